//! Pipeline request/response envelope
//!
//! JSON rendition of the composition pipeline's `RunFunctionRequest` and
//! `RunFunctionResponse`, using the host's camelCase field names. Resources
//! are kept as loosely-typed `serde_json::Value` trees.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Name of a composed resource within the desired/observed map
pub type ResourceName = String;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Opaque tag the host uses to recognise identical requests
    #[serde(default)]
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    #[serde(default)]
    pub tag: String,
    /// How long the host may cache this response, e.g. `60s`
    #[serde(default)]
    pub ttl: String,
}

/// Readiness reported for a desired resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ready {
    #[default]
    #[serde(rename = "READY_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "READY_TRUE")]
    True,
    #[serde(rename = "READY_FALSE")]
    False,
}

/// A single resource with its connection details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default)]
    pub resource: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connection_details: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<Ready>,
}

impl Resource {
    pub fn new(resource: Value) -> Self {
        Self {
            resource,
            ..Self::default()
        }
    }

    pub fn api_version(&self) -> &str {
        self.resource
            .get("apiVersion")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }

    pub fn kind(&self) -> &str {
        self.resource.get("kind").and_then(|v| v.as_str()).unwrap_or("")
    }

    pub fn name(&self) -> &str {
        self.resource
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }
}

/// Observed or desired state of the composite and its composed resources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<Resource>,
    #[serde(default)]
    pub resources: BTreeMap<ResourceName, Resource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFunctionRequest {
    #[serde(default)]
    pub meta: RequestMeta,
    #[serde(default)]
    pub observed: State,
    #[serde(default)]
    pub desired: State,
    /// Function-specific input from the composition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    /// Context passed between functions in the pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "SEVERITY_FATAL")]
    Fatal,
    #[serde(rename = "SEVERITY_WARNING")]
    Warning,
    #[serde(rename = "SEVERITY_NORMAL")]
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFunctionResponse {
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub desired: State,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<FunctionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl RunFunctionResponse {
    /// Start a response that carries over the request's desired state and context
    pub fn to(req: &RunFunctionRequest, ttl: impl Into<String>) -> Self {
        Self {
            meta: ResponseMeta {
                tag: req.meta.tag.clone(),
                ttl: ttl.into(),
            },
            desired: req.desired.clone(),
            results: Vec::new(),
            context: req.context.clone(),
        }
    }

    /// Record a fatal result. The full cause chain becomes the message.
    pub fn fatal(&mut self, err: &anyhow::Error) {
        self.results.push(FunctionResult {
            severity: Severity::Fatal,
            message: format!("{:#}", err),
        });
    }

    pub fn is_fatal(&self) -> bool {
        self.results.iter().any(|r| r.severity == Severity::Fatal)
    }
}

/// The observed composite resource
pub fn get_observed_composite(req: &RunFunctionRequest) -> Result<&Resource> {
    match req.observed.composite.as_ref() {
        Some(xr) if xr.resource.is_object() => Ok(xr),
        Some(_) => anyhow::bail!("observed composite resource is not an object"),
        None => anyhow::bail!("request has no observed composite resource"),
    }
}

/// A copy of the desired composed resources, checked to be objects
pub fn get_desired_composed(req: &RunFunctionRequest) -> Result<BTreeMap<ResourceName, Resource>> {
    check_resources(&req.desired.resources)?;
    Ok(req.desired.resources.clone())
}

/// Replace the desired composed resources of `rsp`. On error `rsp` is untouched.
pub fn set_desired_composed(
    rsp: &mut RunFunctionResponse,
    desired: BTreeMap<ResourceName, Resource>,
) -> Result<()> {
    check_resources(&desired)?;
    rsp.desired.resources = desired;
    Ok(())
}

fn check_resources(resources: &BTreeMap<ResourceName, Resource>) -> Result<()> {
    for (name, res) in resources {
        if name.is_empty() {
            anyhow::bail!("desired resource has an empty name");
        }
        if !res.resource.is_object() {
            anyhow::bail!("desired resource {:?} is not an object", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request() -> RunFunctionRequest {
        serde_json::from_value(json!({
            "meta": {"tag": "abc"},
            "observed": {
                "composite": {
                    "resource": {
                        "apiVersion": "example.org/v1alpha1",
                        "kind": "XNetwork",
                        "metadata": {"name": "net-1"},
                        "spec": {"nsgName": "ng1"}
                    }
                }
            },
            "desired": {
                "resources": {
                    "other": {
                        "resource": {"apiVersion": "v1", "kind": "ConfigMap"},
                        "ready": "READY_TRUE"
                    }
                }
            },
            "context": {"apiextensions.crossplane.io/environment": {"a": 1}}
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_request() {
        let req = request();
        assert_eq!(req.meta.tag, "abc");
        let xr = get_observed_composite(&req).unwrap();
        assert_eq!(xr.kind(), "XNetwork");
        assert_eq!(xr.api_version(), "example.org/v1alpha1");
        assert_eq!(xr.name(), "net-1");
        assert_eq!(req.desired.resources["other"].ready, Some(Ready::True));
    }

    #[test]
    fn test_response_copies_desired_and_context() {
        let req = request();
        let rsp = RunFunctionResponse::to(&req, "60s");
        assert_eq!(rsp.meta.tag, "abc");
        assert_eq!(rsp.meta.ttl, "60s");
        assert_eq!(rsp.desired, req.desired);
        assert_eq!(rsp.context, req.context);
        assert!(!rsp.is_fatal());
    }

    #[test]
    fn test_fatal_message_includes_cause_chain() {
        let mut rsp = RunFunctionResponse::default();
        let err = anyhow::anyhow!("connection refused").context("failed to fetch");
        rsp.fatal(&err);

        assert!(rsp.is_fatal());
        assert_eq!(rsp.results[0].message, "failed to fetch: connection refused");

        let value = serde_json::to_value(&rsp).unwrap();
        assert_eq!(value["results"][0]["severity"], "SEVERITY_FATAL");
    }

    #[test]
    fn test_missing_composite() {
        let req = RunFunctionRequest::default();
        assert!(get_observed_composite(&req).is_err());
    }

    #[test]
    fn test_desired_must_be_objects() {
        let mut req = request();
        req.desired
            .resources
            .insert("broken".to_string(), Resource::new(json!("scalar")));
        assert!(get_desired_composed(&req).is_err());
    }

    #[test]
    fn test_set_desired_leaves_response_on_error() {
        let req = request();
        let mut rsp = RunFunctionResponse::to(&req, "60s");

        let mut bad = BTreeMap::new();
        bad.insert(String::new(), Resource::new(json!({})));
        assert!(set_desired_composed(&mut rsp, bad).is_err());
        assert_eq!(rsp.desired, req.desired);
    }
}
