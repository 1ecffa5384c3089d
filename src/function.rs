//! Composition function
//!
//! Observes a composite resource, fetches the published Cloudflare IPv4
//! ranges and adds one `SecurityRule` allowing them to the desired state.

use crate::config::Config;
use crate::ranges::{extract_ipv4, RangesHttpClient};
use crate::resource::{
    get_desired_composed, get_observed_composite, get_string, set_desired_composed, Resource,
    RunFunctionRequest, RunFunctionResponse, SecurityRule,
};
use anyhow::{Context, Result};

/// Field on the composite holding the network security group name
pub const NSG_NAME_PATH: &str = "spec.nsgName";

/// Prefix for the composed resource name
pub const RESOURCE_NAME_PREFIX: &str = "xbuckets-";

/// Desired-resource key for the rule of a given security group
pub fn resource_name(nsg_name: &str) -> String {
    format!("{}{}", RESOURCE_NAME_PREFIX, nsg_name)
}

/// Stateless request handler. Safe to share between concurrent requests.
#[derive(Clone)]
pub struct Function {
    ranges: RangesHttpClient,
    ttl: String,
}

impl Function {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            ranges: RangesHttpClient::new(config)?,
            ttl: config.response_ttl(),
        })
    }

    /// Run the function against one request.
    ///
    /// Failures never escape as `Err`: they become a single fatal result and
    /// the response keeps the request's desired state unchanged.
    pub async fn run_function(&self, req: &RunFunctionRequest) -> RunFunctionResponse {
        tracing::info!(tag = %req.meta.tag, "Running function");

        let mut rsp = RunFunctionResponse::to(req, self.ttl.clone());

        if let Err(err) = self.compose(req, &mut rsp).await {
            tracing::warn!("Function failed: {:#}", err);
            rsp.fatal(&err);
        }

        rsp
    }

    async fn compose(&self, req: &RunFunctionRequest, rsp: &mut RunFunctionResponse) -> Result<()> {
        let xr = get_observed_composite(req).context("cannot get observed composite resource")?;

        tracing::debug!(
            xr_version = xr.api_version(),
            xr_kind = xr.kind(),
            xr_name = xr.name(),
            "Observed composite resource"
        );

        let nsg_name = get_string(&xr.resource, NSG_NAME_PATH)
            .with_context(|| format!("cannot read {} field of {}", NSG_NAME_PATH, xr.kind()))?;

        let mut desired = get_desired_composed(req).context("cannot get desired resources")?;

        let response = self
            .ranges
            .get()
            .await
            .context("failed to fetch IP addresses from URL")?;
        let body = response
            .text()
            .await
            .context("failed to read response body")?;

        let prefixes = extract_ipv4(&body);
        tracing::debug!("Extracted {} addresses from {}", prefixes.len(), self.ranges.url());

        let rule = SecurityRule::allow_sources(&nsg_name, prefixes);
        let composed = rule.to_unstructured()?;

        let name = resource_name(&nsg_name);
        desired.insert(name.clone(), Resource::new(composed));

        set_desired_composed(rsp, desired).context("cannot set desired composed resources")?;

        tracing::info!(
            xr_kind = xr.kind(),
            xr_name = xr.name(),
            nsg = %nsg_name,
            resource = %name,
            "Added desired nsg"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offline_function() -> Function {
        let config = Config {
            // Discard port; nothing should ever reach it in these tests
            ranges_url: "http://127.0.0.1:9/ips".to_string(),
            max_retries: 0,
            ..Config::default()
        };
        Function::new(&config).unwrap()
    }

    #[test]
    fn test_resource_name_is_deterministic() {
        assert_eq!(resource_name("ng1"), "xbuckets-ng1");
        assert_eq!(resource_name("ng1"), resource_name("ng1"));
    }

    #[tokio::test]
    async fn test_missing_composite_is_fatal() {
        let rsp = offline_function()
            .run_function(&RunFunctionRequest::default())
            .await;

        assert!(rsp.is_fatal());
        assert!(rsp.results[0]
            .message
            .starts_with("cannot get observed composite resource"));
        assert!(rsp.desired.resources.is_empty());
    }

    #[tokio::test]
    async fn test_missing_nsg_name_is_fatal_before_fetch() {
        let req: RunFunctionRequest = serde_json::from_value(json!({
            "observed": {
                "composite": {"resource": {"kind": "XNetwork", "spec": {}}}
            }
        }))
        .unwrap();

        let rsp = offline_function().run_function(&req).await;

        assert_eq!(rsp.results.len(), 1);
        assert_eq!(
            rsp.results[0].message,
            "cannot read spec.nsgName field of XNetwork: no such field: spec.nsgName"
        );
        assert_eq!(rsp.desired, req.desired);
    }
}
