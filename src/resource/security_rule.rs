//! Azure network security rule
//!
//! Typed form of the `SecurityRule` managed resource the function composes.
//! Only the fields this function sets are modelled.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const API_VERSION: &str = "network.azure.upbound.io/v1beta1";
pub const KIND: &str = "SecurityRule";

pub const EXTERNAL_NAME_ANNOTATION: &str = "crossplane.io/external-name";
pub const EXTERNAL_NAME: &str = "cloudflare-ip-allow";

pub const ACCESS: &str = "Allow";
pub const DESTINATION_ADDRESS_PREFIX: &str = "20.100.33.77";
pub const DIRECTION: &str = "Inbound";
pub const PRIORITY: f64 = 100.0;
pub const PROTOCOL: &str = "Tcp";
pub const SOURCE_PORT_RANGE: &str = "443";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleParameters {
    pub access: String,
    pub destination_address_prefix: String,
    pub direction: String,
    pub network_security_group_name: String,
    pub priority: f64,
    pub protocol: String,
    pub source_address_prefixes: Vec<String>,
    pub source_port_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRuleSpec {
    pub for_provider: SecurityRuleParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRule {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: SecurityRuleSpec,
}

impl SecurityRule {
    /// Inbound allow rule on `nsg_name` for the given source prefixes
    pub fn allow_sources(nsg_name: &str, source_address_prefixes: Vec<String>) -> Self {
        let mut annotations = BTreeMap::new();
        annotations.insert(
            EXTERNAL_NAME_ANNOTATION.to_string(),
            EXTERNAL_NAME.to_string(),
        );

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ObjectMeta { annotations },
            spec: SecurityRuleSpec {
                for_provider: SecurityRuleParameters {
                    access: ACCESS.to_string(),
                    destination_address_prefix: DESTINATION_ADDRESS_PREFIX.to_string(),
                    direction: DIRECTION.to_string(),
                    network_security_group_name: nsg_name.to_string(),
                    priority: PRIORITY,
                    protocol: PROTOCOL.to_string(),
                    source_address_prefixes,
                    source_port_range: SOURCE_PORT_RANGE.to_string(),
                },
            },
        }
    }

    /// Convert to the unstructured form stored in the desired resource map
    pub fn to_unstructured(&self) -> Result<Value> {
        serde_json::to_value(self)
            .with_context(|| format!("cannot convert {} to unstructured", KIND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unstructured_shape() {
        let rule = SecurityRule::allow_sources("ng1", vec!["1.2.3.4".to_string()]);
        let value = rule.to_unstructured().unwrap();

        assert_eq!(
            value,
            json!({
                "apiVersion": "network.azure.upbound.io/v1beta1",
                "kind": "SecurityRule",
                "metadata": {
                    "annotations": {"crossplane.io/external-name": "cloudflare-ip-allow"}
                },
                "spec": {
                    "forProvider": {
                        "access": "Allow",
                        "destinationAddressPrefix": "20.100.33.77",
                        "direction": "Inbound",
                        "networkSecurityGroupName": "ng1",
                        "priority": 100.0,
                        "protocol": "Tcp",
                        "sourceAddressPrefixes": ["1.2.3.4"],
                        "sourcePortRange": "443"
                    }
                }
            })
        );
    }

    #[test]
    fn test_empty_prefixes_serialized_as_empty_list() {
        let rule = SecurityRule::allow_sources("ng1", Vec::new());
        let value = rule.to_unstructured().unwrap();
        assert_eq!(value["spec"]["forProvider"]["sourceAddressPrefixes"], json!([]));
    }
}
