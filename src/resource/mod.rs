//! Resource abstraction layer
//!
//! Types for the composition pipeline's request/response envelope and for
//! the resources the function reads and produces.
//!
//! # Architecture
//!
//! - [`request`] - Request/response envelope and desired-state helpers
//! - [`fieldpath`] - Dotted field path lookups on unstructured resources
//! - [`security_rule`] - The composed network security rule

pub mod fieldpath;
pub mod request;
pub mod security_rule;

pub use fieldpath::{get_string, get_value};
pub use request::{
    get_desired_composed, get_observed_composite, set_desired_composed, FunctionResult, Ready,
    Resource, ResourceName, RunFunctionRequest, RunFunctionResponse, Severity, State,
};
pub use security_rule::SecurityRule;
