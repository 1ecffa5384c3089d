//! Composition function that allows Cloudflare's published IPv4 ranges
//! through an Azure network security group.
//!
//! - [`function`] - The request handler
//! - [`ranges`] - Fetching and parsing the address-range listing
//! - [`resource`] - Pipeline envelope and composed resource types
//! - [`config`] - Configuration loading
//! - [`server`] - HTTP transport

pub mod config;
pub mod function;
pub mod ranges;
pub mod resource;
pub mod server;

pub use config::Config;
pub use function::Function;
