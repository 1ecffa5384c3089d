//! Address-range retrieval
//!
//! Fetches the published list of IP ranges and pulls IPv4 literals out of it.
//!
//! # Module Structure
//!
//! - [`http`] - HTTP client with timeout and retry for the range endpoint
//! - [`extract`] - Pattern-based IPv4 extraction from free-form text
//!
//! # Example
//!
//! ```ignore
//! use crate::config::Config;
//! use crate::ranges::{extract_ipv4, RangesHttpClient};
//!
//! async fn example() -> anyhow::Result<Vec<String>> {
//!     let client = RangesHttpClient::new(&Config::default())?;
//!     let body = client.get().await?.text().await?;
//!     Ok(extract_ipv4(&body))
//! }
//! ```

pub mod extract;
pub mod http;

pub use extract::extract_ipv4;
pub use http::RangesHttpClient;
