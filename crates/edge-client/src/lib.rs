//! Client helper for the edge proxy.
//!
//! [`EdgeClient`] builds URLs against a configured base, bounds every request
//! with a timeout and reports every outcome as a [`SafeResult`] instead of an
//! error:
//!
//! ```no_run
//! # async fn demo() -> Result<(), edge_client::ClientError> {
//! use edge_client::{ClientConfig, EdgeClient, SafeResult};
//!
//! let client = EdgeClient::new(ClientConfig::new("https://example.com/api/proxy"))?;
//! match client.list_sessions().await {
//!     SafeResult::Success { body, .. } => println!("sessions: {body}"),
//!     SafeResult::Unreachable { reason, .. } => eprintln!("unreachable: {reason}"),
//!     other => eprintln!("{}", other.to_value()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod result;
pub mod url;

pub use client::{EdgeClient, FetchOptions, RequestBody};
pub use config::{ClientConfig, ConfigSnapshot};
pub use error::ClientError;
pub use result::{FailureReason, SafeResult};
