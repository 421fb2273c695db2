//! Klaud API operations as schema-validated tools.
//!
//! The registry ([`registry`], backed by a static catalog) describes every operation as
//! data; the [`dispatch::Dispatcher`] interprets those records: validate arguments, build one
//! upstream request, execute it through an [`upstream::Upstream`], and wrap the outcome in a
//! [`dispatch::ResponseEnvelope`].
//!
//! It contains **no** transport wiring; the MCP stdio server lives in `klaud-api-mcp`.

mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod redact;
pub mod registry;
pub mod request;
pub mod semantics;
pub mod upstream;
pub mod validate;

pub use config::{ClientConfig, Credentials, Secret};
pub use dispatch::{Dispatcher, ResponseEnvelope};
pub use error::{DispatchError, Result};
