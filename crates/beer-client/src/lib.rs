//! Typed client for the paginated beer REST API
//!
//! ```text
//! BeerClient ──► AuthenticatingTransport ──► ReqwestTransport ──► service
//!                      │
//!                      └─► TokenProvider (cached client-credentials token)
//! ```
//!
//! Every operation returns a typed value or one of five errors: `Auth`,
//! `NotFound`, `Transport`, `Decode`, `Validation`. Nothing is retried;
//! `Error::classification` tells the caller whether a retry could help.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod model;
pub mod page;
pub mod params;

pub use client::BeerClient;
pub use config::{BeerServiceConfig, ItemPath};
pub use error::{Error, ErrorClassification, Result};
pub use model::{Beer, BeerStyle};
pub use page::Page;
pub use params::BeerListParams;
