//! Shared types for the beer service client workspace
//!
//! Holds the pieces every other member needs but that belong to none of
//! them: a redacting wrapper for credentials and the configuration error
//! type used when assembling clients from files or the environment.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
