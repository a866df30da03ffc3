//! Core components for building and signing capability tokens.
//!
//! This crate provides the foundational types and traits shared by saskit services.
//!
//! ## Overview
//!
//! - **Traits**: [`SigningCredential`] validates a signing key, [`SignToken`] is the
//!   contract every token signer implements.
//! - **Error**: [`Error`] with an [`ErrorKind`] that distinguishes parse failures from
//!   signing failures.
//!
//! ## Example
//!
//! ```
//! use saskit_core::{hash, Result, SignToken, SigningCredential};
//!
//! #[derive(Clone, Debug)]
//! struct MyKey(String);
//!
//! impl SigningCredential for MyKey {
//!     fn is_valid(&self) -> bool {
//!         !self.0.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MySigner;
//!
//! impl SignToken for MySigner {
//!     type Params = String;
//!     type Credential = MyKey;
//!     type Output = String;
//!
//!     fn sign_token(&self, params: &String, cred: &MyKey) -> Result<String> {
//!         let key = hash::base64_decode(&cred.0)?;
//!         Ok(hash::base64_hmac_sha256(&key, params.as_bytes()))
//!     }
//! }
//!
//! let sig = MySigner
//!     .sign_token(&"payload".to_string(), &MyKey("a2V5".to_string()))
//!     .unwrap();
//! assert_eq!(sig.len(), 44);
//! ```
//!
//! ## Utilities
//!
//! - [`hash`]: base64 and HMAC helpers
//! - [`time`]: SAS timestamp parsing and formatting
//! - [`utils`]: data redaction

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod api;
pub use api::SignToken;
pub use api::SigningCredential;
mod error;
pub use error::Error;
pub use error::ErrorKind;
pub use error::Result;
