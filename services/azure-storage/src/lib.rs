//! Azure Storage shared access signature codec
//!
//! This crate parses, validates and re-signs Azure Storage SAS tokens:
//! - account SAS (`srt`) and service SAS for blobs, containers, snapshots,
//!   shares, files, tables and queues
//! - every signing format from the pre-2012 blob layout to 2020-10-02
//! - connection strings, with container, blob, share, file, table and
//!   queue names recovered from their endpoints
//!
//! # Example
//!
//! ```rust
//! use saskit_azure_storage::{parse_and_validate, Param, SasSigner};
//!
//! let raw = "https://acct.blob.core.windows.net/photos/cat.png\
//!            ?sv=2019-02-02&sr=b&sp=r&se=2099-01-01&sig=c2ln";
//! let inspection = parse_and_validate(raw).unwrap();
//! assert!(inspection.is_valid(), "{}", inspection.report);
//!
//! // Re-issue the same capability with the account key.
//! let signed = SasSigner::new()
//!     .sign(&inspection.params, "c2Fza2l0LXRlc3QtYWNjb3VudC1rZXk=")
//!     .unwrap();
//! assert!(signed.token().starts_with("sv=2019-02-02&sr=b&se=2099-01-01&sp=r&sig="));
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

#[allow(missing_docs)]
pub mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod field;
pub use field::Endpoints;
pub use field::Field;
pub use field::Param;
pub use field::ParameterSet;

mod resource;
pub use resource::ResourceKind;
pub use resource::SasKind;
pub use resource::Service;

mod lex;
pub use lex::lex;
pub use lex::LexError;

mod resolve;
pub use resolve::resolve;

mod permission;
pub use permission::canonicalize_permissions;
pub use permission::CANONICAL_ORDER;

mod ip_range;
pub use ip_range::parse_ip_range;
pub use ip_range::IpRange;

mod validate;
pub use validate::Diagnostic;
pub use validate::Report;
pub use validate::Validator;

pub mod string_to_sign;

mod signer;
pub use signer::SasSigner;
pub use signer::SignedSas;
pub use signer::SigningDebug;

mod inspect;
pub use inspect::parse_and_validate;
pub use inspect::parse_and_validate_with;
pub use inspect::regenerate;
pub use inspect::regenerate_with;
pub use inspect::Inspection;
