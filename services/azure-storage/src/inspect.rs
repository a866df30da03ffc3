//! Inspect pasted tokens and re-issue parameter sets.

use log::debug;
use saskit_core::Error;
use saskit_core::Result;
use serde::Serialize;

use crate::field::Param;
use crate::field::ParameterSet;
use crate::lex::lex;
use crate::resolve::resolve;
use crate::signer::SasSigner;
use crate::signer::SignedSas;
use crate::validate::Report;
use crate::validate::Validator;

/// A lexed, resolved and validated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inspection {
    /// Fields, with validity flags set by the validator.
    pub params: ParameterSet,
    /// One diagnostic per reported field.
    pub report: Report,
}

impl Inspection {
    /// Returns true when every field passed.
    pub fn is_valid(&self) -> bool {
        self.report.is_valid()
    }
}

/// Lex, resolve and validate a pasted token or connection string.
///
/// Only structurally malformed input is an error; field problems are
/// reported in [`Inspection::report`].
///
/// # Example
///
/// ```
/// use saskit_azure_storage::{parse_and_validate, Param};
///
/// let raw = "BlobEndpoint=https://acct.blob.core.windows.net/mycontainer/myblob.txt;\
///            SharedAccessSignature=sv=2015-04-05&sr=b&sp=rw&se=2020-01-01T00%3A00%3A00Z&sig=c2ln";
/// let inspection = parse_and_validate(raw).unwrap();
///
/// assert_eq!(inspection.params.get(Param::Container), Some("mycontainer"));
/// assert!(!inspection.report.get(Param::Expiry).unwrap().ok);
/// ```
pub fn parse_and_validate(raw: &str) -> Result<Inspection> {
    parse_and_validate_with(&Validator::new(), raw)
}

/// [`parse_and_validate`] with a caller supplied validator.
pub fn parse_and_validate_with(validator: &Validator, raw: &str) -> Result<Inspection> {
    let mut params = resolve(lex(raw)?);
    let report = validator.validate(&mut params);
    debug!(
        "inspected token: {} diagnostics, {} errors",
        report.entries().len(),
        report.errors().count()
    );

    Ok(Inspection { params, report })
}

/// Validate `params` and sign them with the base64 encoded `account_key`.
///
/// The existing `sig` is ignored. Sets with invalid fields are refused
/// with [`saskit_core::ErrorKind::RequestInvalid`]; use
/// [`SasSigner::sign`] directly to re-derive an expired token.
pub fn regenerate(params: &ParameterSet, account_key: &str) -> Result<SignedSas> {
    regenerate_with(&Validator::new(), &SasSigner::new(), params, account_key)
}

/// [`regenerate`] with a caller supplied validator and signer.
pub fn regenerate_with(
    validator: &Validator,
    signer: &SasSigner,
    params: &ParameterSet,
    account_key: &str,
) -> Result<SignedSas> {
    let mut checked = params.clone();
    let report = validator.validate(&mut checked).without(Param::Signature);

    if !report.is_valid() {
        let problems = report
            .errors()
            .map(|d| format!("{}: {}", d.field, d.message))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::request_invalid(format!(
            "refusing to sign invalid fields: {problems}"
        )));
    }

    signer.sign(&checked, account_key)
}
