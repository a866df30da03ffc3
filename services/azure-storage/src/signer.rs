//! Azure Storage SAS signer.

use std::fmt;

use log::debug;
use percent_encoding::utf8_percent_encode;
use saskit_core::hash::base64_decode;
use saskit_core::hash::base64_hmac_sha256;
use saskit_core::Error;
use saskit_core::Result;
use saskit_core::SignToken;
use serde::Serialize;

use crate::constants::*;
use crate::credential::Credential;
use crate::field::Param;
use crate::field::ParameterSet;
use crate::permission::canonicalize_permissions;
use crate::resource::SasKind;
use crate::string_to_sign;

const ACCOUNT_TOKEN_ORDER: &[Param] = &[
    Param::Version,
    Param::Services,
    Param::ResourceTypes,
    Param::Start,
    Param::Expiry,
    Param::Permissions,
    Param::Ip,
    Param::Protocol,
];

const SERVICE_TOKEN_ORDER: &[Param] = &[
    Param::Version,
    Param::Resource,
    Param::TableName,
    Param::Start,
    Param::Expiry,
    Param::Permissions,
    Param::Ip,
    Param::Protocol,
    Param::Identifier,
    Param::StartPartitionKey,
    Param::StartRowKey,
    Param::EndPartitionKey,
    Param::EndRowKey,
    Param::CacheControl,
    Param::ContentDisposition,
    Param::ContentEncoding,
    Param::ContentLanguage,
    Param::ContentType,
    Param::Snapshot,
];

/// Signer that builds Azure Storage shared access signatures.
///
/// - [Create an account SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas)
/// - [Create a service SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas)
#[derive(Debug, Default)]
pub struct SasSigner {
    debug_info: bool,
}

impl SasSigner {
    /// Create a signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical resource path and string-to-sign alongside the token.
    pub fn with_debug_info(mut self, debug_info: bool) -> Self {
        self.debug_info = debug_info;
        self
    }

    /// Sign `params` with the base64 encoded `account_key`.
    ///
    /// Field values are signed as given; only `sp` of a service SAS is
    /// reordered. Capability semantics such as expiry are not checked
    /// here, run the validator first for that.
    ///
    /// # Example
    ///
    /// ```
    /// use saskit_azure_storage::{Param, ParameterSet, SasSigner};
    ///
    /// let params = ParameterSet::new()
    ///     .with(Param::Account, "account")
    ///     .with(Param::Version, "2018-11-09")
    ///     .with(Param::Services, "bqtf")
    ///     .with(Param::ResourceTypes, "sco")
    ///     .with(Param::Permissions, "rwdlacu")
    ///     .with(Param::Expiry, "2022-03-01T08:17:34Z");
    ///
    /// let signed = SasSigner::new().sign(&params, "a2V5").unwrap();
    /// assert!(signed.token().ends_with("sig=jgK9nDUT0ntH%2Fp28LPs0jzwxsk91W6hePLPlfrElv4k%3D"));
    /// ```
    pub fn sign(&self, params: &ParameterSet, account_key: &str) -> Result<SignedSas> {
        let kind = sas_kind(params)?;

        let sv = params.get(Param::Version).unwrap_or_default();
        if !sv.is_empty() && !is_version_shaped(sv) {
            return Err(Error::request_invalid(format!(
                "sv {sv:?} is not a YYYY-MM-DD version"
            )));
        }
        if params
            .get(Param::Protocol)
            .is_some_and(|spr| spr.eq_ignore_ascii_case("http"))
        {
            return Err(Error::request_invalid(
                "spr=http is not allowed, use https or https,http",
            ));
        }
        if kind == SasKind::Account && sv < VERSION_2015_04_05 {
            return Err(Error::unsupported(format!(
                "account SAS requires sv {VERSION_2015_04_05} or later, got {sv:?}"
            )));
        }

        let sts = string_to_sign::build(params, kind)?;

        if account_key.is_empty() {
            return Err(Error::key_invalid("account key is empty"));
        }
        let key = base64_decode(account_key)?;
        let signature = base64_hmac_sha256(&key, sts.value.as_bytes());

        let token = assemble_token(params, kind, &signature);
        debug!("signed {kind} with sv {sv}");

        Ok(SignedSas {
            token,
            debug: self.debug_info.then(|| SigningDebug {
                canonical_resource: sts.canonical_resource,
                string_to_sign: sts.value,
            }),
        })
    }
}

impl SignToken for SasSigner {
    type Params = ParameterSet;
    type Credential = Credential;
    type Output = SignedSas;

    /// Sign with a shared key credential.
    ///
    /// The credential's account name is used when `params` resolved none.
    fn sign_token(&self, params: &ParameterSet, credential: &Credential) -> Result<SignedSas> {
        if params.account_name().is_none() && !credential.account_name.is_empty() {
            let params = params
                .clone()
                .with(Param::Account, credential.account_name.as_str());
            return self.sign(&params, &credential.account_key);
        }
        self.sign(params, &credential.account_key)
    }
}

fn sas_kind(params: &ParameterSet) -> Result<SasKind> {
    if let Some(kind) = params.sas_kind() {
        return Ok(kind);
    }
    match params.selector_count() {
        0 => Err(Error::request_invalid(
            "one of srt, sr or tn is required, or a queue resource",
        )),
        1 => Err(Error::unsupported(format!(
            "unknown signed resource sr={:?}",
            params.get(Param::Resource).unwrap_or_default()
        ))),
        _ => Err(Error::request_invalid(
            "srt, sr and tn are mutually exclusive",
        )),
    }
}

fn is_version_shaped(sv: &str) -> bool {
    sv.len() == 10
        && sv.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

fn assemble_token(params: &ParameterSet, kind: SasKind, signature: &str) -> String {
    let order = match kind {
        SasKind::Account => ACCOUNT_TOKEN_ORDER,
        SasKind::Service(_) => SERVICE_TOKEN_ORDER,
    };

    let mut pairs: Vec<(&str, String)> = Vec::with_capacity(order.len() + 1);
    for param in order {
        let Some(value) = params.get_non_empty(*param) else {
            continue;
        };
        let value = if *param == Param::Permissions && kind.is_service() {
            canonicalize_permissions(value)
        } else {
            value.to_string()
        };
        pairs.push((param.key(), value));
    }
    pairs.push((Param::Signature.key(), signature.to_string()));

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoded(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencoded(s: &str) -> String {
    utf8_percent_encode(s, &SAS_QUERY_ENCODE_SET).to_string()
}

/// Intermediate values of a signing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningDebug {
    /// Canonical resource path, for service SAS only.
    pub canonical_resource: Option<String>,
    /// The exact string that was signed.
    pub string_to_sign: String,
}

/// A freshly signed SAS token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedSas {
    token: String,
    debug: Option<SigningDebug>,
}

impl SignedSas {
    /// The token, without leading `?` or `&`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Debug values, when requested with [`SasSigner::with_debug_info`].
    pub fn debug(&self) -> Option<&SigningDebug> {
        self.debug.as_ref()
    }

    /// Append the token to `endpoint`.
    pub fn url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_end_matches(['?', '&']);
        let sep = if endpoint.contains('?') { '&' } else { '?' };
        format!("{endpoint}{sep}{}", self.token)
    }

    /// Consume into the token.
    pub fn into_token(self) -> String {
        self.token
    }
}

impl fmt::Display for SignedSas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}
