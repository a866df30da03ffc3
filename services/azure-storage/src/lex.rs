//! Split a pasted SAS token or connection string into fields.

use log::debug;
use log::warn;
use percent_encoding::percent_decode_str;
use saskit_core::Error;
use saskit_core::Result;

use crate::constants::*;
use crate::field::Param;
use crate::field::ParameterSet;
use crate::resource::Service;

/// Why raw input could not be lexed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexError {
    /// Tokens and connection strings never contain literal whitespace.
    #[error("input contains a space or line break")]
    Whitespace,
    /// Both `SharedAccessSignature` and a bare `?` token are present.
    #[error("input mixes a connection string and a bare `?` token")]
    Ambiguous,
    /// Neither `SharedAccessSignature` nor `?` is present.
    #[error("input contains neither `SharedAccessSignature=` nor a `?` token")]
    NoSignature,
    /// Characters between `SharedAccessSignature` and its value.
    #[error("`SharedAccessSignature` must be followed directly by `=` and the token")]
    StrayCharacter,
    /// A connection string without any endpoint.
    #[error("connection string has no endpoint; paste a bare `?` token instead")]
    MissingEndpoint,
    /// Connection string endpoints next to a bare token.
    #[error("endpoints are only allowed in the connection string form")]
    EndpointWithBareToken,
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Error::parse_invalid(err.to_string()).with_source(err)
    }
}

impl LexError {
    /// Recover the lexing cause from an error returned by [`lex`].
    pub fn of(err: &Error) -> Option<LexError> {
        std::error::Error::source(err)?
            .downcast_ref::<LexError>()
            .copied()
    }
}

/// Lex `raw` into a [`ParameterSet`].
///
/// Accepts a connection string carrying `SharedAccessSignature=` and at
/// least one `*Endpoint=`, or a bare token `?sv=...`, optionally prefixed by
/// the resource URL. Keys missing from the token are left absent; nothing
/// here judges field values.
pub fn lex(raw: &str) -> Result<ParameterSet> {
    if raw.contains([' ', '\t', '\r', '\n']) {
        return Err(LexError::Whitespace.into());
    }

    let has_sas_key = raw.contains(SHARED_ACCESS_SIGNATURE);
    let has_bare_token = raw.contains('?');

    if has_sas_key && has_bare_token {
        let stray = [
            format!("{SHARED_ACCESS_SIGNATURE}?="),
            format!("{SHARED_ACCESS_SIGNATURE}=?"),
        ];
        if stray.iter().any(|s| raw.contains(s.as_str())) {
            return Err(LexError::StrayCharacter.into());
        }
        return Err(LexError::Ambiguous.into());
    }
    if !has_sas_key && !has_bare_token {
        return Err(LexError::NoSignature.into());
    }

    let mut params = ParameterSet::new();
    for service in Service::ALL {
        if let Some(url) = segment_value(raw, service.endpoint_key()) {
            params.set_endpoint(service, url);
        }
    }

    if has_sas_key {
        let Some(token) = segment_value(raw, &format!("{SHARED_ACCESS_SIGNATURE}=")) else {
            return Err(LexError::StrayCharacter.into());
        };
        if params.endpoints().is_empty() {
            return Err(LexError::MissingEndpoint.into());
        }
        extract_keys(&mut params, token);
    } else {
        if !params.endpoints().is_empty() {
            return Err(LexError::EndpointWithBareToken.into());
        }
        let (prefix, token) = raw.split_once('?').unwrap_or(("", raw));
        extract_keys(&mut params, token);
        recover_implicit_endpoint(&mut params, prefix);
    }

    Ok(params)
}

/// Value of the `;`-separated segment starting with `key`.
fn segment_value<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    raw.split(';').find_map(|segment| segment.strip_prefix(key))
}

fn extract_keys(params: &mut ParameterSet, token: &str) {
    for pair in token.split('&').filter(|p| !p.is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            debug!("ignoring token segment without value: {pair}");
            continue;
        };
        let Some(param) = Param::from_token_key(key) else {
            debug!("ignoring unknown token key: {key}");
            continue;
        };
        if params.is_present(param) {
            warn!("duplicate token key {key}, keeping the first value");
            continue;
        }
        let decoded = percent_decode_str(value);
        match decoded.clone().decode_utf8() {
            Ok(v) => {
                params.set(param, v);
            }
            Err(err) => {
                warn!("token key {key} does not decode to UTF-8 ({err}), invalid bytes replaced");
                params.set(param, decoded.decode_utf8_lossy());
                params.invalidate(param);
            }
        }
    }

    debug!(
        "lexed token keys: {:?}",
        params
            .iter()
            .filter(|(_, f)| f.is_present())
            .map(|(p, _)| p.key())
            .collect::<Vec<_>>()
    );
}

/// A bare token pasted together with its resource URL names the endpoint implicitly.
///
/// Only service SAS tokens are resolved this way: anything carrying `sr` or
/// `tn`, and queue URLs, which carry no selector at all.
fn recover_implicit_endpoint(params: &mut ParameterSet, prefix: &str) {
    if prefix.is_empty() {
        return;
    }

    let Some(service) = Service::ALL
        .into_iter()
        .find(|s| prefix.contains(&format!(".{s}.core")))
    else {
        debug!("cannot classify implicit endpoint {prefix}");
        return;
    };

    let has_selector =
        params.is_present(Param::Resource) || params.is_present(Param::TableName);
    let is_queue = service == Service::Queue && !params.is_present(Param::ResourceTypes);
    if !has_selector && !is_queue {
        return;
    }

    debug!("recovered implicit {service} endpoint {prefix}");
    params.set_endpoint(service, prefix);
    params.set_token_only(true);
}
