//! Per-field and cross-field checks of a [`ParameterSet`].
//!
//! Validation never fails: every problem becomes a [`Diagnostic`] with
//! `ok == false` and clears the field's validity flag, so a caller can
//! highlight every offending input after a single pass.

use std::collections::BTreeMap;
use std::fmt;

use chrono::TimeDelta;
use log::debug;
use saskit_core::time;
use saskit_core::time::parse_sas_timestamp;
use saskit_core::time::DateTime;
use serde::Serialize;

use crate::constants::*;
use crate::field::Param;
use crate::field::ParameterSet;
use crate::ip_range::parse_ip_range;
use crate::permission::describe;
use crate::resource::ResourceKind;
use crate::resource::SasKind;

/// Outcome of checking one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The field checked.
    pub field: Param,
    /// Whether the field passed.
    pub ok: bool,
    /// What the field grants, or why it is rejected.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.ok { "ok" } else { "error" };
        write!(f, "{}: {status}: {}", self.field, self.message)
    }
}

/// Diagnostics of one validation run, in [`Param`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    entries: Vec<Diagnostic>,
}

impl Report {
    /// All diagnostics.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Returns true when no diagnostic failed.
    pub fn is_valid(&self) -> bool {
        self.entries.iter().all(|d| d.ok)
    }

    /// Failing diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| !d.ok)
    }

    /// Diagnostic for `field`, if the field was reported.
    pub fn get(&self, field: Param) -> Option<&Diagnostic> {
        self.entries.iter().find(|d| d.field == field)
    }

    /// Drop the diagnostic for `field`.
    pub(crate) fn without(mut self, field: Param) -> Self {
        self.entries.retain(|d| d.field != field);
        self
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.entries {
            writeln!(f, "{d}")?;
        }
        Ok(())
    }
}

/// Collects at most one diagnostic per field; the first error wins over any ok.
#[derive(Default)]
struct Checks {
    entries: BTreeMap<Param, Diagnostic>,
}

impl Checks {
    fn ok(&mut self, field: Param, message: impl Into<String>) {
        self.entries.entry(field).or_insert_with(|| Diagnostic {
            field,
            ok: true,
            message: message.into(),
        });
    }

    fn error(&mut self, field: Param, message: impl Into<String>) {
        match self.entries.get(&field) {
            Some(d) if !d.ok => {}
            _ => {
                self.entries.insert(
                    field,
                    Diagnostic {
                        field,
                        ok: false,
                        message: message.into(),
                    },
                );
            }
        }
    }

    fn into_report(self) -> Report {
        Report {
            entries: self.entries.into_values().collect(),
        }
    }
}

/// What every rule needs to know about the set as a whole.
struct Context<'a> {
    params: &'a ParameterSet,
    kind: Option<SasKind>,
    sv: &'a str,
    now: DateTime,
}

impl Context<'_> {
    /// `sr`, `tn` or a queue resolution: the set is meant as a service SAS.
    fn is_service(&self) -> bool {
        self.params.is_present(Param::Resource)
            || self.params.is_present(Param::TableName)
            || self.params.is_queue_resource()
    }

    fn is_account(&self) -> bool {
        self.params.is_present(Param::ResourceTypes)
    }
}

/// Field validator.
#[derive(Debug, Default)]
pub struct Validator {
    time: Option<DateTime>,
}

impl Validator {
    /// Create a validator comparing timestamps against the current time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the time `st` and `se` are compared against.
    ///
    /// # Note
    ///
    /// We should always take current time to validate tokens.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Check every field of `params`, clearing the validity flag of each failing one.
    pub fn validate(&self, params: &mut ParameterSet) -> Report {
        let report = {
            let params: &ParameterSet = params;
            let ctx = Context {
                params,
                kind: params.sas_kind(),
                sv: params.get(Param::Version).unwrap_or_default(),
                now: self.time.unwrap_or_else(time::now),
            };

            let mut checks = Checks::default();
            check_encoding(&ctx, &mut checks);
            check_version(&ctx, &mut checks);
            check_selectors(&ctx, &mut checks);
            check_services(&ctx, &mut checks);
            check_resource_types(&ctx, &mut checks);
            check_resource(&ctx, &mut checks);
            check_table_name(&ctx, &mut checks);
            check_permissions(&ctx, &mut checks);
            check_times(&ctx, &mut checks);
            check_ip(&ctx, &mut checks);
            check_protocol(&ctx, &mut checks);
            check_identifier(&ctx, &mut checks);
            check_table_keys(&ctx, &mut checks);
            check_informational(&ctx, &mut checks);
            check_signature(&ctx, &mut checks);
            check_derived(&ctx, &mut checks);
            checks.into_report()
        };

        for d in report.errors() {
            debug!("{d}");
            params.invalidate(d.field);
        }
        report
    }
}

/// Lexed values with bytes that were not UTF-8 cannot be signed faithfully.
fn check_encoding(ctx: &Context, checks: &mut Checks) {
    for (param, field) in ctx.params.iter() {
        if param.is_derived() {
            continue;
        }
        let Some(value) = field.as_deref() else {
            continue;
        };
        if value.contains(char::REPLACEMENT_CHARACTER) {
            checks.error(
                param,
                format!("{param} is not valid UTF-8 once percent-decoded"),
            );
        }
    }
}

fn check_version(ctx: &Context, checks: &mut Checks) {
    let Some(sv) = ctx.params.get(Param::Version) else {
        checks.error(Param::Version, "sv is required");
        return;
    };
    if sv.is_empty() {
        checks.error(Param::Version, "sv is empty");
        return;
    }

    if ACCOUNT_SAS_VERSIONS.contains(&sv) {
        checks.ok(Param::Version, format!("signed with storage version {sv}"));
    } else if SERVICE_SAS_ONLY_VERSIONS.contains(&sv) {
        if ctx.is_service() {
            checks.ok(Param::Version, format!("signed with storage version {sv}"));
        } else {
            checks.error(
                Param::Version,
                format!("version {sv} is only valid for a service SAS"),
            );
        }
    } else {
        checks.error(Param::Version, format!("unknown storage version {sv:?}"));
    }
}

fn check_selectors(ctx: &Context, checks: &mut Checks) {
    let count = ctx.params.selector_count();
    if count == 1 || (count == 0 && ctx.params.is_queue_resource()) {
        return;
    }

    let message = if count == 0 {
        "one of srt, sr or tn is required"
    } else {
        "srt, sr and tn are mutually exclusive"
    };
    for param in [Param::ResourceTypes, Param::Resource, Param::TableName] {
        checks.error(param, message);
    }
}

fn check_services(ctx: &Context, checks: &mut Checks) {
    let Some(ss) = ctx.params.get(Param::Services) else {
        if ctx.kind == Some(SasKind::Account) {
            checks.error(Param::Services, "ss is required for an account SAS");
        }
        return;
    };
    if ctx.is_service() {
        checks.error(Param::Services, "ss is only valid for an account SAS");
        return;
    }
    if ss.is_empty() {
        checks.error(Param::Services, "ss is empty");
        return;
    }

    let mut names = Vec::with_capacity(ss.len());
    for (i, c) in ss.char_indices() {
        let name = match c {
            'b' => "blob",
            'f' => "file",
            'q' => "queue",
            't' => "table",
            _ => {
                checks.error(
                    Param::Services,
                    format!("unknown service {c:?}, expected letters from {SIGNED_SERVICES}"),
                );
                return;
            }
        };
        if ss[..i].contains(c) {
            checks.error(Param::Services, format!("service {c:?} is repeated"));
            return;
        }
        names.push(name);
    }
    checks.ok(Param::Services, format!("services: {}", names.join(", ")));
}

fn check_resource_types(ctx: &Context, checks: &mut Checks) {
    let Some(srt) = ctx.params.get(Param::ResourceTypes) else {
        return;
    };
    if srt.is_empty() {
        checks.error(Param::ResourceTypes, "srt is empty");
        return;
    }
    if srt.len() > SIGNED_RESOURCE_TYPES.len() {
        checks.error(
            Param::ResourceTypes,
            format!("srt has more than {} letters", SIGNED_RESOURCE_TYPES.len()),
        );
        return;
    }

    let mut names = Vec::with_capacity(srt.len());
    for (i, c) in srt.char_indices() {
        let name = match c {
            's' => "service",
            'c' => "container",
            'o' => "object",
            _ => {
                checks.error(
                    Param::ResourceTypes,
                    format!("unknown resource type {c:?}, expected letters from {SIGNED_RESOURCE_TYPES}"),
                );
                return;
            }
        };
        if srt[..i].contains(c) {
            checks.error(Param::ResourceTypes, format!("resource type {c:?} is repeated"));
            return;
        }
        names.push(name);
    }
    checks.ok(
        Param::ResourceTypes,
        format!("account SAS for resource types: {}", names.join(", ")),
    );
}

fn check_resource(ctx: &Context, checks: &mut Checks) {
    let Some(sr) = ctx.params.get(Param::Resource) else {
        return;
    };
    if sr.is_empty() {
        checks.error(Param::Resource, "sr is empty");
        return;
    }
    let Some(kind) = ResourceKind::from_code(sr) else {
        checks.error(
            Param::Resource,
            format!("unknown signed resource {sr:?}, expected one of b, c, bs, s, f"),
        );
        return;
    };

    let gate = match kind {
        ResourceKind::Share | ResourceKind::File => Some(VERSION_2015_02_21),
        ResourceKind::BlobSnapshot => Some(VERSION_2018_11_09),
        _ => None,
    };
    if let Some(min) = gate {
        if ctx.sv < min {
            checks.error(
                Param::Resource,
                format!("sr={sr} requires sv {min} or later"),
            );
            return;
        }
    }
    checks.ok(Param::Resource, format!("{kind} service SAS"));
}

fn check_table_name(ctx: &Context, checks: &mut Checks) {
    let Some(tn) = ctx.params.get(Param::TableName) else {
        return;
    };
    if tn.is_empty() {
        checks.error(Param::TableName, "tn is empty");
    } else if !tn.chars().all(|c| c.is_ascii_alphanumeric()) {
        checks.error(
            Param::TableName,
            format!("table name {tn:?} may only contain letters and digits"),
        );
    } else if tn.len() > TABLE_NAME_MAX_LEN {
        checks.error(
            Param::TableName,
            format!("table name is longer than {TABLE_NAME_MAX_LEN} characters"),
        );
    } else {
        checks.ok(Param::TableName, format!("table service SAS for table {tn}"));
    }
}

fn check_permissions(ctx: &Context, checks: &mut Checks) {
    let Some(sp) = ctx.params.get(Param::Permissions) else {
        checks.error(Param::Permissions, "sp is required");
        return;
    };
    if sp.is_empty() {
        checks.error(Param::Permissions, "sp is empty");
        return;
    }

    let alphabet = ctx
        .kind
        .unwrap_or(SasKind::Account)
        .permission_alphabet();
    if sp.len() > alphabet.len() {
        checks.error(
            Param::Permissions,
            format!("sp has more than {} letters", alphabet.len()),
        );
        return;
    }

    let mut names = Vec::with_capacity(sp.len());
    for (i, c) in sp.char_indices() {
        if !alphabet.contains(c) {
            let target = match ctx.kind {
                Some(kind) => kind.to_string(),
                None => "this SAS".to_string(),
            };
            checks.error(
                Param::Permissions,
                format!("permission {c:?} is not allowed for {target}, expected letters from {alphabet}"),
            );
            return;
        }
        if sp[..i].contains(c) {
            checks.error(Param::Permissions, format!("permission {c:?} is repeated"));
            return;
        }
        names.extend(describe(c));
    }
    checks.ok(Param::Permissions, format!("grants {}", names.join(", ")));
}

fn check_times(ctx: &Context, checks: &mut Checks) {
    let expiry = match ctx.params.get(Param::Expiry) {
        None => {
            checks.error(Param::Expiry, "se is required");
            None
        }
        Some("") => {
            checks.error(Param::Expiry, "se is empty");
            None
        }
        Some(se) => match parse_sas_timestamp(se) {
            Err(err) => {
                checks.error(Param::Expiry, err.to_string());
                None
            }
            Ok(t) if t < ctx.now => {
                checks.error(
                    Param::Expiry,
                    format!("already expired at {}", time::format_rfc3339(t)),
                );
                Some(t)
            }
            Ok(t) => {
                checks.ok(Param::Expiry, format!("expires at {}", time::format_rfc3339(t)));
                Some(t)
            }
        },
    };

    let start = match ctx.params.get(Param::Start) {
        None => None,
        Some("") => {
            checks.error(Param::Start, "st is empty");
            None
        }
        Some(st) => match parse_sas_timestamp(st) {
            Err(err) => {
                checks.error(Param::Start, err.to_string());
                None
            }
            Ok(t) if t > ctx.now => {
                checks.error(
                    Param::Start,
                    format!("not valid before {}", time::format_rfc3339(t)),
                );
                Some(t)
            }
            Ok(t) => {
                checks.ok(Param::Start, format!("valid from {}", time::format_rfc3339(t)));
                Some(t)
            }
        },
    };

    if let (Some(start), Some(expiry)) = (start, expiry) {
        if start > expiry {
            let message = "st is after se";
            checks.error(Param::Start, message);
            checks.error(Param::Expiry, message);
            return;
        }
    }

    if ctx.sv < VERSION_2012_02_12 && !ctx.params.is_present(Param::Identifier) {
        if let Some(expiry) = expiry {
            let start = start.unwrap_or(ctx.now);
            if expiry - start > TimeDelta::hours(1) {
                checks.error(
                    Param::Expiry,
                    format!(
                        "versions before {VERSION_2012_02_12} without a stored policy allow at most one hour between st and se"
                    ),
                );
            }
        }
    }
}

fn check_ip(ctx: &Context, checks: &mut Checks) {
    let Some(sip) = ctx.params.get(Param::Ip) else {
        checks.ok(Param::Ip, "all addresses allowed");
        return;
    };
    if sip.is_empty() {
        checks.error(Param::Ip, "sip is empty");
        return;
    }
    if ctx.is_service() && ctx.sv < VERSION_2015_04_05 {
        checks.error(
            Param::Ip,
            format!("sip requires sv {VERSION_2015_04_05} or later for a service SAS"),
        );
        return;
    }

    let malformed = sip.starts_with(['-', '.'])
        || sip.ends_with(['-', '.'])
        || ["--", "..", "-.", ".-"].iter().any(|s| sip.contains(s));
    if malformed {
        checks.error(
            Param::Ip,
            format!("{sip:?} has a leading, trailing or doubled separator"),
        );
        return;
    }

    match parse_ip_range(sip) {
        Ok(range) if range.is_range() => {
            checks.ok(Param::Ip, format!("allows addresses {range}"));
        }
        Ok(range) => checks.ok(Param::Ip, format!("allows address {range}")),
        Err(err) => checks.error(Param::Ip, err.to_string()),
    }
}

fn check_protocol(ctx: &Context, checks: &mut Checks) {
    let Some(spr) = ctx.params.get(Param::Protocol) else {
        checks.ok(Param::Protocol, "HTTPS and HTTP allowed");
        return;
    };
    if ctx.is_service() && ctx.sv < VERSION_2015_04_05 {
        checks.error(
            Param::Protocol,
            format!("spr requires sv {VERSION_2015_04_05} or later for a service SAS"),
        );
        return;
    }

    match spr {
        "https" => checks.ok(Param::Protocol, "HTTPS only"),
        "https,http" | "http,https" => checks.ok(Param::Protocol, "HTTPS and HTTP allowed"),
        "http" => checks.error(Param::Protocol, "HTTP only is never allowed"),
        "" => checks.error(Param::Protocol, "spr is empty"),
        _ => checks.error(
            Param::Protocol,
            format!("unknown protocol {spr:?}, expected https or https,http"),
        ),
    }
}

fn check_identifier(ctx: &Context, checks: &mut Checks) {
    let Some(si) = ctx.params.get(Param::Identifier) else {
        return;
    };
    if ctx.is_account() {
        checks.error(Param::Identifier, "si is only valid for a service SAS");
    } else if si.is_empty() {
        checks.error(Param::Identifier, "si is empty");
    } else if si.chars().count() > POLICY_ID_MAX_LEN {
        checks.error(
            Param::Identifier,
            format!("si is longer than {POLICY_ID_MAX_LEN} characters"),
        );
    } else {
        checks.ok(Param::Identifier, format!("uses stored access policy {si}"));
    }
}

fn check_table_keys(ctx: &Context, checks: &mut Checks) {
    let pairs = [
        (Param::StartPartitionKey, Param::EndPartitionKey, "partition"),
        (Param::StartRowKey, Param::EndRowKey, "row"),
    ];
    let has_table = ctx.params.is_present(Param::TableName);

    for (start, end, what) in pairs {
        let (from, to) = (ctx.params.get(start), ctx.params.get(end));
        if from.is_none() && to.is_none() {
            continue;
        }

        for param in [start, end] {
            match ctx.params.get(param) {
                Some(_) if !has_table => {
                    checks.error(param, format!("{param} is only valid with tn"));
                }
                Some("") => checks.error(param, format!("{param} is empty")),
                _ => {}
            }
        }
        let (Some(from), Some(to)) = (from, to) else {
            let message = format!("{start} and {end} must be given together");
            checks.error(start, message.as_str());
            checks.error(end, message);
            continue;
        };
        checks.ok(start, format!("{what} keys from {from}"));
        checks.ok(end, format!("{what} keys up to {to}"));
    }
}

fn check_informational(ctx: &Context, checks: &mut Checks) {
    if let Some(v) = ctx.params.get(Param::ApiVersion) {
        checks.ok(Param::ApiVersion, format!("request api-version {v}"));
    }

    if let Some(v) = ctx.params.get(Param::Snapshot) {
        if ctx.params.get(Param::Resource) == Some("bs") {
            checks.ok(Param::Snapshot, format!("grants access to snapshot {v}"));
        } else {
            checks.ok(Param::Snapshot, "snapshot time is only meaningful with sr=bs");
        }
    }

    let headers = [
        (Param::CacheControl, "Cache-Control"),
        (Param::ContentDisposition, "Content-Disposition"),
        (Param::ContentEncoding, "Content-Encoding"),
        (Param::ContentLanguage, "Content-Language"),
        (Param::ContentType, "Content-Type"),
    ];
    for (param, header) in headers {
        if let Some(v) = ctx.params.get(param) {
            checks.ok(param, format!("responses carry {header}: {v}"));
        }
    }
}

fn check_signature(ctx: &Context, checks: &mut Checks) {
    match ctx.params.get(Param::Signature) {
        None => checks.error(Param::Signature, "sig is required"),
        Some("") => checks.error(Param::Signature, "sig is empty"),
        Some(_) => checks.ok(Param::Signature, "signature present, not verified"),
    }
}

fn check_derived(ctx: &Context, checks: &mut Checks) {
    for param in Param::ALL.into_iter().filter(Param::is_derived) {
        let field = ctx.params.field(param);
        let Some(value) = field.as_deref() else {
            continue;
        };

        if field.valid {
            checks.ok(param, format!("{param} {value}"));
            continue;
        }
        let message = match param {
            Param::Account => "endpoints name different storage accounts".to_string(),
            Param::Blob | Param::File => format!("endpoint names a folder, not a {param}"),
            _ => format!("{param} {value:?} cannot be used"),
        };
        checks.error(param, message);
    }
}
