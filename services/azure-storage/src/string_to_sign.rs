//! Canonical resource paths and version-specific strings-to-sign.
//!
//! The layout of the string-to-sign changed several times over the
//! service's history. Each layout is a fixed list of [`Slot`]s; which one
//! applies is looked up by `(Era, ResourceKind)`.
//!
//! ## Reference
//!
//! - [Create a service SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-service-sas#version-2018-11-09-and-later)
//! - [Create an account SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-account-sas#construct-the-signature-string)

use log::debug;
use saskit_core::Error;
use saskit_core::Result;

use crate::constants::*;
use crate::field::Param;
use crate::field::ParameterSet;
use crate::permission::canonicalize_permissions;
use crate::resource::ResourceKind;
use crate::resource::SasKind;

/// Protocol versions that share one string-to-sign layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Era {
    /// Before 2012-02-12: no version line at all.
    Legacy,
    /// Exactly 2012-02-12.
    V2012_02_12,
    /// 2013-08-15 up to, but not including, 2015-02-21.
    V2013_08_15,
    /// Exactly 2015-02-21, the first version with file SAS.
    V2015_02_21,
    /// 2015-04-05 onwards: `sip` and `spr` are signed.
    V2015_04_05,
    /// 2018-11-09 onwards: `sr` and the snapshot time are signed.
    V2018_11_09,
}

impl Era {
    /// Era of `sv`. An empty version is the legacy era.
    ///
    /// Returns `None` for versions between 2012-02-12 and 2013-08-15,
    /// which were never released.
    pub fn from_version(sv: &str) -> Option<Era> {
        if sv >= VERSION_2018_11_09 {
            Some(Era::V2018_11_09)
        } else if sv >= VERSION_2015_04_05 {
            Some(Era::V2015_04_05)
        } else if sv == VERSION_2015_02_21 {
            Some(Era::V2015_02_21)
        } else if sv >= VERSION_2013_08_15 {
            Some(Era::V2013_08_15)
        } else if sv == VERSION_2012_02_12 {
            Some(Era::V2012_02_12)
        } else if sv < VERSION_2012_02_12 {
            Some(Era::Legacy)
        } else {
            None
        }
    }
}

/// One line of a string-to-sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Value of a parameter, empty when absent. `sp` is canonicalized for service SAS.
    Param(Param),
    /// The canonical resource path.
    CanonicalResource,
    /// The storage account name.
    AccountName,
}

use Slot::CanonicalResource;
use Slot::Param as P;

const RESPONSE_HEADERS: [Slot; 5] = [
    P(Param::CacheControl),
    P(Param::ContentDisposition),
    P(Param::ContentEncoding),
    P(Param::ContentLanguage),
    P(Param::ContentType),
];

const BLOB_2018_11_09: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Ip),
    P(Param::Protocol),
    P(Param::Version),
    P(Param::Resource),
    P(Param::Snapshot),
    RESPONSE_HEADERS[0],
    RESPONSE_HEADERS[1],
    RESPONSE_HEADERS[2],
    RESPONSE_HEADERS[3],
    RESPONSE_HEADERS[4],
];

const BLOB_2015_04_05: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Ip),
    P(Param::Protocol),
    P(Param::Version),
    RESPONSE_HEADERS[0],
    RESPONSE_HEADERS[1],
    RESPONSE_HEADERS[2],
    RESPONSE_HEADERS[3],
    RESPONSE_HEADERS[4],
];

const TABLE_2015_04_05: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Ip),
    P(Param::Protocol),
    P(Param::Version),
    P(Param::StartPartitionKey),
    P(Param::StartRowKey),
    P(Param::EndPartitionKey),
    P(Param::EndRowKey),
];

const QUEUE_2015_04_05: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Ip),
    P(Param::Protocol),
    P(Param::Version),
];

const BLOB_2013_08_15: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Version),
    RESPONSE_HEADERS[0],
    RESPONSE_HEADERS[1],
    RESPONSE_HEADERS[2],
    RESPONSE_HEADERS[3],
    RESPONSE_HEADERS[4],
];

const TABLE_2013_08_15: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Version),
    P(Param::StartPartitionKey),
    P(Param::StartRowKey),
    P(Param::EndPartitionKey),
    P(Param::EndRowKey),
];

const QUEUE_2013_08_15: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Version),
];

const BLOB_2012_02_12: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
    P(Param::Version),
];

const BLOB_LEGACY: &[Slot] = &[
    P(Param::Permissions),
    P(Param::Start),
    P(Param::Expiry),
    CanonicalResource,
    P(Param::Identifier),
];

/// Account SAS layout; every line, the last included, ends with `\n`.
pub const ACCOUNT: &[Slot] = &[
    Slot::AccountName,
    P(Param::Permissions),
    P(Param::Services),
    P(Param::ResourceTypes),
    P(Param::Start),
    P(Param::Expiry),
    P(Param::Ip),
    P(Param::Protocol),
    P(Param::Version),
];

/// Service SAS layout for `kind` in `era`, or `None` when the service had none.
pub fn template(era: Era, kind: ResourceKind) -> Option<&'static [Slot]> {
    use ResourceKind::*;

    match (era, kind) {
        (Era::V2018_11_09, Blob | Container | BlobSnapshot | Share | File) => Some(BLOB_2018_11_09),
        (Era::V2018_11_09 | Era::V2015_04_05, Table) => Some(TABLE_2015_04_05),
        (Era::V2018_11_09 | Era::V2015_04_05, Queue) => Some(QUEUE_2015_04_05),
        (Era::V2015_04_05, Blob | Container | Share | File) => Some(BLOB_2015_04_05),
        (Era::V2015_02_21, Blob | Container | Share | File) => Some(BLOB_2013_08_15),
        (Era::V2013_08_15, Blob | Container) => Some(BLOB_2013_08_15),
        (Era::V2015_02_21 | Era::V2013_08_15, Table) => Some(TABLE_2013_08_15),
        (Era::V2015_02_21 | Era::V2013_08_15, Queue) => Some(QUEUE_2013_08_15),
        (Era::V2012_02_12, Blob | Container) => Some(BLOB_2012_02_12),
        (Era::Legacy, Blob | Container) => Some(BLOB_LEGACY),
        _ => None,
    }
}

/// Build the canonical resource path of a service SAS.
///
/// From 2015-02-21 the path starts with `/<service>`. Before that, blob and
/// container paths start directly with the account while the other
/// services keep their prefix.
pub fn canonical_resource(params: &ParameterSet, kind: ResourceKind) -> Result<String> {
    let sv = params.get(Param::Version).unwrap_or_default();
    let account = required(params, Param::Account, kind)?;

    let mut path = String::with_capacity(64);
    let blob_family = matches!(
        kind,
        ResourceKind::Blob | ResourceKind::Container | ResourceKind::BlobSnapshot
    );
    if sv >= VERSION_2015_02_21 || !blob_family {
        path.push('/');
        path.push_str(kind.service().as_str());
    }
    path.push('/');
    path.push_str(account);

    let segments: &[Param] = match kind {
        ResourceKind::Blob | ResourceKind::BlobSnapshot => &[Param::Container, Param::Blob],
        ResourceKind::Container => &[Param::Container],
        ResourceKind::Share => &[Param::Share],
        ResourceKind::File => &[Param::Share, Param::File],
        ResourceKind::Table => &[Param::Table],
        ResourceKind::Queue => &[Param::Queue],
    };
    for param in segments {
        let segment = if *param == Param::Table {
            // The signed table name wins over the one found in the endpoint.
            match params.get(Param::TableName).map(str::trim) {
                Some(tn) if !tn.is_empty() => tn,
                _ => required(params, Param::Table, kind)?,
            }
        } else {
            required(params, *param, kind)?
        };
        path.push('/');
        path.push_str(segment);
    }

    Ok(path)
}

fn required(params: &ParameterSet, param: Param, kind: ResourceKind) -> Result<&str> {
    let value = params.get(param).map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(Error::request_invalid(format!(
            "{param} name is required to sign a {kind} service SAS"
        )));
    }
    if !params.is_valid(param) {
        return Err(Error::request_invalid(format!(
            "{param} name {value:?} cannot be signed"
        )));
    }
    Ok(value)
}

/// A string-to-sign together with the canonical path it embeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToSign {
    /// Canonical resource path, for service SAS only.
    pub canonical_resource: Option<String>,
    /// The exact bytes to sign.
    pub value: String,
}

/// Build the string-to-sign of `params` for `kind`.
pub fn build(params: &ParameterSet, kind: SasKind) -> Result<StringToSign> {
    match kind {
        SasKind::Account => {
            let account = params.account_name().map(str::trim).unwrap_or_default();
            if account.is_empty() {
                return Err(Error::request_invalid(
                    "account name is required to sign an account SAS",
                ));
            }

            let mut s = String::with_capacity(128);
            for slot in ACCOUNT {
                let line = match slot {
                    Slot::AccountName => account,
                    Slot::Param(p) => params.get(*p).unwrap_or_default(),
                    Slot::CanonicalResource => "",
                };
                s.push_str(line);
                s.push('\n');
            }

            debug!("string to sign: {:?}", &s);
            Ok(StringToSign {
                canonical_resource: None,
                value: s,
            })
        }
        SasKind::Service(resource) => {
            let sv = params.get(Param::Version).unwrap_or_default();
            let Some(slots) = Era::from_version(sv).and_then(|era| template(era, resource)) else {
                return Err(Error::unsupported(format!(
                    "version {sv:?} has no signing format for a {resource} service SAS"
                )));
            };

            let canonical = canonical_resource(params, resource)?;
            debug!("canonical resource: {canonical}");

            let permissions =
                canonicalize_permissions(params.get(Param::Permissions).unwrap_or_default());
            let lines: Vec<&str> = slots
                .iter()
                .map(|slot| match slot {
                    Slot::Param(Param::Permissions) => permissions.as_str(),
                    Slot::Param(p) => params.get(*p).unwrap_or_default(),
                    Slot::CanonicalResource => canonical.as_str(),
                    Slot::AccountName => params.account_name().unwrap_or_default(),
                })
                .collect();
            let s = lines.join("\n");

            debug!("string to sign: {:?}", &s);
            Ok(StringToSign {
                canonical_resource: Some(canonical),
                value: s,
            })
        }
    }
}
