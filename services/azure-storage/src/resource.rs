use std::fmt;

use serde::Serialize;

/// Storage service a resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    /// Blob service.
    Blob,
    /// File service.
    File,
    /// Table service.
    Table,
    /// Queue service.
    Queue,
}

impl Service {
    /// All services, in the order endpoints are consulted.
    pub const ALL: [Service; 4] = [Service::Blob, Service::File, Service::Table, Service::Queue];

    /// Name used in canonical resource paths and endpoint host names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Blob => "blob",
            Service::File => "file",
            Service::Table => "table",
            Service::Queue => "queue",
        }
    }

    /// Connection string key, including the trailing `=`.
    pub fn endpoint_key(&self) -> &'static str {
        match self {
            Service::Blob => crate::constants::BLOB_ENDPOINT,
            Service::File => crate::constants::FILE_ENDPOINT,
            Service::Table => crate::constants::TABLE_ENDPOINT,
            Service::Queue => crate::constants::QUEUE_ENDPOINT,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource a service SAS grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    /// `sr=b`
    Blob,
    /// `sr=c`
    Container,
    /// `sr=bs`
    BlobSnapshot,
    /// `sr=s`
    Share,
    /// `sr=f`
    File,
    /// Selected by `tn`.
    Table,
    /// No selector field; inferred from a queue endpoint or declared by the caller.
    Queue,
}

impl ResourceKind {
    /// Parse the value of `sr`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "b" => Some(ResourceKind::Blob),
            "c" => Some(ResourceKind::Container),
            "bs" => Some(ResourceKind::BlobSnapshot),
            "s" => Some(ResourceKind::Share),
            "f" => Some(ResourceKind::File),
            _ => None,
        }
    }

    /// The `sr` value, if this kind is selected through `sr`.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Blob => Some("b"),
            ResourceKind::Container => Some("c"),
            ResourceKind::BlobSnapshot => Some("bs"),
            ResourceKind::Share => Some("s"),
            ResourceKind::File => Some("f"),
            ResourceKind::Table | ResourceKind::Queue => None,
        }
    }

    /// The service hosting this resource.
    pub fn service(&self) -> Service {
        match self {
            ResourceKind::Blob | ResourceKind::Container | ResourceKind::BlobSnapshot => {
                Service::Blob
            }
            ResourceKind::Share | ResourceKind::File => Service::File,
            ResourceKind::Table => Service::Table,
            ResourceKind::Queue => Service::Queue,
        }
    }

    /// Permission letters this resource accepts.
    pub fn permission_alphabet(&self) -> &'static str {
        match self {
            ResourceKind::Blob => "rwdac",
            ResourceKind::Container => "rwdacl",
            ResourceKind::BlobSnapshot => "rwdacup",
            ResourceKind::Share => "rwdlc",
            ResourceKind::File => "rwdc",
            ResourceKind::Table => "raud",
            ResourceKind::Queue => "raup",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Blob => "blob",
            ResourceKind::Container => "container",
            ResourceKind::BlobSnapshot => "blob snapshot",
            ResourceKind::Share => "share",
            ResourceKind::File => "file",
            ResourceKind::Table => "table",
            ResourceKind::Queue => "queue",
        };
        f.write_str(name)
    }
}

/// Account or service SAS, derived from which selector fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SasKind {
    /// Selected by `srt`.
    Account,
    /// Selected by `sr`, `tn`, or a queue resolution.
    Service(ResourceKind),
}

impl SasKind {
    /// Permission letters accepted by this kind of SAS.
    pub fn permission_alphabet(&self) -> &'static str {
        match self {
            SasKind::Account => "rwdlacup",
            SasKind::Service(kind) => kind.permission_alphabet(),
        }
    }

    /// Returns true for any service SAS.
    pub fn is_service(&self) -> bool {
        matches!(self, SasKind::Service(_))
    }
}

impl fmt::Display for SasKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SasKind::Account => f.write_str("account SAS"),
            SasKind::Service(kind) => write!(f, "{kind} service SAS"),
        }
    }
}
