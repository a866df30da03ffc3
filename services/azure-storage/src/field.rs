use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde::Serializer;

use crate::resource::ResourceKind;
use crate::resource::SasKind;
use crate::resource::Service;

/// Every named parameter a [`ParameterSet`] carries.
///
/// Declaration order is the order fields are stored and reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Param {
    /// `sv`
    Version,
    /// `ss`
    Services,
    /// `srt`
    ResourceTypes,
    /// `sr`
    Resource,
    /// `tn`
    TableName,
    /// `sp`
    Permissions,
    /// `st`
    Start,
    /// `se`
    Expiry,
    /// `sip`
    Ip,
    /// `spr`
    Protocol,
    /// `si`
    Identifier,
    /// `spk`
    StartPartitionKey,
    /// `epk`
    EndPartitionKey,
    /// `srk`
    StartRowKey,
    /// `erk`
    EndRowKey,
    /// `snapshot`
    Snapshot,
    /// `rscc`
    CacheControl,
    /// `rscd`
    ContentDisposition,
    /// `rsce`
    ContentEncoding,
    /// `rscl`
    ContentLanguage,
    /// `rsct`
    ContentType,
    /// `api-version`
    ApiVersion,
    /// `sig`
    Signature,
    /// Storage account, resolved from endpoints.
    Account,
    /// Blob container, resolved from the blob endpoint.
    Container,
    /// Blob name, resolved from the blob endpoint.
    Blob,
    /// File share, resolved from the file endpoint.
    Share,
    /// File name, resolved from the file endpoint.
    File,
    /// Table, resolved from the table endpoint.
    Table,
    /// Queue, resolved from the queue endpoint.
    Queue,
}

impl Param {
    /// All params, in declaration order.
    pub const ALL: [Param; 30] = [
        Param::Version,
        Param::Services,
        Param::ResourceTypes,
        Param::Resource,
        Param::TableName,
        Param::Permissions,
        Param::Start,
        Param::Expiry,
        Param::Ip,
        Param::Protocol,
        Param::Identifier,
        Param::StartPartitionKey,
        Param::EndPartitionKey,
        Param::StartRowKey,
        Param::EndRowKey,
        Param::Snapshot,
        Param::CacheControl,
        Param::ContentDisposition,
        Param::ContentEncoding,
        Param::ContentLanguage,
        Param::ContentType,
        Param::ApiVersion,
        Param::Signature,
        Param::Account,
        Param::Container,
        Param::Blob,
        Param::Share,
        Param::File,
        Param::Table,
        Param::Queue,
    ];

    /// Query key, or a descriptive name for derived params.
    pub fn key(&self) -> &'static str {
        match self {
            Param::Version => "sv",
            Param::Services => "ss",
            Param::ResourceTypes => "srt",
            Param::Resource => "sr",
            Param::TableName => "tn",
            Param::Permissions => "sp",
            Param::Start => "st",
            Param::Expiry => "se",
            Param::Ip => "sip",
            Param::Protocol => "spr",
            Param::Identifier => "si",
            Param::StartPartitionKey => "spk",
            Param::EndPartitionKey => "epk",
            Param::StartRowKey => "srk",
            Param::EndRowKey => "erk",
            Param::Snapshot => "snapshot",
            Param::CacheControl => "rscc",
            Param::ContentDisposition => "rscd",
            Param::ContentEncoding => "rsce",
            Param::ContentLanguage => "rscl",
            Param::ContentType => "rsct",
            Param::ApiVersion => "api-version",
            Param::Signature => "sig",
            Param::Account => "account",
            Param::Container => "container",
            Param::Blob => "blob",
            Param::Share => "share",
            Param::File => "file",
            Param::Table => "table",
            Param::Queue => "queue",
        }
    }

    /// Look up a param by the key it carries inside a token.
    ///
    /// Derived params never appear in a token and are not matched.
    pub fn from_token_key(key: &str) -> Option<Param> {
        Param::ALL
            .iter()
            .copied()
            .find(|p| !p.is_derived() && p.key() == key)
    }

    /// Returns true for params resolved from endpoints rather than lexed from the token.
    pub fn is_derived(&self) -> bool {
        matches!(
            self,
            Param::Account
                | Param::Container
                | Param::Blob
                | Param::Share
                | Param::File
                | Param::Table
                | Param::Queue
        )
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Param {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// A single named parameter.
///
/// `value: None` means the parameter was not supplied at all, `Some("")`
/// means it was supplied empty. Validation decides what either means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Raw (decoded) value.
    pub value: Option<String>,
    /// Cleared by the validator or resolver when the value is unusable.
    pub valid: bool,
}

static ABSENT: Field = Field::absent();

impl Field {
    /// A field that was not supplied.
    pub const fn absent() -> Self {
        Self {
            value: None,
            valid: true,
        }
    }

    /// A supplied field.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            valid: true,
        }
    }

    /// Whether the field was supplied, even if empty.
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// The value, if supplied.
    pub fn as_deref(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl Default for Field {
    fn default() -> Self {
        Self::absent()
    }
}

/// Raw endpoint URLs, as found in a connection string or recovered from a bare token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Endpoints {
    /// `BlobEndpoint`
    pub blob: Option<String>,
    /// `FileEndpoint`
    pub file: Option<String>,
    /// `TableEndpoint`
    pub table: Option<String>,
    /// `QueueEndpoint`
    pub queue: Option<String>,
}

impl Endpoints {
    /// Endpoint for `service`.
    pub fn get(&self, service: Service) -> Option<&str> {
        match service {
            Service::Blob => self.blob.as_deref(),
            Service::File => self.file.as_deref(),
            Service::Table => self.table.as_deref(),
            Service::Queue => self.queue.as_deref(),
        }
    }

    /// Set the endpoint for `service`.
    pub fn set(&mut self, service: Service, url: impl Into<String>) {
        let slot = match service {
            Service::Blob => &mut self.blob,
            Service::File => &mut self.file,
            Service::Table => &mut self.table,
            Service::Queue => &mut self.queue,
        };
        *slot = Some(url.into());
    }

    /// Present endpoints, in [`Service::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Service, &str)> {
        Service::ALL
            .into_iter()
            .filter_map(move |s| self.get(s).map(|url| (s, url)))
    }

    /// Whether no endpoint is present.
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// All fields of one SAS token, plus the endpoints it was found with.
///
/// A `ParameterSet` lives for exactly one request: built by the lexer or by
/// the caller, passed through validation and/or signing, then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSet {
    fields: BTreeMap<Param, Field>,
    endpoints: Endpoints,
    token_only: bool,
    queue_resource: bool,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSet {
    /// Create an empty parameter set with every field absent.
    pub fn new() -> Self {
        Self {
            fields: Param::ALL.iter().map(|p| (*p, Field::absent())).collect(),
            endpoints: Endpoints::default(),
            token_only: true,
            queue_resource: false,
        }
    }

    /// Builder style [`ParameterSet::set`].
    pub fn with(mut self, param: Param, value: impl Into<String>) -> Self {
        self.set(param, value);
        self
    }

    /// Builder style [`ParameterSet::set_endpoint`].
    pub fn with_endpoint(mut self, service: Service, url: impl Into<String>) -> Self {
        self.set_endpoint(service, url);
        self
    }

    /// Declare this set a queue service SAS.
    ///
    /// A queue SAS has no selector field, so without a queue endpoint the
    /// caller has to say so explicitly.
    pub fn with_queue_resource(mut self) -> Self {
        self.queue_resource = true;
        self
    }

    /// Supply `param`, overwriting any previous value and resetting its validity.
    pub fn set(&mut self, param: Param, value: impl Into<String>) -> &mut Self {
        self.fields.insert(param, Field::new(value));
        self
    }

    /// Mark `param` absent.
    pub fn remove(&mut self, param: Param) -> &mut Self {
        self.fields.insert(param, Field::absent());
        self
    }

    /// Record a raw endpoint URL.
    ///
    /// The set is no longer token-only once an endpoint is known.
    pub fn set_endpoint(&mut self, service: Service, url: impl Into<String>) -> &mut Self {
        self.endpoints.set(service, url);
        self.token_only = false;
        self
    }

    pub(crate) fn set_token_only(&mut self, token_only: bool) {
        self.token_only = token_only;
    }

    /// The field for `param`.
    pub fn field(&self, param: Param) -> &Field {
        self.fields.get(&param).unwrap_or(&ABSENT)
    }

    /// The value of `param`, if supplied.
    pub fn get(&self, param: Param) -> Option<&str> {
        self.field(param).as_deref()
    }

    /// The value of `param` if supplied and non-empty.
    pub fn get_non_empty(&self, param: Param) -> Option<&str> {
        self.get(param).filter(|v| !v.is_empty())
    }

    /// Whether `param` was supplied, even if empty.
    pub fn is_present(&self, param: Param) -> bool {
        self.field(param).is_present()
    }

    /// Whether `param` is still considered valid.
    pub fn is_valid(&self, param: Param) -> bool {
        self.field(param).valid
    }

    /// Clear the validity flag of `param`.
    pub fn invalidate(&mut self, param: Param) {
        if let Some(field) = self.fields.get_mut(&param) {
            field.valid = false;
        }
    }

    /// Iterate fields in [`Param`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Param, &Field)> {
        self.fields.iter().map(|(p, f)| (*p, f))
    }

    /// Raw endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// True when no connection-string endpoint accompanied the token.
    pub fn token_only(&self) -> bool {
        self.token_only
    }

    /// Resolved storage account name.
    pub fn account_name(&self) -> Option<&str> {
        self.get_non_empty(Param::Account)
    }

    /// Number of `srt`, `sr`, `tn` present.
    pub(crate) fn selector_count(&self) -> usize {
        [Param::ResourceTypes, Param::Resource, Param::TableName]
            .iter()
            .filter(|p| self.is_present(**p))
            .count()
    }

    /// Whether this set is a queue SAS: no selector, and a queue endpoint or
    /// an explicit declaration.
    pub fn is_queue_resource(&self) -> bool {
        self.selector_count() == 0 && (self.queue_resource || self.endpoints.queue.is_some())
    }

    /// Derive the kind of SAS from the selector fields.
    ///
    /// Returns `None` when the selectors contradict each other, are all
    /// missing (outside the queue case), or `sr` carries an unknown code.
    pub fn sas_kind(&self) -> Option<SasKind> {
        if self.is_queue_resource() {
            return Some(SasKind::Service(ResourceKind::Queue));
        }
        if self.selector_count() != 1 {
            return None;
        }

        if self.is_present(Param::ResourceTypes) {
            Some(SasKind::Account)
        } else if self.is_present(Param::TableName) {
            Some(SasKind::Service(ResourceKind::Table))
        } else {
            self.get(Param::Resource)
                .and_then(ResourceKind::from_code)
                .map(SasKind::Service)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let params = ParameterSet::new().with(Param::Identifier, "");
        assert!(params.is_present(Param::Identifier));
        assert_eq!(params.get(Param::Identifier), Some(""));
        assert_eq!(params.get_non_empty(Param::Identifier), None);

        assert!(!params.is_present(Param::Start));
        assert_eq!(params.get(Param::Start), None);
    }

    #[test]
    fn test_token_keys() {
        assert_eq!(Param::from_token_key("sv"), Some(Param::Version));
        assert_eq!(Param::from_token_key("api-version"), Some(Param::ApiVersion));
        assert_eq!(Param::from_token_key("rsct"), Some(Param::ContentType));
        assert_eq!(Param::from_token_key("account"), None);
        assert_eq!(Param::from_token_key("SV"), None);
    }

    #[test]
    fn test_iter_is_ordered() {
        let params = ParameterSet::new();
        let order: Vec<Param> = params.iter().map(|(p, _)| p).collect();
        assert_eq!(order, Param::ALL.to_vec());
    }

    #[test]
    fn test_sas_kind() {
        let account = ParameterSet::new().with(Param::ResourceTypes, "sco");
        assert_eq!(account.sas_kind(), Some(SasKind::Account));

        let snapshot = ParameterSet::new().with(Param::Resource, "bs");
        assert_eq!(
            snapshot.sas_kind(),
            Some(SasKind::Service(ResourceKind::BlobSnapshot))
        );

        let table = ParameterSet::new().with(Param::TableName, "orders");
        assert_eq!(table.sas_kind(), Some(SasKind::Service(ResourceKind::Table)));

        let both = ParameterSet::new()
            .with(Param::ResourceTypes, "s")
            .with(Param::Resource, "b");
        assert_eq!(both.sas_kind(), None);

        let unknown = ParameterSet::new().with(Param::Resource, "q");
        assert_eq!(unknown.sas_kind(), None);

        assert_eq!(ParameterSet::new().sas_kind(), None);
    }

    #[test]
    fn test_queue_resolution() {
        let declared = ParameterSet::new().with_queue_resource();
        assert_eq!(
            declared.sas_kind(),
            Some(SasKind::Service(ResourceKind::Queue))
        );

        let endpoint = ParameterSet::new()
            .with_endpoint(Service::Queue, "https://acct.queue.core.windows.net/jobs");
        assert!(!endpoint.token_only());
        assert_eq!(
            endpoint.sas_kind(),
            Some(SasKind::Service(ResourceKind::Queue))
        );

        // A selector always wins over the queue inference.
        let blob = endpoint.with(Param::Resource, "b");
        assert_eq!(blob.sas_kind(), Some(SasKind::Service(ResourceKind::Blob)));
    }

    #[test]
    fn test_invalidate() {
        let mut params = ParameterSet::new().with(Param::Permissions, "rw");
        assert!(params.is_valid(Param::Permissions));
        params.invalidate(Param::Permissions);
        assert!(!params.is_valid(Param::Permissions));
        params.set(Param::Permissions, "r");
        assert!(params.is_valid(Param::Permissions));
    }
}
