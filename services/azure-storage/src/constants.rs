use percent_encoding::AsciiSet;
use percent_encoding::NON_ALPHANUMERIC;

// Connection string keys.
pub const SHARED_ACCESS_SIGNATURE: &str = "SharedAccessSignature";
pub const BLOB_ENDPOINT: &str = "BlobEndpoint=";
pub const FILE_ENDPOINT: &str = "FileEndpoint=";
pub const TABLE_ENDPOINT: &str = "TableEndpoint=";
pub const QUEUE_ENDPOINT: &str = "QueueEndpoint=";

// Versions that gate features or signing formats.
pub const VERSION_2012_02_12: &str = "2012-02-12";
pub const VERSION_2013_08_15: &str = "2013-08-15";
pub const VERSION_2015_02_21: &str = "2015-02-21";
pub const VERSION_2015_04_05: &str = "2015-04-05";
pub const VERSION_2018_11_09: &str = "2018-11-09";

/// Version used for freshly built parameter sets when nothing else is configured.
pub const DEFAULT_VERSION: &str = "2019-02-02";

/// Versions accepted for an account SAS.
///
/// The catalog stops before 2020-12-06, which added the encryption scope
/// to every string-to-sign.
pub const ACCOUNT_SAS_VERSIONS: &[&str] = &[
    "2015-04-05",
    "2015-07-08",
    "2015-12-11",
    "2016-05-31",
    "2017-04-17",
    "2017-07-29",
    "2017-11-09",
    "2018-03-28",
    "2018-11-09",
    "2019-02-02",
    "2019-07-07",
    "2019-10-10",
    "2019-12-12",
    "2020-02-10",
    "2020-04-08",
    "2020-06-12",
    "2020-08-04",
    "2020-10-02",
];

/// Versions only a service SAS may carry, on top of [`ACCOUNT_SAS_VERSIONS`].
pub const SERVICE_SAS_ONLY_VERSIONS: &[&str] =
    &["2012-02-12", "2013-08-15", "2014-02-14", "2015-02-21"];

// Alphabets.
pub const SIGNED_SERVICES: &str = "bfqt";
pub const SIGNED_RESOURCE_TYPES: &str = "sco";
pub const TABLE_NAME_MAX_LEN: usize = 63;
pub const POLICY_ID_MAX_LEN: usize = 64;

/// Characters left as is when a token value is escaped.
///
/// Everything outside the RFC 3986 unreserved set is percent encoded, so a
/// space becomes `%20` and a literal `+` becomes `%2B`.
pub static SAS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
