use chrono::TimeZone;
use chrono::Utc;
use pretty_assertions::assert_eq;
use saskit_azure_storage::parse_and_validate;
use saskit_azure_storage::parse_and_validate_with;
use saskit_azure_storage::regenerate_with;
use saskit_azure_storage::Config;
use saskit_azure_storage::LexError;
use saskit_azure_storage::Param;
use saskit_azure_storage::ParameterSet;
use saskit_azure_storage::ResourceKind;
use saskit_azure_storage::SasKind;
use saskit_azure_storage::SasSigner;
use saskit_azure_storage::Validator;
use saskit_core::ErrorKind;
use saskit_core::SignToken;
use test_case::test_case;

use crate::init_logger;
use crate::TEST_KEY;

fn validator() -> Validator {
    Validator::new().with_time(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

#[test]
fn test_expired_blob_token() {
    init_logger();

    let raw = "https://acct.blob.core.windows.net/c/b.txt\
               ?sv=2015-04-05&sr=b&sp=rw&se=2020-01-01T00%3A00%3A00Z&sig=c2ln";
    let inspection = parse_and_validate(raw).unwrap();

    let expiry = inspection.report.get(Param::Expiry).unwrap();
    assert!(!expiry.ok);
    assert!(expiry.message.contains("already expired"), "{expiry}");
    assert!(!inspection.params.is_valid(Param::Expiry));
    assert_eq!(inspection.report.errors().count(), 1, "{}", inspection.report);
}

#[test]
fn test_account_sas_inspect_and_sign() {
    init_logger();

    let raw = "BlobEndpoint=https://acct.blob.core.windows.net;\
               SharedAccessSignature=sv=2019-02-02&ss=b&srt=sco&sp=rl&se=2030-01-01T00%3A00%3A00Z&spr=https&sig=c2ln";
    let inspection = parse_and_validate_with(&validator(), raw).unwrap();

    assert!(inspection.is_valid(), "{}", inspection.report);
    assert_eq!(inspection.params.sas_kind(), Some(SasKind::Account));
    assert_eq!(
        inspection.report.get(Param::Permissions).unwrap().message,
        "grants read, list"
    );

    let signed = regenerate_with(&validator(), &SasSigner::new(), &inspection.params, TEST_KEY)
        .unwrap();
    assert_eq!(
        signed.token(),
        "sv=2019-02-02&ss=b&srt=sco&se=2030-01-01T00%3A00%3A00Z&sp=rl&spr=https&sig=olTyZp5nmAsZ%2BtKyUxUF4CW9nW9%2BszyD1ngvAmNQ1cY%3D"
    );
}

#[test]
fn test_connection_string_resolution() {
    init_logger();

    let raw = "BlobEndpoint=https://acct.blob.core.windows.net/mycontainer/myblob.txt;\
               SharedAccessSignature=sv=2015-04-05&sr=b&sp=r&se=2030-01-01&sig=c2ln;";
    let inspection = parse_and_validate_with(&validator(), raw).unwrap();

    assert!(inspection.is_valid(), "{}", inspection.report);
    assert!(!inspection.params.token_only());
    assert_eq!(inspection.params.get(Param::Container), Some("mycontainer"));
    assert_eq!(inspection.params.get(Param::Blob), Some("myblob.txt"));
    assert_eq!(inspection.params.account_name(), Some("acct"));
    assert_eq!(
        inspection.report.get(Param::Container).unwrap().message,
        "container mycontainer"
    );
}

#[test]
fn test_folder_endpoint_is_reported() {
    init_logger();

    let raw = "BlobEndpoint=https://acct.blob.core.windows.net/c/dir/;\
               SharedAccessSignature=sv=2019-02-02&sr=b&sp=r&se=2030-01-01&sig=c2ln";
    let inspection = parse_and_validate_with(&validator(), raw).unwrap();

    let blob = inspection.report.get(Param::Blob).unwrap();
    assert!(!blob.ok);
    assert_eq!(blob.message, "endpoint names a folder, not a blob");

    let err = regenerate_with(&validator(), &SasSigner::new(), &inspection.params, TEST_KEY)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
}

#[test]
fn test_account_mismatch_is_reported() {
    init_logger();

    let raw = "BlobEndpoint=https://one.blob.core.windows.net/c;\
               QueueEndpoint=https://two.queue.core.windows.net/q;\
               SharedAccessSignature=sv=2019-02-02&sr=c&sp=r&se=2030-01-01&sig=c2ln";
    let inspection = parse_and_validate_with(&validator(), raw).unwrap();

    assert!(!inspection.report.get(Param::Account).unwrap().ok);
    assert!(!inspection.params.is_valid(Param::Account));
}

#[test_case("2017-07-29", false)]
#[test_case("2018-11-09", true)]
fn test_snapshot_version_gating(sv: &str, ok: bool) {
    init_logger();

    let raw = format!(
        "https://acct.blob.core.windows.net/c/b.txt?sv={sv}&sr=bs&sp=r&se=2030-01-01&sig=c2ln"
    );
    let inspection = parse_and_validate_with(&validator(), &raw).unwrap();

    assert_eq!(inspection.is_valid(), ok, "{}", inspection.report);
    assert_eq!(inspection.params.is_valid(Param::Resource), ok);
}

#[test]
fn test_mutual_exclusion_marks_both() {
    init_logger();

    let inspection = parse_and_validate_with(
        &validator(),
        "?sv=2019-02-02&srt=s&sr=b&sp=r&se=2030-01-01&sig=c2ln",
    )
    .unwrap();

    assert!(!inspection.params.is_valid(Param::ResourceTypes));
    assert!(!inspection.params.is_valid(Param::Resource));
    assert_eq!(inspection.params.sas_kind(), None);
}

#[test_case("10.0.0.1-10.0.0.5", true)]
#[test_case("10.0.0.5-10.0.0.1", false)]
#[test_case("0.1.2.3", false)]
#[test_case("0.0.0.1", false)]
fn test_ip_ordering(sip: &str, ok: bool) {
    init_logger();

    let raw = format!("?sv=2019-02-02&ss=b&srt=o&sp=r&se=2030-01-01&sip={sip}&sig=c2ln");
    let inspection = parse_and_validate_with(&validator(), &raw).unwrap();

    assert_eq!(inspection.report.get(Param::Ip).unwrap().ok, ok);
}

#[test]
fn test_queue_requires_declaration_without_endpoint() {
    init_logger();

    let params = ParameterSet::new()
        .with(Param::Account, "acct")
        .with(Param::Queue, "jobs")
        .with(Param::Version, "2019-02-02")
        .with(Param::Permissions, "rap")
        .with(Param::Expiry, "2030-01-01");

    let err = regenerate_with(&validator(), &SasSigner::new(), &params, TEST_KEY).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);

    let params = params.with_queue_resource();
    assert_eq!(
        params.sas_kind(),
        Some(SasKind::Service(ResourceKind::Queue))
    );
    let signed = regenerate_with(&validator(), &SasSigner::new(), &params, TEST_KEY).unwrap();
    assert_eq!(
        signed.token(),
        "sv=2019-02-02&se=2030-01-01&sp=rap&sig=tYsjhIkgZeBN2Y9T9H%2Fzm2iDwX4rGzOzzQ0z2t6o6TU%3D"
    );
}

#[test]
fn test_undecodable_value_is_not_resigned() {
    init_logger();

    let raw = "https://acct.blob.core.windows.net/c?sv=2019-02-02&sr=c&sp=r&se=2030-01-01\
               &rscd=a%FFb&sig=c2ln";
    let inspection = parse_and_validate_with(&validator(), raw).unwrap();
    assert!(!inspection.report.get(Param::ContentDisposition).unwrap().ok);

    let err = regenerate_with(&validator(), &SasSigner::new(), &inspection.params, TEST_KEY)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
}

#[test_case("?sv=2019-02-02 &sig=x", LexError::Whitespace)]
#[test_case("sv=2019-02-02&sig=x", LexError::NoSignature)]
#[test_case("SharedAccessSignature=sv=2019-02-02&sig=x", LexError::MissingEndpoint)]
fn test_structural_errors_are_fatal(raw: &str, cause: LexError) {
    init_logger();

    let err = parse_and_validate(raw).unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(LexError::of(&err), Some(cause));
}

#[test]
fn test_report_renders_as_json() {
    init_logger();

    let inspection = parse_and_validate_with(
        &validator(),
        "?sv=2019-02-02&ss=b&srt=sco&sp=rl&se=2030-01-01&spr=http&sig=c2ln",
    )
    .unwrap();
    let json = serde_json::to_value(&inspection).unwrap();

    let entries = json["report"]["entries"].as_array().unwrap();
    let spr = entries.iter().find(|d| d["field"] == "spr").unwrap();
    assert_eq!(spr["ok"], false);
}

#[test]
fn test_sign_with_config_from_env() {
    init_logger();

    temp_env::with_vars(
        [
            ("AZURE_STORAGE_ACCOUNT", Some("acct")),
            ("AZURE_STORAGE_KEY", Some(TEST_KEY)),
            ("SASKIT_DEBUG_INFO", Some("1")),
        ],
        || {
            let config = Config::default().from_env().unwrap();
            let params = config
                .parameter_set()
                .with(Param::Services, "b")
                .with(Param::ResourceTypes, "sco")
                .with(Param::Permissions, "rl")
                .with(Param::Expiry, "2030-01-01T00:00:00Z")
                .with(Param::Protocol, "https");

            let signed = config
                .signer()
                .sign_token(&params, &config.credential().unwrap())
                .unwrap();

            assert!(signed.debug().is_some());
            assert!(signed
                .token()
                .ends_with("sig=olTyZp5nmAsZ%2BtKyUxUF4CW9nW9%2BszyD1ngvAmNQ1cY%3D"));
        },
    );
}
