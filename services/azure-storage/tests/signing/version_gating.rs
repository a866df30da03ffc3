use pretty_assertions::assert_eq;
use saskit_azure_storage::Param;
use saskit_azure_storage::ParameterSet;
use saskit_azure_storage::SasSigner;
use saskit_core::ErrorKind;
use test_case::test_case;

use crate::init_logger;
use crate::TEST_KEY;

fn service(sv: &str, sr: &str) -> ParameterSet {
    ParameterSet::new()
        .with(Param::Account, "acct")
        .with(Param::Container, "photos")
        .with(Param::Blob, "cat.png")
        .with(Param::Share, "share")
        .with(Param::File, "report.csv")
        .with(Param::Version, sv)
        .with(Param::Resource, sr)
        .with(Param::Permissions, "r")
        .with(Param::Expiry, "2030-01-01")
}

#[test_case("2009-09-19", "b", true)]
#[test_case("2009-09-19", "c", true)]
#[test_case("2009-09-19", "f", false)]
#[test_case("2012-02-12", "b", true)]
#[test_case("2012-02-12", "s", false)]
#[test_case("2013-08-15", "c", true)]
#[test_case("2014-02-14", "f", false)]
#[test_case("2015-02-21", "f", true)]
#[test_case("2015-02-21", "s", true)]
#[test_case("2015-04-05", "f", true)]
#[test_case("2017-07-29", "bs", false)]
#[test_case("2018-11-09", "bs", true)]
#[test_case("2020-10-02", "bs", true)]
fn test_signing_format_exists(sv: &str, sr: &str, supported: bool) {
    init_logger();

    let result = SasSigner::new().sign(&service(sv, sr), TEST_KEY);
    match result {
        Ok(_) => assert!(supported, "{sv}/{sr} should have no signing format"),
        Err(err) => {
            assert!(!supported, "{sv}/{sr}: {err}");
            assert_eq!(err.kind(), ErrorKind::Unsupported);
            assert!(err.to_string().contains(sv), "{err}");
        }
    }
}

#[test]
fn test_canonical_path_prefix_by_version() {
    init_logger();

    let signer = SasSigner::new().with_debug_info(true);
    let path = |sv: &str, sr: &str| {
        signer
            .sign(&service(sv, sr), TEST_KEY)
            .unwrap()
            .debug()
            .and_then(|d| d.canonical_resource.clone())
            .unwrap()
    };

    assert_eq!(path("2014-02-14", "b"), "/acct/photos/cat.png");
    assert_eq!(path("2015-02-21", "b"), "/blob/acct/photos/cat.png");
    assert_eq!(path("2015-02-21", "f"), "/file/acct/share/report.csv");
    assert_eq!(path("2019-02-02", "c"), "/blob/acct/photos");
}

#[test]
fn test_account_sas_line_count() {
    init_logger();

    let params = ParameterSet::new()
        .with(Param::Account, "acct")
        .with(Param::Version, "2019-02-02")
        .with(Param::Services, "b")
        .with(Param::ResourceTypes, "sco")
        .with(Param::Permissions, "rl")
        .with(Param::Expiry, "2030-01-01T00:00:00Z")
        .with(Param::Protocol, "https");
    let signed = SasSigner::new()
        .with_debug_info(true)
        .sign(&params, TEST_KEY)
        .unwrap();

    let sts = &signed.debug().unwrap().string_to_sign;
    assert_eq!(sts.matches('\n').count(), 9);
    assert!(sts.ends_with("\nhttps\n2019-02-02\n"));
}
