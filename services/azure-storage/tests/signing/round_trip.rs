//! Lexing a token and signing the lexed fields again must reproduce it byte for byte.

use log::debug;
use percent_encoding::percent_decode_str;
use pretty_assertions::assert_eq;
use saskit_azure_storage::lex;
use saskit_azure_storage::resolve;
use saskit_azure_storage::Param;
use saskit_azure_storage::ParameterSet;
use saskit_azure_storage::ResourceKind;
use saskit_azure_storage::SasKind;
use saskit_azure_storage::SasSigner;
use test_case::test_case;

use crate::init_logger;
use crate::TEST_KEY;

#[test_case(
    "https://acct.blob.core.windows.net/photos/cat.png?",
    "sv=2018-11-09&sr=b&se=2030-01-01T00%3A00%3A00Z&sp=rw&spr=https&sig=MfAKO2iaVolKdCVFRJmrvwHlxw0RizbwoidH6LI6SwU%3D",
    SasKind::Service(ResourceKind::Blob);
    "blob 2018-11-09"
)]
#[test_case(
    "https://acct.blob.core.windows.net/photos/cat.png?",
    "sv=2018-11-09&sr=bs&se=2030-01-01&sp=racwudp&rsct=text%2Fplain&snapshot=2019-01-01T00%3A00%3A00.0000000Z&sig=%2B3H4g8TwNYvTGcKlZANITTQaW%2Fbl1%2BM8Xtoecip7djI%3D",
    SasKind::Service(ResourceKind::BlobSnapshot);
    "blob snapshot 2018-11-09"
)]
#[test_case(
    "https://acct.file.core.windows.net/share?",
    "sv=2020-10-02&sr=s&se=2030-01-01&sp=rcwdl&spr=https%2Chttp&sig=PKgDISPHeTw7MZ3E%2FHlEoPP9vqLOaBqo6qRc42sE6xM%3D",
    SasKind::Service(ResourceKind::Share);
    "share 2020-10-02"
)]
#[test_case(
    "https://acct.blob.core.windows.net/photos?",
    "sv=2015-04-05&sr=c&st=2020-01-01&se=2030-01-01&sp=rl&sip=10.0.0.1-10.0.0.9&spr=https%2Chttp&sig=Nx0CzNE2lKqvi31RIenPTHsYjDsS%2BorVrTsDYsH3n7E%3D",
    SasKind::Service(ResourceKind::Container);
    "container 2015-04-05"
)]
#[test_case(
    "https://acct.table.core.windows.net/orders?",
    "sv=2017-07-29&tn=orders&se=2030-01-01T00%3A00Z&sp=raud&spk=p1&epk=p9&sig=rVjv%2BJRCdrZgF7h0IAx684uublzrqse%2BKtwEzM50Mpg%3D",
    SasKind::Service(ResourceKind::Table);
    "table 2017-07-29"
)]
#[test_case(
    "https://acct.queue.core.windows.net/jobs?",
    "sv=2019-02-02&se=2030-01-01&sp=rap&sig=tYsjhIkgZeBN2Y9T9H%2Fzm2iDwX4rGzOzzQ0z2t6o6TU%3D",
    SasKind::Service(ResourceKind::Queue);
    "queue 2019-02-02"
)]
#[test_case(
    "https://acct.file.core.windows.net/share/report.csv?",
    "sv=2015-02-21&sr=f&se=2030-01-01&sp=rw&sig=6Tbj%2BDawl4uSSLvdJWc7U%2F57PRU8ftGMZwIS%2BpsItU4%3D",
    SasKind::Service(ResourceKind::File);
    "file 2015-02-21"
)]
#[test_case(
    "https://acct.queue.core.windows.net/jobs?",
    "sv=2014-02-14&se=2030-01-01&sp=raup&sig=dDgExfrjs%2FpWPUpwSwEgKPFXi6Y0sUARhuQbjItO%2BPI%3D",
    SasKind::Service(ResourceKind::Queue);
    "queue 2014-02-14"
)]
#[test_case(
    "https://acct.blob.core.windows.net/photos?",
    "sv=2013-08-15&sr=c&se=2030-01-01&sp=rwl&rscd=attachment%3Bfilename%3Da.txt&sig=iMWQvd1NvzUv8Be1%2BF9t4M%2BsavHNuHOWLmHHG7%2B5S%2BU%3D",
    SasKind::Service(ResourceKind::Container);
    "container 2013-08-15"
)]
#[test_case(
    "https://acct.blob.core.windows.net/photos/cat.png?",
    "sv=2012-02-12&sr=b&se=2030-01-01&sp=r&si=policy1&sig=%2FAmV8qZ1v8EhMhlLaYHb9GgGqEp8NOKCnwEUOOIxNMY%3D",
    SasKind::Service(ResourceKind::Blob);
    "blob 2012-02-12"
)]
#[test_case(
    "https://acct.blob.core.windows.net/photos/cat.png?",
    "sr=b&st=2024-06-01T11%3A30%3A00Z&se=2024-06-01T12%3A30%3A00Z&sp=r&sig=a3OeEvWITTKgMe7Oqd1w%2B6Pocmllab%2Bxw16uxbspAj0%3D",
    SasKind::Service(ResourceKind::Blob);
    "blob without version"
)]
#[test_case(
    "BlobEndpoint=https://acct.blob.core.windows.net;SharedAccessSignature=",
    "sv=2019-02-02&ss=b&srt=sco&se=2030-01-01T00%3A00%3A00Z&sp=rl&spr=https&sig=olTyZp5nmAsZ%2BtKyUxUF4CW9nW9%2BszyD1ngvAmNQ1cY%3D",
    SasKind::Account;
    "account 2019-02-02"
)]
fn test_round_trip(prefix: &str, token: &str, kind: SasKind) {
    init_logger();

    let params = resolve(lex(&format!("{prefix}{token}")).unwrap());
    assert_eq!(params.sas_kind(), Some(kind));

    let signed = SasSigner::new()
        .with_debug_info(true)
        .sign(&params, TEST_KEY)
        .unwrap();
    debug!("signed: {:?}", signed.debug());

    assert_eq!(signed.token(), token);
    let (_, sig) = token.rsplit_once("&sig=").unwrap();
    let sig = percent_decode_str(sig).decode_utf8().unwrap();
    assert_eq!(params.get(Param::Signature), Some(&*sig));
}

#[test]
fn test_round_trip_with_wrong_key_differs() {
    init_logger();

    let token = "sv=2019-02-02&se=2030-01-01&sp=rap&sig=tYsjhIkgZeBN2Y9T9H%2Fzm2iDwX4rGzOzzQ0z2t6o6TU%3D";
    let raw = format!("https://acct.queue.core.windows.net/jobs?{token}");
    let params = resolve(lex(&raw).unwrap());

    let signed = SasSigner::new().sign(&params, "a2V5").unwrap();
    assert_ne!(signed.token(), token);
}

#[test_case(Param::ContentDisposition, "attachment; filename=a b.txt"; "space")]
#[test_case(Param::ContentType, "application/ld+json"; "plus")]
#[test_case(Param::Identifier, "read only~1"; "policy id")]
fn test_signed_token_lexes_back(param: Param, value: &str) {
    init_logger();

    let params = ParameterSet::new()
        .with(Param::Account, "acct")
        .with(Param::Container, "photos")
        .with(Param::Version, "2019-02-02")
        .with(Param::Resource, "c")
        .with(Param::Permissions, "rl")
        .with(Param::Expiry, "2030-01-01")
        .with(param, value);
    let first = SasSigner::new().sign(&params, TEST_KEY).unwrap();
    assert!(!first.token().contains([' ', '+']), "{first}");

    let lexed = resolve(lex(&first.url("https://acct.blob.core.windows.net/photos")).unwrap());
    assert_eq!(lexed.get(param), Some(value));

    let second = SasSigner::new().sign(&lexed, TEST_KEY).unwrap();
    assert_eq!(first.token(), second.token());
}
