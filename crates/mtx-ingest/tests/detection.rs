use mtx_ingest::{DetectionError, detect};

fn mt202(extra: &str) -> String {
    format!(
        "{{1:F01BANKBEBBAXXX0000000000}}{{2:I202BANKDEFFXXXXN}}{{4:\n:20:COVREF\n:21:RELREF\n:32A:240115EUR1000,\n{extra}:58A:BANKDEFF\n-}}"
    )
}

#[test]
fn mt202_with_cover_party_is_cov() {
    let raw = mt202(":50A:PAYERBIC\n:59A:BENEBIC\n");
    assert_eq!(detect(&raw, None).unwrap(), "MT202COV");
}

#[test]
fn mt202_without_cover_parties_stays_plain() {
    assert_eq!(detect(&mt202(""), None).unwrap(), "MT202");
}

#[test]
fn mt202_needs_both_cover_tags() {
    assert_eq!(detect(&mt202(":50K:/123\nPAYER\n"), None).unwrap(), "MT202");
    assert_eq!(detect(&mt202(":59:/456\nBENE\n"), None).unwrap(), "MT202");
}

#[test]
fn forced_type_overrides_header() {
    assert_eq!(detect(&mt202(""), Some("mt202cov")).unwrap(), "MT202COV");
}

#[test]
fn undetermined_text_is_an_error() {
    let err = detect(":99:NOTHING\n", None).unwrap_err();
    assert!(matches!(err, DetectionError::Undetermined));
    assert_eq!(err.to_string(), "unable to detect MT type");
}
