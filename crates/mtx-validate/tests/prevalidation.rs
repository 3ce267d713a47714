use std::fs;
use std::path::Path;

use mtx_model::{MESSAGE_FIELD, PRESENCE_CODE};
use mtx_standards::FieldDefinitionsLoader;
use mtx_validate::{PrevalidationEngine, UNKNOWN_TYPE};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn prevalidate_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "MT103/fieldvalidations.yaml",
        r"
- tag: '20'
  presence: mandatory
  validations:
    - rule: no_leading_or_trailing_slash_or_double_slash
      error_code: T26
- tag: 32A
  presence: mandatory
  validations:
    - rule: must_be_valid_date_yymmdd
      error_code: T50
    - rule: amount_decimal_comma_mandatory
      error_code: T40
- tag: 59a
  presence: mandatory
- tag: '70'
  validations:
    - rule: value_must_use_x_charset
      error_code: T32
    - rule: some_future_rule
",
    );
    write(
        dir.path(),
        "MTn96/fieldvalidations.yaml",
        r"
- tag: 76
  presence: mandatory
  validations:
    - rule: mt196_rjcr_pdcr_reason_codes
      error_code: T80
",
    );
    write(
        dir.path(),
        "lookups.yaml",
        "mt196_reason_codes:\n  AM04: Insufficient funds\n  AC01: Incorrect account number\n",
    );
    dir
}

fn engine(dir: &TempDir) -> PrevalidationEngine {
    PrevalidationEngine::new(FieldDefinitionsLoader::new(dir.path()))
}

fn mt103(body: &str) -> String {
    format!("{{1:F01BANKBEBBAXXX0000000000}}{{2:I103BANKDEFFXXXXN}}{{4:\n{body}\n-}}")
}

#[test]
fn valid_mt103_with_lettered_beneficiary() {
    let dir = prevalidate_dir();
    let raw = mt103(":20:REF-1\n:32A:240115EUR1000,00\n:59A:BANKDEFF\n:70:INVOICE 1");
    let result = engine(&dir).validate(&raw, None).unwrap();
    assert_eq!(result.mt_type, "MT103");
    assert!(result.valid, "{:?}", result.errors);
    assert!(result.errors.is_empty());
}

#[test]
fn presence_and_rule_errors_carry_codes() {
    let dir = prevalidate_dir();
    let raw = mt103(":20:/REF\n:32A:240230EUR1000.00\n:70:LINE_1");
    let result = engine(&dir).validate(&raw, None).unwrap();
    assert!(!result.valid);

    let summary: Vec<(&str, Option<&str>, Option<usize>)> = result
        .errors
        .iter()
        .map(|e| (e.field.as_str(), e.code.as_deref(), e.occurrence))
        .collect();
    assert_eq!(
        summary,
        [
            ("59a", Some(PRESENCE_CODE), None),
            ("20", Some("T26"), Some(1)),
            ("32A", Some("T50"), Some(1)),
            ("32A", Some("T40"), Some(1)),
            ("70", Some("T32"), Some(1)),
        ]
    );
    assert_eq!(result.errors[0].message, "Field is mandatory but missing");
    assert_eq!(result.errors[2].message, "Invalid date value");
    assert_eq!(result.errors[4].message, "Character '_' not allowed in X charset");
}

#[test]
fn repeated_tags_record_their_occurrence() {
    let dir = prevalidate_dir();
    let raw = mt103(":20:REF\n:32A:240115EUR1,00\n:59:NAME\n:70:OK\n:70:BAD_ONE");
    let result = engine(&dir).validate(&raw, None).unwrap();
    assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
    assert_eq!(result.errors[0].field, "70");
    assert_eq!(result.errors[0].occurrence, Some(2));
}

#[test]
fn undetected_and_undefined_types_are_reported() {
    let dir = prevalidate_dir();
    let engine = engine(&dir);

    let result = engine.validate("hello", None).unwrap();
    assert_eq!(result.mt_type, UNKNOWN_TYPE);
    assert!(!result.valid);
    assert_eq!(result.errors[0].field, MESSAGE_FIELD);
    assert_eq!(result.errors[0].message, "Unable to detect MT type");

    let result = engine.validate(":20:REF", Some("mt940")).unwrap();
    assert_eq!(result.mt_type, "MT940");
    assert_eq!(result.errors[0].message, "No field validations defined for MT940");
}

#[test]
fn category_n_answers_share_definitions() {
    let dir = prevalidate_dir();
    let engine = engine(&dir);
    let answer = |line: &str| format!("{{2:I196BANKDEFFXXXXN}}{{4:\n:20:ANS\n:76:{line}\n-}}");

    let result = engine.validate(&answer("/RJCR/AM04"), None).unwrap();
    assert_eq!(result.mt_type, "MT196");
    assert!(result.valid, "{:?}", result.errors);

    let result = engine.validate(&answer("/RJCR/"), None).unwrap();
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code.as_deref(), Some("T80"));
    assert_eq!(
        result.errors[0].message,
        "Reason code required when RJCR or PDCR is reported"
    );
}
