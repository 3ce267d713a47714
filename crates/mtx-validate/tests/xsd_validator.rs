use std::fs;
use std::path::Path;

use mockito::Matcher;
use mtx_validate::{BackendKind, SchemaCache, ValidatorConfig, ValidatorError, XsdValidator};

const MX_TYPE: &str = "pacs.008.001.13";

const SIMPLE_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Document">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Value" type="xs:string"/>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

const ASSERT_SCHEMA: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="Document">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="Value" type="xs:int"/>
      </xs:sequence>
      <xs:assert test="Value gt 0"/>
    </xs:complexType>
  </xs:element>
</xs:schema>
"#;

fn config(backend: BackendKind) -> ValidatorConfig {
    ValidatorConfig {
        backend,
        ..ValidatorConfig::default()
    }
}

fn schema_dir(file: &str, text: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(file), text).unwrap();
    dir
}

#[test]
fn missing_schema_fails_open() {
    for backend in [BackendKind::Xsd10, BackendKind::Auto] {
        let validator =
            XsdValidator::new(&config(backend), Some(Path::new("/nonexistent/xsd")), MX_TYPE).unwrap();
        let outcome = validator.validate("<Document/>");
        assert!(outcome.ok);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("skipped"), "{}", outcome.errors[0]);
        assert!(outcome.errors[0].contains(MX_TYPE));
        assert_eq!(validator.schema_path(), None);
    }
}

#[test]
fn simple_schema_accepts_and_rejects() {
    let dir = schema_dir(&format!("{MX_TYPE}.xsd"), SIMPLE_SCHEMA);
    let validator = XsdValidator::new(&config(BackendKind::Xsd10), Some(dir.path()), MX_TYPE).unwrap();
    assert_eq!(validator.engine_name(), "xsd10");

    let outcome = validator.validate("<Document/>");
    assert!(!outcome.ok);
    assert_eq!(
        outcome.errors,
        ["line 1: Element 'Document': Missing child element(s). Expected is ( Value )."]
    );

    let outcome = validator.validate("<Document><Value>ok</Value></Document>");
    assert!(outcome.ok, "{:?}", outcome.errors);
    assert!(outcome.errors.is_empty());

    let outcome = validator.validate("<Document><Value>");
    assert!(!outcome.ok);
}

#[test]
fn schema_is_found_by_target_namespace() {
    let schema = SIMPLE_SCHEMA.replace(
        "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">",
        "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\" xmlns=\"urn:iso:std:iso:20022:tech:xsd:pacs.008.001.13\" targetNamespace=\"urn:iso:std:iso:20022:tech:xsd:pacs.008.001.13\" elementFormDefault=\"qualified\">",
    );
    let dir = schema_dir("pacs_008.xsd", &schema);
    let validator = XsdValidator::new(&config(BackendKind::Xsd10), Some(dir.path()), MX_TYPE).unwrap();
    assert_eq!(validator.schema_path(), Some(dir.path().join("pacs_008.xsd").as_path()));

    let doc = format!(
        "<Document xmlns=\"urn:iso:std:iso:20022:tech:xsd:{MX_TYPE}\"><Value>x</Value></Document>"
    );
    assert!(validator.validate(&doc).ok);
}

#[test]
fn one_one_schema_fails_open_under_one_zero() {
    let dir = schema_dir(&format!("{MX_TYPE}.xsd"), ASSERT_SCHEMA);

    let strict = XsdValidator::new(&config(BackendKind::Xsd10), Some(dir.path()), MX_TYPE).unwrap();
    let outcome = strict.validate("<Document><Value>abc</Value></Document>");
    assert!(outcome.ok);
    assert!(
        outcome.errors[0].contains("xsd10 backend failed to parse schema"),
        "{}",
        outcome.errors[0]
    );

    if cfg!(feature = "xsd11") {
        let validator = XsdValidator::new(&config(BackendKind::Xsd11), Some(dir.path()), MX_TYPE).unwrap();
        assert_eq!(validator.engine_name(), "xsd11");
        let outcome = validator.validate("<Document><Value>abc</Value></Document>");
        assert!(!outcome.ok);
        assert!(outcome.errors[0].contains("xs:int"), "{}", outcome.errors[0]);
    } else {
        assert!(matches!(
            XsdValidator::new(&config(BackendKind::Xsd11), Some(dir.path()), MX_TYPE),
            Err(ValidatorError::Xsd11Unavailable)
        ));
    }
}

#[test]
fn validators_share_a_schema_cache() {
    let dir = schema_dir(&format!("{MX_TYPE}.xsd"), SIMPLE_SCHEMA);
    let cache = SchemaCache::new();
    let config = config(BackendKind::Xsd10);
    for _ in 0..3 {
        let validator = XsdValidator::with_cache(&config, &cache, Some(dir.path()), MX_TYPE).unwrap();
        assert!(validator.validate("<Document><Value/></Document>").ok);
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn remote_backend_posts_multipart_form() {
    let dir = schema_dir(&format!("{MX_TYPE}.xsd"), SIMPLE_SCHEMA);
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/validate")
        .match_header("content-type", Matcher::Regex("^multipart/form-data".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="engine"\r\n\r\nxmlschema"#.to_string()),
            Matcher::Regex(format!(r#"name="mx_type"\r\n\r\n{}"#, regex_escape(MX_TYPE))),
            Matcher::Regex(r#"name="xml"; filename="payload.xml""#.to_string()),
            Matcher::Regex(r#"name="xsd"; filename="pacs\.008\.001\.13\.xsd""#.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": false, "errors": ["Value missing"]}"#)
        .create();

    let config = ValidatorConfig {
        backend: BackendKind::Remote,
        endpoint: Some(format!("{}/validate", server.url())),
        ..ValidatorConfig::default()
    };
    let validator = XsdValidator::new(&config, Some(dir.path()), MX_TYPE).unwrap();
    assert_eq!(validator.engine_name(), "remote:xmlschema");

    let outcome = validator.validate("<Document/>");
    mock.assert();
    assert!(!outcome.ok);
    assert_eq!(outcome.errors, ["Value missing"]);
}

#[test]
fn remote_failures_fail_open() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/validate")
        .with_status(503)
        .with_body("down for maintenance")
        .create();
    let config = ValidatorConfig {
        backend: BackendKind::Remote,
        endpoint: Some(format!("{}/validate", server.url())),
        ..ValidatorConfig::default()
    };
    let outcome = XsdValidator::new(&config, None, MX_TYPE)
        .unwrap()
        .validate("<Document/>");
    assert!(outcome.ok);
    assert_eq!(outcome.errors, ["Remote XSD validation HTTP 503: down for maintenance"]);

    let config = ValidatorConfig {
        endpoint: Some("http://127.0.0.1:9/validate".to_string()),
        timeout_secs: 2,
        ..config
    };
    let outcome = XsdValidator::new(&config, None, MX_TYPE)
        .unwrap()
        .validate("<Document/>");
    assert!(outcome.ok);
    assert!(outcome.errors[0].starts_with("Remote XSD validation failed:"));
}

#[test]
fn non_success_status_fails_open_before_reading_payload() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/validate")
        .with_status(300)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok": false, "errors": ["Value missing"]}"#)
        .create();
    let config = ValidatorConfig {
        backend: BackendKind::Remote,
        endpoint: Some(format!("{}/validate", server.url())),
        ..ValidatorConfig::default()
    };
    let outcome = XsdValidator::new(&config, None, MX_TYPE)
        .unwrap()
        .validate("<Document/>");
    assert!(outcome.ok);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Remote XSD validation HTTP 300:"));
}

fn regex_escape(text: &str) -> String {
    text.replace('.', r"\.")
}
