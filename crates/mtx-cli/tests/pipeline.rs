//! Integration tests for the translation pipeline over the bundled standards.

mod common;

use std::fs;
use std::path::Path;

use mtx_cli::pipeline::{PipelineError, TranslateOptions, Translator};
use mtx_model::{ConvertedMessage, NO_CONVERSION_APPLICABLE, PassThrough, Translation};
use mtx_standards::StandardsError;
use mtx_validate::ValidatorConfig;

use common::{
    MT101, MT103, MT103_WITHOUT_CHARGES, MT196_CANCELLATION, MT196_INFORMATION, MT202, MT202COV,
    MT940, pinned_now, translator,
};

fn options(request_id: &str) -> TranslateOptions {
    TranslateOptions {
        request_id: Some(request_id.to_string()),
        now: Some(pinned_now()),
        ..TranslateOptions::default()
    }
}

fn converted(translation: Translation) -> ConvertedMessage {
    match translation {
        Translation::Converted(message) => message,
        Translation::PassThrough(other) => panic!("expected a conversion, got {other:?}"),
    }
}

fn passed_through(translation: Translation) -> PassThrough {
    match translation {
        Translation::PassThrough(message) => message,
        Translation::Converted(other) => panic!("expected a pass-through, got {other:?}"),
    }
}

#[test]
fn test_mt103_converts_to_pacs_008() {
    let result = converted(translator().translate(MT103, &options("REQ-1")).unwrap());

    assert_eq!(result.mt_type, "MT103");
    assert_eq!(result.mx_type, "pacs.008.001.13");
    assert_eq!(
        result.mapping_profile.as_deref(),
        Some("mappings/MT103_to_pacs.008.001.13.json")
    );
    assert!(result.variant.is_none());

    let xml = &result.xml;
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<Document xmlns=\"urn:iso:std:iso:20022:tech:xsd:pacs.008.001.13\">"));
    for fragment in [
        "<MsgId>REQ-1</MsgId>",
        "<CreDtTm>2024-01-15T09:30:00Z</CreDtTm>",
        "<NbOfTxs>1</NbOfTxs>",
        "<SttlmMtd>INDA</SttlmMtd>",
        "<InstrId>REF20240115001</InstrId>",
        "<EndToEndId>REF20240115001</EndToEndId>",
        "<IntrBkSttlmAmt Ccy=\"EUR\">1250.50</IntrBkSttlmAmt>",
        "<IntrBkSttlmDt>2024-01-15</IntrBkSttlmDt>",
        "<ChrgBr>SHAR</ChrgBr>",
        "<Nm>JOHN SMITH</Nm>",
        "<IBAN>DE89370400440532013000</IBAN>",
        "<BICFI>BANKDEFFXXX</BICFI>",
        "<BICFI>BANKGB2L</BICFI>",
        "<Nm>JANE DOE</Nm>",
        "<IBAN>GB29NWBK60161331926819</IBAN>",
        "<Ustrd>INVOICE 4711</Ustrd>",
    ] {
        assert!(xml.contains(fragment), "missing {fragment} in\n{xml}");
    }

    let dbtr = xml.find("<Dbtr>").unwrap();
    let cdtr_agt = xml.find("<CdtrAgt>").unwrap();
    let cdtr = xml.find("<Cdtr>").unwrap();
    assert!(dbtr < cdtr_agt && cdtr_agt < cdtr);

    assert!(result.validation.ok, "{:?}", result.validation.errors);
    assert!(result.validation.errors.is_empty());
    assert!(result.diagnostics.is_empty());
    assert!(
        result
            .mapped
            .contains(&"/Document/FIToFICstmrCdtTrf/CdtTrfTxInf/ChrgBr".to_string())
    );
}

#[test]
fn test_msg_id_falls_back_to_timestamp() {
    let options = TranslateOptions {
        now: Some(pinned_now()),
        ..TranslateOptions::default()
    };
    let result = converted(translator().translate(MT103, &options).unwrap());
    assert!(result.xml.contains("<MsgId>2024-01-15T09:30:00Z</MsgId>"));
}

#[test]
fn test_result_serializes_audit_fields() {
    let result = translator().translate(MT103, &options("REQ-2")).unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["mx_type"], "pacs.008.001.13");
    assert_eq!(json["validation"]["ok"], true);
    assert!(json["validator_engine"].is_string());
    assert!(json["latency_ms"].is_u64());
    assert!(json.get("variant").is_none());
}

#[test]
fn test_mt940_passes_through_unchanged() {
    let result = passed_through(translator().translate(MT940, &options("REQ-3")).unwrap());
    assert_eq!(result.code, NO_CONVERSION_APPLICABLE);
    assert_eq!(result.mt_type, "940");
    assert_eq!(result.mode, "pass_through");
    assert!(result.payload_preserved);
    assert!(result.mx_type.is_none());
    assert_eq!(result.mt_raw, MT940);
    assert!(result.validation.ok);
}

#[test]
fn test_missing_charges_fails_prevalidation() {
    let err = translator()
        .translate(MT103_WITHOUT_CHARGES, &options("REQ-4"))
        .unwrap_err();
    assert_eq!(err.status_code(), 422);
    assert_eq!(err.to_string(), "Prevalidation failed");
    let PipelineError::Prevalidation(verdict) = err else {
        panic!("expected a prevalidation failure");
    };
    assert_eq!(verdict.mt_type, "MT103");
    assert!(!verdict.valid);
    assert!(
        verdict
            .errors
            .iter()
            .any(|e| e.field == "71A" && e.code.as_deref() == Some("PRESENCE"))
    );
}

#[test]
fn test_skipping_prevalidation_surfaces_schema_errors() {
    let options = TranslateOptions {
        prevalidate: false,
        ..options("REQ-5")
    };
    let result = converted(translator().translate(MT103_WITHOUT_CHARGES, &options).unwrap());
    assert!(!result.xml.contains("<ChrgBr>"));
    assert!(result.xml.contains("<IntrBkSttlmAmt Ccy=\"EUR\">99.00</IntrBkSttlmAmt>"));
    assert!(!result.validation.ok);
    assert!(!result.validation.errors.is_empty());
}

#[test]
fn test_undetectable_input_is_a_client_error() {
    let err = translator()
        .translate("hello, not a SWIFT message", &options("REQ-6"))
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(matches!(err, PipelineError::Detection(_)));
}

#[test]
fn test_missing_schema_fails_open() {
    let result = converted(translator().translate(MT202, &options("REQ-7")).unwrap());
    assert_eq!(result.mt_type, "MT202");
    assert_eq!(result.mx_type, "pacs.009.001.12");
    assert!(result.xml.contains("<IntrBkSttlmAmt Ccy=\"USD\">500000</IntrBkSttlmAmt>"));
    assert!(result.xml.contains("<BICFI>CHASUS33XXX</BICFI>"));
    assert!(result.validation.ok);
    assert_eq!(result.validation.errors.len(), 1);
    assert!(result.validation.errors[0].contains("not found"));
}

#[test]
fn test_cover_payment_routes_to_cover_profile() {
    let result = converted(translator().translate(MT202COV, &options("REQ-8")).unwrap());
    assert_eq!(result.mt_type, "MT202COV");
    assert_eq!(
        result.mapping_profile.as_deref(),
        Some("mappings/MT202COV_to_pacs.009.001.12.json")
    );
    assert!(result.xml.contains("<SttlmMtd>COVE</SttlmMtd>"));
    assert!(result.xml.contains("<UndrlygCstmrCdtTrf>"));
    assert!(result.xml.contains("<Nm>JOHN SMITH</Nm>"));
    assert!(result.xml.contains("<InstdAmt Ccy=\"EUR\">1000.00</InstdAmt>"));
}

#[test]
fn test_mt196_cancellation_variant_is_routed() {
    let result = converted(
        translator()
            .translate(MT196_CANCELLATION, &options("REQ-9"))
            .unwrap(),
    );
    assert_eq!(result.variant.as_deref(), Some("cancellation"));
    assert_eq!(result.mx_type, "camt.029.001.09");
    assert!(result.xml.contains("<RsltnOfInvstgtn>"));
    assert!(result.xml.contains("<Id>ANS-0001</Id>"));
    assert!(result.xml.contains("<Conf>RJCR</Conf>"));
    assert!(result.xml.contains("<Cd>AC04</Cd>"));
    assert!(result.xml.contains("<OrgnlInstrId>REF20240115001</OrgnlInstrId>"));
    // several lines on one path keep the last
    assert!(result.xml.contains("<AddtlInf>PLEASE CONTACT BENEFICIARY</AddtlInf>"));
}

#[test]
fn test_mt196_without_variant_route_passes_through() {
    let result = passed_through(
        translator()
            .translate(MT196_INFORMATION, &options("REQ-10"))
            .unwrap(),
    );
    assert_eq!(result.mt_type, "196");
}

#[test]
fn test_unrouted_type_passes_the_gate_then_through() {
    let translator = translator();
    let verdict = translator.prevalidation().validate(MT101, None).unwrap();
    assert!(verdict.valid, "{:?}", verdict.errors);
    let result = passed_through(translator.translate(MT101, &options("REQ-15")).unwrap());
    assert_eq!(result.mt_type, "101");
}

#[test]
fn test_forced_type_overrides_header() {
    let options = TranslateOptions {
        force_type: Some("mt940".to_string()),
        prevalidate: false,
        ..options("REQ-11")
    };
    let result = passed_through(translator().translate(MT103, &options).unwrap());
    assert_eq!(result.mt_type, "940");
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[test]
fn test_missing_mapping_file_is_a_server_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "pairs.yaml",
        "- mt_code: MT103\n  mapping_file: mappings/absent.json\n  mx_type: pacs.008.001.13\n",
    );
    let translator = Translator::open(dir.path(), ValidatorConfig::default()).unwrap();
    let options = TranslateOptions {
        prevalidate: false,
        ..options("REQ-12")
    };
    let err = translator.translate(MT103, &options).unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert!(matches!(
        err,
        PipelineError::Standards(StandardsError::MappingFileMissing { .. })
    ));
}

#[test]
fn test_types_without_definitions_fail_the_gate() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "pairs.yaml", "pairs: []\n");
    let translator = Translator::open(dir.path(), ValidatorConfig::default()).unwrap();
    let err = translator.translate(MT940, &options("REQ-13")).unwrap_err();
    let PipelineError::Prevalidation(verdict) = err else {
        panic!("expected a prevalidation failure");
    };
    assert_eq!(verdict.errors[0].message, "No field validations defined for MT940");
}

#[test]
fn test_rejection_detail_snapshot() {
    let err = translator()
        .translate(MT103_WITHOUT_CHARGES, &options("REQ-14"))
        .unwrap_err();
    let PipelineError::Prevalidation(verdict) = err else {
        panic!("expected a prevalidation failure");
    };
    insta::assert_json_snapshot!(verdict, @r#"
    {
      "mt_type": "MT103",
      "valid": false,
      "errors": [
        {
          "field": "71A",
          "message": "Field is mandatory but missing",
          "code": "PRESENCE"
        }
      ],
      "warnings": []
    }
    "#);
}
