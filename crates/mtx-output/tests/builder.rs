use insta::assert_snapshot;
use mtx_model::FlatDocument;
use mtx_output::build;

#[test]
fn renders_nested_document_with_attributes() {
    let mut flat = FlatDocument::default();
    flat.push("/Document/FIToFICstmrCdtTrf/GrpHdr/MsgId", "REF-1");
    flat.push("/Document/FIToFICstmrCdtTrf/GrpHdr/NbOfTxs", "1");
    flat.push("/Document/FIToFICstmrCdtTrf/CdtTrfTxInf/IntrBkSttlmAmt/@Ccy", "EUR");
    flat.push("/Document/FIToFICstmrCdtTrf/CdtTrfTxInf/IntrBkSttlmAmt", "12345.67");
    flat.push("/Document/FIToFICstmrCdtTrf/CdtTrfTxInf/RmtInf/Ustrd", "LINE 1");
    flat.push("/Document/FIToFICstmrCdtTrf/CdtTrfTxInf/RmtInf/Ustrd", "LINE 2");

    let xml = build("pacs.008.001.13", &flat).unwrap();
    assert_snapshot!(xml, @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <Document xmlns="urn:iso:std:iso:20022:tech:xsd:pacs.008.001.13">
      <FIToFICstmrCdtTrf>
        <GrpHdr>
          <MsgId>REF-1</MsgId>
          <NbOfTxs>1</NbOfTxs>
        </GrpHdr>
        <CdtTrfTxInf>
          <IntrBkSttlmAmt Ccy="EUR">12345.67</IntrBkSttlmAmt>
          <RmtInf>
            <Ustrd>LINE 2</Ustrd>
          </RmtInf>
        </CdtTrfTxInf>
      </FIToFICstmrCdtTrf>
    </Document>
    "#);
}

#[test]
fn attribute_only_elements_are_empty() {
    let mut flat = FlatDocument::default();
    flat.push("/Document/Root/Amt/@Ccy", "USD");
    let xml = build("camt.029.001.09", &flat).unwrap();
    assert!(xml.contains(r#"<Amt Ccy="USD"/>"#));
}

#[test]
fn repeated_attribute_values_keep_the_last() {
    let mut flat = FlatDocument::default();
    flat.push("/Document/Root/Amt/@Ccy", "EUR");
    flat.push("/Document/Root/Amt/@Ccy", "USD");
    flat.push("/Document/Root/Amt", "10.5");
    let xml = build("pacs.008.001.13", &flat).unwrap();
    assert!(xml.contains(r#"<Amt Ccy="USD">10.5</Amt>"#));
    assert!(!xml.contains("EUR"));
}

#[test]
fn repeated_element_values_overwrite_one_node() {
    let mut flat = FlatDocument::default();
    flat.push("/Document/Root/Tx/Id", "T-1");
    flat.push("/Document/Root/Tx/Inf", "FIRST");
    flat.push("/Document/Root/Tx/Inf", "SECOND");
    flat.push("/Document/Root/Tx/Inf[2]", "THIRD");
    flat.push("/Document/Root/Tx/Nm", "NAME");

    let xml = build("pacs.008.001.13", &flat).unwrap();
    assert_snapshot!(xml, @r#"
    <?xml version="1.0" encoding="UTF-8"?>
    <Document xmlns="urn:iso:std:iso:20022:tech:xsd:pacs.008.001.13">
      <Root>
        <Tx>
          <Id>T-1</Id>
          <Inf>THIRD</Inf>
          <Nm>NAME</Nm>
        </Tx>
      </Root>
    </Document>
    "#);
}
