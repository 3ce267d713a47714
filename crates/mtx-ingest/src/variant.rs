//! Variant classification for MT types served by more than one profile.

use mtx_model::ParsedMessage;

const MT195_QUERIES: [(&str, &str); 3] = [
    ("/QUERY/UNABLE TO APPLY", "unable_to_apply"),
    ("/QUERY/CLAIM NON RECEIPT", "claim_non_receipt"),
    ("/QUERY/REQUEST FOR DUPLICATE", "request_duplicate"),
];

const MT196_CANCELLATION_KEYWORDS: [&str; 5] = ["CANCEL", "RJCR", "PDCR", "CNCL", "ACCR"];

/// Pick the profile variant for `message`, or `None` for the generic route.
pub fn classify(message: &ParsedMessage) -> Option<&'static str> {
    match message.declared_type().as_str() {
        "MT195" => classify_mt195(message),
        "MT196" => classify_mt196(message),
        "MT102" => classify_mt102(message),
        _ => None,
    }
}

fn joined_upper(message: &ParsedMessage, tag: &str) -> Option<String> {
    let values = message.values(tag);
    if values.is_empty() {
        return None;
    }
    Some(values.join("\n").to_uppercase())
}

fn classify_mt195(message: &ParsedMessage) -> Option<&'static str> {
    let text = joined_upper(message, "72")?.replace('-', " ");
    MT195_QUERIES
        .iter()
        .find(|(marker, _)| text.contains(marker))
        .map(|(_, variant)| *variant)
}

fn classify_mt196(message: &ParsedMessage) -> Option<&'static str> {
    let text = joined_upper(message, "76")?;
    if MT196_CANCELLATION_KEYWORDS
        .iter()
        .any(|keyword| text.contains(keyword))
    {
        Some("cancellation")
    } else {
        Some("information")
    }
}

fn classify_mt102(message: &ParsedMessage) -> Option<&'static str> {
    message
        .block("3")
        .filter(|block| block.to_uppercase().contains("119:STP"))
        .map(|_| "stp")
}
