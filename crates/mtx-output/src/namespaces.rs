//! Registered MX message types and their namespaces.

pub const ISO20022_URN_PREFIX: &str = "urn:iso:std:iso:20022:tech:xsd:";

const MX_TYPES: &[&str] = &[
    "pacs.008.001.13",
    "pacs.009.001.12",
    "pacs.008.001.10",
    "pacs.009.001.09",
    "pacs.003.001.11",
    "camt.053.001.08",
    "camt.054.001.08",
    "camt.057.001.08",
    "camt.056.001.11",
    "camt.026.001.10",
    "camt.027.001.10",
    "camt.028.001.12",
    "camt.033.001.07",
    "pain.001.001.12",
    "pain.008.001.11",
    "camt.107.001.02",
    "camt.029.001.09",
    "camt.108.001.02",
    "camt.109.001.02",
    "camt.029.001.13",
    "camt.111.001.02",
];

/// The ISO 20022 URN for an MX type, registered or not.
pub fn iso_urn(mx_type: &str) -> String {
    format!("{ISO20022_URN_PREFIX}{mx_type}")
}

/// Namespace of a registered MX type.
pub fn namespace_for(mx_type: &str) -> Option<String> {
    MX_TYPES
        .iter()
        .any(|known| *known == mx_type)
        .then(|| iso_urn(mx_type))
}

pub fn registered_types() -> impl Iterator<Item = &'static str> {
    MX_TYPES.iter().copied()
}
