/// Strips invisible characters and collapses inner whitespace. Case is kept:
/// names are matched case-sensitively downstream.
pub(crate) fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '\u{a0}'], " ");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn normalize_header(value: &str) -> String {
    normalize_name(value).to_ascii_lowercase()
}

#[cfg(test)]
pub(crate) fn normalize_for_tests(value: &str) -> String {
    normalize_name(value)
}
