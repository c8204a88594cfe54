//! Maps free-text fund input to a tax identifier.
use crate::core::fund::FundCatalog;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// CNPJ shape: 14 digits, punctuation in the usual positions is optional.
static TAX_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}").expect("tax id pattern is valid")
});

const NAME_SEPARATOR: &str = " | ";

/// Returns the first tax-id shaped substring of `text`, verbatim.
pub fn extract_tax_id(text: &str) -> Option<&str> {
    TAX_ID_PATTERN.find(text).map(|m| m.as_str())
}

/// Resolves user input to a tax identifier.
///
/// A tax-id anywhere in the text wins. Otherwise the text before the first
/// `" | "` is trimmed and looked up as an exact commercial name. Anything
/// else is unresolved, which callers treat as "no fund selected".
pub fn resolve_input(text: &str, catalog: &FundCatalog) -> Option<String> {
    if let Some(tax_id) = extract_tax_id(text) {
        debug!("Resolved '{}' by tax id pattern to {}", text, tax_id);
        return Some(tax_id.to_string());
    }

    let name = text.split(NAME_SEPARATOR).next().unwrap_or_default().trim();
    let resolved = catalog.tax_id_for(name).map(str::to_string);
    debug!("Resolved '{}' by commercial name to {:?}", name, resolved);
    resolved
}
