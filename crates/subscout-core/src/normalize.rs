//! Description normalization
//!
//! Turns raw statement text into the canonical key used for both keyword
//! categorization and recurrence grouping:
//!
//! 1. lower-case
//! 2. punctuation from a fixed set becomes a space
//! 3. whitespace runs collapse to one space, ends trimmed
//! 4. at most one boilerplate payment-channel prefix is removed
//!
//! Prefixes are matched on the canonical text (step 4 runs last) so that
//! `"CARD-PAYMENT AT: Netflix"` and `"card payment at netflix"` normalize
//! alike, and `normalize` stays idempotent.

/// Payment-channel boilerplate, in match order. Entries are already in
/// canonical form (lower-case, single spaces, no punctuation).
pub const BOILERPLATE_PREFIXES: &[&str] = &[
    "card payment at",
    "card payment to",
    "contactless payment at",
    "direct debit from",
    "direct debit to",
    "standing order to",
    "recurring payment to",
    "pos purchase",
    "compra tarjeta",
    "compra en",
    "adeudo recibo",
    "recibo",
];

/// Characters replaced by a single space
pub const PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '*', '#', '/', '\\', '-', '_', '(', ')', '[', ']', '{', '}',
    '\'', '"', '`', '&', '+', '|', '@', '~', '^', '<', '>', '=', '$', '%',
];

/// Normalize a transaction description into its grouping key.
///
/// Pure and total: every input (including the empty string) yields a string,
/// and `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let canonical = canonicalize(text);
    match strip_boilerplate_prefix(&canonical) {
        Some(rest) => rest.to_string(),
        None => canonical,
    }
}

/// Normalize optional text; absent input yields the empty string.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

/// Lower-case, replace punctuation with spaces, collapse whitespace.
///
/// This is `normalize` without prefix stripping; category keywords go
/// through it so they compare against normalized descriptions.
pub fn canonicalize(text: &str) -> String {
    let spaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if PUNCTUATION.contains(&c) { ' ' } else { c })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove the first boilerplate prefix (in list order) from canonical text.
///
/// Returns `None` when no prefix matches, when the prefix is the whole
/// text, or when the remainder itself opens with another boilerplate
/// prefix. In the last case the text is left untouched: stripping one
/// layer would expose a second and break idempotence.
fn strip_boilerplate_prefix(canonical: &str) -> Option<&str> {
    let rest = BOILERPLATE_PREFIXES
        .iter()
        .find_map(|prefix| split_prefix(canonical, prefix))?;

    if BOILERPLATE_PREFIXES
        .iter()
        .any(|prefix| split_prefix(rest, prefix).is_some())
    {
        return None;
    }

    Some(rest)
}

/// `text` minus `prefix` and the following space, on a word boundary.
fn split_prefix<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    text.strip_prefix(prefix)?
        .strip_prefix(' ')
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        assert_eq!(normalize("NETFLIX.COM*12345"), "netflix com 12345");
        assert_eq!(normalize("  Spotify   USA  "), "spotify usa");
        assert_eq!(normalize("AT&T  Wireless"), "at t wireless");
    }

    #[test]
    fn test_strips_one_boilerplate_prefix() {
        assert_eq!(normalize("CARD PAYMENT AT Netflix"), "netflix");
        assert_eq!(normalize("Direct Debit from: Gym-Co"), "gym co");
        assert_eq!(normalize("RECIBO VODAFONE ESPAÑA"), "vodafone españa");
    }

    #[test]
    fn test_prefix_needs_word_boundary() {
        // "recibos" is not the "recibo" prefix
        assert_eq!(normalize("RECIBOS VARIOS"), "recibos varios");
        // A bare prefix is kept rather than normalized to nothing
        assert_eq!(normalize("Card payment at"), "card payment at");
    }

    #[test]
    fn test_first_prefix_in_list_order_wins() {
        // "adeudo recibo" is listed before "recibo" and consumes both words
        assert_eq!(normalize("ADEUDO RECIBO Endesa"), "endesa");
    }

    #[test]
    fn test_stacked_prefixes_are_left_alone() {
        let text = "direct debit from card payment at netflix";
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn test_no_prefix_passes_through() {
        assert_eq!(normalize("Amazon Prime"), "amazon prime");
    }

    #[test]
    fn test_absent_and_empty_input() {
        assert_eq!(normalize_opt(None), "");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  ...  "), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "CARD PAYMENT AT Netflix",
            "card payment at card payment at netflix",
            "Direct Debit from: Gym-Co",
            "direct debit from card payment at netflix",
            "card-payment at: SPOTIFY",
            "recibo recibo luz",
            "Card payment at",
            "  Café   Ñandú!! ",
            "NETFLIX.COM*12345",
            "",
            "***",
            "İstanbul Kart",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_prefix_table_is_canonical() {
        for prefix in BOILERPLATE_PREFIXES {
            assert_eq!(&canonicalize(prefix), prefix);
        }
    }

    #[test]
    fn test_canonicalize_keeps_prefixes() {
        assert_eq!(canonicalize("Card Payment at Apple.com/Bill"), "card payment at apple com bill");
    }
}
