//! Description normalization and reference-token extraction.

// ---------------------------------------------------------------------------
// Stop words
// ---------------------------------------------------------------------------

/// Banking-noise vocabulary stripped before textual comparison. The exact
/// contents are part of the matching contract: changing this list changes
/// which descriptions normalize to the same string.
const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "ltd", "inc", "corp", "plc", "llc", "gmbh", "pvt",
    "payment", "transfer", "tfr", "inv", "ref", "invoice", "bill", "reference",
    "to", "from", "of", "for", "by", "deposit", "withdrawal", "dr", "cr",
    "momo", "mobile", "money", "bank", "charges", "service", "fee", "comm",
    "pos", "purchase", "card", "visa", "mastercard", "direct", "debit",
    "standing", "order", "chq", "cheque", "cash", "atm", "trf", "rtgs",
    "neft", "imps", "ach", "wire", "txn", "id", "no", "number", "account",
    "acct", "opening", "balance", "closing", "brought", "forward",
];

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Lowercase, strip punctuation to spaces, drop one-character tokens and
/// stop words, rejoin with single spaces.
pub fn normalize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut cleaned = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() {
            cleaned.push(c);
        } else {
            cleaned.push(' ');
        }
    }
    cleaned
        .split_whitespace()
        .filter(|t| t.len() > 1 && !STOP_WORDS.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Reference tokens
// ---------------------------------------------------------------------------

/// Extract likely reference identifiers (invoice numbers, transfer refs)
/// from a free-text narrative. Case-sensitive, deduplicated, in order of
/// first appearance.
///
/// A word-boundary segment qualifies when, after dropping separators, it is
/// either all digits of length >= 3 or mixes letters with at least three
/// digits. Bare calendar years are excluded so "Invoice 2024" does not pin
/// a match on the year.
pub fn reference_tokens(input: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for segment in word_boundary_segments(input) {
        if segment.is_empty()
            || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            continue;
        }
        let cleaned: String = segment.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if !is_reference_token(&cleaned) {
            continue;
        }
        if !out.contains(&cleaned) {
            out.push(cleaned);
        }
    }
    out
}

/// True when the two narratives carry at least one reference token in common.
pub fn share_reference_token(a: &str, b: &str) -> bool {
    let tokens_a = reference_tokens(a);
    if tokens_a.is_empty() {
        return false;
    }
    reference_tokens(b).iter().any(|t| tokens_a.contains(t))
}

/// Split into maximal runs of word characters (`[A-Za-z0-9_]`) and runs of
/// everything else, i.e. the segments between regex word boundaries.
fn word_boundary_segments(input: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut prev_word: Option<bool> = None;
    for (i, c) in input.char_indices() {
        let word = c.is_ascii_alphanumeric() || c == '_';
        if let Some(prev) = prev_word {
            if prev != word {
                segments.push(&input[start..i]);
                start = i;
            }
        }
        prev_word = Some(word);
    }
    if prev_word.is_some() {
        segments.push(&input[start..]);
    }
    segments
}

fn is_reference_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    // Calendar-year guard.
    if let Ok(n) = token.parse::<i64>() {
        if (2020..=2030).contains(&n) {
            return false;
        }
    }
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = token.chars().filter(|c| c.is_ascii_alphabetic()).count();
    if letters == 0 {
        return digits >= 3;
    }
    digits >= 3
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_noise() {
        assert_eq!(normalize("TRF to ACME Holdings Ltd."), "acme holdings");
        assert_eq!(normalize("POS purchase - COFFEE & CO"), "coffee co");
        assert_eq!(normalize("NEFT/RTGS wire fee"), "");
    }

    #[test]
    fn normalize_drops_single_chars() {
        assert_eq!(normalize("Salary June K Mensah"), "salary june mensah");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  acme   holdings  "), "acme holdings");
    }

    #[test]
    fn reference_tokens_all_digit() {
        assert_eq!(reference_tokens("Invoice 99821 payment"), vec!["99821"]);
    }

    #[test]
    fn reference_tokens_split_at_hyphen() {
        // "INV-99821" splits at the word boundary, leaving the digit run.
        assert_eq!(reference_tokens("TRF INV-99821 ACME"), vec!["99821"]);
    }

    #[test]
    fn reference_tokens_mixed_alnum() {
        assert_eq!(reference_tokens("Payment REF99821X"), vec!["REF99821X"]);
    }

    #[test]
    fn reference_tokens_year_guard() {
        assert!(reference_tokens("Statement 2024").is_empty());
        assert!(reference_tokens("Statement 2030").is_empty());
        // Outside the guard range, a bare number is a reference again.
        assert_eq!(reference_tokens("Statement 2045"), vec!["2045"]);
    }

    #[test]
    fn reference_tokens_too_short() {
        assert!(reference_tokens("Row 42 seat 7").is_empty());
        assert!(reference_tokens("Gate A1").is_empty());
    }

    #[test]
    fn reference_tokens_dedup_keeps_order() {
        assert_eq!(
            reference_tokens("99821 then REF123A then 99821"),
            vec!["99821", "REF123A"]
        );
    }

    #[test]
    fn share_reference_token_exact_match_only() {
        assert!(share_reference_token("TRF INV-99821", "Invoice 99821 payment"));
        assert!(!share_reference_token("TRF INV-99821", "Invoice 99822 payment"));
        assert!(!share_reference_token("no refs here", "Invoice 99821"));
    }
}
