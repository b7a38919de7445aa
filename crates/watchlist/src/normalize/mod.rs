//! Free-text canonicalization shared by indexing and querying.
//!
//! Both sides of every comparison go through [`tokenize`], so a query typed as
//! `"Müller-Lüdenscheidt, GmbH."` and a list entry stored as `"MULLER LUDENSCHEIDT GMBH"`
//! end up as the same token sequence. Legal-form words are kept on purpose: they are often
//! the only difference between two listed companies.

pub mod address;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Splits `text` into lowercase ASCII-folded alphanumeric tokens, preserving order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut folded = String::with_capacity(text.len());

    for ch in text.nfkd() {
        for lower in ch.to_lowercase() {
            if is_combining_mark(lower) {
                continue;
            }
            match transliterate(lower) {
                Some(replacement) => folded.push_str(replacement),
                None if lower.is_alphanumeric() => folded.push(lower),
                None => folded.push(' '),
            }
        }
    }

    folded.split_whitespace().map(str::to_string).collect()
}

/// Tokens re-joined with single spaces.
pub fn normalize(text: &str) -> String {
    tokenize(text).join(" ")
}

// Letters with no canonical decomposition into a base Latin letter.
fn transliterate(ch: char) -> Option<&'static str> {
    let replacement = match ch {
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        'ø' => "o",
        'đ' | 'ð' => "d",
        'ł' => "l",
        'þ' => "th",
        'ı' => "i",
        _ => return None,
    };
    Some(replacement)
}

/// Individuals are listed surname-first (`"AL-ZAWAHIRI, Dr. Ayman"`); queries are
/// usually typed given-name-first, so the two halves are swapped before indexing.
pub fn reorder_sdn_name(name: &str, sdn_type: &str) -> String {
    if !sdn_type.trim().eq_ignore_ascii_case("individual") {
        return name.trim().to_string();
    }

    match name.split_once(',') {
        Some((last, first)) if !first.trim().is_empty() && !last.trim().is_empty() => {
            format!("{} {}", first.trim(), last.trim())
        }
        _ => name.trim().to_string(),
    }
}

const SKIPPED_REMARK_PREFIXES: &[&str] = &[
    "dob",
    "pob",
    "nationality",
    "citizen",
    "gender",
    "email",
    "website",
    "phone",
    "alt.",
    "a.k.a",
    "f.k.a",
];

/// Pulls document numbers (passports, tax IDs, registration numbers) out of a remarks
/// field such as `"Passport 5892464 (Iraq); DOB 1950; nationality Iraq."`.
pub fn extract_identifiers(remarks: &str) -> Vec<String> {
    let mut identifiers: Vec<String> = Vec::new();

    for segment in remarks.split(';') {
        let segment = segment.trim();
        let lowered = segment.to_ascii_lowercase();
        if SKIPPED_REMARK_PREFIXES
            .iter()
            .any(|prefix| lowered.starts_with(prefix))
        {
            continue;
        }

        for raw in segment.split_whitespace() {
            if raw.starts_with('(') {
                continue;
            }
            let candidate = raw.trim_matches(|c: char| !c.is_ascii_alphanumeric());
            let has_digit = candidate.chars().any(|c| c.is_ascii_digit());
            let well_formed = candidate
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/');
            if has_digit
                && well_formed
                && candidate.len() >= 4
                && !identifiers.iter().any(|known| known == candidate)
            {
                identifiers.push(candidate.to_string());
            }
        }
    }

    identifiers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_folds_case_diacritics_and_punctuation() {
        assert_eq!(
            tokenize("Müller-Lüdenscheidt, GmbH."),
            vec!["muller", "ludenscheidt", "gmbh"]
        );
        assert_eq!(tokenize("AL-ZAWAHIRI, Dr. Ayman"), vec!["al", "zawahiri", "dr", "ayman"]);
        assert_eq!(tokenize("Straße Øresund"), vec!["strasse", "oresund"]);
        assert_eq!(tokenize("İstanbul ﬁnance"), vec!["istanbul", "finance"]);
    }

    #[test]
    fn tokenize_keeps_legal_suffixes() {
        assert_eq!(tokenize("Acme Trading LTD"), vec!["acme", "trading", "ltd"]);
        assert_eq!(tokenize("MIDCO FINANCE S.A."), vec!["midco", "finance", "s", "a"]);
    }

    #[test]
    fn tokenize_replaces_symbols_and_emoji_with_separators() {
        assert_eq!(tokenize("🏠 123 Happy St"), vec!["123", "happy", "st"]);
        assert_eq!(tokenize("a│b─c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize("!@#$%^&*()_+"), Vec::<String>::new());
    }

    #[test]
    fn tokenize_handles_empty_and_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n  \t").is_empty());
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        let samples = [
            "I.C. SOGO KENKYUSHO",
            "1234 El Niño Ave\nSan José, CA 95112",
            "50 北京路 上海, 200001",
            "Münchner Straße 45",
            "C/O Jane Smith",
            "",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "normalize not idempotent for {sample:?}");
        }
    }

    #[test]
    fn normalize_keeps_non_latin_letters() {
        assert_eq!(normalize("50 北京路"), "50 北京路");
    }

    #[test]
    fn reorder_swaps_individual_names_only() {
        assert_eq!(
            reorder_sdn_name("AL-ZAWAHIRI, Dr. Ayman", "individual"),
            "Dr. Ayman AL-ZAWAHIRI"
        );
        assert_eq!(
            reorder_sdn_name("MIDCO FINANCE, S.A.", "entity"),
            "MIDCO FINANCE, S.A."
        );
        assert_eq!(reorder_sdn_name("MADONNA", "individual"), "MADONNA");
        assert_eq!(reorder_sdn_name("TRAILING,", "individual"), "TRAILING,");
    }

    #[test]
    fn extract_identifiers_reads_document_numbers() {
        let remarks = "DOB 19 Jun 1951; POB Giza, Egypt; Passport 1084010 (Egypt); alt. Passport 19820215; Operational and Military Leader of JIHAD GROUP.";
        assert_eq!(extract_identifiers(remarks), vec!["1084010"]);

        let remarks = "US FEIN CH-660-0-469-982-0 (United States); Switzerland.";
        assert_eq!(extract_identifiers(remarks), vec!["CH-660-0-469-982-0"]);

        assert!(extract_identifiers("").is_empty());
        assert!(extract_identifiers("Linked To: ABC GROUP.").is_empty());
    }

    #[test]
    fn extract_identifiers_deduplicates() {
        let remarks = "Cedula No. 10517860 (Colombia); NIT # 10517860-1; Cedula No. 10517860";
        assert_eq!(extract_identifiers(remarks), vec!["10517860", "10517860-1"]);
    }
}
