//! Latin script detection and transliteration.

/// Whether every letter in `value` belongs to the Latin script.
///
/// Digits, punctuation, whitespace and combining marks are script neutral.
#[must_use]
pub fn is_latin_script(value: &str) -> bool {
    value.chars().all(|c| !c.is_alphabetic() || is_latin_letter(c))
}

const fn is_latin_letter(c: char) -> bool {
    matches!(
        c,
        'A'..='Z'
            | 'a'..='z'
            | '\u{00AA}'
            | '\u{00BA}'
            | '\u{00C0}'..='\u{00D6}'
            | '\u{00D8}'..='\u{00F6}'
            | '\u{00F8}'..='\u{024F}'
            | '\u{1E00}'..='\u{1EFF}'
            | '\u{2C60}'..='\u{2C7F}'
            | '\u{A720}'..='\u{A7FF}'
            | '\u{AB30}'..='\u{AB6F}'
            | '\u{FB00}'..='\u{FB06}'
            | '\u{FF21}'..='\u{FF3A}'
            | '\u{FF41}'..='\u{FF5A}'
    )
}

/// Latin transliteration of `value`.
#[must_use]
pub fn transliterate(value: &str) -> String {
    deunicode::deunicode(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_detection() {
        assert!(is_latin_script("García-Müller"));
        assert!(is_latin_script("O'Brien 3rd"));
        assert!(!is_latin_script("Παπαδόπουλος"));
        assert!(!is_latin_script("Иванов"));
    }

    #[test]
    fn transliteration_produces_latin() {
        let latin = transliterate("Παπαδόπουλος");
        assert!(is_latin_script(&latin));
        assert!(!latin.is_empty());
    }
}
