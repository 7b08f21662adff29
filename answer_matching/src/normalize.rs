use deunicode::deunicode_char;

/// Turns an answer or a lookup key into a form suitable for "slightly fuzzy"
/// equality.
///
/// The key is transliterated to ASCII (`"Fóo"` is `"foo"`, `"Да"` is `"da"`,
/// an en-dash is a `-`), lower-cased and stripped of any character that is not
/// a letter, a digit, a space or one of `%-.,<>()`. Letters without a
/// transliteration are kept as they are. Runs of whitespace collapse to a
/// single space and the ends are trimmed.
///
/// ```
/// use answer_matching::normalize::key_for_fuzzy_lookup;
///
/// assert_eq!(key_for_fuzzy_lookup(" Qux! "), "qux");
/// assert_eq!(key_for_fuzzy_lookup("Fóo*"), "foo");
/// assert_eq!(key_for_fuzzy_lookup("30-40 %"), "30-40 %");
/// assert_eq!(key_for_fuzzy_lookup("Нет"), "net");
/// ```
pub fn key_for_fuzzy_lookup(key: &str) -> String {
    let mut transliterated = String::with_capacity(key.len());
    for c in key.chars() {
        match deunicode_char(c) {
            Some(ascii) => transliterated.push_str(ascii),
            None => transliterated.push(c),
        }
    }
    let filtered: String = transliterated
        .to_lowercase()
        .chars()
        .filter(|c| is_key_char(*c))
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || c.is_whitespace()
        || matches!(c, '%' | '-' | '.' | ',' | '<' | '>' | '(' | ')')
        || (!c.is_ascii() && c.is_alphanumeric())
}
