/// Lower-cases the text and joins its ASCII alphanumeric runs with `-`.
///
/// `"Fall Sale!"` becomes `"fall-sale"`, text without alphanumerics becomes `""`.
pub fn slugify(text: &str) -> String {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Turns a page slug into a display name, `"ignite-marketing.co"` becomes `"Ignite Marketing Co"`.
pub fn humanize(slug: &str) -> String {
    slug.split(|c: char| matches!(c, '-' | '_' | '.' | '+') || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Makes a file name safe for archive paths while keeping its extension readable.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches('.');

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized.to_string()
    }
}
