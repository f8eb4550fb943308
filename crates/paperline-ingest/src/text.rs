use std::borrow::Cow;

/// Collapses every run of whitespace into a single space.
///
/// Leading and trailing whitespace is collapsed too, not removed; use
/// [`clean_text`] for the trimmed form.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(ch);
            in_run = false;
        }
    }
    out
}

pub fn clean_text(input: &str) -> String {
    collapse_whitespace(input.trim())
}

/// Percent-decodes a URL, keeping the input untouched when it is not valid UTF-8 once decoded.
pub fn decode_url(url: &str) -> String {
    urlencoding::decode(url)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| url.to_string())
}
