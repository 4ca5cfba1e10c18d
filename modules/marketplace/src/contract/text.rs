//! Text forms shared by the Bridge, the store and client caches.
//!
//! Titles, descriptions and conditions are stored with markup characters
//! escaped. Filters and lookups compare on [`fold`]ed keys so every backend
//! agrees on case-insensitivity, including outside ASCII.

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses one level of [`escape_html`].
pub fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Escaped form of text that may already have been escaped once, e.g. a title
/// a client read back and resubmitted.
pub fn canonical_escape(input: &str) -> String {
    escape_html(&unescape_html(input))
}

/// Trimmed, Unicode lower-cased comparison key.
pub fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Key searched by free-text filters: folded title and description joined by
/// a separator no search term contains.
pub fn search_key(title: &str, description: &str) -> String {
    format!("{}\u{1f}{}", fold(title), fold(description))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_reverses_one_level() {
        assert_eq!(unescape_html("Tom &amp; Jerry &lt;3 &#x27;DVD&#x27;"), "Tom & Jerry <3 'DVD'");
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
    }

    #[test]
    fn canonical_escape_is_stable() {
        let once = canonical_escape("Tom & Jerry");
        assert_eq!(once, "Tom &amp; Jerry");
        assert_eq!(canonical_escape(&once), once);
        assert_eq!(canonical_escape("Men's <b>"), "Men&#x27;s &lt;b&gt;");
    }

    #[test]
    fn fold_handles_non_ascii() {
        assert_eq!(fold(" ÉLECTRONIQUE "), "électronique");
        assert_eq!(search_key("Étagère", "Pine"), "étagère\u{1f}pine");
    }
}
