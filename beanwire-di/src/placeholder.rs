//! `${key}` placeholders, resolved against properties holders of a context.

pub const PREFIX: &str = "${";
pub const SUFFIX: &str = "}";

/// Checks if the whole text is a single placeholder.
#[inline]
pub fn is_placeholder(text: &str) -> bool {
    placeholder_key(text).is_some()
}

/// Extracts the key of a placeholder.
pub fn placeholder_key(text: &str) -> Option<&str> {
    text.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)
}

#[cfg(test)]
mod tests {
    use crate::placeholder::{is_placeholder, placeholder_key};

    #[test]
    fn should_detect_placeholders() {
        assert!(is_placeholder("${server.port}"));
        assert!(is_placeholder("${}"));
        assert!(!is_placeholder("$server.port"));
        assert!(!is_placeholder("prefix ${server.port}"));
        assert!(!is_placeholder("${"));
    }

    #[test]
    fn should_extract_keys() {
        assert_eq!(placeholder_key("${server.port}"), Some("server.port"));
        assert_eq!(placeholder_key("plain"), None);
    }
}
