//! Small text and time helpers shared by the store, the source and the CLI.

/// Trim optional text, mapping blank values to `None`.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Whether an endpoint carries an `http://` or `https://` scheme.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Response body excerpt for error messages (at most 180 characters).
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// ASCII digits of `value`, in order.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Label equality as users type it: surrounding spaces and ASCII case ignored.
pub fn same_label(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_drops_blank_values() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some(" \t ".to_string())), None);
        assert_eq!(
            normalize_text_option(Some(" sheet-1 ".to_string())),
            Some("sheet-1".to_string())
        );
    }

    #[test]
    fn is_http_url_requires_scheme() {
        assert!(is_http_url("http://localhost:8080/leads"));
        assert!(is_http_url("https://leads.example.com"));
        assert!(!is_http_url("ftp://leads.example.com"));
        assert!(!is_http_url("leads.example.com"));
    }

    #[test]
    fn compact_text_limits_length() {
        assert_eq!(compact_text(&"x".repeat(500)).len(), 180);
        assert_eq!(compact_text("  Sheet not found \n"), "Sheet not found");
    }

    #[test]
    fn digits_only_strips_formatting() {
        assert_eq!(digits_only("+91 (987) 654-3210"), "919876543210");
        assert_eq!(digits_only("n/a"), "");
    }

    #[test]
    fn same_label_ignores_case_and_padding() {
        assert!(same_label(" deal done", "Deal Done "));
        assert!(!same_label("Deal", "Deal Done"));
    }
}
