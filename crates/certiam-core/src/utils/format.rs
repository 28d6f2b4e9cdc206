/// Truncate a string to a maximum length in characters, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None or empty
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or(default).to_string()
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if date.len() >= 10 && date.is_char_boundary(10) {
        // Keep the YYYY-MM-DD prefix
        date[..10].to_string()
    } else {
        date.to_string()
    }
}

/// Colon-grouped upper-case hex, e.g. `ab01cd` -> `AB:01:CD`.
/// Input that is not plain hex (after dropping colons and spaces) is returned as-is.
pub fn format_fingerprint(fingerprint: &str) -> String {
    let hex: String = fingerprint
        .chars()
        .filter(|c| *c != ':' && !c.is_whitespace())
        .collect();
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return fingerprint.to_string();
    }
    hex.to_ascii_uppercase()
        .as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("证书管理系统", 5), "证书...");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-03-07T10:00:00Z"), "Mar 07, 2025");
        assert_eq!(format_date("2025-03-07 10:00:00"), "2025-03-07");
        assert_eq!(format_date("soon"), "soon");
    }

    #[test]
    fn test_format_fingerprint() {
        assert_eq!(format_fingerprint("ab01cd"), "AB:01:CD");
        assert_eq!(format_fingerprint("AB:01:cd"), "AB:01:CD");
        assert_eq!(format_fingerprint("xyz"), "xyz");
        assert_eq!(format_fingerprint(""), "");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("x"), "-"), "x");
        assert_eq!(format_optional(Some(""), "-"), "-");
        assert_eq!(format_optional(None, "-"), "-");
    }
}
