use once_cell::sync::Lazy;
use regex::Regex;

static UNSAFE_FILENAME_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).expect("filename pattern is valid")
});

const MAX_FILENAME_LEN: usize = 100;

/// `mm:ss`, or `hh:mm:ss` from one hour up. Zero reads as `N/A`.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "N/A".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

pub fn sanitize_filename(name: &str) -> String {
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(name, "_");
    let trimmed = replaced.trim_matches(|c: char| c == ' ' || c == '.');
    trimmed.chars().take(MAX_FILENAME_LEN).collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "N/A");
        assert_eq!(format_duration(95), "01:35");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(3725), "01:02:05");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report: 05/2024?.csv"), "report_ 05_2024_.csv");
        assert_eq!(sanitize_filename("  ..hidden.. "), "hidden");
        assert_eq!(sanitize_filename(&"x".repeat(150)).len(), 100);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>Tom & \"Jerry\"</b>"), "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");
    }
}
