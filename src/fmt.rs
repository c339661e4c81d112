//! Shared formatting helpers for text output.
//!
//! Sizes appear both in table cells and in the summary title, so
//! [`format_mb`] takes a [`FmtStyle`].

/// Controls compact (table columns) vs verbose (summary line) output.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FmtStyle {
    /// Compact: short suffixes ("0.30M", "1.5G")
    Compact,
    /// Detail: spaced, full suffixes ("0.30 MB", "1.5 GB")
    Detail,
}

/// Session runtime for a table column: `"42s"`, `"3m05s"`, `"2h10m"`, `"1d3h"`.
///
/// Fractions of a second are dropped. Negative input renders as `"-"`.
pub fn format_duration(secs: f64) -> String {
    if secs < 0.0 || !secs.is_finite() {
        return "-".to_string();
    }
    let secs = secs as u64;
    match secs {
        0..60 => format!("{}s", secs),
        60..3600 => format!("{}m{:02}s", secs / 60, secs % 60),
        3600..86400 => format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60),
        _ => format!("{}d{}h", secs / 86400, (secs % 86400) / 3600),
    }
}

/// Format a size given in MB.
///
/// Compact: `"512.00M"`, `"1.5G"`
/// Detail:  `"512.00 MB"`, `"1.5 GB"`
pub fn format_mb(mb: f64, style: FmtStyle) -> String {
    let (g, m) = match style {
        FmtStyle::Compact => ("G", "M"),
        FmtStyle::Detail => (" GB", " MB"),
    };
    if mb >= 1024.0 {
        format!("{:.1}{}", mb / 1024.0, g)
    } else {
        format!("{:.2}{}", mb, m)
    }
}

/// Format an optional percentage; `"-"` when absent.
pub fn format_opt_pct(pct: Option<f64>) -> String {
    match pct {
        Some(p) => format!("{:.1}%", p),
        None => "-".to_string(),
    }
}

/// Truncate to `max_chars` characters, marking the cut with `…`.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Puts SQL text on one line: every whitespace run becomes a single space,
/// leading and trailing whitespace is dropped.
pub fn normalize_for_display(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_durations() {
        assert_eq!(format_duration(42.9), "42s");
        assert_eq!(format_duration(185.0), "3m05s");
        assert_eq!(format_duration(7800.0), "2h10m");
        assert_eq!(format_duration(97200.0), "1d3h");
        assert_eq!(format_duration(-1.0), "-");
    }

    #[test]
    fn mb_sizes() {
        assert_eq!(format_mb(0.3, FmtStyle::Compact), "0.30M");
        assert_eq!(format_mb(1536.0, FmtStyle::Detail), "1.5 GB");
    }

    #[test]
    fn optional_percent() {
        assert_eq!(format_opt_pct(Some(12.345)), "12.3%");
        assert_eq!(format_opt_pct(None), "-");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("Médio impacto", 6), "Médio…");
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn display_normalization() {
        assert_eq!(
            normalize_for_display("  SELECT *\n\tFROM   t\r\n"),
            "SELECT * FROM t"
        );
    }
}
