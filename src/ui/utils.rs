/// Format a count with thousands separators, e.g. `12847` -> `12,847`
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Upper-case the first character, leave the rest untouched
pub fn capitalize(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Shrink a string to at most `max` characters, marking the cut with `…`
pub fn truncate(raw: &str, max: usize) -> String {
    if raw.chars().count() <= max {
        return raw.to_string();
    }
    let mut out: String = raw.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_grouped(0), "0");
        assert_eq!(format_grouped(156), "156");
        assert_eq!(format_grouped(3456), "3,456");
        assert_eq!(format_grouped(12847), "12,847");
        assert_eq!(format_grouped(1_000_000), "1,000,000");
        assert_eq!(format_grouped(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn capitalizes_first_letter() {
        assert_eq!(capitalize("running"), "Running");
        assert_eq!(capitalize("x"), "X");
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("éclair"), "Éclair");
    }

    #[test]
    fn truncates_long_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long message", 6), "a lon…");
    }
}
