//! String helpers for previews in listings.

/// Collapse `s` onto a single line and cut it to at most `max_chars`
/// characters, appending `…` when anything was dropped.
pub fn preview(s: &str, max_chars: usize) -> String {
    let single_line = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let kept: String = single_line
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect();
    format!("{}…", kept.trim_end())
}
