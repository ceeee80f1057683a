//! Compact output rendering helpers for report cells.
//!
//! Keeps table cells bounded and single-line while preserving signal.

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        let trimmed: String = preview.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", trimmed)
    } else {
        preview
    }
}

/// Escape a value for use inside a markdown table cell.
pub fn md_cell(input: &str) -> String {
    input.replace('|', "\\|")
}

/// Left-justify to `width` display characters.
pub fn pad(input: &str, width: usize) -> String {
    let len = input.chars().count();
    if len >= width {
        input.to_string()
    } else {
        format!("{}{}", input, " ".repeat(width - len))
    }
}
