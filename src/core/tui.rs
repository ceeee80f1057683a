use colored::{Color, Colorize};
use std::env;

const MIN_BOX_WIDTH: usize = 40;
const MAX_BOX_WIDTH: usize = 60;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxStyle {
    Info,
    Success,
    Warning,
    Error,
}

impl BoxStyle {
    fn color(&self) -> Color {
        match self {
            BoxStyle::Info => Color::BrightCyan,
            BoxStyle::Success => Color::BrightGreen,
            BoxStyle::Warning => Color::BrightYellow,
            BoxStyle::Error => Color::BrightRed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
    Running,
    Info,
}

impl ItemStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ItemStatus::Pass => "✅",
            ItemStatus::Warn => "⚠️",
            ItemStatus::Fail => "❌",
            ItemStatus::Skipped => "⏭",
            ItemStatus::Running => "▶",
            ItemStatus::Info => "💡",
        }
    }

    fn color(&self) -> Color {
        match self {
            ItemStatus::Pass => Color::BrightGreen,
            ItemStatus::Warn => Color::BrightYellow,
            ItemStatus::Fail => Color::BrightRed,
            ItemStatus::Skipped => Color::BrightBlack,
            ItemStatus::Running | ItemStatus::Info => Color::Cyan,
        }
    }
}

pub fn terminal_width() -> usize {
    env::var("TERM_WIDTH")
        .ok()
        .and_then(|w| w.parse().ok())
        .or_else(|| env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .unwrap_or(80)
}

fn effective_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

pub fn box_top(width: usize) -> String {
    format!("╔{}╗", "═".repeat(width.saturating_sub(2)))
}

pub fn box_bottom(width: usize) -> String {
    format!("╚{}╝", "═".repeat(width.saturating_sub(2)))
}

pub fn box_row(left: &str, content: &str, right: &str, width: usize) -> String {
    let content_len = content.chars().count();
    let padding = width.saturating_sub(2).saturating_sub(content_len);
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;
    format!(
        "{}{}{}{}{}",
        left,
        " ".repeat(left_pad),
        content,
        " ".repeat(right_pad),
        right
    )
}

pub fn render_box(title: &str, subtitle: &str, style: BoxStyle) {
    let width = effective_width();
    let color = style.color();
    println!("{}", box_top(width).color(color));
    println!("{}", box_row("║", title, "║", width).color(color).bold());
    if !subtitle.is_empty() {
        println!("{}", box_row("║", subtitle, "║", width).color(color));
    }
    println!("{}", box_bottom(width).color(color));
}

/// Phase banner printed before a collaborator starts streaming.
pub fn print_phase_banner(title: &str) {
    println!();
    println!("{} {}", ItemStatus::Running.icon().cyan(), title.bold());
}

pub fn print_status_line(message: &str, status: ItemStatus) {
    println!(
        "  {} {}",
        status.icon().color(status.color()),
        message.bright_white()
    );
}

/// Fatal errors go to stderr in red before the process exits.
pub fn print_fatal(message: &str) {
    eprintln!("{} {}", "✖".bright_red().bold(), message.bright_red().bold());
}

pub fn print_list(items: &[&str]) {
    for item in items {
        println!("    • {}", item.bright_white());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_row_is_exactly_width_for_short_content() {
        let row = box_row("║", "Validation", "║", 40);
        assert_eq!(row.chars().count(), 40);
    }

    #[test]
    fn box_edges_match_width() {
        assert_eq!(box_top(40).chars().count(), 40);
        assert_eq!(box_bottom(40).chars().count(), 40);
    }
}
