//! Terminal output for the tmd CLI.

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tmd_core::{ModelError, Severity};

pub mod colors {
    use console::Color;

    pub const CYAN: Color = Color::Color256(51);
    pub const MAGENTA: Color = Color::Color256(201);
    pub const AMBER: Color = Color::Color256(214);
    pub const NEON_GREEN: Color = Color::Color256(82);
    pub const DIM: Color = Color::Color256(240);
}

pub mod symbols {
    pub const DIAMOND: &str = "\u{25C6}"; // ◆
    pub const DIAMOND_OUTLINE: &str = "\u{25C7}"; // ◇
    pub const TARGET_FILLED: &str = "\u{25C9}"; // ◉
    pub const TRIANGLE: &str = "\u{25B8}"; // ▸
    pub const DOT: &str = "\u{00B7}"; // ·
}

/// OSC 8 hyperlink to a model file location.
pub fn file_link(path: &Path, line: usize) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let uri = format!("file://{}#{}", absolute.display(), line);
    let display = format!("{}:{}", path.display(), line);
    format!("\x1b]8;;{}\x07{}\x1b]8;;\x07", uri, display)
}

/// Compact header shown before long-running commands.
pub fn header(version: &str) {
    println!(
        "  {} {} {}",
        style(symbols::DIAMOND).fg(colors::CYAN),
        style("tmd").fg(colors::CYAN).bold(),
        style(version).dim()
    );
    println!();
}

pub fn success(msg: &str) {
    println!("  {} {}", style(symbols::TARGET_FILLED).fg(colors::NEON_GREEN), msg);
}

pub fn error(msg: &str) {
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA),
        style(msg).fg(colors::MAGENTA)
    );
}

pub fn info(msg: &str) {
    println!("  {} {}", style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN), msg);
}

pub fn dim(msg: &str) {
    println!("  {}", style(msg).fg(colors::DIM));
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("\u{25CE}\u{25C9}\u{25CE}\u{25C9}") // ◎◉◎◉
        .template("  {spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(150));
    pb
}

/// One diagnostic, with its location when the offending reference is known.
pub fn diagnostic(error: &ModelError) {
    let (marker, color) = match error.severity {
        Severity::Error => (symbols::DIAMOND, colors::MAGENTA),
        Severity::Warning => (symbols::DIAMOND_OUTLINE, colors::AMBER),
    };

    println!(
        "  {} {} {}",
        style(marker).fg(color),
        style(error.kind.code()).fg(color).bold(),
        error.message
    );

    let location = match &error.reference {
        Some(reference) => file_link(&reference.span.file, reference.span.line),
        None => error.file.clone(),
    };
    println!(
        "    {} {} {} {}",
        style(symbols::TRIANGLE).fg(colors::DIM),
        style(location).fg(colors::DIM),
        style(symbols::DOT).fg(colors::DIM),
        style(&error.element).fg(colors::DIM)
    );
}

pub fn timing(label: &str, duration_ms: u128) {
    println!(
        "  {} {} in {}ms",
        style(symbols::DIAMOND_OUTLINE).fg(colors::CYAN),
        label,
        duration_ms
    );
}

/// Header printed above a rejected model.
pub fn nope_header() {
    println!();
    println!(
        "  {} {}",
        style(symbols::DIAMOND).fg(colors::MAGENTA).bold(),
        style("Nope.").fg(colors::MAGENTA).bold()
    );
    println!();
}

pub fn looking_good() {
    println!(
        "  {} {}",
        style(symbols::TARGET_FILLED).fg(colors::NEON_GREEN),
        style("Looking good.").bold()
    );
}

/// "1 error", "3 warnings", "2 classes".
pub fn plural(count: usize, noun: &str) -> String {
    match count {
        1 => format!("{count} {noun}"),
        _ if noun.ends_with('s') => format!("{count} {noun}es"),
        _ => format!("{count} {noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_link_format() {
        let link = file_link(Path::new("Users.tmd"), 12);
        assert!(link.contains("Users.tmd:12"));
        assert!(link.starts_with("\x1b]8;;file://"));
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "error"), "1 error");
        assert_eq!(plural(0, "error"), "0 errors");
        assert_eq!(plural(3, "warning"), "3 warnings");
        assert_eq!(plural(2, "class"), "2 classes");
    }
}
