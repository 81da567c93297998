//! Status message functions for terminal output.

use owo_colors::OwoColorize;

/// Print a success message to stderr.
///
/// # Examples
///
/// ```no_run
/// use devhost::ui::success;
///
/// success("Config resolved");
/// ```
pub fn success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message.yellow());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        // These should not panic
        success("Success message");
        info("Info message");
        warning("Warning message");
    }
}
