//! Terminal UI utilities: status lines and the entry announcement box.
//!
//! # Examples
//!
//! ```no_run
//! use devhost::ui;
//!
//! ui::init_colors();
//! ui::success("Config resolved");
//! ```

mod entry_box;
mod messages;

pub use entry_box::{announce_entry, render_entry_box};
pub use messages::{info, success, warning};

/// Check if color output should be enabled.
///
/// Respects NO_COLOR and FORCE_COLOR environment variables, falls back to
/// terminal capability detection.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    console::user_attended_stderr()
}

/// Initialize color support based on environment.
///
/// Applies the NO_COLOR / FORCE_COLOR decision to both output streams.
pub fn init_colors() {
    let enabled = should_use_color();
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}

/// Turn colors off regardless of the environment (`--no-color`).
pub fn disable_colors() {
    console::set_colors_enabled(false);
    console::set_colors_enabled_stderr(false);
}
