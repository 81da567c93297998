//! Entry announcer: the resolved entry map in a double-bordered box.

use console::measure_text_width;
use devhost_config::{EntryMap, EntrySources};
use owo_colors::OwoColorize;

const TITLE: &str = "Auto Load Webpack Entry:";
const PAD_X: usize = 3;

/// Print the entry map box to stderr.
pub fn announce_entry(entry: &EntryMap) {
    eprintln!("{}", render_entry_box(entry, console::colors_enabled()));
}

/// Render the entry map box; `color` toggles ANSI styling.
pub fn render_entry_box(entry: &EntryMap, color: bool) -> String {
    let title = if color {
        TITLE.magenta().to_string()
    } else {
        TITLE.to_string()
    };

    let mut lines = vec![String::new(), title, String::new()];
    lines.extend(stringify_entry(entry));
    lines.push(String::new());

    let inner = lines.iter().map(|l| measure_text_width(l)).max().unwrap_or(0) + PAD_X * 2;
    let paint = |s: String| if color { s.yellow().to_string() } else { s };

    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(paint(format!("╔{}╗", "═".repeat(inner))));
    for line in &lines {
        let fill = inner - PAD_X - measure_text_width(line);
        out.push(format!(
            "{}{}{}{}{}",
            paint("║".to_string()),
            " ".repeat(PAD_X),
            line,
            " ".repeat(fill),
            paint("║".to_string())
        ));
    }
    out.push(paint(format!("╚{}╝", "═".repeat(inner))));
    out.join("\n")
}

/// Object-literal style listing, one bundle per line.
fn stringify_entry(entry: &EntryMap) -> Vec<String> {
    if entry.is_empty() {
        return vec!["{}".to_string()];
    }

    let mut lines = vec!["{".to_string()];
    let count = entry.len();
    for (idx, (name, sources)) in entry.iter().enumerate() {
        let comma = if idx + 1 < count { "," } else { "" };
        let key = quote_key(name);
        match sources {
            EntrySources::Single(path) => lines.push(format!("  {key}: '{path}'{comma}")),
            EntrySources::Many(paths) => {
                lines.push(format!("  {key}: ["));
                for (i, path) in paths.iter().enumerate() {
                    let sep = if i + 1 < paths.len() { "," } else { "" };
                    lines.push(format!("    '{path}'{sep}"));
                }
                lines.push(format!("  ]{comma}"));
            }
        }
    }
    lines.push("}".to_string());
    lines
}

fn quote_key(name: &str) -> String {
    let is_ident = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_ident {
        name.to_string()
    } else {
        format!("'{name}'")
    }
}
