//! Terminal output utilities

use console::style;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print a warning message to stderr
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print a section header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print one numbered entry of the decorator chain
pub fn chain_entry(position: usize, name: &str) {
    println!("  {:>2}. {}", style(position).dim(), name);
}

/// Print a transaction journal line, colored by outcome
pub fn journal_entry(entry: &str) {
    let marker = journal_marker(entry);
    let styled = match marker {
        "+" => style(marker).green(),
        "-" => style(marker).red(),
        _ => style(marker).blue(),
    };
    println!("  {} {}", styled, entry);
}

fn journal_marker(entry: &str) -> &'static str {
    if entry.starts_with("commit") {
        "+"
    } else if entry.starts_with("rollback") || entry.contains("failed") {
        "-"
    } else {
        "·"
    }
}
