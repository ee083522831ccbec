//! Coloured terminal rendering of an exported diff file.

use crate::diff::export::EXPORT_HEADER;
use crate::error::Result;
use console::Style;
use std::path::Path;

/// Line prefixes and the style each one is printed with, checked in order.
fn prefix_styles() -> [(&'static str, Style); 11] {
    [
        (EXPORT_HEADER, Style::new().cyan().bold()),
        ("Total changes:", Style::new().yellow()),
        ("+ Added:", Style::new().green()),
        ("- Deleted:", Style::new().red()),
        ("* Renamed:", Style::new().yellow().bright()),
        ("  http", Style::new().blue().bright()),
        ("  -", Style::new().red()),
        ("  +", Style::new().green()),
        ("Only in Local:", Style::new().cyan().bold()),
        ("Only in Remote:", Style::new().cyan().bold()),
        ("Title Changed:", Style::new().cyan().bold()),
    ]
}

/// Pick the style for one line of an exported diff.
pub fn style_for_line(line: &str) -> Style {
    if let Some((_, style)) = prefix_styles()
        .into_iter()
        .find(|(prefix, _)| line.starts_with(prefix))
    {
        return style;
    }

    if line.starts_with('+') {
        Style::new().green()
    } else if line.starts_with('-') {
        Style::new().red()
    } else if line.starts_with('*') {
        Style::new().yellow().bright()
    } else {
        Style::new()
    }
}

/// Print the diff file at `path` to stdout with colours.
pub fn print_colored(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    for line in content.lines() {
        println!("{}", style_for_line(line).apply_to(line));
    }
    Ok(())
}
