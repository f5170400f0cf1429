use colored::{ColoredString, Colorize};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let render = |cells: Vec<String>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:w$}", cell)
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", render(headers.iter().map(|h| h.to_string()).collect()));
    for row in rows {
        println!("{}", render(row));
    }
}

/// Prefix for startup banners.
pub fn progress_message() -> ColoredString {
    "==>".green()
}

/// Report a failed run the way every command does: red `Error:` and the
/// full cause chain on stderr.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red(), err);
}
