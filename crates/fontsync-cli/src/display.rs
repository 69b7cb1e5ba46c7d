//! Terminal rendering helpers

use console::style;

/// A simple fixed-width table
pub struct Table {
    title: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with the given title and column headers
    pub fn new(title: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; cell count should match the column count
    pub fn add_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Print the table to stdout
    pub fn print(&self) {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        println!();
        println!("{}", style(&self.title).bold().underlined());

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect();
        println!("  {}", style(header.join("  ")).bold());

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        println!("  {}", style(rule.join("  ")).dim());

        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:<w$}"))
                .collect();
            println!("  {}", line.join("  "));
        }
    }
}

/// Print an error list capped at `cap` entries with an "…and K more" trailer
pub fn print_error_list(errors: &[String], cap: usize) {
    if errors.is_empty() {
        return;
    }

    println!();
    println!("{}", style("Errors:").red().bold());
    for error in errors.iter().take(cap) {
        println!("  - {error}");
    }
    if errors.len() > cap {
        println!(
            "  {}",
            style(format!("...and {} more", errors.len() - cap)).dim()
        );
    }
}

/// Render a size in megabytes for table cells
pub fn format_size_mb(size_mb: f64) -> String {
    format!("{size_mb:.2} MB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_mb() {
        assert_eq!(format_size_mb(1.5), "1.50 MB");
        assert_eq!(format_size_mb(0.0), "0.00 MB");
    }
}
