use anyhow::Result;
use comfy_table::{Cell, Table};
use slackvault_traits::FileRef;

pub fn print_table(table: Table) -> Result<()> {
    println!("{table}");
    Ok(())
}

/// Truncate `text` to `max` characters on one line.
pub fn truncate(text: &str, max: usize) -> String {
    let line = text.replace('\n', " ");
    if line.chars().count() <= max {
        return line;
    }
    let cut: String = line.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Table describing written files.
pub fn file_table<'a>(files: impl IntoIterator<Item = &'a FileRef>) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["File", "Lines", "Bytes"]);
    for file in files {
        table.add_row(vec![
            Cell::new(file.path.display()),
            Cell::new(file.lines),
            Cell::new(file.bytes),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_text() {
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_truncate_flattens_newlines() {
        assert_eq!(truncate("a\nb", 10), "a b");
    }
}
