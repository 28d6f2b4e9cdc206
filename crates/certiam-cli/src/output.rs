//! Output formatting: aligned tables for people, JSON for scripts.

use serde::Serialize;
use serde_json::Value;

use certiam_core::utils::truncate_string;

/// Widest a table cell may get before it is truncated.
const MAX_CELL_WIDTH: usize = 48;

/// Types that can be printed either way.
pub trait Outputable {
    fn to_json(&self) -> Value;

    fn to_human(&self) -> String;
}

/// Print a value in the appropriate format.
pub fn print_output<T: Outputable>(value: &T, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&value.to_json())
                .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize: {}\"}}", e))
        );
    } else {
        println!("{}", value.to_human());
    }
}

/// Print a success message.
pub fn print_success(message: &str, json: bool) {
    if json {
        println!("{}", serde_json::json!({"status": "success", "message": message}));
    } else {
        println!("{}", message);
    }
}

/// JSON form of any serializable record.
pub fn json_of<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Render rows as a left-aligned table with a header rule.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate_string(c, MAX_CELL_WIDTH)).collect())
        .collect();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = vec![table_line(headers, &widths)];
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push(table_line(&rule.iter().map(String::as_str).collect::<Vec<_>>(), &widths));
    for row in &rows {
        out.push(table_line(&row.iter().map(String::as_str).collect::<Vec<_>>(), &widths));
    }
    out.join("\n")
}

fn table_line(cells: &[&str], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(c, w)| format!("{:<width$}", c, width = *w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Footer under a paged table.
pub fn page_footer(shown: usize, total: i64, page: u32, page_count: i64) -> String {
    format!("{} of {} (page {}/{})", shown, total, page, page_count.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(
            &["ID", "NAME"],
            &[vec!["1".into(), "edge".into()], vec!["200".into(), "api".into()]],
        );
        assert_eq!(table, "ID   NAME\n---  ----\n1    edge\n200  api");
    }

    #[test]
    fn test_render_table_truncates_wide_cells() {
        let wide = "x".repeat(80);
        let table = render_table(&["V"], &[vec![wide]]);
        assert!(table.lines().nth(2).unwrap().ends_with("..."));
        assert_eq!(table.lines().nth(2).unwrap().chars().count(), MAX_CELL_WIDTH);
    }

    #[test]
    fn test_page_footer() {
        assert_eq!(page_footer(10, 42, 1, 5), "10 of 42 (page 1/5)");
        assert_eq!(page_footer(0, 0, 1, 0), "0 of 0 (page 1/1)");
    }
}
