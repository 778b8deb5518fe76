//! HTML table extraction.
//!
//! The payment-method collaborator arrives as a page containing one or
//! more <table> elements. Policy: the first table in document order is
//! used and the rest are ignored — a fixed choice, not an error.

use crate::{
    error::{EtlError, EtlResult},
    table::{Table, Value},
};
use scraper::{Html, Selector};
use std::path::Path;

/// Render a table as a minimal page with a single <table> element.
/// The pipeline only consumes HTML; this writer exists for the
/// external-fixture tool and the tests.
pub fn write_table(path: &Path, table: &Table) -> EtlResult<()> {
    let mut page = String::from("<html>\n<body>\n<table>\n<tr>");
    for name in table.schema().names() {
        page.push_str(&format!("<th>{name}</th>"));
    }
    page.push_str("</tr>\n");
    for row in table.rows() {
        page.push_str("<tr>");
        for value in row {
            page.push_str(&format!("<td>{value}</td>"));
        }
        page.push_str("</tr>\n");
    }
    page.push_str("</table>\n</body>\n</html>\n");
    std::fs::write(path, page)?;
    Ok(())
}

pub fn read_first_table(path: &Path, name: &str) -> EtlResult<Table> {
    let html = std::fs::read_to_string(path)?;
    let document = Html::parse_document(&html);
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("th, td").unwrap();

    let table_el = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| EtlError::NoHtmlTable {
            path: path.to_path_buf(),
        })?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<Value>> = Vec::new();
    for tr in table_el.select(&row_selector) {
        let cells: Vec<String> = tr
            .select(&cell_selector)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        if cells.is_empty() {
            continue;
        }
        if headers.is_empty() {
            headers = cells;
        } else {
            rows.push(cells.iter().map(|s| Value::infer(s)).collect());
        }
    }
    Ok(Table::from_inferred(name, headers, rows))
}
