use crate::extract::label::collapse_whitespace;
use crate::types::RawTable;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("table selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("row selector"));

/// Every `<table>` in the markup, in document order, as rows of cell text.
///
/// Rows and cells belong to their nearest enclosing table, so a nested
/// table shows up as its own entry rather than leaking into its parent.
/// Each nested table records the index of the table around it.
pub fn parse_tables(html: &str) -> Vec<RawTable> {
    let document = Html::parse_document(html);
    let elements: Vec<ElementRef<'_>> = document.select(&TABLE).collect();
    let ids: Vec<_> = elements.iter().map(|t| t.id()).collect();

    let tables: Vec<RawTable> = elements
        .iter()
        .map(|table| {
            let raw = table_rows(*table);
            let parent = nearest_table(*table)
                .and_then(|outer| ids.iter().position(|id| *id == outer.id()));
            match parent {
                Some(index) => raw.nested_in(index),
                None => raw,
            }
        })
        .collect();
    debug!("parse_tables: html_len={} tables={}", html.len(), tables.len());
    tables
}

fn table_rows(table: ElementRef<'_>) -> RawTable {
    let rows = table
        .select(&ROW)
        .filter(|row| nearest_table(*row).map(|t| t.id()) == Some(table.id()))
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| collapse_whitespace(&cell.text().collect::<Vec<_>>().join(" ")))
                .collect()
        })
        .collect();
    RawTable::new(rows)
}

fn nearest_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}
