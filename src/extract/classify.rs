use crate::config::{HeaderSkipStrategy, VendorProfile};
use crate::types::{Category, RawTable};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// How a table came to be chosen for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Its text carried the category's signature.
    Signature,
    /// No table matched; the first table passed post-hoc validation.
    PositionalFallback,
}

/// A table picked for one category.
#[derive(Debug, Clone, Copy)]
pub struct ClassifiedTable<'a> {
    /// Position in document order.
    pub index: usize,
    pub table: &'a RawTable,
    pub kind: MatchKind,
    /// Header handling that applies to this table.
    pub header_skip: HeaderSkipStrategy,
}

pub type Classification<'a> = BTreeMap<Category, Option<ClassifiedTable<'a>>>;

/// Decides which table holds which rate category.
///
/// The first table in document order whose text carries a category's
/// signature wins, so a new table above the real one can steal the match.
/// A match nested inside the winner takes its place, since a layout table
/// wrapping the rate tables carries their text too.
pub fn classify<'a>(tables: &'a [RawTable], profile: &VendorProfile) -> Classification<'a> {
    let texts: Vec<String> = tables.iter().map(RawTable::text).collect();
    let mut out = Classification::new();

    for category in &profile.categories {
        let matches: Vec<usize> = texts
            .iter()
            .enumerate()
            .filter(|(_, text)| category.signature.matches(text))
            .map(|(i, _)| i)
            .collect();

        let chosen = match innermost_first_match(tables, &matches) {
            Some(index) => {
                let ignored: Vec<usize> = matches.into_iter().filter(|i| *i != index).collect();
                if !ignored.is_empty() {
                    warn!(
                        "{}: {} also matched tables {:?}; keeping table {}",
                        profile.vendor_id, category.category, ignored, index
                    );
                }
                Some((index, MatchKind::Signature))
            }
            None if profile.primary_category == Some(category.category) => {
                positional_fallback(&texts, profile, category.category)
            }
            None => None,
        };

        let classified = chosen.map(|(index, kind)| ClassifiedTable {
            index,
            table: &tables[index],
            kind,
            header_skip: header_skip_for(index, profile.header_skip),
        });

        match &classified {
            Some(c) => info!(
                "{}: {} -> table {} ({:?}, {} rows)",
                profile.vendor_id,
                category.category,
                c.index,
                c.kind,
                c.table.rows.len()
            ),
            None => warn!(
                "{}: no table classified as {} among {} tables",
                profile.vendor_id,
                category.category,
                tables.len()
            ),
        }
        out.insert(category.category, classified);
    }

    out
}

/// The first match, swapped for the first match nested inside it for as
/// long as there is one.
fn innermost_first_match(tables: &[RawTable], matches: &[usize]) -> Option<usize> {
    let mut chosen = *matches.first()?;
    while let Some(inner) = matches
        .iter()
        .copied()
        .find(|&i| i > chosen && is_nested_in(tables, i, chosen))
    {
        chosen = inner;
    }
    Some(chosen)
}

fn is_nested_in(tables: &[RawTable], index: usize, ancestor: usize) -> bool {
    let mut child = index;
    // parents always precede their children; anything else ends the walk
    while let Some(parent) = tables.get(child).and_then(|t| t.parent).filter(|p| *p < child) {
        if parent == ancestor {
            return true;
        }
        child = parent;
    }
    false
}

/// First table in the document, kept only if it passes the fallback check.
fn positional_fallback(
    texts: &[String],
    profile: &VendorProfile,
    category: Category,
) -> Option<(usize, MatchKind)> {
    let first = texts.first()?;
    let signature = profile.category(category)?.fallback_signature();
    if signature.matches(first) {
        debug!("{}: first table accepted as {} by position", profile.vendor_id, category);
        Some((0, MatchKind::PositionalFallback))
    } else {
        debug!(
            "{}: first table failed validation as {}; skipping category",
            profile.vendor_id, category
        );
        None
    }
}

/// Only the first table in the document has a header row we can trust by
/// position; anything found further down is filtered by content.
fn header_skip_for(index: usize, configured: HeaderSkipStrategy) -> HeaderSkipStrategy {
    if index == 0 {
        configured
    } else {
        HeaderSkipStrategy::ByContentFilter
    }
}
