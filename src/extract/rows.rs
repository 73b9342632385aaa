use super::classify::ClassifiedTable;
use super::label::{collapse_whitespace, LabelNormalizer};
use super::numeric::parse_decimal;
use crate::config::{CategoryProfile, HeaderSkipStrategy, VendorProfile};
use crate::types::{RateRecord, RawRow, Sides};
use metrics::counter;
use tracing::debug;

/// Walks a classified table and yields one record per usable row.
///
/// Header rows are skipped by position or by content, rows too short for
/// the category are ignored, and rows without a readable buy price (or sell
/// price, when the category quotes both) are dropped without error.
pub fn extract_rows(
    classified: &ClassifiedTable<'_>,
    category: &CategoryProfile,
    profile: &VendorProfile,
) -> Vec<RateRecord> {
    let normalizer = LabelNormalizer::for_vendor(profile);
    let rows = &classified.table.rows;
    let skip = match classified.header_skip {
        HeaderSkipStrategy::ByPosition => 1,
        HeaderSkipStrategy::ByContentFilter => 0,
    };

    let mut records = Vec::new();
    for (i, row) in rows.iter().enumerate().skip(skip) {
        if classified.header_skip == HeaderSkipStrategy::ByContentFilter
            && is_header_row(row, &category.header_tokens)
        {
            debug!("{} row {}: header/noise row skipped", category.category, i);
            continue;
        }
        match extract_row(row, category, profile, &normalizer) {
            Some(record) => records.push(record),
            None => {
                debug!("{} row {}: dropped {:?}", category.category, i, row);
                counter!("gold_rates_rows_dropped_total", "vendor" => profile.vendor_id.clone())
                    .increment(1);
            }
        }
    }
    records
}

fn extract_row(
    row: &RawRow,
    category: &CategoryProfile,
    profile: &VendorProfile,
    normalizer: &LabelNormalizer<'_>,
) -> Option<RateRecord> {
    if row.len() < category.sides.min_cells() {
        return None;
    }

    let label = collapse_whitespace(&row[0]);
    if label.is_empty() {
        return None;
    }
    let we_buy = parse_decimal(&row[1])?;
    let we_sell = match category.sides {
        Sides::TwoSided => Some(parse_decimal(&row[2])?),
        Sides::OneSided => None,
    };

    let normalized = normalizer.normalize(category.category, &label);
    Some(RateRecord {
        vendor_id: profile.vendor_id.clone(),
        category: category.category,
        detail_name: normalized.detail_name,
        we_buy,
        we_sell,
        purity: normalized.purity,
    })
}

/// Blank label, or a label carrying one of the category's banner tokens.
fn is_header_row(row: &RawRow, header_tokens: &[String]) -> bool {
    let Some(first) = row.first() else {
        return true;
    };
    let label = first.trim();
    label.is_empty() || header_tokens.iter().any(|t| label.contains(t.as_str()))
}
