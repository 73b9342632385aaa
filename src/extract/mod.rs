//! Table extraction and normalization engine.
//!
//! `classify` picks the rate tables out of a page, `rows` turns their rows
//! into records, `label` canonicalizes row labels and `numeric` reads the
//! prices out of noisy cell text.

pub mod classify;
pub mod label;
pub mod numeric;
pub mod rows;

pub use classify::{classify, ClassifiedTable, Classification, MatchKind};
pub use label::{LabelNormalizer, NormalizedLabel};
pub use numeric::{parse_decimal, try_parse_decimal};
pub use rows::extract_rows;
