//! Distinct dimension values for selector options

use std::collections::BTreeSet;

use crate::models::{Dimension, Scoped};

/// Pick the value of `dimension` from a record
pub fn dimension_value<R: Scoped>(record: &R, dimension: Dimension) -> &str {
    match dimension {
        Dimension::Product => record.product(),
        Dimension::Project => record.project(),
    }
}

/// Sorted, deduplicated values of `dimension` across `records`.
///
/// Ordering is byte-wise lexicographic so it does not depend on the host locale.
pub fn distinct_values<'a, R, I>(records: I, dimension: Dimension) -> Vec<String>
where
    R: Scoped + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records
        .into_iter()
        .map(|record| dimension_value(record, dimension))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}
