/// Year-bucketed view of the album
///
/// Buckets keep insertion order inside; the buckets themselves are ordered
/// numeric years first (newest first), then any other labels, then the
/// fallback bucket.
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::Memory;

/// Bucket for memories without a year
pub const FALLBACK_YEAR: &str = "Purani Yaadein";

#[derive(Debug, Clone, Serialize)]
pub struct YearGroup {
    pub label: String,
    pub memories: Vec<Memory>,
}

/// Label a memory is filed under
pub fn year_label(memory: &Memory) -> &str {
    let year = memory.year.trim();
    if year.is_empty() {
        FALLBACK_YEAR
    } else {
        year
    }
}

/// Leading integer of a label, if it starts with one
fn parse_year(label: &str) -> Option<i64> {
    let s = label.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Ordering of bucket labels for display
pub fn compare_year_labels(a: &str, b: &str) -> Ordering {
    match (a == FALLBACK_YEAR, b == FALLBACK_YEAR) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    match (parse_year(a), parse_year(b)) {
        (Some(ya), Some(yb)) => yb.cmp(&ya).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn group_by_year(memories: &[Memory]) -> Vec<YearGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<Memory>> = HashMap::new();

    for memory in memories {
        let label = year_label(memory);
        if !buckets.contains_key(label) {
            order.push(label.to_string());
        }
        buckets
            .entry(label.to_string())
            .or_default()
            .push(memory.clone());
    }

    order.sort_by(|a, b| compare_year_labels(a, b));
    order
        .into_iter()
        .map(|label| {
            let memories = buckets.remove(&label).unwrap_or_default();
            YearGroup { label, memories }
        })
        .collect()
}
