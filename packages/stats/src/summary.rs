//! Order-independent reductions over a group of values.

use nyc_rent_stats_models::SummaryStats;

/// Summarizes the present values.
///
/// Values are sorted before summing so the mean does not depend on the
/// order listings arrived in.
#[must_use]
pub fn summarize(values: impl IntoIterator<Item = f64>) -> SummaryStats {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len() as u64;

    SummaryStats {
        mean: mean(&sorted),
        median: median(&sorted),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        count,
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(sorted: &[f64]) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
}

/// Median of an already sorted slice.
fn median(sorted: &[f64]) -> Option<f64> {
    let len = sorted.len();
    if len == 0 {
        return None;
    }
    let mid = len / 2;
    if len % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent label. Ties go to the label seen first.
#[must_use]
pub fn mode<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<String> {
    // (label, count) in first-seen order
    let mut counts: Vec<(&str, u64)> = Vec::new();

    for label in labels {
        match counts.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => counts.push((label, 1)),
        }
    }

    let mut best: Option<(&str, u64)> = None;
    for (label, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }

    best.map(|(label, _)| label.to_owned())
}
