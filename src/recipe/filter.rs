//! Near-zero-variance column filtering

use std::collections::HashMap;

/// A column is near-zero-variance when its most common value dominates the
/// second most common by this ratio or more...
const FREQ_RATIO_CUT: f64 = 95.0 / 5.0;
/// ...while the share of distinct values stays under this percentage.
const UNIQUE_PERCENT_CUT: f64 = 10.0;

/// Indices of columns worth keeping after the near-zero-variance check.
///
/// Single-valued columns are always dropped. NaN cells are ignored when
/// counting, so the check works before imputation as well as after.
pub(crate) fn nzv_keep(rows: &[Vec<f64>], n_cols: usize) -> Vec<usize> {
    (0..n_cols).filter(|&j| !is_nzv_column(rows, j)).collect()
}

fn is_nzv_column(rows: &[Vec<f64>], j: usize) -> bool {
    let mut value_counts: HashMap<u64, usize> = HashMap::new();
    let mut observed = 0usize;
    for row in rows {
        let v = row[j];
        if v.is_nan() {
            continue;
        }
        *value_counts.entry(v.to_bits()).or_insert(0) += 1;
        observed += 1;
    }

    if observed == 0 {
        return true;
    }
    if value_counts.len() <= 1 {
        return true;
    }

    let mut counts: Vec<usize> = value_counts.values().copied().collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));
    let freq_ratio = counts[0] as f64 / counts[1] as f64;
    let percent_unique = 100.0 * value_counts.len() as f64 / observed as f64;

    freq_ratio > FREQ_RATIO_CUT && percent_unique <= UNIQUE_PERCENT_CUT
}
