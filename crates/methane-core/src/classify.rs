//! Per-year choropleth classification: quantile bucket and emitter rank.

use serde::Serialize;

use crate::dataset::Dataset;
use crate::emissions::YearValue;

// ── Quantile scale ────────────────────────────────────────────────────────────

/// Maps values onto `buckets` classes holding roughly equal counts.
///
/// Thresholds are the `i / buckets` quantiles of the sorted domain, estimated by
/// linear interpolation between order statistics. A value's bucket is the
/// number of thresholds at or below it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileScale {
    thresholds: Vec<f64>,
}

impl QuantileScale {
    /// Build a scale over `domain`. Returns `None` when the domain is empty or
    /// `buckets` is zero; non-finite values are ignored.
    pub fn new(domain: impl IntoIterator<Item = f64>, buckets: usize) -> Option<Self> {
        let mut sorted: Vec<f64> = domain.into_iter().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() || buckets == 0 {
            return None;
        }
        sorted.sort_by(f64::total_cmp);
        let thresholds = (1..buckets)
            .map(|i| quantile_sorted(&sorted, i as f64 / buckets as f64))
            .collect();
        Some(Self { thresholds })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Bucket index in `0..buckets`.
    pub fn bucket(&self, value: f64) -> usize {
        self.thresholds.partition_point(|&t| t <= value)
    }
}

/// Quantile of an ascending, non-empty slice at probability `p` in `[0, 1]`.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if p <= 0.0 || n < 2 {
        return sorted[0];
    }
    if p >= 1.0 {
        return sorted[n - 1];
    }
    let pos = (n - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let lower = sorted[lo];
    let upper = sorted[lo + 1];
    lower + (upper - lower) * (pos - lo as f64)
}

// ── Rank table ────────────────────────────────────────────────────────────────

/// Present values in descending order.
///
/// A value's rank is one plus the index of its first occurrence, so equal
/// values share the better rank: `[50, 30, 30, 10]` ranks as `1, 2, 2, 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct RankTable {
    descending: Vec<f64>,
}

impl RankTable {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut descending: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        descending.sort_by(|a, b| b.total_cmp(a));
        Self { descending }
    }

    /// 1-based rank of `value`, or `None` if it is not one of the ranked values.
    pub fn rank(&self, value: f64) -> Option<usize> {
        let idx = self.descending.partition_point(|&v| v > value);
        (self.descending.get(idx) == Some(&value)).then_some(idx + 1)
    }
}

// ── Classification ────────────────────────────────────────────────────────────

/// Derived per-feature styling inputs for one year. `None` means no data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub bucket: Option<usize>,
    pub rank: Option<usize>,
}

impl Classification {
    pub const NO_DATA: Classification = Classification { bucket: None, rank: None };

    /// Bucket as the renderer expects it: `-1` for no data.
    pub fn bucket_or_sentinel(&self) -> i64 {
        self.bucket.map_or(-1, |b| b as i64)
    }

    /// Whole-number percentile of the bucket within `stops` classes.
    pub fn percentile(&self, stops: usize) -> Option<u32> {
        let bucket = self.bucket?;
        if stops <= 1 {
            return Some(100);
        }
        Some((bucket * 100 / (stops - 1)) as u32)
    }
}

/// Classify every feature of `dataset` for `year`, in feature order.
///
/// Features without a value for `year` are left out of both the quantile
/// domain and the rank ordering and come back as [`Classification::NO_DATA`].
pub fn classify_year(dataset: &Dataset, year: i32, stops: usize) -> Vec<Classification> {
    let values: Vec<YearValue> = dataset.features.iter().map(|f| f.emissions(year)).collect();
    classify_values(&values, stops)
}

/// Classification over a plain value column. Exposed for callers that already
/// hold the year's values.
pub fn classify_values(values: &[YearValue], stops: usize) -> Vec<Classification> {
    let present = || values.iter().filter_map(|v| v.value());
    let scale = QuantileScale::new(present(), stops);
    let ranks = RankTable::new(present());

    values
        .iter()
        .map(|v| match (v.value(), &scale) {
            (Some(x), Some(scale)) => Classification {
                bucket: Some(scale.bucket(x)),
                rank: ranks.rank(x),
            },
            _ => Classification::NO_DATA,
        })
        .collect()
}

// ── Display helpers ───────────────────────────────────────────────────────────

/// English ordinal suffix: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st.
pub fn ordinal_suffix(n: usize) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

pub fn ordinal(n: usize) -> String {
    format!("{n}{}", ordinal_suffix(n))
}
