//! Filtering and summarising batted-ball events.
//!
//! ```text
//!   &[BattedBallEvent] / &BattedBallDataset / &Subset
//!        │
//!        ▼  filter(predicate)            three-valued, keeps only True
//!   ┌──────────┐
//!   │  Subset  │  borrowed events + determined / undetermined counts
//!   └──────────┘
//!        │
//!        ├── filter(...)                 chain further conditions
//!        ├── summarize(metric)           count / mean / min / max / median / p90
//!        └── histogram(metric, binning)  distribution (Knuth's rule or fixed)
//! ```

use log::debug;
use serde::Serialize;
use statrs::function::gamma::ln_gamma;

use crate::config::EngineConfig;
use crate::data::model::BattedBallEvent;
use crate::error::ConfigError;
use crate::metrics::Metric;
use crate::predicate::{Predicate, Truth};

// ---------------------------------------------------------------------------
// Subset
// ---------------------------------------------------------------------------

/// A filtered view over borrowed events.  Source order is preserved.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    events: Vec<&'a BattedBallEvent>,
    /// Events in the input whose predicate outcome was True or False.
    determined: usize,
    /// Events in the input the predicate could not answer.
    undetermined: usize,
}

impl<'a> Subset<'a> {
    /// Every event of `records`, unfiltered.
    pub fn all(records: impl IntoIterator<Item = &'a BattedBallEvent>) -> Self {
        let events: Vec<_> = records.into_iter().collect();
        let determined = events.len();
        Subset {
            events,
            determined,
            undetermined: 0,
        }
    }

    pub fn events(&self) -> &[&'a BattedBallEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a BattedBallEvent> + '_ {
        self.events.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn determined(&self) -> usize {
        self.determined
    }

    pub fn undetermined(&self) -> usize {
        self.undetermined
    }

    /// Share of determined inputs that matched; `None` when nothing was determined.
    pub fn match_rate(&self) -> Option<f64> {
        (self.determined > 0).then(|| self.events.len() as f64 / self.determined as f64)
    }
}

impl<'s, 'a> IntoIterator for &'s Subset<'a> {
    type Item = &'a BattedBallEvent;
    type IntoIter = std::iter::Copied<std::slice::Iter<'s, &'a BattedBallEvent>>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// 90th percentile.
    pub p90: f64,
}

/// Result of summarising a metric.  `NoData` is distinct from any number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Summary {
    NoData,
    Stats(SummaryStats),
}

impl Summary {
    pub fn stats(&self) -> Option<&SummaryStats> {
        match self {
            Summary::Stats(s) => Some(s),
            Summary::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Summary::NoData)
    }

    pub fn mean(&self) -> Option<f64> {
        self.stats().map(|s| s.mean)
    }

    pub fn median(&self) -> Option<f64> {
        self.stats().map(|s| s.median)
    }

    pub fn p90(&self) -> Option<f64> {
        self.stats().map(|s| s.p90)
    }
}

/// Percentile `q` in `[0, 100]` of sorted data, interpolating linearly
/// between the closest ranks.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    (!sorted.is_empty()).then(|| interpolate(sorted, q))
}

/// `sorted` must be non-empty.
fn interpolate(sorted: &[f64], q: f64) -> f64 {
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Upper bound on the number of bins of any histogram.
pub const MAX_HISTOGRAM_BINS: usize = 1_000;

/// Largest bin count Knuth's rule will consider.
const KNUTH_MAX_BINS: usize = 200;

/// How a histogram picks its bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Binning {
    /// Bin count maximising Knuth's Bayesian posterior for a piecewise
    /// constant density.
    #[default]
    Knuth,
    /// Fixed bin count, capped at [`MAX_HISTOGRAM_BINS`].
    Fixed(usize),
}

/// Equal-width distribution of a metric.  `counts[i]` covers
/// `[edges[i], edges[i + 1])`; the last bin also includes its upper edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (min, max)
}

fn bin_counts(values: &[f64], min: f64, width: f64, bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    for v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Knuth's rule: the `M` in `1..=200` (and at most one per value) maximising
///
/// `n ln M + lnΓ(M/2) − M lnΓ(1/2) − lnΓ(n + M/2) + Σ lnΓ(n_k + 1/2)`.
///
/// Returns 1 for empty or constant data.
pub fn knuth_bin_count(values: &[f64]) -> usize {
    let (min, max) = value_range(values);
    if values.is_empty() || max <= min {
        return 1;
    }
    let n = values.len() as f64;
    let ln_gamma_half = ln_gamma(0.5);

    let log_posterior = |m: usize| {
        let mf = m as f64;
        let counts = bin_counts(values, min, (max - min) / mf, m);
        n * mf.ln() + ln_gamma(mf / 2.0)
            - mf * ln_gamma_half
            - ln_gamma(n + mf / 2.0)
            + counts
                .iter()
                .map(|&c| ln_gamma(c as f64 + 0.5))
                .sum::<f64>()
    };

    (1..=values.len().min(KNUTH_MAX_BINS))
        .map(|m| (m, log_posterior(m)))
        .fold((1, f64::NEG_INFINITY), |best, (m, score)| {
            if score > best.1 { (m, score) } else { best }
        })
        .0
}

// ---------------------------------------------------------------------------
// SubsetEngine
// ---------------------------------------------------------------------------

/// The validated configuration plus the filter / summarize operations.
#[derive(Debug, Clone)]
pub struct SubsetEngine {
    config: EngineConfig,
}

impl SubsetEngine {
    /// Validate `config` up front; nothing later can fail on configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Derive `metric` for one event under this engine's configuration.
    pub fn derive(&self, metric: Metric, event: &BattedBallEvent) -> Option<f64> {
        metric.derive(event, &self.config)
    }

    pub fn evaluate(&self, predicate: &Predicate, event: &BattedBallEvent) -> Truth {
        predicate.evaluate(event, &self.config)
    }

    /// Keep exactly the events for which `predicate` is True.
    ///
    /// Accepts a slice, a dataset, or a previous subset, so filters chain.
    pub fn filter<'a, I>(&self, records: I, predicate: &Predicate) -> Subset<'a>
    where
        I: IntoIterator<Item = &'a BattedBallEvent>,
    {
        let mut events = Vec::new();
        let mut determined = 0;
        let mut undetermined = 0;

        for ev in records {
            match self.evaluate(predicate, ev) {
                Truth::True => {
                    determined += 1;
                    events.push(ev);
                }
                Truth::False => determined += 1,
                Truth::Undetermined => undetermined += 1,
            }
        }

        debug!(
            "filter [{predicate}]: {} matched, {determined} determined, {undetermined} undetermined",
            events.len()
        );
        Subset {
            events,
            determined,
            undetermined,
        }
    }

    /// Present values of `metric` over the events, in event order.
    pub fn values<'a, I>(&self, records: I, metric: Metric) -> Vec<f64>
    where
        I: IntoIterator<Item = &'a BattedBallEvent>,
    {
        records
            .into_iter()
            .filter_map(|ev| self.derive(metric, ev))
            .collect()
    }

    /// Statistics of `metric` over events where it is present.
    ///
    /// Events lacking the metric stay in the subset but add nothing here.
    pub fn summarize(&self, subset: &Subset<'_>, metric: Metric) -> Summary {
        let mut values = self.values(subset, metric);
        if values.is_empty() {
            return Summary::NoData;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        Summary::Stats(SummaryStats {
            count,
            mean,
            min: values[0],
            max: values[count - 1],
            median: interpolate(&values, 50.0),
            p90: interpolate(&values, 90.0),
        })
    }

    /// Distribution of `metric` over equal-width bins spanning the observed
    /// range.  `None` when there is no data or `Binning::Fixed(0)`.
    pub fn histogram(&self, subset: &Subset<'_>, metric: Metric, binning: Binning) -> Option<Histogram> {
        let values = self.values(subset, metric);
        if values.is_empty() {
            return None;
        }
        let bins = match binning {
            Binning::Fixed(0) => return None,
            Binning::Fixed(n) => n.min(MAX_HISTOGRAM_BINS),
            Binning::Knuth => knuth_bin_count(&values),
        };
        let (min, max) = value_range(&values);
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let edges = (0..=bins).map(|i| min + width * i as f64).collect();
        let counts = bin_counts(&values, min, width, bins);
        debug!("histogram of {metric}: {} values in {bins} bins", values.len());
        Some(Histogram { edges, counts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Handedness;
    use crate::predicate::CompareOp;

    fn engine() -> SubsetEngine {
        SubsetEngine::new(EngineConfig::default()).unwrap()
    }

    fn ev(exit_velocity: Option<f64>, launch_angle: Option<f64>) -> BattedBallEvent {
        BattedBallEvent::new(exit_velocity, launch_angle, None, None, Handedness::Right)
    }

    #[test]
    fn inverted_range_fails_at_construction() {
        let config = EngineConfig::default().with_overrides(None, Some(30.0), Some(10.0));
        assert!(matches!(
            SubsetEngine::new(config),
            Err(ConfigError::InvalidLaunchAngleRange { .. })
        ));
    }

    #[test]
    fn filter_counts_determined_outcomes_only() {
        let records = vec![ev(Some(100.0), None), ev(Some(80.0), None), ev(None, None)];
        let hard = engine().filter(&records, &Predicate::hard_hit());
        assert_eq!(hard.len(), 1);
        assert_eq!(hard.determined(), 2);
        assert_eq!(hard.undetermined(), 1);
        assert_eq!(hard.match_rate(), Some(0.5));
        // Source untouched.
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn empty_input_gives_empty_subset_and_no_data() {
        let records: Vec<BattedBallEvent> = Vec::new();
        let e = engine();
        let subset = e.filter(&records, &Predicate::hard_hit());
        assert!(subset.is_empty());
        assert_eq!(subset.match_rate(), None);
        assert_eq!(e.summarize(&subset, Metric::ExitVelocity), Summary::NoData);
        assert_eq!(e.histogram(&subset, Metric::ExitVelocity, Binning::Knuth), None);
    }

    #[test]
    fn absent_target_metric_does_not_shrink_subset() {
        let records = vec![ev(Some(100.0), Some(20.0)), ev(Some(99.0), None)];
        let e = engine();
        let hard = e.filter(&records, &Predicate::hard_hit());
        assert_eq!(hard.len(), 2);
        let la = e.summarize(&hard, Metric::LaunchAngle);
        assert_eq!(la.stats().unwrap().count, 1);
        assert_eq!(la.mean(), Some(20.0));
    }

    #[test]
    fn all_absent_target_is_no_data_not_zero() {
        let records = vec![ev(Some(100.0), None), ev(Some(101.0), None)];
        let e = engine();
        let subset = Subset::all(&records);
        let summary = e.summarize(&subset, Metric::LaunchAngle);
        assert!(summary.is_no_data());
        assert_ne!(summary.mean(), Some(0.0));
    }

    #[test]
    fn summary_statistics() {
        let records: Vec<_> = [90.0, 100.0, 95.0, 105.0, 110.0]
            .into_iter()
            .map(|v| ev(Some(v), None))
            .collect();
        let e = engine();
        let s = *e
            .summarize(&Subset::all(&records), Metric::ExitVelocity)
            .stats()
            .unwrap();
        assert_eq!(s.count, 5);
        assert_eq!(s.mean, 100.0);
        assert_eq!(s.min, 90.0);
        assert_eq!(s.max, 110.0);
        assert_eq!(s.median, 100.0);
        // rank 3.6 between 105 and 110
        assert!((s.p90 - 108.0).abs() < 1e-9);
    }

    #[test]
    fn flag_mean_is_a_rate() {
        let records = vec![
            ev(Some(100.0), None),
            ev(Some(80.0), None),
            ev(Some(96.0), None),
            ev(Some(70.0), None),
            ev(None, None),
        ];
        let e = engine();
        let summary = e.summarize(&Subset::all(&records), Metric::HardHit);
        assert_eq!(summary.mean(), Some(0.5));
        assert_eq!(summary.stats().unwrap().count, 4);
    }

    #[test]
    fn chained_filters_narrow_incrementally() {
        let records = vec![
            ev(Some(100.0), Some(20.0)),
            ev(Some(100.0), Some(45.0)),
            ev(Some(80.0), Some(20.0)),
        ];
        let e = engine();
        let hard = e.filter(&records, &Predicate::hard_hit());
        let barrels = e.filter(&hard, &Predicate::optimal_launch_angle());
        assert_eq!(barrels.len(), 1);
        assert!(std::ptr::eq(barrels.events()[0], &records[0]));
    }

    #[test]
    fn histogram_buckets_values() {
        let records: Vec<_> = [0.0, 1.0, 2.0, 3.0, 4.0, 10.0]
            .into_iter()
            .map(|a| ev(None, Some(a)))
            .collect();
        let e = engine();
        let h = e
            .histogram(&Subset::all(&records), Metric::LaunchAngle, Binning::Fixed(5))
            .unwrap();
        assert_eq!(h.edges, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        assert_eq!(h.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(h.total(), 6);
    }

    #[test]
    fn histogram_of_constant_values() {
        let records = vec![ev(Some(95.0), None), ev(Some(95.0), None)];
        let h = engine()
            .histogram(&Subset::all(&records), Metric::ExitVelocity, Binning::Fixed(3))
            .unwrap();
        assert_eq!(h.counts, vec![2, 0, 0]);
    }

    #[test]
    fn undetermined_compare_leaf_is_excluded() {
        let records = vec![ev(None, Some(10.0))];
        let below = Predicate::compare(Metric::ExitVelocity, CompareOp::Lt, 90.0);
        let e = engine();
        assert!(e.filter(&records, &below).is_empty());
        assert!(e.filter(&records, &below.negate()).is_empty());
    }

    #[test]
    fn oversized_bin_count_is_capped() {
        let records = vec![ev(Some(80.0), None), ev(Some(110.0), None)];
        let h = engine()
            .histogram(&Subset::all(&records), Metric::ExitVelocity, Binning::Fixed(usize::MAX))
            .unwrap();
        assert_eq!(h.counts.len(), MAX_HISTOGRAM_BINS);
        assert_eq!(h.edges.len(), MAX_HISTOGRAM_BINS + 1);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn zero_fixed_bins_is_none() {
        let records = vec![ev(Some(80.0), None)];
        let h = engine().histogram(&Subset::all(&records), Metric::ExitVelocity, Binning::Fixed(0));
        assert_eq!(h, None);
    }

    #[test]
    fn knuth_uses_one_bin_for_flat_or_constant_data() {
        assert_eq!(knuth_bin_count(&[]), 1);
        assert_eq!(knuth_bin_count(&[95.0; 20]), 1);
        // Evenly spread values have a flat density.
        let uniform: Vec<f64> = (0..200).map(f64::from).collect();
        assert_eq!(knuth_bin_count(&uniform), 1);
    }

    #[test]
    fn knuth_splits_lopsided_data() {
        let mut values = vec![0.0; 90];
        values.extend([10.0; 10]);
        let bins = knuth_bin_count(&values);
        assert!(bins > 1 && bins <= 100, "got {bins}");

        let records: Vec<_> = values.iter().map(|&v| ev(Some(v), None)).collect();
        let h = engine()
            .histogram(&Subset::all(&records), Metric::ExitVelocity, Binning::Knuth)
            .unwrap();
        assert_eq!(h.counts.len(), bins);
        assert_eq!(h.counts[0], 90);
        assert_eq!(h.counts[bins - 1], 10);
    }

    #[test]
    fn percentile_interpolates() {
        assert_eq!(percentile_sorted(&[], 50.0), None);
        assert_eq!(percentile_sorted(&[3.0], 90.0), Some(3.0));
        assert_eq!(percentile_sorted(&[1.0, 2.0, 3.0, 4.0], 50.0), Some(2.5));
    }
}
