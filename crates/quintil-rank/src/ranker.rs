//! Quintile ranking of index members on one metric.
//!
//! Members with a missing or NaN metric are excluded, members with a metric
//! at or below zero go to [`Bucket::NonPositive`], and the strictly positive
//! members are sorted ascending by `(value, ticker)` and cut into five
//! equal-frequency bins by position: the item at position `p` of `n` goes to
//! bin `⌊5p / n⌋`. Bin sizes therefore differ by at most one, and ties are
//! broken by ticker so the result is fully deterministic.

use crate::metric::Metric;
use polars::prelude::*;
use quintil_traits::{Bucket, DataSource, Date, MetricsSnapshot, QuintilError, Result, Ticker};
use serde::{Deserialize, Serialize};

/// Number of positive-metric bins.
pub const QUINTILE_COUNT: usize = 5;

/// A ticker with the metric value it was ranked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTicker {
    /// Ticker symbol
    pub ticker: Ticker,
    /// Metric value
    pub value: f64,
}

/// Bucket assignment of one index on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Ranking date
    pub date: Date,
    /// Index name
    pub index: String,
    /// Metric ranked on
    pub metric: Metric,
    non_positive: Vec<RankedTicker>,
    quintiles: [Vec<RankedTicker>; QUINTILE_COUNT],
    excluded: usize,
}

impl Ranking {
    /// Members of a bucket, sorted ascending by metric value.
    pub fn bucket(&self, bucket: Bucket) -> &[RankedTicker] {
        match bucket {
            Bucket::NonPositive => &self.non_positive,
            Bucket::Q1 => &self.quintiles[0],
            Bucket::Q2 => &self.quintiles[1],
            Bucket::Q3 => &self.quintiles[2],
            Bucket::Q4 => &self.quintiles[3],
            Bucket::Q5 => &self.quintiles[4],
        }
    }

    /// Ticker symbols of a bucket.
    pub fn tickers(&self, bucket: Bucket) -> Vec<Ticker> {
        self.bucket(bucket).iter().map(|r| r.ticker.clone()).collect()
    }

    /// Metric values of a bucket.
    pub fn values(&self, bucket: Bucket) -> Vec<f64> {
        self.bucket(bucket).iter().map(|r| r.value).collect()
    }

    /// Iterate over every bucket in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[RankedTicker])> {
        Bucket::ALL.into_iter().map(move |b| (b, self.bucket(b)))
    }

    /// Number of ranked tickers across all buckets.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, members)| members.len()).sum()
    }

    /// Whether no ticker was ranked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of members left out for lack of a finite metric value.
    pub const fn excluded(&self) -> usize {
        self.excluded
    }

    /// Bucket holding `ticker`, if it was ranked.
    pub fn bucket_of(&self, ticker: &str) -> Option<Bucket> {
        self.iter()
            .find(|(_, members)| members.iter().any(|r| r.ticker == ticker))
            .map(|(b, _)| b)
    }

    /// Long-format frame with `ticker`, `bucket` and `value` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be built.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut tickers = Vec::with_capacity(self.len());
        let mut buckets = Vec::with_capacity(self.len());
        let mut values = Vec::with_capacity(self.len());
        for (bucket, members) in self.iter() {
            for r in members {
                tickers.push(r.ticker.clone());
                buckets.push(bucket.label());
                values.push(r.value);
            }
        }
        DataFrame::new(vec![
            Series::new("ticker".into(), tickers).into(),
            Series::new("bucket".into(), buckets).into(),
            Series::new("value".into(), values).into(),
        ])
    }
}

/// Split metric values into the non-positive bucket and five quintiles.
///
/// Non-finite values are dropped. Returns the non-positive members, the
/// quintiles (lowest first) and the number of dropped entries.
pub fn partition(
    values: impl IntoIterator<Item = (Ticker, f64)>,
) -> (Vec<RankedTicker>, [Vec<RankedTicker>; QUINTILE_COUNT], usize) {
    let mut non_positive = Vec::new();
    let mut positive = Vec::new();
    let mut dropped = 0;

    for (ticker, value) in values {
        if !value.is_finite() {
            dropped += 1;
        } else if value <= 0.0 {
            non_positive.push(RankedTicker { ticker, value });
        } else {
            positive.push(RankedTicker { ticker, value });
        }
    }

    let by_value = |a: &RankedTicker, b: &RankedTicker| {
        a.value
            .total_cmp(&b.value)
            .then_with(|| a.ticker.cmp(&b.ticker))
    };
    non_positive.sort_by(by_value);
    positive.sort_by(by_value);

    let n = positive.len();
    let mut quintiles: [Vec<RankedTicker>; QUINTILE_COUNT] = Default::default();
    for (p, item) in positive.into_iter().enumerate() {
        quintiles[p * QUINTILE_COUNT / n].push(item);
    }

    (non_positive, quintiles, dropped)
}

/// Snapshot column holding `metric`, matched case-insensitively.
fn metric_column<'s>(
    snapshot: &'s MetricsSnapshot,
    index: &str,
    metric: Metric,
) -> Result<&'s String> {
    snapshot
        .columns()
        .iter()
        .find(|c| c.eq_ignore_ascii_case(metric.as_str()))
        .ok_or_else(|| {
            QuintilError::Validation(format!(
                "metric '{metric}' not found in the {index} data columns"
            ))
        })
}

/// Ranks index members into quintile buckets.
#[derive(Debug, Clone, Copy)]
pub struct Ranker<'a, D: DataSource + ?Sized> {
    source: &'a D,
}

impl<'a, D: DataSource + ?Sized> Ranker<'a, D> {
    /// Create a ranker over a data source.
    pub const fn new(source: &'a D) -> Self {
        Self { source }
    }

    /// Rank the members of `index` on `date` by a metric given by name.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the metric is not supported.
    pub fn rank_by_name(&self, date: Date, index: &str, metric: &str) -> Result<Ranking> {
        self.rank(date, index, metric.parse()?)
    }

    /// Check that `index` is known and `metric` is one of its data columns,
    /// without ranking anything.
    ///
    /// # Errors
    ///
    /// Same as [`Ranker::rank`].
    pub fn validate(&self, date: Date, index: &str, metric: Metric) -> Result<()> {
        self.source.membership(index, date)?;
        let snapshot = self.source.metrics_snapshot(index, date)?;
        metric_column(&snapshot, index, metric).map(|_| ())
    }

    /// Rank the members of `index` on `date` by `metric`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown index and a validation
    /// error if the metric is not a column of the source data.
    pub fn rank(&self, date: Date, index: &str, metric: Metric) -> Result<Ranking> {
        let members = self.source.membership(index, date)?;
        let snapshot = self.source.metrics_snapshot(index, date)?;
        let column = metric_column(&snapshot, index, metric)?;

        let mut missing = 0;
        let values: Vec<(Ticker, f64)> = snapshot
            .iter()
            .filter(|(ticker, _)| members.contains(ticker.as_str()))
            .filter_map(|(ticker, row)| match row.values.get(column) {
                Some(v) => Some((ticker.clone(), *v)),
                None => {
                    missing += 1;
                    None
                }
            })
            .collect();

        let (non_positive, quintiles, dropped) = partition(values);
        let ranking = Ranking {
            date,
            index: index.to_string(),
            metric,
            non_positive,
            quintiles,
            excluded: missing + dropped,
        };

        tracing::debug!(
            %date,
            %index,
            %metric,
            members = members.len(),
            ranked = ranking.len(),
            excluded = ranking.excluded,
            "ranked universe"
        );

        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quintil_traits::{MonthlyRecord, PricePoint, SnapshotRow};
    use std::collections::{BTreeMap, BTreeSet};

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd_opt(y, m, day).unwrap()
    }

    /// A single-index source with fixed members and metric values.
    struct Fixture {
        members: BTreeSet<Ticker>,
        rows: Vec<(&'static str, Option<f64>)>,
    }

    impl Fixture {
        fn new(rows: Vec<(&'static str, Option<f64>)>) -> Self {
            let members = rows.iter().map(|(t, _)| (*t).to_string()).collect();
            Self { members, rows }
        }
    }

    impl DataSource for Fixture {
        fn membership(&self, index: &str, _date: Date) -> Result<BTreeSet<Ticker>> {
            if index != "test" {
                return Err(QuintilError::Configuration(format!("invalid index '{index}'")));
            }
            Ok(self.members.clone())
        }

        fn metrics_snapshot(&self, _index: &str, date: Date) -> Result<MetricsSnapshot> {
            let mut snap = MetricsSnapshot::new(date, ["bm".to_string(), "CAPEI".to_string()]);
            for (ticker, value) in &self.rows {
                let mut values = BTreeMap::new();
                if let Some(v) = value {
                    values.insert("bm".to_string(), *v);
                }
                snap.insert(
                    *ticker,
                    SnapshotRow {
                        effective_date: Some(date),
                        values,
                    },
                );
            }
            Ok(snap)
        }

        fn prices(&self, _t: &str, _i: &str, _s: Date, _e: Date) -> Result<Vec<PricePoint>> {
            Ok(Vec::new())
        }

        fn monthly_record(&self, _t: &str, _i: &str, _m: Date) -> Result<Option<MonthlyRecord>> {
            Ok(None)
        }
    }

    #[test]
    fn test_rank_scenario() {
        let source = Fixture::new(vec![
            ("A", Some(-1.0)),
            ("B", Some(0.0)),
            ("C", Some(2.0)),
            ("D", Some(5.0)),
            ("E", None),
        ]);
        let ranking = Ranker::new(&source)
            .rank(d(2020, 1, 1), "test", Metric::Bm)
            .unwrap();

        assert_eq!(ranking.tickers(Bucket::NonPositive), vec!["A", "B"]);
        let positive: Vec<Ticker> = Bucket::QUINTILES
            .iter()
            .flat_map(|b| ranking.tickers(*b))
            .collect();
        assert_eq!(positive, vec!["C", "D"]);
        assert_eq!(ranking.bucket_of("C"), Some(Bucket::Q1));
        assert_eq!(ranking.bucket_of("D"), Some(Bucket::Q3));
        assert_eq!(ranking.bucket_of("E"), None);
        assert_eq!(ranking.excluded(), 1);
    }

    #[test]
    fn test_partition_sizes_differ_by_at_most_one() {
        for n in 1..=23 {
            let values = (0..n).map(|i| (format!("T{i:02}"), f64::from(i) + 1.0));
            let (non_positive, quintiles, dropped) = partition(values);
            assert!(non_positive.is_empty());
            assert_eq!(dropped, 0);

            let sizes: Vec<usize> = quintiles.iter().map(Vec::len).collect();
            assert_eq!(sizes.iter().sum::<usize>(), n as usize);
            if n >= 5 {
                let max = sizes.iter().max().unwrap();
                let min = sizes.iter().min().unwrap();
                assert!(max - min <= 1, "n={n} sizes={sizes:?}");
            }
        }
    }

    #[test]
    fn test_quintiles_are_ordered() {
        let values = vec![
            ("X".to_string(), 9.0),
            ("Y".to_string(), 1.0),
            ("Z".to_string(), 4.0),
            ("W".to_string(), 7.0),
            ("V".to_string(), 3.0),
        ];
        let (_, quintiles, _) = partition(values);
        let order: Vec<&str> = quintiles
            .iter()
            .flat_map(|q| q.iter().map(|r| r.ticker.as_str()))
            .collect();
        assert_eq!(order, vec!["Y", "V", "Z", "W", "X"]);
        assert!(quintiles.iter().all(|q| q.len() == 1));
    }

    #[test]
    fn test_ties_broken_by_ticker() {
        let values = vec![
            ("B".to_string(), 1.0),
            ("A".to_string(), 1.0),
            ("C".to_string(), 1.0),
            ("E".to_string(), 1.0),
            ("D".to_string(), 1.0),
        ];
        let (_, quintiles, _) = partition(values);
        assert_eq!(quintiles[0][0].ticker, "A");
        assert_eq!(quintiles[4][0].ticker, "E");
    }

    #[test]
    fn test_metric_not_in_data_is_validation_error() {
        let source = Fixture::new(vec![("A", Some(1.0))]);
        let err = Ranker::new(&source)
            .rank(d(2020, 1, 1), "test", Metric::Roe)
            .unwrap_err();
        assert!(matches!(err, QuintilError::Validation(_)));
    }

    #[test]
    fn test_unsupported_metric_name_is_validation_error() {
        let source = Fixture::new(vec![("A", Some(1.0))]);
        let err = Ranker::new(&source)
            .rank_by_name(d(2020, 1, 1), "test", "momentum")
            .unwrap_err();
        assert!(matches!(err, QuintilError::Validation(_)));
    }

    #[test]
    fn test_validate_without_ranking() {
        let source = Fixture::new(vec![("A", Some(1.0))]);
        let ranker = Ranker::new(&source);
        ranker.validate(d(2020, 1, 1), "test", Metric::Bm).unwrap();
        assert!(matches!(
            ranker.validate(d(2020, 1, 1), "sp500", Metric::Bm).unwrap_err(),
            QuintilError::Configuration(_)
        ));
        assert!(matches!(
            ranker.validate(d(2020, 1, 1), "test", Metric::Roe).unwrap_err(),
            QuintilError::Validation(_)
        ));
    }

    #[test]
    fn test_unknown_index_is_configuration_error() {
        let source = Fixture::new(vec![("A", Some(1.0))]);
        let err = Ranker::new(&source)
            .rank(d(2020, 1, 1), "sp500", Metric::Bm)
            .unwrap_err();
        assert!(matches!(err, QuintilError::Configuration(_)));
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let source = Fixture::new(vec![("A", Some(1.0))]);
        // CAPEI column exists but no row reports it
        let ranking = Ranker::new(&source)
            .rank(d(2020, 1, 1), "test", Metric::Capei)
            .unwrap();
        assert!(ranking.is_empty());
        assert_eq!(ranking.excluded(), 1);
    }

    #[test]
    fn test_to_frame() {
        let source = Fixture::new(vec![("A", Some(-1.0)), ("B", Some(2.0))]);
        let ranking = Ranker::new(&source)
            .rank(d(2020, 1, 1), "test", Metric::Bm)
            .unwrap();
        let df = ranking.to_frame().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 3);
        let buckets = df.column("bucket").unwrap().as_materialized_series().str().unwrap().clone();
        assert_eq!(buckets.get(0), Some("<=0"));
        assert_eq!(buckets.get(1), Some("Q1"));
    }
}
