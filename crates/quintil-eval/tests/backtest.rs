//! End-to-end runs over a small synthetic market.

use approx::assert_relative_eq;
use chrono::{Datelike, Days};
use polars::prelude::*;
use quintil_data::{IndexData, IndexPreset, MarketData, MonthlyTable};
use quintil_eval::{
    Cadence, PortfolioAnalysis, RebalanceConfig, Rebalancer, Regression, RegressionConfig,
    Weighting,
};
use quintil_rank::Metric;
use quintil_traits::{Bucket, DataSource, Date, QuintilError};

const TICKERS: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

fn d(y: i32, m: u32, day: u32) -> Date {
    Date::from_ymd_opt(y, m, day).unwrap()
}

/// Daily growth rate of each ticker's price.
fn growth(i: usize) -> f64 {
    0.0001 * i as f64
}

/// Seven tickers: G left the index in 2019, A has a negative book/market,
/// F has no ROE. Prices grow at a constant daily rate per ticker.
fn market() -> MarketData {
    let thru: Vec<Option<&str>> = TICKERS
        .iter()
        .map(|t| (*t == "G").then_some("2019-06-30"))
        .collect();
    let membership = df! {
        "co_tic" => TICKERS.to_vec(),
        "from" => vec!["2019-01-01"; TICKERS.len()],
        "thru" => thru,
    }
    .unwrap();

    let metrics = df! {
        "TICKER" => TICKERS.to_vec(),
        "public_date" => vec!["2019-12-31"; TICKERS.len()],
        "bm" => &[-1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        "roe" => &[Some(-0.1), Some(0.1), Some(0.2), Some(0.3), Some(0.4), None, Some(0.5)],
    }
    .unwrap();

    let mut tic = Vec::new();
    let mut date = Vec::new();
    let mut close = Vec::new();
    for (i, ticker) in TICKERS.iter().enumerate() {
        for k in 0..731_u64 {
            let day = d(2020, 1, 1).checked_add_days(Days::new(k)).unwrap();
            tic.push((*ticker).to_string());
            date.push(day.format("%Y-%m-%d").to_string());
            close.push(100.0 * (1.0 + growth(i)).powi(k as i32));
        }
    }
    let prices = df! {
        "tic" => tic,
        "datadate" => date,
        "prccd" => close,
    }
    .unwrap();

    let mut m_date = Vec::new();
    let mut m_ticker = Vec::new();
    let mut m_cap = Vec::new();
    let mut m_ret = Vec::new();
    for (i, ticker) in TICKERS.iter().enumerate() {
        for month in 1..=4 {
            m_date.push(format!("2020-{month:02}-28"));
            m_ticker.push((*ticker).to_string());
            m_cap.push(100.0 * (i + 1) as f64);
            m_ret.push(0.01 * (i + 1) as f64);
        }
    }
    let monthly = df! {
        "date" => m_date,
        "Ticker" => m_ticker,
        "MthCap" => m_cap,
        "MthRetx" => m_ret,
    }
    .unwrap();
    let monthly = MonthlyTable::from_frame(&monthly, "date", "Ticker", "MthCap", "MthRetx").unwrap();

    let index = IndexData::from_frames(IndexPreset::Nasdaq100, &membership, &metrics, &prices)
        .unwrap()
        .with_monthly(monthly);
    MarketData::new().with_index(index)
}

fn yearly_config(metric: Metric) -> RebalanceConfig {
    RebalanceConfig {
        index: "nasdaq100".to_string(),
        metric,
        start_date: d(2020, 1, 1),
        end_date: d(2020, 12, 31),
        cadence: Cadence::Yearly,
        weighting: Weighting::Equal,
        fill_empty_periods: true,
    }
}

#[test]
fn test_yearly_equal_weight_run() {
    let market = market();
    let result = Rebalancer::new(&market, yearly_config(Metric::Bm))
        .run()
        .unwrap();

    assert_eq!(result.periods, vec![d(2020, 1, 1)]);

    for bucket in Bucket::ALL {
        let series = result.series(bucket).series();
        // [2020-01-01, 2020-12-31) holds 365 daily closes
        assert_eq!(series.len(), 365, "{bucket}");
        assert!(series.is_strictly_increasing());
        assert!(series.values().iter().all(|v| v.is_finite()));
        assert_relative_eq!(series.values()[0], 0.0);
    }

    let q1 = result.stats(Bucket::Q1);
    assert_eq!(q1.len(), 1);
    assert_eq!(q1[0].tickers, vec!["B"]);
    assert_eq!(q1[0].year, 2020);
    assert_relative_eq!(q1[0].mean, 1.0);
    assert!(q1[0].std.is_nan());
    assert_relative_eq!(
        q1[0].period_return,
        (1.0 + growth(1)).powi(364) - 1.0,
        epsilon = 1e-9
    );

    let non_positive = result.stats(Bucket::NonPositive);
    assert_eq!(non_positive[0].tickers, vec!["A"]);
}

#[test]
fn test_yearly_step_drifts_over_leap_year() {
    let market = market();
    let config = RebalanceConfig {
        end_date: d(2021, 1, 1),
        ..yearly_config(Metric::Bm)
    };
    let result = Rebalancer::new(&market, config).run().unwrap();

    // 2020 has 366 days, so 365 days on lands on Dec 31
    assert_eq!(result.periods, vec![d(2020, 1, 1), d(2020, 12, 31)]);
    let q1 = result.series(Bucket::Q1).series();
    assert_eq!(q1.len(), 730);
    assert!(q1.is_strictly_increasing());
    assert_eq!(result.stats(Bucket::Q1).len(), 2);
    assert_eq!(result.stats(Bucket::Q1)[1].year, 2020);
    assert_eq!(result.stats(Bucket::Q1)[1].month, 12);
}

#[test]
fn test_quarterly_equal_weight_run() {
    let market = market();
    let config = RebalanceConfig {
        start_date: d(2020, 1, 31),
        end_date: d(2020, 9, 30),
        cadence: Cadence::Quarterly,
        ..yearly_config(Metric::Bm)
    };
    let result = Rebalancer::new(&market, config).run().unwrap();

    // Jan 31 clamps to Apr 30 and the 30th carries forward
    assert_eq!(result.periods, vec![d(2020, 1, 31), d(2020, 4, 30), d(2020, 7, 30)]);

    let mut windows = Vec::new();
    let mut expected = Vec::new();
    for (k, start) in result.periods.iter().enumerate() {
        let end = Cadence::Quarterly.step(*start).unwrap();
        windows.push((*start, end));
        expected.extend(start.iter_days().take_while(|day| *day < end));
        assert!(k == 0 || windows[k - 1].1 == *start);
    }

    for bucket in Bucket::ALL {
        let series = result.series(bucket).series();
        assert_eq!(series.dates(), expected, "{bucket}");
        for (start, _) in &windows {
            let first = series.iter().find(|p| p.date == *start).unwrap();
            assert_relative_eq!(first.value, 0.0);
        }
    }

    let q1 = result.series(Bucket::Q1).series();
    for p in q1.iter().filter(|p| !result.periods.contains(&p.date)) {
        assert_relative_eq!(p.value, growth(1), epsilon = 1e-12);
    }

    let stats = result.stats(Bucket::Q1);
    assert_eq!(stats.len(), 3);
    for (period, (start, end)) in stats.iter().zip(&windows) {
        assert_eq!(period.tickers, vec!["B"]);
        assert_eq!(period.month, start.month());
        let days = (*end - *start).num_days() as i32;
        assert_relative_eq!(
            period.period_return,
            (1.0 + growth(1)).powi(days - 1) - 1.0,
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_buckets_only_hold_members() {
    let market = market();
    let result = Rebalancer::new(&market, yearly_config(Metric::Bm))
        .run()
        .unwrap();
    let members = market.membership("nasdaq100", d(2020, 1, 1)).unwrap();

    for bucket in Bucket::ALL {
        for stats in result.stats(bucket) {
            assert!(stats.tickers.iter().all(|t| members.contains(t)));
        }
    }
    assert!(!members.contains("G"));
}

#[test]
fn test_empty_bucket_gets_zero_calendar() {
    let market = market();
    // Four positive ROE values fill Q1..Q4 and leave Q5 empty
    let result = Rebalancer::new(&market, yearly_config(Metric::Roe))
        .run()
        .unwrap();

    assert!(result.stats(Bucket::Q5).is_empty());
    let q5 = result.series(Bucket::Q5).series();
    assert_eq!(q5.dates(), result.series(Bucket::Q1).series().dates());
    assert!(q5.values().iter().all(|v| *v == 0.0));
}

#[test]
fn test_cap_weighted_run_is_monthly() {
    let market = market();
    let config = RebalanceConfig {
        start_date: d(2020, 1, 31),
        end_date: d(2020, 4, 15),
        cadence: Cadence::Yearly,
        weighting: Weighting::CapWeighted,
        ..yearly_config(Metric::Bm)
    };
    let result = Rebalancer::new(&market, config).run().unwrap();

    assert_eq!(result.cadence, Cadence::Monthly);
    assert_eq!(result.periods, vec![d(2020, 1, 31), d(2020, 2, 29), d(2020, 3, 29)]);

    let q1 = result.series(Bucket::Q1).series();
    assert_eq!(q1.dates(), vec![d(2020, 1, 1), d(2020, 2, 1), d(2020, 3, 1)]);
    for value in q1.values() {
        // B is the only member of Q1
        assert_relative_eq!(value, 0.02, epsilon = 1e-12);
    }
}

#[test]
fn test_universe_returns_have_no_gaps() {
    let market = market();
    let universe = Rebalancer::new(&market, yearly_config(Metric::Bm))
        .universe_returns()
        .unwrap();
    assert_eq!(universe.len(), 365);
    assert!(universe.values().iter().all(|v| v.is_finite()));
}

#[test]
fn test_analysis_of_run() {
    let market = market();
    let result = Rebalancer::new(&market, yearly_config(Metric::Bm))
        .run()
        .unwrap();
    let analysis = PortfolioAnalysis::new(&result);

    let cagr = analysis.cagr();
    assert_eq!(cagr.len(), 6);
    assert_eq!(cagr[0].portfolio, "<=0");
    // One year observed: CAGR equals the period return
    assert_eq!(cagr[1].portfolio, "Q1");
    assert_relative_eq!(
        cagr[1].cagr,
        result.stats(Bucket::Q1)[0].period_return,
        epsilon = 1e-12
    );

    let table = analysis.year_table();
    assert_eq!(table.years, vec![2020]);
    assert_eq!(result.stats_frame().unwrap().height(), 6);
}

#[test]
fn test_unknown_index_fails_fast() {
    let market = market();
    let config = RebalanceConfig {
        index: "sp500".to_string(),
        ..yearly_config(Metric::Bm)
    };
    let err = Rebalancer::new(&market, config).run().unwrap_err();
    assert!(matches!(err, QuintilError::Configuration(_)));
}

#[test]
fn test_unknown_index_fails_without_periods() {
    let config = RebalanceConfig {
        index: "sp500".to_string(),
        start_date: d(2020, 1, 1),
        end_date: d(2020, 1, 1),
        ..yearly_config(Metric::Bm)
    };
    let market = MarketData::new();
    let rebalancer = Rebalancer::new(&market, config);
    assert!(rebalancer.schedule().unwrap().is_empty());
    assert!(matches!(rebalancer.run().unwrap_err(), QuintilError::Configuration(_)));
    assert!(matches!(
        rebalancer.universe_returns().unwrap_err(),
        QuintilError::Configuration(_)
    ));
}

#[test]
fn test_missing_metric_fails_without_periods() {
    let market = market();
    let config = RebalanceConfig {
        end_date: d(2019, 6, 30),
        ..yearly_config(Metric::Capei)
    };
    let err = Rebalancer::new(&market, config).run().unwrap_err();
    assert!(matches!(err, QuintilError::Validation(_)));
}

#[test]
fn test_metric_missing_from_data_fails() {
    let market = market();
    let err = Rebalancer::new(&market, yearly_config(Metric::Capei))
        .run()
        .unwrap_err();
    assert!(matches!(err, QuintilError::Validation(_)));
}

#[test]
fn test_regression_over_market() {
    let market = market();
    let config = RegressionConfig {
        index: "nasdaq100".to_string(),
        metric: Metric::Bm,
        start_date: d(2020, 1, 1),
        end_date: d(2020, 12, 31),
        outlier_threshold: 3.0,
    };
    let result = Regression::new(&market, config).run().unwrap();

    // A..F are members with prices; G is not a member
    assert_eq!(result.observations.len() + result.removed, 6);
    assert!(result.fit.slope > 0.0);
    assert!(result.fit.r_value > 0.9);
}
