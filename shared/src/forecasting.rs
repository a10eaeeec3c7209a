//! Time-series demand forecasting
//!
//! Turns a dense demand series into a horizon of point forecasts with
//! prediction intervals. Four method families are supported and `Auto`
//! picks one from the shape of the series:
//!
//! - fewer than 10 points: moving average
//! - seasonal: Holt-Winters (level and trend only)
//! - coefficient of variation below 0.3: exponential smoothing
//! - otherwise: linear regression

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::{
    AccuracyMetrics, ForecastMethod, ForecastPeriod, ForecastResult, ForecastSummary,
    SummaryAccuracy, Trend, TrendBreakdown,
};
use crate::statistics::{
    autocorrelation, guarded_cv, linregress, mape, mean, mean_abs, normal_ppf, rms, round_to,
    std_dev, EPSILON,
};
use crate::types::PeriodType;

/// Level smoothing factor shared by exponential smoothing and Holt-Winters
pub const ALPHA: f64 = 0.3;
/// Trend smoothing factor for Holt-Winters
pub const BETA: f64 = 0.1;
/// Series shorter than this are not forecast
pub const MIN_OBSERVATIONS: usize = 4;

const MAX_MA_WINDOW: usize = 7;
const TREND_P_VALUE: f64 = 0.05;
const TREND_RELATIVE_SLOPE: f64 = 0.01;
const SEASONAL_MIN_OBSERVATIONS: usize = 14;
const SEASONAL_AUTOCORRELATION: f64 = 0.3;
const SHORT_SERIES: usize = 10;
const STABLE_CV: f64 = 0.3;

/// Gap-free demand history, one value per period
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DemandSeries {
    pub dates: Vec<NaiveDate>,
    pub quantities: Vec<f64>,
}

impl DemandSeries {
    /// Bucket dated quantities into periods and fill missing periods with zero
    pub fn aggregate<I>(observations: I, period: PeriodType) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (date, qty) in observations {
            *buckets.entry(period.bucket_start(date)).or_insert(0.0) += qty;
        }

        let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Self::default(),
        };

        let mut series = Self::default();
        let mut cursor = first;
        while cursor <= last {
            series.dates.push(cursor);
            series
                .quantities
                .push(buckets.get(&cursor).copied().unwrap_or(0.0));
            cursor = period.advance(cursor, 1);
        }
        series
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

/// Point forecast and interval for one future period, before flooring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub point: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Output of one method family over one series
#[derive(Debug, Clone, PartialEq)]
pub struct MethodForecast {
    pub points: Vec<ForecastPoint>,
    pub accuracy: AccuracyMetrics,
}

/// Everything a forecast result carries except product identity
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesForecast {
    pub method_used: ForecastMethod,
    pub periods: Vec<ForecastPeriod>,
    pub accuracy: AccuracyMetrics,
    pub historical_avg: f64,
    pub trend: Trend,
    pub seasonality_detected: bool,
}

/// Forecast a series; `None` when it has fewer than four observations
pub fn forecast_series(
    series: &DemandSeries,
    periods: u32,
    period_type: PeriodType,
    method: ForecastMethod,
    confidence_level: f64,
) -> Option<SeriesForecast> {
    if series.len() < MIN_OBSERVATIONS {
        return None;
    }
    let data = &series.quantities;
    let last_date = *series.dates.last()?;

    let trend = detect_trend(data);
    let seasonality_detected = detect_seasonality(data, period_type);
    let method_used = match method {
        ForecastMethod::Auto => select_method(data, seasonality_detected),
        explicit => explicit,
    };

    let forecast = generate(data, periods as usize, method_used, confidence_level);

    Some(SeriesForecast {
        method_used,
        periods: to_periods(last_date, period_type, &forecast.points),
        accuracy: forecast.accuracy,
        historical_avg: round_to(mean(data), 2),
        trend,
        seasonality_detected,
    })
}

/// Significant linear trend relative to the series mean
pub fn detect_trend(data: &[f64]) -> Trend {
    if data.len() < 3 {
        return Trend::Stable;
    }
    let Some(fit) = linregress(data) else {
        return Trend::Stable;
    };
    if fit.p_value < TREND_P_VALUE {
        let relative_slope = fit.slope / (mean(data) + EPSILON);
        if relative_slope > TREND_RELATIVE_SLOPE {
            return Trend::Increasing;
        }
        if relative_slope < -TREND_RELATIVE_SLOPE {
            return Trend::Decreasing;
        }
    }
    Trend::Stable
}

/// Autocorrelation at the seasonal lag above 0.3
pub fn detect_seasonality(data: &[f64], period_type: PeriodType) -> bool {
    if data.len() < SEASONAL_MIN_OBSERVATIONS {
        return false;
    }
    let period = period_type.seasonal_period();
    if data.len() < period * 2 {
        return false;
    }
    autocorrelation(data, period) > SEASONAL_AUTOCORRELATION
}

/// Pick a concrete method from the shape of the series
pub fn select_method(data: &[f64], has_seasonality: bool) -> ForecastMethod {
    if data.len() < SHORT_SERIES {
        return ForecastMethod::MovingAverage;
    }
    if has_seasonality {
        return ForecastMethod::HoltWinters;
    }
    if guarded_cv(data) < STABLE_CV {
        ForecastMethod::ExponentialSmoothing
    } else {
        ForecastMethod::LinearRegression
    }
}

/// Run one method family over `data`
pub fn generate(
    data: &[f64],
    periods: usize,
    method: ForecastMethod,
    confidence_level: f64,
) -> MethodForecast {
    if data.is_empty() {
        return MethodForecast {
            points: Vec::new(),
            accuracy: AccuracyMetrics::default(),
        };
    }
    let z = normal_ppf((1.0 + confidence_level) / 2.0);
    match method {
        ForecastMethod::MovingAverage | ForecastMethod::Auto => moving_average(data, periods, z),
        ForecastMethod::ExponentialSmoothing => exponential_smoothing(data, periods, z),
        ForecastMethod::LinearRegression => linear_regression(data, periods, z),
        ForecastMethod::HoltWinters => holt_winters(data, periods, z),
    }
}

fn moving_average(data: &[f64], periods: usize, z: f64) -> MethodForecast {
    let window = (data.len() / 2).clamp(1, MAX_MA_WINDOW);
    let tail = &data[data.len() - window..];
    let value = mean(tail);
    let std_error = std_dev(tail);

    let points = (0..periods)
        .map(|i| {
            let half = z * std_error * (1.0 + i as f64 * 0.1).sqrt();
            ForecastPoint {
                point: value,
                lower: value - half,
                upper: value + half,
            }
        })
        .collect();

    MethodForecast {
        points,
        accuracy: backtest(data, window, Backtest::MovingAverage),
    }
}

fn smooth(data: &[f64]) -> Vec<f64> {
    let mut smoothed = Vec::with_capacity(data.len());
    for (i, x) in data.iter().enumerate() {
        if i == 0 {
            smoothed.push(*x);
        } else {
            smoothed.push(ALPHA * x + (1.0 - ALPHA) * smoothed[i - 1]);
        }
    }
    smoothed
}

fn exponential_smoothing(data: &[f64], periods: usize, z: f64) -> MethodForecast {
    let smoothed = smooth(data);
    let value = smoothed.last().copied().unwrap_or(0.0);
    let residuals: Vec<f64> = data.iter().zip(&smoothed).map(|(x, s)| x - s).collect();
    let std_error = std_dev(&residuals);

    let points = (0..periods)
        .map(|i| {
            let half = z * std_error * (1.0 + i as f64 * ALPHA * ALPHA).sqrt();
            ForecastPoint {
                point: value,
                lower: value - half,
                upper: value + half,
            }
        })
        .collect();

    MethodForecast {
        points,
        accuracy: backtest(data, data.len() / 5, Backtest::Smoothing),
    }
}

fn linear_regression(data: &[f64], periods: usize, z: f64) -> MethodForecast {
    let Some(fit) = linregress(data) else {
        return moving_average(data, periods, z);
    };
    let n = data.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let sxx: f64 = (0..data.len()).map(|i| (i as f64 - x_mean).powi(2)).sum();

    let residuals: Vec<f64> = data
        .iter()
        .enumerate()
        .map(|(i, y)| y - fit.predict(i as f64))
        .collect();
    let rmse = rms(&residuals);

    let points = (0..periods)
        .map(|i| {
            let future_x = n + i as f64;
            let point = fit.predict(future_x);
            let se = rmse * (1.0 + 1.0 / n + (future_x - x_mean).powi(2) / sxx).sqrt();
            ForecastPoint {
                point,
                lower: point - z * se,
                upper: point + z * se,
            }
        })
        .collect();

    MethodForecast {
        points,
        accuracy: AccuracyMetrics {
            r_squared: Some(round_to(fit.r_value * fit.r_value, 4)),
            rmse: round_to(rmse, 2),
            mae: round_to(mean_abs(&residuals), 2),
            mape: round_to(mape(&residuals, data), 2),
        },
    }
}

fn holt_winters(data: &[f64], periods: usize, z: f64) -> MethodForecast {
    let mut level = data[0];
    let mut trend = if data.len() > 1 { data[1] - data[0] } else { 0.0 };
    let mut fitted = Vec::with_capacity(data.len());
    fitted.push(level + trend);

    for x in &data[1..] {
        let new_level = ALPHA * x + (1.0 - ALPHA) * (level + trend);
        trend = BETA * (new_level - level) + (1.0 - BETA) * trend;
        level = new_level;
        fitted.push(level + trend);
    }

    let residuals: Vec<f64> = data.iter().zip(&fitted).map(|(x, f)| x - f).collect();
    let std_error = std_dev(&residuals);

    let points = (0..periods)
        .map(|i| {
            let point = level + (i as f64 + 1.0) * trend;
            let se = std_error * (1.0 + i as f64 * 0.2).sqrt();
            ForecastPoint {
                point,
                lower: point - z * se,
                upper: point + z * se,
            }
        })
        .collect();

    MethodForecast {
        points,
        accuracy: AccuracyMetrics {
            r_squared: None,
            rmse: round_to(rms(&residuals), 2),
            mae: round_to(mean_abs(&residuals), 2),
            mape: round_to(mape(&residuals, data), 2),
        },
    }
}

/// Predictor used for the holdout check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backtest {
    MovingAverage,
    Smoothing,
}

/// Withhold the last `holdout` points and predict them with a flat forecast
///
/// Returns zeroed metrics when the holdout is shorter than 2 or covers the
/// whole series.
pub fn backtest(data: &[f64], holdout: usize, mode: Backtest) -> AccuracyMetrics {
    if holdout < 2 || holdout >= data.len() {
        return AccuracyMetrics::default();
    }
    let (train, test) = data.split_at(data.len() - holdout);

    let prediction = match mode {
        Backtest::MovingAverage => {
            let window = (train.len() / 2).clamp(1, MAX_MA_WINDOW);
            mean(&train[train.len() - window..])
        }
        Backtest::Smoothing => smooth(train).last().copied().unwrap_or(0.0),
    };

    let errors: Vec<f64> = test.iter().map(|x| x - prediction).collect();
    AccuracyMetrics {
        r_squared: None,
        mae: round_to(mean_abs(&errors), 2),
        rmse: round_to(rms(&errors), 2),
        mape: round_to(mape(&errors, test), 2),
    }
}

/// Date each point and floor quantities and bounds at zero
pub fn to_periods(
    last_date: NaiveDate,
    period_type: PeriodType,
    points: &[ForecastPoint],
) -> Vec<ForecastPeriod> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| ForecastPeriod {
            date: period_type.advance(last_date, i as u32 + 1),
            quantity: round_to(p.point.max(0.0), 2),
            lower_bound: round_to(p.lower.max(0.0), 2),
            upper_bound: round_to(p.upper.max(0.0), 2),
        })
        .collect()
}

/// Rollup across forecasts; `None` for an empty batch
pub fn summarize(results: &[ForecastResult]) -> Option<ForecastSummary> {
    if results.is_empty() {
        return None;
    }
    let total: f64 = results
        .iter()
        .flat_map(|r| r.forecast_periods.iter())
        .map(|p| p.quantity)
        .sum();

    let mut trend_breakdown = TrendBreakdown::default();
    for r in results {
        trend_breakdown.record(r.trend);
    }

    let mapes: Vec<f64> = results.iter().map(|r| r.accuracy_metrics.mape).collect();

    Some(ForecastSummary {
        products_forecasted: results.len(),
        total_forecasted_demand: round_to(total, 2),
        trend_breakdown,
        seasonality_detected_count: results.iter().filter(|r| r.seasonality_detected).count(),
        accuracy_metrics: SummaryAccuracy {
            avg_mape: round_to(mean(&mapes), 2),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_aggregate_fills_gaps() {
        let series = DemandSeries::aggregate(
            vec![
                (date(2024, 1, 1), 5.0),
                (date(2024, 1, 1), 2.0),
                (date(2024, 1, 4), 3.0),
            ],
            PeriodType::Day,
        );
        assert_eq!(series.quantities, vec![7.0, 0.0, 0.0, 3.0]);
        assert_eq!(series.dates.first(), Some(&date(2024, 1, 1)));
        assert_eq!(series.dates.last(), Some(&date(2024, 1, 4)));
    }

    #[test]
    fn test_aggregate_by_month() {
        let series = DemandSeries::aggregate(
            vec![(date(2024, 1, 15), 5.0), (date(2024, 3, 2), 1.0)],
            PeriodType::Month,
        );
        assert_eq!(series.dates, vec![date(2024, 1, 1), date(2024, 2, 1), date(2024, 3, 1)]);
        assert_eq!(series.quantities, vec![5.0, 0.0, 1.0]);
    }

    #[test]
    fn test_short_series_is_skipped() {
        let series = DemandSeries::aggregate(
            vec![(date(2024, 1, 1), 5.0), (date(2024, 1, 3), 2.0)],
            PeriodType::Day,
        );
        assert_eq!(series.len(), 3);
        assert!(forecast_series(&series, 5, PeriodType::Day, ForecastMethod::Auto, 0.95).is_none());
    }

    #[test]
    fn test_trend_detection() {
        let rising: Vec<f64> = (0..20).map(|i| 10.0 + 2.0 * i as f64).collect();
        let falling: Vec<f64> = rising.iter().rev().copied().collect();
        assert_eq!(detect_trend(&rising), Trend::Increasing);
        assert_eq!(detect_trend(&falling), Trend::Decreasing);
        assert_eq!(detect_trend(&[5.0; 20]), Trend::Stable);
        assert_eq!(detect_trend(&[1.0, 100.0]), Trend::Stable);
    }

    #[test]
    fn test_seasonality_requires_length() {
        let weekly: Vec<f64> = (0..28).map(|i| if i % 7 == 0 { 50.0 } else { 5.0 }).collect();
        assert!(detect_seasonality(&weekly, PeriodType::Day));
        assert!(!detect_seasonality(&weekly[..13], PeriodType::Day));
        // Monthly seasonality needs 24 observations
        assert!(!detect_seasonality(&weekly[..20], PeriodType::Month));
    }

    #[test]
    fn test_method_selection() {
        assert_eq!(select_method(&[1.0; 9], false), ForecastMethod::MovingAverage);
        assert_eq!(select_method(&[1.0; 12], true), ForecastMethod::HoltWinters);
        assert_eq!(select_method(&[10.0; 12], false), ForecastMethod::ExponentialSmoothing);
        let volatile = [0.0, 20.0, 0.0, 30.0, 1.0, 25.0, 0.0, 40.0, 2.0, 18.0];
        assert_eq!(select_method(&volatile, false), ForecastMethod::LinearRegression);
    }

    #[test]
    fn test_moving_average_constant_series() {
        let forecast = generate(&[10.0; 8], 3, ForecastMethod::MovingAverage, 0.95);
        assert_eq!(forecast.points.len(), 3);
        for p in &forecast.points {
            assert_eq!(p.point, 10.0);
            assert_eq!(p.lower, 10.0);
            assert_eq!(p.upper, 10.0);
        }
        assert_eq!(forecast.accuracy.mae, 0.0);
    }

    #[test]
    fn test_linear_regression_extrapolates() {
        let data: Vec<f64> = (0..10).map(|i| 3.0 * i as f64 + 1.0).collect();
        let forecast = generate(&data, 2, ForecastMethod::LinearRegression, 0.95);
        assert!((forecast.points[0].point - 31.0).abs() < 1e-9);
        assert!((forecast.points[1].point - 34.0).abs() < 1e-9);
        assert_eq!(forecast.accuracy.r_squared, Some(1.0));
        assert_eq!(forecast.accuracy.rmse, 0.0);
    }

    #[test]
    fn test_holt_winters_follows_linear_trend() {
        let data: Vec<f64> = (0..12).map(|i| 5.0 + i as f64).collect();
        let forecast = generate(&data, 3, ForecastMethod::HoltWinters, 0.95);
        assert!((forecast.points[0].point - 17.0).abs() < 1e-9);
        assert!((forecast.points[2].point - 19.0).abs() < 1e-9);
        assert!(forecast.accuracy.r_squared.is_none());
    }

    #[test]
    fn test_intervals_widen_with_horizon() {
        let data = [3.0, 9.0, 4.0, 12.0, 6.0, 8.0, 2.0, 11.0, 5.0, 7.0, 10.0, 4.0];
        let forecast = generate(&data, 5, ForecastMethod::ExponentialSmoothing, 0.95);
        let widths: Vec<f64> = forecast.points.iter().map(|p| p.upper - p.lower).collect();
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_backtest_bounds() {
        assert_eq!(backtest(&[1.0, 2.0, 3.0], 1, Backtest::Smoothing), AccuracyMetrics::default());
        assert_eq!(backtest(&[1.0, 2.0, 3.0], 3, Backtest::Smoothing), AccuracyMetrics::default());
        let metrics = backtest(&[4.0, 4.0, 4.0, 4.0, 6.0, 2.0], 2, Backtest::MovingAverage);
        assert_eq!(metrics.mae, 2.0);
        assert_eq!(metrics.rmse, 2.0);
    }

    #[test]
    fn test_periods_are_floored() {
        let points = [ForecastPoint { point: -1.0, lower: -5.0, upper: 2.346 }];
        let periods = to_periods(date(2024, 1, 31), PeriodType::Month, &points);
        assert_eq!(periods[0].date, date(2024, 2, 29));
        assert_eq!(periods[0].quantity, 0.0);
        assert_eq!(periods[0].lower_bound, 0.0);
        assert_eq!(periods[0].upper_bound, 2.35);
    }
}
