//! Demand forecast models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::ParseEnumError;

/// Available forecasting methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    #[default]
    Auto,
    MovingAverage,
    ExponentialSmoothing,
    LinearRegression,
    HoltWinters,
}

impl ForecastMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastMethod::Auto => "auto",
            ForecastMethod::MovingAverage => "moving_average",
            ForecastMethod::ExponentialSmoothing => "exponential_smoothing",
            ForecastMethod::LinearRegression => "linear_regression",
            ForecastMethod::HoltWinters => "holt_winters",
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForecastMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(ForecastMethod::Auto),
            "moving_average" => Ok(ForecastMethod::MovingAverage),
            "exponential_smoothing" => Ok(ForecastMethod::ExponentialSmoothing),
            "linear_regression" => Ok(ForecastMethod::LinearRegression),
            "holt_winters" => Ok(ForecastMethod::HoltWinters),
            other => Err(ParseEnumError::new("method", other)),
        }
    }
}

/// Direction of a demand series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

/// One forecast period with its prediction interval
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastPeriod {
    pub date: NaiveDate,
    pub quantity: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Error metrics reported alongside a forecast
///
/// `r_squared` is only present for linear regression.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct AccuracyMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
    pub rmse: f64,
    pub mae: f64,
    pub mape: f64,
}

/// Forecast for one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastResult {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: Option<String>,
    pub method_used: ForecastMethod,
    pub forecast_periods: Vec<ForecastPeriod>,
    pub accuracy_metrics: AccuracyMetrics,
    pub historical_avg: f64,
    pub trend: Trend,
    pub seasonality_detected: bool,
    pub confidence_level: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TrendBreakdown {
    pub increasing: usize,
    pub decreasing: usize,
    pub stable: usize,
}

impl TrendBreakdown {
    pub fn record(&mut self, trend: Trend) {
        match trend {
            Trend::Increasing => self.increasing += 1,
            Trend::Decreasing => self.decreasing += 1,
            Trend::Stable => self.stable += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SummaryAccuracy {
    pub avg_mape: f64,
}

/// Rollup across a batch of forecasts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastSummary {
    pub products_forecasted: usize,
    pub total_forecasted_demand: f64,
    pub trend_breakdown: TrendBreakdown,
    pub seasonality_detected_count: usize,
    pub accuracy_metrics: SummaryAccuracy,
}
