//! Typed tool arguments
//!
//! Every field has a serde default so `{}` is a valid call for tools
//! without required inputs.

use serde::Deserialize;
use validator::Validate;

use shared::{
    validate_abc_thresholds, validate_confidence_level, validate_xyz_thresholds, AbcThresholds,
    ForecastMethod, PeriodType, XyzThresholds,
};

use crate::error::{AppError, AppResult};
use crate::services::abc_xyz::AbcXyzRequest;
use crate::services::forecasting::ForecastRequest;
use crate::services::supply::ProductFilter;
use crate::services::turnover::TurnoverRequest;

fn default_true() -> bool {
    true
}

fn default_threshold_days() -> f64 {
    7.0
}

fn default_weeks() -> i64 {
    4
}

fn default_periods() -> u32 {
    30
}

fn default_period_type() -> String {
    PeriodType::Day.as_str().to_string()
}

fn default_method() -> String {
    ForecastMethod::Auto.as_str().to_string()
}

fn default_historical_days() -> i64 {
    365
}

fn default_confidence_level() -> f64 {
    0.95
}

fn default_alert_threshold() -> f64 {
    50.0
}

fn default_analysis_days() -> i64 {
    365
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchCategoriesArgs {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SearchProductsArgs {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProductsByCategoryArgs {
    #[validate(length(min = 1))]
    pub category_name: String,
    #[serde(default = "default_true")]
    pub include_subcategories: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRulesArgs {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub only_below_minimum: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReorderAlertsArgs {
    #[serde(default = "default_threshold_days")]
    #[validate(range(min = 0.0))]
    pub threshold_days: f64,
    #[serde(default)]
    pub warehouse_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct WarehouseArgs {
    #[serde(default)]
    pub warehouse_id: Option<i64>,
}

/// Product name and category filters used by the supply tools
#[derive(Debug, Deserialize, Validate)]
pub struct ProductFilterArgs {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
}

impl ProductFilterArgs {
    pub fn as_filter(&self) -> ProductFilter<'_> {
        ProductFilter {
            product_name: self.product_name.as_deref(),
            category_name: self.category_name.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StockForecastArgs {
    #[serde(flatten)]
    pub filter: ProductFilterArgs,
    #[serde(default = "default_weeks")]
    pub weeks: i64,
}

impl StockForecastArgs {
    /// Requested weeks, clamped to 1..=12
    pub fn weeks(&self) -> u32 {
        self.weeks.clamp(1, 12) as u32
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FutureStockAlertArgs {
    #[serde(default)]
    pub target_date: String,
    #[serde(default = "default_alert_threshold")]
    pub threshold: f64,
    #[serde(flatten)]
    pub filter: ProductFilterArgs,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForecastArgs {
    #[serde(default)]
    pub product_ids: Option<Vec<i64>>,
    #[serde(default = "default_periods")]
    #[validate(range(min = 1, max = 365))]
    pub periods: u32,
    #[serde(default = "default_period_type")]
    pub period_type: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_historical_days")]
    #[validate(range(min = 1, max = 3650))]
    pub historical_days: i64,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
}

impl ForecastArgs {
    pub fn into_request(self) -> AppResult<ForecastRequest> {
        let period_type: PeriodType = self
            .period_type
            .parse()
            .map_err(|e: shared::ParseEnumError| AppError::Validation(e.to_string()))?;
        let method: ForecastMethod = self
            .method
            .parse()
            .map_err(|e: shared::ParseEnumError| AppError::Validation(e.to_string()))?;
        validate_confidence_level(self.confidence_level)
            .map_err(|msg| AppError::Validation(msg.to_string()))?;

        Ok(ForecastRequest {
            product_ids: self.product_ids,
            periods: self.periods,
            period_type,
            method,
            historical_days: self.historical_days,
            confidence_level: self.confidence_level,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AbcXyzArgs {
    #[serde(default)]
    pub product_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub category_ids: Option<Vec<i64>>,
    #[serde(default = "default_analysis_days")]
    #[validate(range(min = 1, max = 3650))]
    pub analysis_period_days: i64,
    #[serde(default)]
    pub abc_thresholds: Option<AbcThresholds>,
    #[serde(default)]
    pub xyz_thresholds: Option<XyzThresholds>,
}

impl AbcXyzArgs {
    pub fn into_request(self) -> AppResult<AbcXyzRequest> {
        let abc_thresholds = self.abc_thresholds.unwrap_or_default();
        let xyz_thresholds = self.xyz_thresholds.unwrap_or_default();
        validate_abc_thresholds(abc_thresholds.a, abc_thresholds.b)
            .and_then(|_| validate_xyz_thresholds(xyz_thresholds.x, xyz_thresholds.y))
            .map_err(|msg| AppError::Validation(msg.to_string()))?;

        Ok(AbcXyzRequest {
            product_ids: self.product_ids,
            category_ids: self.category_ids,
            analysis_period_days: self.analysis_period_days,
            abc_thresholds,
            xyz_thresholds,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct TurnoverArgs {
    #[serde(default)]
    pub product_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub category_ids: Option<Vec<i64>>,
    #[serde(default = "default_analysis_days")]
    #[validate(range(min = 1, max = 3650))]
    pub analysis_period_days: i64,
}

impl TurnoverArgs {
    pub fn into_request(self) -> TurnoverRequest {
        TurnoverRequest {
            product_ids: self.product_ids,
            category_ids: self.category_ids,
            analysis_period_days: self.analysis_period_days,
        }
    }
}

/// Slow-moving and high-risk filters over every product in the categories
#[derive(Debug, Deserialize, Validate)]
pub struct ValueFilterArgs {
    #[serde(default)]
    pub min_value: f64,
    #[serde(default)]
    pub category_ids: Option<Vec<i64>>,
}

impl ValueFilterArgs {
    pub fn request(&self) -> TurnoverRequest {
        TurnoverRequest {
            category_ids: self.category_ids.clone(),
            ..TurnoverRequest::default()
        }
    }
}
