//! Tool dispatch shared by the HTTP and stdio transports

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use super::args::*;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::OdooGateway;
use crate::services::stock_levels::StockLevelFilter;
use crate::services::{
    AbcXyzService, CatalogService, ForecastService, StockLevelService, SupplyService,
    TurnoverService,
};

/// Decode tool arguments; a missing or null body counts as `{}`
fn decode<T: DeserializeOwned>(arguments: Value) -> AppResult<T> {
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| AppError::Validation(format!("Invalid arguments: {}", e)))
}

fn decode_valid<T: DeserializeOwned + Validate>(arguments: Value) -> AppResult<T> {
    let args: T = decode(arguments)?;
    args.validate()?;
    Ok(args)
}

fn to_json<T: Serialize>(value: T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Summaries with nothing to summarize serialize as `{}`
fn summary_json<T: Serialize>(summary: Option<T>) -> AppResult<Value> {
    match summary {
        Some(summary) => to_json(summary),
        None => Ok(json!({})),
    }
}

/// Run one tool by name and return its JSON result
pub async fn dispatch<G: OdooGateway>(
    gateway: &G,
    config: &Config,
    name: &str,
    arguments: Value,
) -> AppResult<Value> {
    let span = tracing::info_span!("tool", tool = name, request_id = %Uuid::new_v4());
    async move {
        tracing::debug!("Tool call started");
        let result = run(gateway, config.analysis.default_location_id, name, arguments).await;
        match &result {
            Ok(_) => tracing::debug!("Tool call finished"),
            Err(e) => tracing::warn!(error = %e, "Tool call failed"),
        }
        result
    }
    .instrument(span)
    .await
}

async fn run<G: OdooGateway>(
    gateway: &G,
    location_id: i64,
    name: &str,
    arguments: Value,
) -> AppResult<Value> {
    match name {
        "search_categories" => {
            let args: SearchCategoriesArgs = decode_valid(arguments)?;
            to_json(CatalogService::new(gateway).search_categories(&args.name).await?)
        }
        "search_products" => {
            let args: SearchProductsArgs = decode_valid(arguments)?;
            let products = CatalogService::new(gateway)
                .search_products(
                    args.name.as_deref(),
                    args.product_id,
                    args.category_name.as_deref(),
                )
                .await?;
            to_json(products)
        }
        "get_products_by_category" => {
            let args: ProductsByCategoryArgs = decode_valid(arguments)?;
            let products = CatalogService::new(gateway)
                .get_products_by_category(&args.category_name, args.include_subcategories)
                .await?;
            to_json(products)
        }
        "get_reorder_rules" => {
            let args: ReorderRulesArgs = decode_valid(arguments)?;
            let rules = CatalogService::new(gateway)
                .get_reorder_rules(
                    args.product_name.as_deref(),
                    args.category_name.as_deref(),
                    args.only_below_minimum,
                )
                .await?;
            to_json(rules)
        }
        "get_stock_levels" => {
            let filter: StockLevelFilter = decode(arguments)?;
            to_json(
                StockLevelService::new(gateway, location_id)
                    .get_stock_levels(&filter)
                    .await?,
            )
        }
        "get_reorder_alerts" => {
            let args: ReorderAlertsArgs = decode_valid(arguments)?;
            to_json(
                StockLevelService::new(gateway, location_id)
                    .get_reorder_alerts(args.threshold_days, args.warehouse_id)
                    .await?,
            )
        }
        "get_stock_summary" => {
            let args: WarehouseArgs = decode_valid(arguments)?;
            to_json(
                StockLevelService::new(gateway, location_id)
                    .get_stock_summary(args.warehouse_id)
                    .await?,
            )
        }
        "get_stock_forecast" => {
            let args: StockForecastArgs = decode_valid(arguments)?;
            to_json(
                SupplyService::new(gateway, location_id)
                    .get_stock_forecast(args.filter.as_filter(), args.weeks())
                    .await?,
            )
        }
        "forecast_demand" => {
            let args: ForecastArgs = decode_valid(arguments)?;
            let request = args.into_request()?;
            to_json(
                ForecastService::new(gateway, location_id)
                    .forecast_demand(&request)
                    .await?,
            )
        }
        "get_forecast_summary" => {
            let args: ForecastArgs = decode_valid(arguments)?;
            let request = args.into_request()?;
            summary_json(
                ForecastService::new(gateway, location_id)
                    .get_forecast_summary(&request)
                    .await?,
            )
        }
        "get_lead_time" => {
            let args: ProductFilterArgs = decode_valid(arguments)?;
            to_json(
                SupplyService::new(gateway, location_id)
                    .get_lead_time(args.as_filter())
                    .await?,
            )
        }
        "get_future_stock_alert" => {
            let args: FutureStockAlertArgs = decode_valid(arguments)?;
            to_json(
                SupplyService::new(gateway, location_id)
                    .get_future_stock_alert(&args.target_date, args.threshold, args.filter.as_filter())
                    .await?,
            )
        }
        "analyze_abc_xyz" => {
            let args: AbcXyzArgs = decode_valid(arguments)?;
            let request = args.into_request()?;
            to_json(AbcXyzService::new(gateway, location_id).analyze(&request).await?)
        }
        "get_abc_xyz_summary" => {
            let args: AbcXyzArgs = decode_valid(arguments)?;
            let request = args.into_request()?;
            summary_json(
                AbcXyzService::new(gateway, location_id)
                    .get_analysis_summary(&request)
                    .await?,
            )
        }
        "analyze_turnover" => {
            let args: TurnoverArgs = decode_valid(arguments)?;
            to_json(
                TurnoverService::new(gateway, location_id)
                    .analyze_turnover(&args.into_request())
                    .await?,
            )
        }
        "analyze_aging" => {
            let args: TurnoverArgs = decode_valid(arguments)?;
            to_json(
                TurnoverService::new(gateway, location_id)
                    .analyze_aging(&args.into_request())
                    .await?,
            )
        }
        "get_turnover_summary" => {
            let args: TurnoverArgs = decode_valid(arguments)?;
            summary_json(
                TurnoverService::new(gateway, location_id)
                    .get_turnover_summary(&args.into_request())
                    .await?,
            )
        }
        "get_aging_summary" => {
            let args: TurnoverArgs = decode_valid(arguments)?;
            summary_json(
                TurnoverService::new(gateway, location_id)
                    .get_aging_summary(&args.into_request())
                    .await?,
            )
        }
        "get_slow_moving_items" => {
            let args: ValueFilterArgs = decode_valid(arguments)?;
            to_json(
                TurnoverService::new(gateway, location_id)
                    .get_slow_moving_items(&args.request(), args.min_value)
                    .await?,
            )
        }
        "get_high_risk_aging_items" => {
            let args: ValueFilterArgs = decode_valid(arguments)?;
            to_json(
                TurnoverService::new(gateway, location_id)
                    .get_high_risk_aging_items(&args.request(), args.min_value)
                    .await?,
            )
        }
        other => Err(AppError::UnknownTool(other.to_string())),
    }
}
