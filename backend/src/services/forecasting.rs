//! Demand forecasting service

use chrono::NaiveDate;

use shared::forecasting::{forecast_series, summarize, DemandSeries};
use shared::{parse_erp_date, ForecastMethod, ForecastResult, ForecastSummary, PeriodType};

use super::{days_before, local_today, non_empty};
use crate::error::AppResult;
use crate::external::records::{MoveRecord, ProductRecord, MOVE, PRODUCT};
use crate::external::{Domain, OdooGateway, Op, Query};

/// Products forecast when the caller names none
const DEFAULT_PRODUCT_LIMIT: u32 = 100;

/// Parameters of one forecast run
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub product_ids: Option<Vec<i64>>,
    pub periods: u32,
    pub period_type: PeriodType,
    pub method: ForecastMethod,
    pub historical_days: i64,
    pub confidence_level: f64,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            product_ids: None,
            periods: 30,
            period_type: PeriodType::Day,
            method: ForecastMethod::Auto,
            historical_days: 365,
            confidence_level: 0.95,
        }
    }
}

/// Demand forecasting service
pub struct ForecastService<'a, G> {
    gateway: &'a G,
    location_id: i64,
    today: NaiveDate,
}

impl<'a, G: OdooGateway> ForecastService<'a, G> {
    /// Create a new ForecastService for one stock location
    pub fn new(gateway: &'a G, location_id: i64) -> Self {
        Self {
            gateway,
            location_id,
            today: local_today(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Forecast demand per product
    ///
    /// Products with too little history, or whose history cannot be
    /// fetched, are left out of the result.
    pub async fn forecast_demand(&self, request: &ForecastRequest) -> AppResult<Vec<ForecastResult>> {
        let query = match non_empty(&request.product_ids) {
            Some(ids) => Query::new(
                Domain::new()
                    .and("id", Op::In, ids.to_vec())
                    .and("type", Op::Eq, "product"),
            ),
            None => Query::new(Domain::new().and("type", Op::Eq, "product"))
                .limit(DEFAULT_PRODUCT_LIMIT),
        }
        .fields(&["id", "name", "default_code"]);
        let products: Vec<ProductRecord> = self.gateway.search_read(PRODUCT, &query).await?;

        let mut results = Vec::new();
        for product in products {
            let history = match self.demand_history(product.id, request).await {
                Ok(history) => history,
                Err(e) => {
                    tracing::debug!(product_id = product.id, error = %e, "Skipping product");
                    continue;
                }
            };

            let Some(forecast) = forecast_series(
                &history,
                request.periods,
                request.period_type,
                request.method,
                request.confidence_level,
            ) else {
                tracing::debug!(
                    product_id = product.id,
                    observations = history.len(),
                    "Not enough history to forecast"
                );
                continue;
            };

            results.push(ForecastResult {
                product_id: product.id,
                product_name: product.name,
                product_code: product.default_code,
                method_used: forecast.method_used,
                forecast_periods: forecast.periods,
                accuracy_metrics: forecast.accuracy,
                historical_avg: forecast.historical_avg,
                trend: forecast.trend,
                seasonality_detected: forecast.seasonality_detected,
                confidence_level: request.confidence_level,
            });
        }

        Ok(results)
    }

    /// Forecast and roll up; `None` when nothing could be forecast
    pub async fn get_forecast_summary(
        &self,
        request: &ForecastRequest,
    ) -> AppResult<Option<ForecastSummary>> {
        let results = self.forecast_demand(request).await?;
        Ok(summarize(&results))
    }

    /// Customer shipments from the location, bucketed by period
    async fn demand_history(
        &self,
        product_id: i64,
        request: &ForecastRequest,
    ) -> AppResult<DemandSeries> {
        let domain = Domain::new()
            .and("product_id", Op::Eq, product_id)
            .and("state", Op::Eq, "done")
            .and("date", Op::Ge, days_before(self.today, request.historical_days))
            .and("location_id", Op::Eq, self.location_id)
            .and("location_dest_id.usage", Op::Eq, "customer");

        let moves: Vec<MoveRecord> = self
            .gateway
            .search_read(
                MOVE,
                &Query::new(domain)
                    .fields(&["date", "product_uom_qty"])
                    .order("date asc"),
            )
            .await?;

        let observations = moves.iter().filter_map(|m| {
            m.date
                .as_deref()
                .and_then(parse_erp_date)
                .map(|date| (date, m.product_uom_qty))
        });
        Ok(DemandSeries::aggregate(observations, request.period_type))
    }
}
