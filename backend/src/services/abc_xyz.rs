//! ABC/XYZ classification service

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use shared::{
    category_breakdown, parse_erp_date, rank_and_classify, summarize_abc_xyz, AbcThresholds,
    AbcXyzResult, AbcXyzSummary, ConsumptionProfile, PeriodType, XyzThresholds,
};

use super::{days_before, local_today, non_empty};
use crate::error::AppResult;
use crate::external::records::{MoveRecord, ProductRecord, MOVE, PRODUCT};
use crate::external::{Domain, OdooGateway, Op, Query};

/// Parameters of one classification run
#[derive(Debug, Clone)]
pub struct AbcXyzRequest {
    pub product_ids: Option<Vec<i64>>,
    pub category_ids: Option<Vec<i64>>,
    pub analysis_period_days: i64,
    pub abc_thresholds: AbcThresholds,
    pub xyz_thresholds: XyzThresholds,
}

impl Default for AbcXyzRequest {
    fn default() -> Self {
        Self {
            product_ids: None,
            category_ids: None,
            analysis_period_days: 365,
            abc_thresholds: AbcThresholds::default(),
            xyz_thresholds: XyzThresholds::default(),
        }
    }
}

#[derive(Default)]
struct Consumption {
    total: f64,
    by_month: BTreeMap<NaiveDate, f64>,
}

/// ABC/XYZ classification service
pub struct AbcXyzService<'a, G> {
    gateway: &'a G,
    location_id: i64,
    today: NaiveDate,
}

impl<'a, G: OdooGateway> AbcXyzService<'a, G> {
    /// Create a new AbcXyzService for one stock location
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

    /// Classify products by consumption share and demand variability
    ///
    /// Results are ordered by consumption, largest first.
    pub async fn analyze(&self, request: &AbcXyzRequest) -> AppResult<Vec<AbcXyzResult>> {
        let domain = Domain::new()
            .and("type", Op::Eq, "product")
            .and_some(
                "id",
                Op::In,
                non_empty(&request.product_ids).map(<[i64]>::to_vec),
            )
            .and_some(
                "categ_id",
                Op::In,
                non_empty(&request.category_ids).map(<[i64]>::to_vec),
            );

        let products: Vec<ProductRecord> = self
            .gateway
            .search_read(
                PRODUCT,
                &Query::new(domain).fields(&["id", "name", "default_code", "categ_id"]),
            )
            .await?;
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let mut consumption = self
            .consumption(&ids, request.analysis_period_days)
            .await?;

        let profiles = products
            .into_iter()
            .map(|product| {
                let usage = consumption.remove(&product.id).unwrap_or_default();
                ConsumptionProfile {
                    product_id: product.id,
                    category: product.category_or_uncategorized(),
                    product_name: product.name,
                    product_code: product.default_code,
                    annual_quantity: usage.total,
                    monthly_demands: usage.by_month.into_values().collect(),
                }
            })
            .collect();

        let results = rank_and_classify(
            profiles,
            &request.abc_thresholds,
            &request.xyz_thresholds,
        );
        tracing::debug!(products = results.len(), "ABC/XYZ classification complete");
        Ok(results)
    }

    /// Classify and roll up; `None` when no product was classified
    pub async fn get_analysis_summary(
        &self,
        request: &AbcXyzRequest,
    ) -> AppResult<Option<AbcXyzSummary>> {
        let results = self.analyze(request).await?;
        Ok(summarize_abc_xyz(&results))
    }

    /// Classify and group by combined class
    pub async fn get_category_breakdown(
        &self,
        request: &AbcXyzRequest,
    ) -> AppResult<BTreeMap<String, Vec<AbcXyzResult>>> {
        let results = self.analyze(request).await?;
        Ok(category_breakdown(&results))
    }

    /// Quantity shipped to customers or production, in total and per
    /// calendar month with at least one move
    async fn consumption(
        &self,
        product_ids: &[i64],
        days: i64,
    ) -> AppResult<HashMap<i64, Consumption>> {
        let domain = Domain::new()
            .and("product_id", Op::In, product_ids.to_vec())
            .and("state", Op::Eq, "done")
            .and("date", Op::Ge, days_before(self.today, days))
            .and("location_id", Op::Eq, self.location_id)
            .and(
                "location_dest_id.usage",
                Op::In,
                vec!["customer", "production"],
            );

        let moves: Vec<MoveRecord> = self
            .gateway
            .search_read(
                MOVE,
                &Query::new(domain)
                    .fields(&["product_id", "product_uom_qty", "date"])
                    .order("date asc"),
            )
            .await?;

        let mut consumption: HashMap<i64, Consumption> = HashMap::new();
        for m in &moves {
            let Some(pid) = m.product_id.id() else {
                continue;
            };
            let entry = consumption.entry(pid).or_default();
            entry.total += m.product_uom_qty;
            if let Some(date) = m.date.as_deref().and_then(parse_erp_date) {
                *entry
                    .by_month
                    .entry(PeriodType::Month.bucket_start(date))
                    .or_insert(0.0) += m.product_uom_qty;
            }
        }
        Ok(consumption)
    }
}
