//! Turnover and aging service

use chrono::NaiveDate;
use std::collections::HashMap;

use shared::statistics::round_to;
use shared::{
    average_inventory, days_of_inventory, high_risk, parse_erp_date, slow_moving,
    summarize_aging, summarize_turnover, turnover_ratio, AgingProfile, AgingResult,
    AgingSummary, ObsolescenceRisk, QuantAge, TurnoverCategory, TurnoverResult, TurnoverSummary,
};

use super::{days_before, local_today, non_empty, quantity_by_product};
use crate::error::AppResult;
use crate::external::records::{MoveRecord, ProductRecord, QuantRecord, MOVE, PRODUCT, QUANT};
use crate::external::{Domain, OdooGateway, Op, Query, Term};

/// Which products a turnover or aging run covers
#[derive(Debug, Clone)]
pub struct TurnoverRequest {
    pub product_ids: Option<Vec<i64>>,
    pub category_ids: Option<Vec<i64>>,
    pub analysis_period_days: i64,
}

impl Default for TurnoverRequest {
    fn default() -> Self {
        Self {
            product_ids: None,
            category_ids: None,
            analysis_period_days: 365,
        }
    }
}

/// Turnover and aging service
pub struct TurnoverService<'a, G> {
    gateway: &'a G,
    location_id: i64,
    today: NaiveDate,
}

impl<'a, G: OdooGateway> TurnoverService<'a, G> {
    /// Create a new TurnoverService for one stock location
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

    /// Turnover ratio per product, most stagnant first
    pub async fn analyze_turnover(
        &self,
        request: &TurnoverRequest,
    ) -> AppResult<Vec<TurnoverResult>> {
        let products = self.products(request).await?;
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let since = days_before(self.today, request.analysis_period_days);

        let on_hand = self.on_hand_at_location().await?;
        let sold = self.quantity_sold(&ids, &since).await?;
        let average = self.average_inventory(&ids, &since).await?;
        let last_moves = self.last_movement_dates(&ids).await?;

        let mut results: Vec<TurnoverResult> = products
            .into_iter()
            .map(|product| {
                let current_qty = on_hand.get(&product.id).copied().unwrap_or(0.0);
                let qty_sold = sold.get(&product.id).copied().unwrap_or(0.0);
                let avg_qty = average.get(&product.id).copied().unwrap_or(current_qty);
                let ratio = turnover_ratio(qty_sold, avg_qty);
                let last_movement_date = last_moves.get(&product.id).copied();

                TurnoverResult {
                    product_id: product.id,
                    category: product.category_or_uncategorized(),
                    product_name: product.name,
                    product_code: product.default_code,
                    current_stock_qty: round_to(current_qty, 2),
                    current_stock_value: 0.0,
                    cost_of_goods_sold: round_to(qty_sold, 2),
                    average_inventory_value: round_to(avg_qty, 2),
                    turnover_ratio: round_to(ratio, 2),
                    days_of_inventory: days_of_inventory(ratio),
                    turnover_category: TurnoverCategory::classify(ratio),
                    last_movement_date,
                    days_since_movement: last_movement_date
                        .map(|date| (self.today - date).num_days()),
                }
            })
            .collect();

        results.sort_by(|a, b| a.turnover_ratio.total_cmp(&b.turnover_ratio));
        Ok(results)
    }

    /// Age profile of on-hand stock per product, oldest first
    ///
    /// Products with nothing on hand at the location are left out.
    pub async fn analyze_aging(&self, request: &TurnoverRequest) -> AppResult<Vec<AgingResult>> {
        let products = self.products(request).await?;
        if products.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();

        let domain = Domain::new()
            .and("product_id", Op::In, ids)
            .and("quantity", Op::Gt, 0)
            .and("location_id", Op::Eq, self.location_id);
        let quants: Vec<QuantRecord> = self
            .gateway
            .search_read(
                QUANT,
                &Query::new(domain).fields(&["product_id", "quantity", "in_date", "lot_id"]),
            )
            .await?;

        let mut by_product: HashMap<i64, Vec<QuantAge>> = HashMap::new();
        for q in &quants {
            if let Some(pid) = q.product_id.id() {
                by_product.entry(pid).or_default().push(QuantAge {
                    quantity: q.quantity,
                    received: q.in_date.as_deref().and_then(parse_erp_date),
                });
            }
        }

        let mut results: Vec<AgingResult> = products
            .into_iter()
            .filter_map(|product| {
                let quants = by_product.remove(&product.id)?;
                let profile = AgingProfile::build(&quants, self.today);
                let risk = ObsolescenceRisk::assess(&profile.breakdown, profile.average_age_days);
                Some(AgingResult {
                    product_id: product.id,
                    category: product.category_or_uncategorized(),
                    product_name: product.name,
                    product_code: product.default_code,
                    total_qty: profile.total_qty,
                    total_value: 0.0,
                    aging_breakdown: profile.breakdown,
                    oldest_stock_date: profile.oldest,
                    average_age_days: round_to(profile.average_age_days, 1),
                    obsolescence_risk: risk,
                })
            })
            .collect();

        results.sort_by(|a, b| b.average_age_days.total_cmp(&a.average_age_days));
        Ok(results)
    }

    pub async fn get_turnover_summary(
        &self,
        request: &TurnoverRequest,
    ) -> AppResult<Option<TurnoverSummary>> {
        let results = self.analyze_turnover(request).await?;
        Ok(summarize_turnover(&results))
    }

    pub async fn get_aging_summary(
        &self,
        request: &TurnoverRequest,
    ) -> AppResult<Option<AgingSummary>> {
        let results = self.analyze_aging(request).await?;
        Ok(summarize_aging(&results))
    }

    /// Slow moving and dead stock with at least `min_value` in stock
    pub async fn get_slow_moving_items(
        &self,
        request: &TurnoverRequest,
        min_value: f64,
    ) -> AppResult<Vec<TurnoverResult>> {
        let results = self.analyze_turnover(request).await?;
        Ok(slow_moving(&results, min_value))
    }

    /// High obsolescence risk items with at least `min_value` in stock
    pub async fn get_high_risk_aging_items(
        &self,
        request: &TurnoverRequest,
        min_value: f64,
    ) -> AppResult<Vec<AgingResult>> {
        let results = self.analyze_aging(request).await?;
        Ok(high_risk(&results, min_value))
    }

    async fn products(&self, request: &TurnoverRequest) -> AppResult<Vec<ProductRecord>> {
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
        self.gateway
            .search_read(
                PRODUCT,
                &Query::new(domain).fields(&[
                    "id",
                    "name",
                    "default_code",
                    "categ_id",
                    "qty_available",
                ]),
            )
            .await
    }

    /// Non-zero quant quantity at the location, per product
    async fn on_hand_at_location(&self) -> AppResult<HashMap<i64, f64>> {
        let domain = Domain::new()
            .and("location_id", Op::Eq, self.location_id)
            .and("quantity", Op::Ne, 0);
        let quants: Vec<QuantRecord> = self
            .gateway
            .search_read(
                QUANT,
                &Query::new(domain).fields(&["product_id", "quantity"]),
            )
            .await?;
        Ok(sum_quants(&quants))
    }

    async fn quantity_sold(&self, product_ids: &[i64], since: &str) -> AppResult<HashMap<i64, f64>> {
        let domain = Domain::new()
            .and("product_id", Op::In, product_ids.to_vec())
            .and("state", Op::Eq, "done")
            .and("date", Op::Ge, since)
            .and("location_id", Op::Eq, self.location_id)
            .and("location_dest_id.usage", Op::Eq, "customer");
        let moves = self.done_moves(domain).await?;
        Ok(quantity_by_product(&moves))
    }

    /// Mean of period-start and period-end quantity for every product
    async fn average_inventory(
        &self,
        product_ids: &[i64],
        since: &str,
    ) -> AppResult<HashMap<i64, f64>> {
        let domain = Domain::new()
            .and("location_id", Op::Eq, self.location_id)
            .and("product_id", Op::In, product_ids.to_vec());
        let quants: Vec<QuantRecord> = self
            .gateway
            .search_read(
                QUANT,
                &Query::new(domain).fields(&["product_id", "quantity"]),
            )
            .await?;
        let end_qty = sum_quants(&quants);

        let moved = |location_field: &'static str| {
            Domain::new()
                .and("product_id", Op::In, product_ids.to_vec())
                .and("state", Op::Eq, "done")
                .and("date", Op::Ge, since)
                .and(location_field, Op::Eq, self.location_id)
        };
        let incoming = quantity_by_product(&self.done_moves(moved("location_dest_id")).await?);
        let outgoing = quantity_by_product(&self.done_moves(moved("location_id")).await?);

        Ok(product_ids
            .iter()
            .map(|pid| {
                let net = incoming.get(pid).copied().unwrap_or(0.0)
                    - outgoing.get(pid).copied().unwrap_or(0.0);
                let end = end_qty.get(pid).copied().unwrap_or(0.0);
                (*pid, average_inventory(end, net))
            })
            .collect())
    }

    /// Date of the latest done move into or out of the location, per product
    async fn last_movement_dates(&self, product_ids: &[i64]) -> AppResult<HashMap<i64, NaiveDate>> {
        let domain = Domain::new()
            .and("product_id", Op::In, product_ids.to_vec())
            .and("state", Op::Eq, "done")
            .or(
                Term::leaf("location_id", Op::Eq, self.location_id),
                Term::leaf("location_dest_id", Op::Eq, self.location_id),
            );
        let moves: Vec<MoveRecord> = self
            .gateway
            .search_read(
                MOVE,
                &Query::new(domain)
                    .fields(&["product_id", "date"])
                    .order("date desc"),
            )
            .await?;

        let mut latest = HashMap::new();
        for m in &moves {
            let (Some(pid), Some(date)) =
                (m.product_id.id(), m.date.as_deref().and_then(parse_erp_date))
            else {
                continue;
            };
            latest
                .entry(pid)
                .and_modify(|d: &mut NaiveDate| *d = (*d).max(date))
                .or_insert(date);
        }
        Ok(latest)
    }

    async fn done_moves(&self, domain: Domain) -> AppResult<Vec<MoveRecord>> {
        self.gateway
            .search_read(
                MOVE,
                &Query::new(domain).fields(&["product_id", "product_uom_qty"]),
            )
            .await
    }
}

fn sum_quants(quants: &[QuantRecord]) -> HashMap<i64, f64> {
    let mut totals = HashMap::new();
    for q in quants {
        if let Some(pid) = q.product_id.id() {
            *totals.entry(pid).or_insert(0.0) += q.quantity;
        }
    }
    totals
}
