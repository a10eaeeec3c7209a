//! Stock level service: on-hand snapshot, status and reorder suggestions

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use shared::statistics::round_to;
use shared::{suggested_reorder_qty, StockLevelResult, StockStatus, StockSummary};

use super::{days_before, local_today, non_empty, quantity_by_product};
use crate::error::AppResult;
use crate::external::records::{
    MoveRecord, OrderpointRecord, ProductRecord, QuantRecord, MOVE, ORDERPOINT, PRODUCT, QUANT,
};
use crate::external::{Domain, OdooGateway, Op, Query};

/// Trailing window for the average daily consumption rate
const CONSUMPTION_WINDOW_DAYS: i64 = 30;

/// Which products a stock level call covers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockLevelFilter {
    #[serde(default)]
    pub product_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub category_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub warehouse_id: Option<i64>,
    #[serde(default)]
    pub include_zero_stock: bool,
}

#[derive(Default)]
struct QuantTotals {
    quantity: f64,
    reserved: f64,
}

/// Stock level service
pub struct StockLevelService<'a, G> {
    gateway: &'a G,
    location_id: i64,
    today: NaiveDate,
}

impl<'a, G: OdooGateway> StockLevelService<'a, G> {
    /// Create a new StockLevelService for one stock location
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

    /// Current stock levels with status classification
    pub async fn get_stock_levels(
        &self,
        filter: &StockLevelFilter,
    ) -> AppResult<Vec<StockLevelResult>> {
        let product_ids = non_empty(&filter.product_ids);

        let quant_domain = Domain::new()
            .and("location_id", Op::Eq, self.location_id)
            .and("quantity", Op::Ne, 0)
            .and_some("product_id", Op::In, product_ids.map(<[i64]>::to_vec));
        let quants: Vec<QuantRecord> = self
            .gateway
            .search_read(
                QUANT,
                &Query::new(quant_domain).fields(&["product_id", "quantity", "reserved_quantity"]),
            )
            .await?;

        let quant_product_ids: HashSet<i64> =
            quants.iter().filter_map(|q| q.product_id.id()).collect();
        if quant_product_ids.is_empty() && !filter.include_zero_stock {
            return Ok(Vec::new());
        }

        let mut domain = Domain::new().and("type", Op::Eq, "product");
        if let Some(ids) = product_ids {
            domain = domain.and("id", Op::In, ids.to_vec());
        } else if !quant_product_ids.is_empty() && !filter.include_zero_stock {
            let mut ids: Vec<i64> = quant_product_ids.iter().copied().collect();
            ids.sort_unstable();
            domain = domain.and("id", Op::In, ids);
        }
        domain = domain.and_some(
            "categ_id",
            Op::In,
            non_empty(&filter.category_ids).map(<[i64]>::to_vec),
        );

        let products: Vec<ProductRecord> = self
            .gateway
            .search_read(
                PRODUCT,
                &Query::new(domain).fields(&[
                    "id",
                    "name",
                    "default_code",
                    "categ_id",
                    "qty_available",
                    "virtual_available",
                    "incoming_qty",
                    "outgoing_qty",
                ]),
            )
            .await?;
        if products.is_empty() {
            return Ok(Vec::new());
        }

        let mut quant_lookup: HashMap<i64, QuantTotals> = HashMap::new();
        for q in &quants {
            if let Some(pid) = q.product_id.id() {
                let totals = quant_lookup.entry(pid).or_default();
                totals.quantity += q.quantity;
                totals.reserved += q.reserved_quantity;
            }
        }

        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let rules = self.reorder_rules(&ids, filter.warehouse_id).await?;
        let consumption = self.consumption_rates(&ids).await?;

        let mut results = Vec::with_capacity(products.len());
        for product in products {
            let quant = quant_lookup.remove(&product.id).unwrap_or_default();
            let qty_on_hand = quant.quantity;
            if !filter.include_zero_stock && qty_on_hand == 0.0 {
                continue;
            }
            let qty_available = qty_on_hand - quant.reserved;
            let qty_forecast = qty_available + product.incoming_qty - product.outgoing_qty;

            let (reorder_min, reorder_max) = rules
                .get(&product.id)
                .map(|r| (r.product_min_qty, r.product_max_qty))
                .unwrap_or((0.0, 0.0));

            let rate = consumption.get(&product.id).copied().unwrap_or(0.0);
            let days_of_stock = (rate > 0.0).then(|| round_to(qty_on_hand / rate, 1));

            results.push(StockLevelResult {
                product_id: product.id,
                category: product.category_or_uncategorized(),
                product_name: product.name,
                product_code: product.default_code,
                qty_on_hand,
                qty_available,
                qty_incoming: product.incoming_qty,
                qty_outgoing: product.outgoing_qty,
                qty_forecast,
                reorder_min,
                reorder_max,
                status: StockStatus::classify(qty_on_hand, qty_forecast, reorder_min, reorder_max),
                days_of_stock,
                reorder_qty_suggested: suggested_reorder_qty(qty_forecast, reorder_min, reorder_max),
            });
        }

        Ok(results)
    }

    /// Products out of stock, critical, low or running out within `threshold_days`
    ///
    /// Most urgent status first, then fewest days of stock.
    pub async fn get_reorder_alerts(
        &self,
        threshold_days: f64,
        warehouse_id: Option<i64>,
    ) -> AppResult<Vec<StockLevelResult>> {
        let levels = self
            .get_stock_levels(&StockLevelFilter {
                warehouse_id,
                include_zero_stock: true,
                ..StockLevelFilter::default()
            })
            .await?;

        let mut alerts: Vec<StockLevelResult> = levels
            .into_iter()
            .filter(|level| level.is_alert(threshold_days))
            .collect();
        alerts.sort_by(|a, b| {
            a.status.priority().cmp(&b.status.priority()).then_with(|| {
                a.days_of_stock
                    .unwrap_or(0.0)
                    .total_cmp(&b.days_of_stock.unwrap_or(0.0))
            })
        });
        Ok(alerts)
    }

    /// Summary over every product at the location, zero stock included
    pub async fn get_stock_summary(&self, warehouse_id: Option<i64>) -> AppResult<StockSummary> {
        let levels = self
            .get_stock_levels(&StockLevelFilter {
                warehouse_id,
                include_zero_stock: true,
                ..StockLevelFilter::default()
            })
            .await?;
        Ok(StockSummary::from_levels(&levels))
    }

    /// Active min/max rule per product; the last rule returned wins
    async fn reorder_rules(
        &self,
        product_ids: &[i64],
        warehouse_id: Option<i64>,
    ) -> AppResult<HashMap<i64, OrderpointRecord>> {
        let domain = Domain::new()
            .and("active", Op::Eq, true)
            .and("product_id", Op::In, product_ids.to_vec())
            .and_some("warehouse_id", Op::Eq, warehouse_id);

        let rules: Vec<OrderpointRecord> = self
            .gateway
            .search_read(
                ORDERPOINT,
                &Query::new(domain).fields(&[
                    "product_id",
                    "product_min_qty",
                    "product_max_qty",
                    "qty_multiple",
                ]),
            )
            .await?;

        Ok(rules
            .into_iter()
            .filter_map(|r| r.product_id.id().map(|pid| (pid, r)))
            .collect())
    }

    /// Average daily quantity shipped to customers or production
    async fn consumption_rates(&self, product_ids: &[i64]) -> AppResult<HashMap<i64, f64>> {
        let domain = Domain::new()
            .and("product_id", Op::In, product_ids.to_vec())
            .and("state", Op::Eq, "done")
            .and("date", Op::Ge, days_before(self.today, CONSUMPTION_WINDOW_DAYS))
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
                &Query::new(domain).fields(&["product_id", "product_uom_qty"]),
            )
            .await?;

        Ok(quantity_by_product(&moves)
            .into_iter()
            .map(|(pid, qty)| (pid, qty / CONSUMPTION_WINDOW_DAYS as f64))
            .collect())
    }
}
