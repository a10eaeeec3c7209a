//! Supply planning: supplier lead times, scheduled stock projection and
//! future low-stock alerts

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use shared::statistics::round_to;
use shared::{erp_date, parse_erp_date, validate_future_date};

use super::{local_today, match_category, match_name_or_code, SCHEDULED_STATES};
use crate::error::{AppError, AppResult};
use crate::external::records::{
    ComputedProductFields, MoveRecord, ProductRecord, SupplierInfoRecord, MOVE, PRODUCT,
    SUPPLIER_INFO,
};
use crate::external::{Domain, OdooGateway, Op, Query};

const NO_SUPPLIER: &str = "No supplier";
const NO_PRODUCTS: &str = "No products found matching criteria";

/// Name or category restriction shared by the supply tools
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductFilter<'f> {
    pub product_name: Option<&'f str>,
    pub category_name: Option<&'f str>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeadTime {
    pub product_id: i64,
    pub name: String,
    pub code: String,
    pub supplier: String,
    pub lead_time_days: i64,
    pub min_qty: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeadTimeSummary {
    pub total_products: usize,
    pub products_with_supplier: usize,
    pub products_without_supplier: usize,
    pub avg_lead_time_days: f64,
    pub max_lead_time_days: i64,
    pub min_lead_time_days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LeadTimeReport {
    pub summary: LeadTimeSummary,
    pub products: Vec<LeadTime>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekProjection {
    pub week: u32,
    pub period: String,
    pub incoming: f64,
    pub outgoing: f64,
    pub ending_stock: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductProjection {
    pub product_id: i64,
    pub name: String,
    pub code: String,
    pub current_on_hand: f64,
    pub weekly_forecast: Vec<WeekProjection>,
    pub final_stock: f64,
    pub total_incoming: f64,
    pub total_outgoing: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ProjectionSummary {
    pub total_products: usize,
    pub total_current_stock: f64,
    pub total_final_stock: f64,
    pub total_incoming: f64,
    pub total_outgoing: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockProjection {
    pub forecast_period: String,
    pub weeks: u32,
    pub products: Vec<ProductProjection>,
    pub summary: ProjectionSummary,
}

/// Whether an order can still arrive by the target date
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum OrderStatus {
    #[serde(rename = "TOO LATE - Lead time exceeded")]
    TooLate,
    #[serde(rename = "ORDER TODAY")]
    OrderToday,
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "NO LEAD TIME")]
    NoLeadTime,
}

/// Order-by date, status and advice for a supplier lead time
pub fn order_timing(
    target: NaiveDate,
    lead_time_days: i64,
    today: NaiveDate,
) -> (String, OrderStatus, String) {
    if lead_time_days <= 0 {
        return (
            "N/A".to_string(),
            OrderStatus::NoLeadTime,
            "No supplier lead time configured".to_string(),
        );
    }
    let order_by = target - Duration::days(lead_time_days);
    let (status, advice) = if order_by < today {
        (
            OrderStatus::TooLate,
            format!("Should have ordered {} days ago", (today - order_by).num_days()),
        )
    } else if order_by == today {
        (
            OrderStatus::OrderToday,
            "Place order immediately to receive by target date".to_string(),
        )
    } else {
        (
            OrderStatus::Ok,
            format!("Place order within {} days", (order_by - today).num_days()),
        )
    };
    (erp_date(order_by), status, advice)
}

/// Quantity that brings projected stock back to the threshold, or to the
/// product minimum when that is higher
pub fn suggested_order_qty(threshold: f64, projected: f64, minimum: f64) -> f64 {
    let shortage = threshold - projected;
    let qty = if minimum > projected {
        shortage.max(minimum - projected)
    } else {
        shortage
    };
    round_to(qty.max(0.0), 2)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockAlert {
    pub product_id: i64,
    pub name: String,
    pub code: String,
    pub current_stock: f64,
    pub incoming_by_target: f64,
    pub outgoing_by_target: f64,
    pub projected_stock: f64,
    pub minimum: f64,
    pub pending_forecast: f64,
    pub threshold: f64,
    pub shortage: f64,
    pub supplier: String,
    pub lead_time_days: i64,
    pub order_by_date: String,
    pub order_status: OrderStatus,
    pub order_recommendation: String,
    pub suggested_order_qty: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockAlertSummary {
    pub target_date: NaiveDate,
    pub days_until_target: i64,
    pub threshold: f64,
    pub total_products_checked: usize,
    pub low_stock_count: usize,
    pub critical_count: usize,
    pub order_today_count: usize,
    pub ok_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StockAlertReport {
    pub summary: StockAlertSummary,
    pub low_stock_alerts: Vec<StockAlert>,
}

/// Supply planning service
pub struct SupplyService<'a, G> {
    gateway: &'a G,
    location_id: i64,
    today: NaiveDate,
}

impl<'a, G: OdooGateway> SupplyService<'a, G> {
    /// Create a new SupplyService for one stock location
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

    /// Top supplier lead time per product, longest first
    pub async fn get_lead_time(&self, filter: ProductFilter<'_>) -> AppResult<LeadTimeReport> {
        let products = self
            .products(filter, &["id", "name", "default_code", "product_tmpl_id"], 200)
            .await?;
        let suppliers = self.top_suppliers(&products).await?;

        let mut lead_times: Vec<LeadTime> = products
            .into_iter()
            .map(|p| {
                let supplier = p
                    .product_tmpl_id
                    .id()
                    .and_then(|tmpl| suppliers.get(&tmpl));
                LeadTime {
                    product_id: p.id,
                    code: p.code_or_na(),
                    name: p.name,
                    supplier: supplier
                        .and_then(|s| s.partner_id.name())
                        .unwrap_or(NO_SUPPLIER)
                        .to_string(),
                    lead_time_days: supplier.map_or(0, |s| s.delay),
                    min_qty: supplier.map_or(0.0, |s| s.min_qty),
                    price: supplier.map_or(0.0, |s| s.price),
                }
            })
            .collect();
        lead_times.sort_by(|a, b| b.lead_time_days.cmp(&a.lead_time_days));

        let total = lead_times.len();
        let with_supplier = lead_times.iter().filter(|l| l.supplier != NO_SUPPLIER).count();
        let summary = LeadTimeSummary {
            total_products: total,
            products_with_supplier: with_supplier,
            products_without_supplier: total - with_supplier,
            avg_lead_time_days: if total > 0 {
                let sum: i64 = lead_times.iter().map(|l| l.lead_time_days).sum();
                round_to(sum as f64 / total as f64, 1)
            } else {
                0.0
            },
            max_lead_time_days: lead_times.iter().map(|l| l.lead_time_days).max().unwrap_or(0),
            min_lead_time_days: lead_times
                .iter()
                .map(|l| l.lead_time_days)
                .filter(|d| *d > 0)
                .min()
                .unwrap_or(0),
        };

        Ok(LeadTimeReport {
            summary,
            products: lead_times,
        })
    }

    /// Week-by-week projection of on-hand stock from scheduled moves
    ///
    /// Week `w` spans today+7(w-1) through today+7w, both days included.
    pub async fn get_stock_forecast(
        &self,
        filter: ProductFilter<'_>,
        weeks: u32,
    ) -> AppResult<StockProjection> {
        let weeks = weeks.clamp(1, 12);
        let products = self
            .products(filter, &["id", "name", "default_code", "qty_available"], 100)
            .await?;
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();

        let horizon = self.today + Duration::weeks(weeks as i64);
        let incoming = self
            .scheduled_moves(&ids, "location_dest_id", self.today, horizon)
            .await?;
        let outgoing = self
            .scheduled_moves(&ids, "location_id", self.today, horizon)
            .await?;

        let mut summary = ProjectionSummary::default();
        let mut projections = Vec::with_capacity(products.len());
        for product in products {
            let mut running = product.qty_available;
            let mut weekly = Vec::with_capacity(weeks as usize);
            for week in 1..=weeks {
                let start = self.today + Duration::days(7 * (week as i64 - 1));
                let end = self.today + Duration::days(7 * week as i64);
                let week_in = sum_between(incoming.get(&product.id), start, end);
                let week_out = sum_between(outgoing.get(&product.id), start, end);
                running += week_in - week_out;
                weekly.push(WeekProjection {
                    week,
                    period: format!("{} - {}", start.format("%d %b"), end.format("%d %b")),
                    incoming: week_in,
                    outgoing: week_out,
                    ending_stock: running,
                });
            }

            let projection = ProductProjection {
                product_id: product.id,
                code: product.code_or_na(),
                name: product.name,
                current_on_hand: product.qty_available,
                total_incoming: weekly.iter().map(|w| w.incoming).sum(),
                total_outgoing: weekly.iter().map(|w| w.outgoing).sum(),
                weekly_forecast: weekly,
                final_stock: running,
            };
            summary.total_products += 1;
            summary.total_current_stock += projection.current_on_hand;
            summary.total_final_stock += projection.final_stock;
            summary.total_incoming += projection.total_incoming;
            summary.total_outgoing += projection.total_outgoing;
            projections.push(projection);
        }

        Ok(StockProjection {
            forecast_period: format!("{} to {}", erp_date(self.today), erp_date(horizon)),
            weeks,
            products: projections,
            summary,
        })
    }

    /// Products projected at or below `threshold` on `target_date`, with
    /// order-by advice from the top supplier's lead time
    pub async fn get_future_stock_alert(
        &self,
        target_date: &str,
        threshold: f64,
        filter: ProductFilter<'_>,
    ) -> AppResult<StockAlertReport> {
        let target = validate_future_date(target_date, self.today)
            .map_err(|msg| AppError::Validation(msg.to_string()))?;

        let products = self
            .products(
                filter,
                &[
                    "id",
                    "name",
                    "default_code",
                    "product_tmpl_id",
                    "qty_available",
                    "minimum",
                ],
                500,
            )
            .await?;
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();

        let computed: HashMap<i64, ComputedProductFields> = self
            .gateway
            .read::<ComputedProductFields>(PRODUCT, &ids, &["id", "pending_forecast", "require"])
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let suppliers = self.top_suppliers(&products).await?;

        let incoming = self
            .scheduled_moves(&ids, "location_dest_id", self.today, target)
            .await?;
        let outgoing = self
            .scheduled_moves(&ids, "location_id", self.today, target)
            .await?;

        let total_products_checked = products.len();
        let mut alerts = Vec::new();
        for product in products {
            let qty_in = total_of(incoming.get(&product.id));
            let qty_out = total_of(outgoing.get(&product.id));
            let projected = product.qty_available + qty_in - qty_out;
            if projected > threshold {
                continue;
            }

            let supplier = product
                .product_tmpl_id
                .id()
                .and_then(|tmpl| suppliers.get(&tmpl));
            let lead_time_days = supplier.map_or(0, |s| s.delay);
            let (order_by_date, order_status, order_recommendation) =
                order_timing(target, lead_time_days, self.today);

            alerts.push(StockAlert {
                product_id: product.id,
                code: product.code_or_na(),
                name: product.name,
                current_stock: product.qty_available,
                incoming_by_target: qty_in,
                outgoing_by_target: qty_out,
                projected_stock: round_to(projected, 2),
                minimum: product.minimum,
                pending_forecast: computed
                    .get(&product.id)
                    .map_or(0.0, |c| c.pending_forecast),
                threshold,
                shortage: round_to((threshold - projected).max(0.0), 2),
                supplier: supplier
                    .and_then(|s| s.partner_id.name())
                    .unwrap_or(NO_SUPPLIER)
                    .to_string(),
                lead_time_days,
                order_by_date,
                order_status,
                order_recommendation,
                suggested_order_qty: suggested_order_qty(threshold, projected, product.minimum),
            });
        }
        alerts.sort_by(|a, b| a.projected_stock.total_cmp(&b.projected_stock));

        let count = |status: OrderStatus| alerts.iter().filter(|a| a.order_status == status).count();
        let summary = StockAlertSummary {
            target_date: target,
            days_until_target: (target - self.today).num_days(),
            threshold,
            total_products_checked,
            low_stock_count: alerts.len(),
            critical_count: count(OrderStatus::TooLate),
            order_today_count: count(OrderStatus::OrderToday),
            ok_count: count(OrderStatus::Ok),
        };

        Ok(StockAlertReport {
            summary,
            low_stock_alerts: alerts,
        })
    }

    /// Products matching the filter; an empty match is an error
    async fn products(
        &self,
        filter: ProductFilter<'_>,
        fields: &[&str],
        limit: u32,
    ) -> AppResult<Vec<ProductRecord>> {
        let domain = match_name_or_code(
            Domain::new().and("type", Op::Eq, "product"),
            filter.product_name,
        );
        let domain = match_category(self.gateway, domain, filter.category_name).await?;
        let products: Vec<ProductRecord> = self
            .gateway
            .search_read(PRODUCT, &Query::new(domain).fields(fields).limit(limit))
            .await?;
        if products.is_empty() {
            return Err(AppError::NotFound(NO_PRODUCTS.to_string()));
        }
        Ok(products)
    }

    /// First supplier by sequence for each product template
    async fn top_suppliers(
        &self,
        products: &[ProductRecord],
    ) -> AppResult<HashMap<i64, SupplierInfoRecord>> {
        let mut tmpl_ids: Vec<i64> = products.iter().filter_map(|p| p.product_tmpl_id.id()).collect();
        if tmpl_ids.is_empty() {
            return Ok(HashMap::new());
        }
        tmpl_ids.sort_unstable();
        tmpl_ids.dedup();

        let infos: Vec<SupplierInfoRecord> = self
            .gateway
            .search_read(
                SUPPLIER_INFO,
                &Query::new(Domain::new().and("product_tmpl_id", Op::In, tmpl_ids))
                    .fields(&[
                        "product_tmpl_id",
                        "partner_id",
                        "delay",
                        "min_qty",
                        "price",
                        "sequence",
                    ])
                    .order("product_tmpl_id, sequence, id"),
            )
            .await?;

        let mut top = HashMap::new();
        for info in infos {
            if let Some(tmpl) = info.product_tmpl_id.id() {
                top.entry(tmpl).or_insert(info);
            }
        }
        Ok(top)
    }

    /// Scheduled moves into or out of the location between two days,
    /// as dated quantities per product
    async fn scheduled_moves(
        &self,
        product_ids: &[i64],
        location_field: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AppResult<HashMap<i64, Vec<(NaiveDate, f64)>>> {
        let domain = Domain::new()
            .and("product_id", Op::In, product_ids.to_vec())
            .and("state", Op::In, SCHEDULED_STATES.to_vec())
            .and(location_field, Op::Eq, self.location_id)
            .and("date", Op::Ge, format!("{} 00:00:00", erp_date(from)))
            .and("date", Op::Le, format!("{} 23:59:59", erp_date(to)));
        let moves: Vec<MoveRecord> = self
            .gateway
            .search_read(
                MOVE,
                &Query::new(domain).fields(&["product_id", "product_uom_qty", "date"]),
            )
            .await?;

        let mut by_product: HashMap<i64, Vec<(NaiveDate, f64)>> = HashMap::new();
        for m in moves {
            let (Some(pid), Some(date)) =
                (m.product_id.id(), m.date.as_deref().and_then(parse_erp_date))
            else {
                continue;
            };
            by_product.entry(pid).or_default().push((date, m.product_uom_qty));
        }
        Ok(by_product)
    }
}

fn sum_between(moves: Option<&Vec<(NaiveDate, f64)>>, start: NaiveDate, end: NaiveDate) -> f64 {
    moves.map_or(0.0, |moves| {
        moves
            .iter()
            .filter(|(date, _)| *date >= start && *date <= end)
            .map(|(_, qty)| qty)
            .sum()
    })
}

fn total_of(moves: Option<&Vec<(NaiveDate, f64)>>) -> f64 {
    moves.map_or(0.0, |moves| moves.iter().map(|(_, qty)| qty).sum())
}
