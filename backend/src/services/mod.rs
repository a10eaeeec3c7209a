//! Analysis engines over the ERP gateway
//!
//! Each service borrows a gateway, works against one stock location and
//! carries its own notion of "today" so results are reproducible in tests.

pub mod abc_xyz;
pub mod catalog;
pub mod forecasting;
pub mod stock_levels;
pub mod supply;
pub mod turnover;

pub use abc_xyz::AbcXyzService;
pub use catalog::CatalogService;
pub use forecasting::ForecastService;
pub use stock_levels::StockLevelService;
pub use supply::SupplyService;
pub use turnover::TurnoverService;

use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

use crate::error::AppResult;
use crate::external::records::{CategoryRecord, MoveRecord, CATEGORY};
use crate::external::{Domain, OdooGateway, Op, Query, Term};

/// Move states that count as scheduled but not yet done
pub const SCHEDULED_STATES: [&str; 3] = ["assigned", "confirmed", "waiting"];

/// Current local date
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// `None` for a missing or empty id list
pub(crate) fn non_empty(ids: &Option<Vec<i64>>) -> Option<&[i64]> {
    ids.as_deref().filter(|ids| !ids.is_empty())
}

/// ERP date string for `today - days`
pub(crate) fn days_before(today: NaiveDate, days: i64) -> String {
    shared::erp_date(today - Duration::days(days))
}

/// Sum move quantities per product id
pub(crate) fn quantity_by_product(moves: &[MoveRecord]) -> HashMap<i64, f64> {
    let mut totals = HashMap::new();
    for m in moves {
        if let Some(pid) = m.product_id.id() {
            *totals.entry(pid).or_insert(0.0) += m.product_uom_qty;
        }
    }
    totals
}

/// Restrict a product domain to a name or internal reference match
pub(crate) fn match_name_or_code(domain: Domain, name: Option<&str>) -> Domain {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => domain.or(
            Term::leaf("name", Op::ILike, name),
            Term::leaf("default_code", Op::ILike, name),
        ),
        None => domain,
    }
}

/// Restrict a product domain to categories whose full path matches `name`
///
/// A name that matches no category leaves the domain unchanged.
pub(crate) async fn match_category<G: OdooGateway>(
    gateway: &G,
    domain: Domain,
    name: Option<&str>,
) -> AppResult<Domain> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(domain);
    };
    let categories: Vec<CategoryRecord> = gateway
        .search_read(
            CATEGORY,
            &Query::new(Domain::new().and("complete_name", Op::ILike, name))
                .fields(&["id", "name", "complete_name"])
                .limit(10),
        )
        .await?;

    if categories.is_empty() {
        tracing::debug!(category = name, "No category matched, filter ignored");
        return Ok(domain);
    }
    let ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
    Ok(domain.and("categ_id", Op::ChildOf, ids))
}
