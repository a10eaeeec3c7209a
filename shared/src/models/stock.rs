//! Stock level models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::statistics::{mean, round_to};

/// Stock status classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    Normal,
    Overstock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::Critical => "critical",
            StockStatus::Low => "low",
            StockStatus::Normal => "normal",
            StockStatus::Overstock => "overstock",
        }
    }

    /// Classify stock by on-hand, forecast and the min/max reorder rule
    ///
    /// First match wins; without a positive minimum only the out-of-stock
    /// check applies.
    pub fn classify(on_hand: f64, forecast: f64, reorder_min: f64, reorder_max: f64) -> Self {
        if on_hand <= 0.0 {
            return StockStatus::OutOfStock;
        }
        if reorder_min > 0.0 {
            if forecast <= 0.0 || forecast < reorder_min * 0.5 {
                return StockStatus::Critical;
            }
            if forecast < reorder_min {
                return StockStatus::Low;
            }
            if reorder_max > 0.0 && on_hand > reorder_max * 1.5 {
                return StockStatus::Overstock;
            }
        }
        StockStatus::Normal
    }

    /// Sort priority for reorder alerts, most urgent first
    pub fn priority(&self) -> u8 {
        match self {
            StockStatus::OutOfStock => 0,
            StockStatus::Critical => 1,
            StockStatus::Low => 2,
            StockStatus::Normal => 3,
            StockStatus::Overstock => 4,
        }
    }

    pub fn needs_reorder(&self) -> bool {
        matches!(
            self,
            StockStatus::OutOfStock | StockStatus::Critical | StockStatus::Low
        )
    }
}

/// Quantity to order back up to the maximum when the forecast dips below the minimum
pub fn suggested_reorder_qty(forecast: f64, reorder_min: f64, reorder_max: f64) -> f64 {
    if forecast < reorder_min && reorder_max > 0.0 {
        (reorder_max - forecast).max(0.0)
    } else {
        0.0
    }
}

/// Current stock position of one product at one location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockLevelResult {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: Option<String>,
    pub category: String,
    pub qty_on_hand: f64,
    pub qty_available: f64,
    pub qty_incoming: f64,
    pub qty_outgoing: f64,
    pub qty_forecast: f64,
    pub reorder_min: f64,
    pub reorder_max: f64,
    pub status: StockStatus,
    pub days_of_stock: Option<f64>,
    pub reorder_qty_suggested: f64,
}

impl StockLevelResult {
    /// Whether this level should appear in a reorder alert list
    pub fn is_alert(&self, threshold_days: f64) -> bool {
        self.status.needs_reorder()
            || self
                .days_of_stock
                .map(|days| days < threshold_days)
                .unwrap_or(false)
    }
}

/// Aggregate view over a set of stock levels
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockSummary {
    pub total_products: usize,
    pub total_quantity: f64,
    pub status_breakdown: BTreeMap<StockStatus, usize>,
    pub avg_days_of_stock: Option<f64>,
    pub products_needing_reorder: usize,
}

impl StockSummary {
    /// Roll up a set of levels; an empty set gives zero counts and no average
    pub fn from_levels(levels: &[StockLevelResult]) -> Self {
        let mut status_breakdown = BTreeMap::new();
        for level in levels {
            *status_breakdown.entry(level.status).or_insert(0) += 1;
        }
        let days: Vec<f64> = levels.iter().filter_map(|l| l.days_of_stock).collect();

        Self {
            total_products: levels.len(),
            total_quantity: round_to(levels.iter().map(|l| l.qty_on_hand).sum(), 2),
            status_breakdown,
            avg_days_of_stock: (!days.is_empty()).then(|| round_to(mean(&days), 1)),
            products_needing_reorder: levels
                .iter()
                .filter(|l| l.reorder_qty_suggested > 0.0)
                .count(),
        }
    }
}
