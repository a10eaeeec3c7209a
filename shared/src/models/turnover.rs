//! Inventory turnover and aging models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::statistics::{mean, round_to};

/// Days of inventory reported when stock never turns
pub const NO_TURNS_DAYS: f64 = 9999.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TurnoverCategory {
    FastMoving,
    Normal,
    SlowMoving,
    DeadStock,
}

impl TurnoverCategory {
    pub const ALL: [TurnoverCategory; 4] = [
        TurnoverCategory::FastMoving,
        TurnoverCategory::Normal,
        TurnoverCategory::SlowMoving,
        TurnoverCategory::DeadStock,
    ];

    /// Category for an annual turnover ratio
    pub fn classify(ratio: f64) -> Self {
        if ratio >= 12.0 {
            TurnoverCategory::FastMoving
        } else if ratio >= 4.0 {
            TurnoverCategory::Normal
        } else if ratio >= 1.0 {
            TurnoverCategory::SlowMoving
        } else {
            TurnoverCategory::DeadStock
        }
    }

    pub fn is_slow(&self) -> bool {
        matches!(self, TurnoverCategory::SlowMoving | TurnoverCategory::DeadStock)
    }
}

/// Days covered by one year of turns, capped for stock that never moves
pub fn days_of_inventory(ratio: f64) -> f64 {
    if ratio > 0.0 {
        round_to((365.0 / ratio).min(NO_TURNS_DAYS), 1)
    } else {
        NO_TURNS_DAYS
    }
}

/// Average of period-start and period-end quantity, where start is end minus net movement
pub fn average_inventory(end_qty: f64, net_change: f64) -> f64 {
    let begin_qty = end_qty - net_change;
    (begin_qty + end_qty) / 2.0
}

pub fn turnover_ratio(qty_sold: f64, avg_qty: f64) -> f64 {
    if avg_qty > 0.0 {
        qty_sold / avg_qty
    } else {
        0.0
    }
}

/// Age band of a quant, by days since receipt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgingBucket {
    #[serde(rename = "0-30 days")]
    Current,
    #[serde(rename = "31-60 days")]
    Days31To60,
    #[serde(rename = "61-90 days")]
    Days61To90,
    #[serde(rename = "91-180 days")]
    Days91To180,
    #[serde(rename = "181-365 days")]
    Days181To365,
    #[serde(rename = "Over 1 year")]
    OverOneYear,
}

impl AgingBucket {
    pub fn for_age(age_days: i64) -> Self {
        match age_days {
            i64::MIN..=30 => AgingBucket::Current,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            91..=180 => AgingBucket::Days91To180,
            181..=365 => AgingBucket::Days181To365,
            _ => AgingBucket::OverOneYear,
        }
    }

    /// Buckets that count as old stock for obsolescence
    pub fn is_old(&self) -> bool {
        *self >= AgingBucket::Days91To180
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct BucketAmount {
    pub qty: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ObsolescenceRisk {
    Low,
    Medium,
    High,
}

impl ObsolescenceRisk {
    /// Risk from the share of value held in old buckets and the average age
    ///
    /// With no stock value recorded only the average-age thresholds apply.
    pub fn assess(breakdown: &BTreeMap<AgingBucket, BucketAmount>, avg_age_days: f64) -> Self {
        let total_value: f64 = breakdown.values().map(|b| b.value).sum();
        let old_share = if total_value > 0.0 {
            let old_value: f64 = breakdown
                .iter()
                .filter(|(bucket, _)| bucket.is_old())
                .map(|(_, amount)| amount.value)
                .sum();
            old_value / total_value
        } else {
            0.0
        };

        if old_share > 0.5 || avg_age_days > 180.0 {
            ObsolescenceRisk::High
        } else if old_share > 0.2 || avg_age_days > 90.0 {
            ObsolescenceRisk::Medium
        } else {
            ObsolescenceRisk::Low
        }
    }
}

/// One on-hand lot as seen by the aging analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantAge {
    pub quantity: f64,
    pub received: Option<NaiveDate>,
}

/// Bucketed view of a product's quants
#[derive(Debug, Clone, PartialEq)]
pub struct AgingProfile {
    pub breakdown: BTreeMap<AgingBucket, BucketAmount>,
    pub total_qty: f64,
    pub oldest: Option<NaiveDate>,
    pub average_age_days: f64,
}

impl AgingProfile {
    /// Bucket every quant by age at `today`
    ///
    /// A quant without a receipt date is age 0. Each quant contributes
    /// `max(1, trunc(qty))` samples to the average age.
    pub fn build(quants: &[QuantAge], today: NaiveDate) -> Self {
        let mut breakdown: BTreeMap<AgingBucket, BucketAmount> = BTreeMap::new();
        let mut oldest: Option<NaiveDate> = None;
        let mut age_sum = 0.0;
        let mut samples = 0u64;

        for quant in quants {
            let age_days = match quant.received {
                Some(received) => {
                    oldest = Some(oldest.map_or(received, |o| o.min(received)));
                    (today - received).num_days()
                }
                None => 0,
            };
            let weight = (quant.quantity.trunc() as i64).max(1) as u64;
            age_sum += age_days as f64 * weight as f64;
            samples += weight;

            breakdown
                .entry(AgingBucket::for_age(age_days))
                .or_default()
                .qty += quant.quantity;
        }

        breakdown.retain(|_, amount| amount.qty > 0.0);
        for amount in breakdown.values_mut() {
            amount.qty = round_to(amount.qty, 2);
        }
        let total_qty = round_to(breakdown.values().map(|b| b.qty).sum(), 2);
        let average_age_days = if samples > 0 {
            age_sum / samples as f64
        } else {
            0.0
        };

        Self {
            breakdown,
            total_qty,
            oldest,
            average_age_days,
        }
    }
}

/// Turnover of one product over the analysis period
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnoverResult {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: Option<String>,
    pub category: String,
    pub current_stock_qty: f64,
    pub current_stock_value: f64,
    pub cost_of_goods_sold: f64,
    pub average_inventory_value: f64,
    pub turnover_ratio: f64,
    pub days_of_inventory: f64,
    pub turnover_category: TurnoverCategory,
    pub last_movement_date: Option<NaiveDate>,
    pub days_since_movement: Option<i64>,
}

/// Aging of one product's on-hand stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgingResult {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: Option<String>,
    pub category: String,
    pub total_qty: f64,
    pub total_value: f64,
    pub aging_breakdown: BTreeMap<AgingBucket, BucketAmount>,
    pub oldest_stock_date: Option<NaiveDate>,
    pub average_age_days: f64,
    pub obsolescence_risk: ObsolescenceRisk,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CategoryShare {
    pub count: usize,
    pub value: f64,
    pub value_percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnoverSummary {
    pub total_products: usize,
    pub total_stock_value: f64,
    pub average_turnover_ratio: f64,
    pub average_days_of_inventory: Option<f64>,
    pub category_distribution: BTreeMap<TurnoverCategory, CategoryShare>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BucketShare {
    pub qty: f64,
    pub value: f64,
    pub value_percentage: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RiskCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgingSummary {
    pub total_products: usize,
    pub total_inventory_value: f64,
    pub average_age_days: f64,
    pub aging_buckets: BTreeMap<AgingBucket, BucketShare>,
    pub obsolescence_risk: RiskCounts,
}

fn share_of(value: f64, total: f64) -> f64 {
    if total != 0.0 {
        round_to(value / total * 100.0, 1)
    } else {
        0.0
    }
}

pub fn summarize_turnover(results: &[TurnoverResult]) -> Option<TurnoverSummary> {
    if results.is_empty() {
        return None;
    }
    let total_value: f64 = results.iter().map(|r| r.current_stock_value).sum();
    let ratios: Vec<f64> = results.iter().map(|r| r.turnover_ratio).collect();
    let finite_days: Vec<f64> = results
        .iter()
        .map(|r| r.days_of_inventory)
        .filter(|days| *days < NO_TURNS_DAYS)
        .collect();

    let category_distribution = TurnoverCategory::ALL
        .iter()
        .map(|category| {
            let members = results.iter().filter(|r| r.turnover_category == *category);
            let count = members.clone().count();
            let value: f64 = members.map(|r| r.current_stock_value).sum();
            (
                *category,
                CategoryShare {
                    count,
                    value: round_to(value, 2),
                    value_percentage: share_of(value, total_value),
                },
            )
        })
        .collect();

    Some(TurnoverSummary {
        total_products: results.len(),
        total_stock_value: round_to(total_value, 2),
        average_turnover_ratio: round_to(mean(&ratios), 2),
        average_days_of_inventory: (!finite_days.is_empty())
            .then(|| round_to(mean(&finite_days), 1)),
        category_distribution,
    })
}

pub fn summarize_aging(results: &[AgingResult]) -> Option<AgingSummary> {
    if results.is_empty() {
        return None;
    }
    let mut totals: BTreeMap<AgingBucket, BucketAmount> = BTreeMap::new();
    let mut risk = RiskCounts::default();
    for r in results {
        match r.obsolescence_risk {
            ObsolescenceRisk::Low => risk.low += 1,
            ObsolescenceRisk::Medium => risk.medium += 1,
            ObsolescenceRisk::High => risk.high += 1,
        }
        for (bucket, amount) in &r.aging_breakdown {
            let total = totals.entry(*bucket).or_default();
            total.qty += amount.qty;
            total.value += amount.value;
        }
    }

    let total_value: f64 = results.iter().map(|r| r.total_value).sum();
    let ages: Vec<f64> = results.iter().map(|r| r.average_age_days).collect();
    let aging_buckets = totals
        .into_iter()
        .filter(|(_, amount)| amount.qty > 0.0)
        .map(|(bucket, amount)| {
            (
                bucket,
                BucketShare {
                    qty: round_to(amount.qty, 2),
                    value: round_to(amount.value, 2),
                    value_percentage: share_of(amount.value, total_value),
                },
            )
        })
        .collect();

    Some(AgingSummary {
        total_products: results.len(),
        total_inventory_value: round_to(total_value, 2),
        average_age_days: round_to(mean(&ages), 1),
        aging_buckets,
        obsolescence_risk: risk,
    })
}

/// Slow-moving and dead stock worth at least `min_value`
pub fn slow_moving(results: &[TurnoverResult], min_value: f64) -> Vec<TurnoverResult> {
    results
        .iter()
        .filter(|r| r.turnover_category.is_slow() && r.current_stock_value >= min_value)
        .cloned()
        .collect()
}

/// High obsolescence risk items worth at least `min_value`
pub fn high_risk(results: &[AgingResult], min_value: f64) -> Vec<AgingResult> {
    results
        .iter()
        .filter(|r| r.obsolescence_risk == ObsolescenceRisk::High && r.total_value >= min_value)
        .cloned()
        .collect()
}
