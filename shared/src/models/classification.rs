//! ABC/XYZ inventory classification
//!
//! ABC ranks products by their cumulative share of consumption value:
//! - A: the items making up the first 80% of value
//! - B: the next 15%
//! - C: the remaining 5%
//!
//! XYZ ranks demand variability by the coefficient of variation of
//! monthly demand:
//! - X: CV < 0.5
//! - Y: 0.5 <= CV < 1.0
//! - Z: CV >= 1.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::statistics::{mean, round_to, std_dev};
use crate::types::{AbcThresholds, XyzThresholds};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    pub const ALL: [AbcClass; 3] = [AbcClass::A, AbcClass::B, AbcClass::C];

    /// Class for a cumulative value share in `[0, 1]`
    pub fn from_cumulative_share(share: f64, thresholds: &AbcThresholds) -> Self {
        if share <= thresholds.a {
            AbcClass::A
        } else if share <= thresholds.b {
            AbcClass::B
        } else {
            AbcClass::C
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum XyzClass {
    X,
    Y,
    Z,
}

impl XyzClass {
    pub const ALL: [XyzClass; 3] = [XyzClass::X, XyzClass::Y, XyzClass::Z];

    pub fn from_cv(cv: f64, thresholds: &XyzThresholds) -> Self {
        if cv < thresholds.x {
            XyzClass::X
        } else if cv < thresholds.y {
            XyzClass::Y
        } else {
            XyzClass::Z
        }
    }
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl fmt::Display for XyzClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Inventory policy guidance for each of the nine combined classes
pub fn recommendation(abc: AbcClass, xyz: XyzClass) -> &'static str {
    use AbcClass::*;
    use XyzClass::*;

    match (abc, xyz) {
        (A, X) => "High priority. Use JIT inventory, tight control, frequent reviews. Consider vendor-managed inventory.",
        (A, Y) => "High priority. Maintain safety stock, regular forecasting, flexible supply contracts.",
        (A, Z) => "High priority but unpredictable. Higher safety stock, multiple suppliers, close monitoring.",
        (B, X) => "Medium priority. Standard reorder point system, periodic reviews.",
        (B, Y) => "Medium priority. Balance safety stock with carrying costs, regular forecasting.",
        (B, Z) => "Medium priority. Consider make-to-order or higher safety stock for critical items.",
        (C, X) => "Low priority. Simple min-max system, bulk ordering to reduce costs.",
        (C, Y) => "Low priority. Periodic ordering, may benefit from consignment.",
        (C, Z) => "Low priority. Review necessity, consider dropping or make-to-order.",
    }
}

/// Mean, population standard deviation and CV of a monthly demand series
///
/// CV is 0 when mean demand is 0.
pub fn demand_variability(monthly_demands: &[f64]) -> (f64, f64, f64) {
    if monthly_demands.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let avg = mean(monthly_demands);
    let std = std_dev(monthly_demands);
    let cv = if avg > 0.0 { std / avg } else { 0.0 };
    (avg, std, cv)
}

/// Consumption figures for one product, before ranking
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionProfile {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: Option<String>,
    pub category: String,
    pub annual_quantity: f64,
    pub monthly_demands: Vec<f64>,
}

/// Classification of one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbcXyzResult {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: Option<String>,
    pub category: String,
    pub abc_class: AbcClass,
    pub xyz_class: XyzClass,
    pub combined_class: String,
    pub annual_value: f64,
    pub annual_quantity: f64,
    pub unit_cost: f64,
    pub value_percentage: f64,
    pub cumulative_percentage: f64,
    pub demand_cv: f64,
    pub avg_monthly_demand: f64,
    pub demand_std: f64,
    pub recommendation: String,
}

/// Rank profiles by consumption and assign ABC and XYZ classes
///
/// Quantity stands in for value. Ties keep their input order. A zero
/// total is treated as 1 so every share is 0. The cumulative share is
/// the running quantity over the total, so a boundary such as 1900/2000
/// lands exactly on a 0.95 threshold.
pub fn rank_and_classify(
    mut profiles: Vec<ConsumptionProfile>,
    abc: &AbcThresholds,
    xyz: &XyzThresholds,
) -> Vec<AbcXyzResult> {
    profiles.sort_by(|a, b| b.annual_quantity.total_cmp(&a.annual_quantity));

    let total: f64 = profiles.iter().map(|p| p.annual_quantity).sum();
    let total = if total == 0.0 { 1.0 } else { total };

    let mut running = 0.0;
    profiles
        .into_iter()
        .map(|p| {
            let share = p.annual_quantity / total;
            running += p.annual_quantity;
            let cumulative = running / total;

            let (avg, std, cv) = demand_variability(&p.monthly_demands);
            let abc_class = AbcClass::from_cumulative_share(cumulative, abc);
            let xyz_class = XyzClass::from_cv(cv, xyz);

            AbcXyzResult {
                product_id: p.product_id,
                product_name: p.product_name,
                product_code: p.product_code,
                category: p.category,
                abc_class,
                xyz_class,
                combined_class: format!("{}{}", abc_class, xyz_class),
                annual_value: round_to(p.annual_quantity, 2),
                annual_quantity: round_to(p.annual_quantity, 2),
                unit_cost: 0.0,
                value_percentage: round_to(share * 100.0, 2),
                cumulative_percentage: round_to(cumulative * 100.0, 2),
                demand_cv: round_to(cv, 3),
                avg_monthly_demand: round_to(avg, 2),
                demand_std: round_to(std, 2),
                recommendation: recommendation(abc_class, xyz_class).to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AbcShare {
    pub count: usize,
    pub percentage: f64,
    pub value: f64,
    pub value_percentage: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct XyzShare {
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MatrixCell {
    pub count: usize,
    pub value: f64,
}

/// Distribution of a classified batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbcXyzSummary {
    pub total_products: usize,
    pub total_annual_value: f64,
    pub abc_distribution: BTreeMap<AbcClass, AbcShare>,
    pub xyz_distribution: BTreeMap<XyzClass, XyzShare>,
    pub combined_matrix: BTreeMap<String, MatrixCell>,
}

/// Counts and value per class; `None` for an empty batch
pub fn summarize_abc_xyz(results: &[AbcXyzResult]) -> Option<AbcXyzSummary> {
    if results.is_empty() {
        return None;
    }
    let total_products = results.len();
    let total_value: f64 = results.iter().map(|r| r.annual_value).sum();
    let pct = |count: usize| round_to(count as f64 / total_products as f64 * 100.0, 1);
    let value_pct = |value: f64| {
        if total_value != 0.0 {
            round_to(value / total_value * 100.0, 1)
        } else {
            0.0
        }
    };

    let abc_distribution = AbcClass::ALL
        .iter()
        .map(|class| {
            let members = results.iter().filter(|r| r.abc_class == *class);
            let count = members.clone().count();
            let value: f64 = members.map(|r| r.annual_value).sum();
            (
                *class,
                AbcShare {
                    count,
                    percentage: pct(count),
                    value: round_to(value, 2),
                    value_percentage: value_pct(value),
                },
            )
        })
        .collect();

    let xyz_distribution = XyzClass::ALL
        .iter()
        .map(|class| {
            let count = results.iter().filter(|r| r.xyz_class == *class).count();
            (
                *class,
                XyzShare {
                    count,
                    percentage: pct(count),
                },
            )
        })
        .collect();

    let mut combined_matrix: BTreeMap<String, MatrixCell> = BTreeMap::new();
    for r in results {
        let cell = combined_matrix.entry(r.combined_class.clone()).or_default();
        cell.count += 1;
        cell.value += r.annual_value;
    }
    for cell in combined_matrix.values_mut() {
        cell.value = round_to(cell.value, 2);
    }

    Some(AbcXyzSummary {
        total_products,
        total_annual_value: round_to(total_value, 2),
        abc_distribution,
        xyz_distribution,
        combined_matrix,
    })
}

/// Group results by combined class label, in label order
pub fn category_breakdown(results: &[AbcXyzResult]) -> BTreeMap<String, Vec<AbcXyzResult>> {
    let mut breakdown: BTreeMap<String, Vec<AbcXyzResult>> = BTreeMap::new();
    for r in results {
        breakdown
            .entry(r.combined_class.clone())
            .or_default()
            .push(r.clone());
    }
    breakdown
}
