//! Typed shapes of the ERP records the engines read
//!
//! The ERP encodes an empty value of any type as `false`, so optional
//! strings, numbers and relations all go through lenient decoders.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const PRODUCT: &str = "product.product";
pub const CATEGORY: &str = "product.category";
pub const QUANT: &str = "stock.quant";
pub const MOVE: &str = "stock.move";
pub const ORDERPOINT: &str = "stock.warehouse.orderpoint";
pub const SUPPLIER_INFO: &str = "product.supplierinfo";

/// A many2one relation: `[id, "display name"]` or `false`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Many2One(pub Option<(i64, String)>);

impl Many2One {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(|(id, _)| *id)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.as_ref().map(|(_, name)| name.as_str())
    }
}

impl<'de> Deserialize<'de> for Many2One {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Array(items) => {
                let id = items.first().and_then(Value::as_i64);
                let name = items
                    .get(1)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok(Many2One(id.map(|id| (id, name))))
            }
            // Some ERP versions send the bare id
            Value::Number(n) => Ok(Many2One(n.as_i64().map(|id| (id, String::new())))),
            _ => Ok(Many2One(None)),
        }
    }
}

/// `false`, null or an empty string decode to `None`
fn optional_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Numbers pass through, anything else is zero
fn number_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().unwrap_or(0.0))
}

fn integer_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .unwrap_or(0))
}

/// `product.product`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProductRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_string")]
    pub default_code: Option<String>,
    #[serde(default)]
    pub categ_id: Many2One,
    #[serde(default)]
    pub product_tmpl_id: Many2One,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub qty_available: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub virtual_available: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub incoming_qty: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub outgoing_qty: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub minimum: f64,
}

impl ProductRecord {
    pub fn category_or_uncategorized(&self) -> String {
        self.categ_id.name().unwrap_or("Uncategorized").to_string()
    }

    pub fn code_or_na(&self) -> String {
        self.default_code.clone().unwrap_or_else(|| "N/A".to_string())
    }
}

/// Computed product fields that only `read` returns
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ComputedProductFields {
    pub id: i64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub pending_forecast: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub require: f64,
}

/// `product.category`
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "optional_string")]
    pub complete_name: Option<String>,
    #[serde(default)]
    pub parent_id: Many2One,
}

impl CategoryRecord {
    pub fn full_path(&self) -> String {
        self.complete_name.clone().unwrap_or_else(|| self.name.clone())
    }
}

/// `stock.quant`
#[derive(Debug, Clone, Deserialize)]
pub struct QuantRecord {
    #[serde(default)]
    pub product_id: Many2One,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub reserved_quantity: f64,
    #[serde(default, deserialize_with = "optional_string")]
    pub in_date: Option<String>,
    #[serde(default)]
    pub lot_id: Many2One,
}

/// `stock.move`
#[derive(Debug, Clone, Deserialize)]
pub struct MoveRecord {
    #[serde(default)]
    pub product_id: Many2One,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub product_uom_qty: f64,
    #[serde(default, deserialize_with = "optional_string")]
    pub date: Option<String>,
}

/// `stock.warehouse.orderpoint`
#[derive(Debug, Clone, Deserialize)]
pub struct OrderpointRecord {
    #[serde(default)]
    pub product_id: Many2One,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub product_min_qty: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub product_max_qty: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub qty_multiple: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub qty_to_order: f64,
    #[serde(default, deserialize_with = "optional_string")]
    pub trigger: Option<String>,
    #[serde(default)]
    pub location_id: Many2One,
}

/// `product.supplierinfo`
#[derive(Debug, Clone, Deserialize)]
pub struct SupplierInfoRecord {
    #[serde(default)]
    pub product_tmpl_id: Many2One,
    #[serde(default)]
    pub partner_id: Many2One,
    #[serde(default, deserialize_with = "integer_or_zero")]
    pub delay: i64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub min_qty: f64,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub price: f64,
    #[serde(default, deserialize_with = "integer_or_zero")]
    pub sequence: i64,
}
