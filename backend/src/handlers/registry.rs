//! Tool registry: names, descriptions and JSON input schemas

use serde::Serialize;
use serde_json::{json, Value};

/// One callable tool as advertised to clients
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    fn new(name: &'static str, description: &'static str, input_schema: Value) -> Self {
        Self {
            name,
            description,
            input_schema,
        }
    }
}

fn id_list(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "integer"},
        "description": description
    })
}

fn text(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn object(properties: Value) -> Value {
    json!({"type": "object", "properties": properties})
}

fn period_type() -> Value {
    json!({
        "type": "string",
        "enum": ["day", "week", "month"],
        "default": "day",
        "description": "Granularity of forecast"
    })
}

/// Every tool the server exposes, in display order
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // Catalog
        ToolDefinition::new(
            "search_categories",
            "Search for product categories by name. Use this to find category IDs before querying stock levels or other analysis.",
            json!({
                "type": "object",
                "properties": {
                    "name": text("Category name to search for (partial match supported)")
                },
                "required": ["name"]
            }),
        ),
        ToolDefinition::new(
            "search_products",
            "Search for products by name, code or ID. Returns product ID, name, code, category and current stock.",
            object(json!({
                "name": text("Product name or code to search for (partial match supported)"),
                "product_id": {"type": "integer", "description": "Product ID (exact match)"},
                "category_name": text("Optional category name to filter products")
            })),
        ),
        ToolDefinition::new(
            "get_products_by_category",
            "Get all products in a category by category name, with on hand, minimum, pending forecast and quantity to order.",
            json!({
                "type": "object",
                "properties": {
                    "category_name": text("Category name to search for"),
                    "include_subcategories": {
                        "type": "boolean",
                        "default": true,
                        "description": "Include products from subcategories"
                    }
                },
                "required": ["category_name"]
            }),
        ),
        // Stock
        ToolDefinition::new(
            "get_reorder_rules",
            "Get minimum stock levels (reorder points) for products and current stock against the minimum.",
            object(json!({
                "product_name": text("Product name to search for (partial match)"),
                "category_name": text("Category name to filter products"),
                "only_below_minimum": {
                    "type": "boolean",
                    "default": false,
                    "description": "Only show products below minimum stock level"
                }
            })),
        ),
        ToolDefinition::new(
            "get_stock_levels",
            "Get current stock levels with status classification (out of stock, critical, low, normal, overstock).",
            object(json!({
                "product_ids": id_list("Optional list of product IDs to filter"),
                "category_ids": id_list("Optional list of category IDs to filter"),
                "warehouse_id": {"type": "integer", "description": "Optional warehouse ID to filter"},
                "include_zero_stock": {
                    "type": "boolean",
                    "default": false,
                    "description": "Include products with zero stock"
                }
            })),
        ),
        ToolDefinition::new(
            "get_reorder_alerts",
            "Get products that are out of stock, critical, low, or have less than threshold days of stock.",
            object(json!({
                "threshold_days": {
                    "type": "number",
                    "default": 7,
                    "description": "Alert when days of stock is below this value"
                },
                "warehouse_id": {"type": "integer", "description": "Optional warehouse ID to filter"}
            })),
        ),
        ToolDefinition::new(
            "get_stock_summary",
            "Get summary statistics of stock levels: total products, status breakdown and products needing reorder.",
            object(json!({
                "warehouse_id": {"type": "integer", "description": "Optional warehouse ID to filter"}
            })),
        ),
        // Forecast
        ToolDefinition::new(
            "get_stock_forecast",
            "Project stock week by week from scheduled incoming and outgoing moves.",
            object(json!({
                "product_name": text("Product name to search for (partial match)"),
                "category_name": text("Category name to filter products"),
                "weeks": {"type": "integer", "default": 4, "description": "Number of weeks to forecast (1-12)"}
            })),
        ),
        ToolDefinition::new(
            "forecast_demand",
            "Forecast future demand using moving average, exponential smoothing, linear regression or Holt-Winters.",
            object(json!({
                "product_ids": id_list("Optional list of product IDs (default: up to 100 products)"),
                "periods": {"type": "integer", "default": 30, "description": "Number of periods to forecast (1-365)"},
                "period_type": period_type(),
                "method": {
                    "type": "string",
                    "enum": ["auto", "moving_average", "exponential_smoothing", "linear_regression", "holt_winters"],
                    "default": "auto",
                    "description": "Forecasting method (auto selects best)"
                },
                "historical_days": {"type": "integer", "default": 365, "description": "Days of historical data to use"},
                "confidence_level": {"type": "number", "default": 0.95, "description": "Prediction interval confidence"}
            })),
        ),
        ToolDefinition::new(
            "get_forecast_summary",
            "Summarize demand forecasts: total forecasted demand, trend breakdown and accuracy metrics.",
            object(json!({
                "product_ids": id_list("Optional list of product IDs"),
                "periods": {"type": "integer", "default": 30, "description": "Number of periods to forecast"},
                "period_type": period_type()
            })),
        ),
        // Supply
        ToolDefinition::new(
            "get_lead_time",
            "Get supplier lead time in days for products, using the top supplier of each product.",
            object(json!({
                "product_name": text("Product name to search for (partial match)"),
                "category_name": text("Category name to filter products")
            })),
        ),
        ToolDefinition::new(
            "get_future_stock_alert",
            "List products whose projected stock on a future date is at or below a threshold, with order-by dates from supplier lead time.",
            json!({
                "type": "object",
                "properties": {
                    "target_date": text("Target date in YYYY-MM-DD format"),
                    "threshold": {"type": "number", "default": 50, "description": "Alert when projected stock is at or below this value"},
                    "category_name": text("Category name to filter products"),
                    "product_name": text("Product name to search for (partial match)")
                },
                "required": ["target_date"]
            }),
        ),
        // Classification
        ToolDefinition::new(
            "analyze_abc_xyz",
            "ABC/XYZ classification. ABC ranks by consumption share (A=high, B=medium, C=low), XYZ by demand variability (X=stable, Y=variable, Z=unpredictable).",
            object(json!({
                "product_ids": id_list("Optional list of product IDs"),
                "category_ids": id_list("Optional list of category IDs"),
                "analysis_period_days": {"type": "integer", "default": 365, "description": "Historical period for analysis"},
                "abc_thresholds": {
                    "type": "object",
                    "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
                    "description": "Cumulative share bounds, default {a: 0.80, b: 0.95}"
                },
                "xyz_thresholds": {
                    "type": "object",
                    "properties": {"x": {"type": "number"}, "y": {"type": "number"}},
                    "description": "Coefficient of variation bounds, default {x: 0.5, y: 1.0}"
                }
            })),
        ),
        ToolDefinition::new(
            "get_abc_xyz_summary",
            "Summarize ABC/XYZ classification: class distributions and the combined matrix.",
            object(json!({
                "product_ids": id_list("Optional list of product IDs"),
                "category_ids": id_list("Optional list of category IDs")
            })),
        ),
        // Turnover and aging
        ToolDefinition::new(
            "analyze_turnover",
            "Analyze inventory turnover: fast moving (>12/year), normal (4-12), slow moving (1-4) or dead stock (<1).",
            object(json!({
                "product_ids": id_list("Optional list of product IDs"),
                "category_ids": id_list("Optional list of category IDs"),
                "analysis_period_days": {"type": "integer", "default": 365, "description": "Period for quantity sold"}
            })),
        ),
        ToolDefinition::new(
            "analyze_aging",
            "Analyze how long stock has been on hand, in buckets 0-30, 31-60, 61-90, 91-180, 181-365 days and over 1 year.",
            object(json!({
                "product_ids": id_list("Optional list of product IDs"),
                "category_ids": id_list("Optional list of category IDs")
            })),
        ),
        ToolDefinition::new(
            "get_turnover_summary",
            "Summarize turnover: average ratio, days of inventory and category distribution.",
            object(json!({
                "product_ids": id_list("Optional list of product IDs"),
                "category_ids": id_list("Optional list of category IDs")
            })),
        ),
        ToolDefinition::new(
            "get_aging_summary",
            "Summarize aging: average age, bucket breakdown and obsolescence risk counts.",
            object(json!({
                "product_ids": id_list("Optional list of product IDs"),
                "category_ids": id_list("Optional list of category IDs")
            })),
        ),
        ToolDefinition::new(
            "get_slow_moving_items",
            "List slow moving and dead stock items.",
            object(json!({
                "min_value": {"type": "number", "default": 0, "description": "Minimum stock value to include"},
                "category_ids": id_list("Optional list of category IDs")
            })),
        ),
        ToolDefinition::new(
            "get_high_risk_aging_items",
            "List items with high obsolescence risk.",
            object(json!({
                "min_value": {"type": "number", "default": 0, "description": "Minimum stock value to include"},
                "category_ids": id_list("Optional list of category IDs")
            })),
        ),
    ]
}
