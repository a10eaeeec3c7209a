//! Catalog lookups: categories, products and reorder rules

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::{AppError, AppResult};
use crate::external::records::{
    CategoryRecord, ComputedProductFields, OrderpointRecord, ProductRecord, CATEGORY, ORDERPOINT,
    PRODUCT,
};
use crate::external::{Domain, OdooGateway, Op, Query};

use super::{match_category, match_name_or_code};

const SEARCH_LIMIT: u32 = 50;
const RULE_LIMIT: u32 = 200;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryMatch {
    pub id: i64,
    pub name: String,
    pub full_path: String,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductMatch {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub category: Option<String>,
    pub on_hand: f64,
    pub forecasted: f64,
    pub minimum: f64,
    pub pending_forecast: f64,
    pub require: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
    pub full_path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryProduct {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub on_hand: f64,
    pub forecasted: f64,
    pub incoming: f64,
    pub outgoing: f64,
    pub minimum: f64,
    pub pending_forecast: f64,
    pub require: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CategoryTotals {
    pub total_on_hand: f64,
    pub total_forecasted: f64,
    pub total_incoming: f64,
    pub total_outgoing: f64,
    pub total_minimum: f64,
    pub total_pending_forecast: f64,
    pub total_require: f64,
}

impl CategoryTotals {
    fn add(&mut self, p: &CategoryProduct) {
        self.total_on_hand += p.on_hand;
        self.total_forecasted += p.forecasted;
        self.total_incoming += p.incoming;
        self.total_outgoing += p.outgoing;
        self.total_minimum += p.minimum;
        self.total_pending_forecast += p.pending_forecast;
        self.total_require += p.require;
    }
}

/// Products of one category with their stock figures
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryProducts {
    pub category: CategoryRef,
    pub product_count: usize,
    pub products: Vec<CategoryProduct>,
    pub summary: CategoryTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReorderRule {
    pub product_id: i64,
    pub product_name: String,
    pub product_code: String,
    pub on_hand: f64,
    pub forecasted: f64,
    pub min_qty: f64,
    pub max_qty: f64,
    pub qty_to_order: f64,
    pub trigger: String,
    pub location: Option<String>,
    pub below_minimum: bool,
    pub shortage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReorderRuleSummary {
    pub total_rules: usize,
    pub below_minimum_count: usize,
    pub total_shortage: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReorderRules {
    pub summary: ReorderRuleSummary,
    pub reorder_rules: Vec<ReorderRule>,
}

/// Catalog lookup service
pub struct CatalogService<'a, G> {
    gateway: &'a G,
}

impl<'a, G: OdooGateway> CatalogService<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Categories whose own name contains `name`
    pub async fn search_categories(&self, name: &str) -> AppResult<Vec<CategoryMatch>> {
        let categories: Vec<CategoryRecord> = self
            .gateway
            .search_read(
                CATEGORY,
                &Query::new(Domain::new().and("name", Op::ILike, name))
                    .fields(&["id", "name", "complete_name", "parent_id"])
                    .limit(SEARCH_LIMIT),
            )
            .await?;

        Ok(categories
            .into_iter()
            .map(|c| CategoryMatch {
                id: c.id,
                full_path: c.full_path(),
                parent: c.parent_id.name().map(str::to_string),
                name: c.name,
            })
            .collect())
    }

    /// Products by exact id, or by name or internal reference
    ///
    /// An id takes precedence over a name.
    pub async fn search_products(
        &self,
        name: Option<&str>,
        product_id: Option<i64>,
        category_name: Option<&str>,
    ) -> AppResult<Vec<ProductMatch>> {
        let mut domain = Domain::new().and("type", Op::Eq, "product");
        domain = match product_id {
            Some(id) => domain.and("id", Op::Eq, id),
            None => match_name_or_code(domain, name),
        };
        let domain = match_category(self.gateway, domain, category_name).await?;

        let products: Vec<ProductRecord> = self
            .gateway
            .search_read(
                PRODUCT,
                &Query::new(domain)
                    .fields(&[
                        "id",
                        "name",
                        "default_code",
                        "categ_id",
                        "qty_available",
                        "virtual_available",
                        "minimum",
                    ])
                    .limit(SEARCH_LIMIT),
            )
            .await?;
        let computed = self.computed_fields(&products).await?;

        Ok(products
            .into_iter()
            .map(|p| {
                let extra = computed.get(&p.id).cloned().unwrap_or_default();
                ProductMatch {
                    id: p.id,
                    code: p.code_or_na(),
                    category: p.categ_id.name().map(str::to_string),
                    name: p.name,
                    on_hand: p.qty_available,
                    forecasted: p.virtual_available,
                    minimum: p.minimum,
                    pending_forecast: extra.pending_forecast,
                    require: extra.require,
                }
            })
            .collect())
    }

    /// Every product in the first category whose full path matches
    pub async fn get_products_by_category(
        &self,
        category_name: &str,
        include_subcategories: bool,
    ) -> AppResult<CategoryProducts> {
        let categories: Vec<CategoryRecord> = self
            .gateway
            .search_read(
                CATEGORY,
                &Query::new(Domain::new().and("complete_name", Op::ILike, category_name))
                    .fields(&["id", "name", "complete_name"])
                    .limit(10),
            )
            .await?;
        let category = categories.into_iter().next().ok_or_else(|| {
            AppError::NotFound(format!("No category found matching '{}'", category_name))
        })?;

        let op = if include_subcategories {
            Op::ChildOf
        } else {
            Op::Eq
        };
        let domain = Domain::new()
            .and("categ_id", op, category.id)
            .and("type", Op::Eq, "product");
        let products: Vec<ProductRecord> = self
            .gateway
            .search_read(
                PRODUCT,
                &Query::new(domain)
                    .fields(&[
                        "id",
                        "name",
                        "default_code",
                        "categ_id",
                        "qty_available",
                        "virtual_available",
                        "incoming_qty",
                        "outgoing_qty",
                        "minimum",
                    ])
                    .order("default_code"),
            )
            .await?;
        let computed = self.computed_fields(&products).await?;

        let mut summary = CategoryTotals::default();
        let products: Vec<CategoryProduct> = products
            .into_iter()
            .map(|p| {
                let extra = computed.get(&p.id).cloned().unwrap_or_default();
                let product = CategoryProduct {
                    id: p.id,
                    code: p.code_or_na(),
                    name: p.name,
                    on_hand: p.qty_available,
                    forecasted: p.virtual_available,
                    incoming: p.incoming_qty,
                    outgoing: p.outgoing_qty,
                    minimum: p.minimum,
                    pending_forecast: extra.pending_forecast,
                    require: extra.require,
                };
                summary.add(&product);
                product
            })
            .collect();

        Ok(CategoryProducts {
            category: CategoryRef {
                id: category.id,
                full_path: category.full_path(),
                name: category.name,
            },
            product_count: products.len(),
            products,
            summary,
        })
    }

    /// Min/max reorder rules with the current shortage against on-hand
    ///
    /// A name or category filter that matches no product yields no rules.
    pub async fn get_reorder_rules(
        &self,
        product_name: Option<&str>,
        category_name: Option<&str>,
        only_below_minimum: bool,
    ) -> AppResult<ReorderRules> {
        let filtered = product_name.is_some_and(|n| !n.is_empty())
            || category_name.is_some_and(|n| !n.is_empty());

        let mut rule_domain = Domain::new();
        if filtered {
            let domain = match_name_or_code(Domain::new().and("type", Op::Eq, "product"), product_name);
            let domain = match_category(self.gateway, domain, category_name).await?;
            let ids = self
                .gateway
                .search(PRODUCT, &Query::new(domain).limit(RULE_LIMIT))
                .await?;
            if ids.is_empty() {
                return Ok(ReorderRules::from_rules(Vec::new()));
            }
            rule_domain = rule_domain.and("product_id", Op::In, ids);
        }

        let orderpoints: Vec<OrderpointRecord> = self
            .gateway
            .search_read(
                ORDERPOINT,
                &Query::new(rule_domain)
                    .fields(&[
                        "product_id",
                        "product_min_qty",
                        "product_max_qty",
                        "qty_to_order",
                        "trigger",
                        "location_id",
                    ])
                    .limit(RULE_LIMIT),
            )
            .await?;

        let product_ids: HashSet<i64> = orderpoints
            .iter()
            .filter_map(|op| op.product_id.id())
            .collect();
        let stock: HashMap<i64, ProductRecord> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            let mut ids: Vec<i64> = product_ids.into_iter().collect();
            ids.sort_unstable();
            let products: Vec<ProductRecord> = self
                .gateway
                .search_read(
                    PRODUCT,
                    &Query::new(Domain::new().and("id", Op::In, ids)).fields(&[
                        "id",
                        "name",
                        "default_code",
                        "qty_available",
                        "virtual_available",
                    ]),
                )
                .await?;
            products.into_iter().map(|p| (p.id, p)).collect()
        };

        let mut rules = Vec::new();
        for op in orderpoints {
            let Some((product_id, product_name)) = op.product_id.0.clone() else {
                continue;
            };
            let product = stock.get(&product_id);
            let on_hand = product.map_or(0.0, |p| p.qty_available);
            let min_qty = op.product_min_qty;
            if only_below_minimum && on_hand >= min_qty {
                continue;
            }
            rules.push(ReorderRule {
                product_id,
                product_name,
                product_code: product.map_or_else(|| "N/A".to_string(), ProductRecord::code_or_na),
                on_hand,
                forecasted: product.map_or(0.0, |p| p.virtual_available),
                min_qty,
                max_qty: op.product_max_qty,
                qty_to_order: op.qty_to_order,
                trigger: op.trigger.unwrap_or_else(|| "auto".to_string()),
                location: op.location_id.name().map(str::to_string),
                below_minimum: on_hand < min_qty,
                shortage: (min_qty - on_hand).max(0.0),
            });
        }

        Ok(ReorderRules::from_rules(rules))
    }

    /// Computed fields are not stored, so they come from a separate `read`
    async fn computed_fields(
        &self,
        products: &[ProductRecord],
    ) -> AppResult<HashMap<i64, ComputedProductFields>> {
        let ids: Vec<i64> = products.iter().map(|p| p.id).collect();
        let computed: Vec<ComputedProductFields> = self
            .gateway
            .read(PRODUCT, &ids, &["id", "pending_forecast", "require"])
            .await?;
        Ok(computed.into_iter().map(|c| (c.id, c)).collect())
    }
}

impl ReorderRules {
    /// Largest shortage first, with totals
    fn from_rules(mut rules: Vec<ReorderRule>) -> Self {
        rules.sort_by(|a, b| b.shortage.total_cmp(&a.shortage));
        let summary = ReorderRuleSummary {
            total_rules: rules.len(),
            below_minimum_count: rules.iter().filter(|r| r.below_minimum).count(),
            total_shortage: rules.iter().map(|r| r.shortage).sum(),
        };
        Self {
            summary,
            reorder_rules: rules,
        }
    }
}
