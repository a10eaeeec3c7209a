//! In-memory ERP gateway for engine and route tests
//!
//! Records are plain JSON objects. Many2one fields are `[id, "name"]`
//! pairs and compare by id. Dotted relation paths such as
//! `location_dest_id.usage` are stored as literal keys on the record.
//! `child_of` walks the `parent_id` links of `product.category`.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use inventory_analytics_backend::error::{AppError, AppResult};
use inventory_analytics_backend::external::{Domain, OdooGateway, Op, Query, Term};

pub const STOCK: i64 = 8;
pub const CUSTOMERS: i64 = 5;
pub const VENDORS: i64 = 4;

#[derive(Default)]
pub struct FakeGateway {
    models: HashMap<String, Vec<Value>>,
    unreachable: bool,
    queries: Mutex<Vec<(String, Value)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose every call fails as if the ERP were down
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, model: &str, records: Vec<Value>) -> Self {
        self.models
            .entry(model.to_string())
            .or_default()
            .extend(records);
        self
    }

    /// Serialized domains of every query issued against `model`
    pub fn domains(&self, model: &str) -> Vec<Value> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == model)
            .map(|(_, d)| d.clone())
            .collect()
    }

    fn check(&self) -> AppResult<()> {
        if self.unreachable {
            return Err(AppError::Gateway("connection refused".to_string()));
        }
        Ok(())
    }

    fn matching(&self, model: &str, query: &Query) -> Vec<Value> {
        self.queries.lock().unwrap().push((
            model.to_string(),
            serde_json::to_value(&query.domain).unwrap(),
        ));
        let tree = self.category_tree();
        let mut records: Vec<Value> = self
            .models
            .get(model)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| matches(&query.domain, r, &tree))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            sort_records(&mut records, order);
        }
        if let Some(limit) = query.limit {
            records.truncate(limit as usize);
        }
        records
    }

    /// Parent id to child ids over the stored categories
    fn category_tree(&self) -> HashMap<i64, Vec<i64>> {
        let mut tree: HashMap<i64, Vec<i64>> = HashMap::new();
        for category in self.models.get("product.category").into_iter().flatten() {
            if let (Some(id), Some(parent)) = (
                category["id"].as_i64(),
                field_value(category, "parent_id").as_i64(),
            ) {
                tree.entry(parent).or_default().push(id);
            }
        }
        tree
    }
}

impl OdooGateway for FakeGateway {
    async fn search_read_values(&self, model: &str, query: &Query) -> AppResult<Vec<Value>> {
        self.check()?;
        Ok(self.matching(model, query))
    }

    async fn read_values(&self, model: &str, ids: &[i64], _fields: &[&str]) -> AppResult<Vec<Value>> {
        self.check()?;
        Ok(self
            .models
            .get(model)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r["id"].as_i64().is_some_and(|id| ids.contains(&id)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn search(&self, model: &str, query: &Query) -> AppResult<Vec<i64>> {
        self.check()?;
        Ok(self
            .matching(model, query)
            .iter()
            .filter_map(|r| r["id"].as_i64())
            .collect())
    }

    async fn search_count(&self, model: &str, domain: &Domain) -> AppResult<u64> {
        self.check()?;
        let query = Query::new(domain.clone());
        Ok(self.matching(model, &query).len() as u64)
    }
}

// ============================================================================
// Domain evaluation
// ============================================================================

type Tree = HashMap<i64, Vec<i64>>;

fn matches(domain: &Domain, record: &Value, tree: &Tree) -> bool {
    let terms = domain.terms();
    let mut pos = 0;
    let mut result = true;
    while pos < terms.len() {
        let term = eval(terms, &mut pos, record, tree);
        result = result && term;
    }
    result
}

fn eval(terms: &[Term], pos: &mut usize, record: &Value, tree: &Tree) -> bool {
    let term = &terms[*pos];
    *pos += 1;
    match term {
        Term::Or => {
            let left = eval(terms, pos, record, tree);
            let right = eval(terms, pos, record, tree);
            left || right
        }
        Term::Not => !eval(terms, pos, record, tree),
        Term::Leaf {
            field,
            op: Op::ChildOf,
            value,
        } => one_of(&field_value(record, field), &descendants(value, tree)),
        Term::Leaf { field, op, value } => leaf(&field_value(record, field), *op, value),
    }
}

/// The given ids and every id below them
fn descendants(roots: &Value, tree: &Tree) -> Value {
    let mut pending: Vec<i64> = match roots {
        Value::Array(items) => items.iter().filter_map(Value::as_i64).collect(),
        single => single.as_i64().into_iter().collect(),
    };
    let mut seen = HashSet::new();
    while let Some(id) = pending.pop() {
        if seen.insert(id) {
            pending.extend(tree.get(&id).into_iter().flatten().copied());
        }
    }
    Value::Array(seen.into_iter().map(Value::from).collect())
}

/// Many2one pairs reduce to their id, `false` to null
fn field_value(record: &Value, field: &str) -> Value {
    match record.get(field) {
        Some(Value::Array(pair)) if pair.len() == 2 && pair[0].is_i64() => pair[0].clone(),
        Some(Value::Bool(false)) | None => Value::Null,
        Some(other) => other.clone(),
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    compare(a, b) == Some(Ordering::Equal)
}

fn one_of(actual: &Value, expected: &Value) -> bool {
    match expected {
        Value::Array(items) => items.iter().any(|item| equal(actual, item)),
        single => equal(actual, single),
    }
}

fn leaf(actual: &Value, op: Op, expected: &Value) -> bool {
    match op {
        Op::Eq => equal(actual, expected),
        Op::Ne => !equal(actual, expected),
        Op::Gt => compare(actual, expected) == Some(Ordering::Greater),
        Op::Ge => matches!(
            compare(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Op::Lt => compare(actual, expected) == Some(Ordering::Less),
        Op::Le => matches!(
            compare(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Op::In | Op::ChildOf => one_of(actual, expected),
        Op::NotIn => !one_of(actual, expected),
        Op::ILike => match (actual.as_str(), expected.as_str()) {
            (Some(a), Some(e)) => a.to_lowercase().contains(&e.to_lowercase()),
            _ => false,
        },
    }
}

fn sort_records(records: &mut [Value], order: &str) {
    let keys: Vec<(String, bool)> = order
        .split(',')
        .map(|part| {
            let mut words = part.split_whitespace();
            let field = words.next().unwrap_or_default().to_string();
            let descending = words.next().is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
            (field, descending)
        })
        .collect();

    records.sort_by(|a, b| {
        for (field, descending) in &keys {
            let ordering = compare(&field_value(a, field), &field_value(b, field))
                .unwrap_or(Ordering::Equal);
            let ordering = if *descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

// ============================================================================
// Record builders
// ============================================================================

pub fn product(id: i64, name: &str, code: &str, category: (i64, &str)) -> Value {
    json!({
        "id": id,
        "name": name,
        "default_code": code,
        "type": "product",
        "categ_id": [category.0, category.1],
        "product_tmpl_id": [id + 100, name],
        "qty_available": 0.0,
        "virtual_available": 0.0,
        "incoming_qty": 0.0,
        "outgoing_qty": 0.0,
        "minimum": 0.0,
        "pending_forecast": 0.0,
        "require": 0.0
    })
}

/// Overwrite fields of a record built by one of the helpers
pub fn with(mut record: Value, fields: Value) -> Value {
    if let (Some(target), Value::Object(fields)) = (record.as_object_mut(), fields) {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }
    record
}

pub fn quant(product_id: i64, quantity: f64, reserved: f64, in_date: &str) -> Value {
    json!({
        "product_id": [product_id, format!("Product {}", product_id)],
        "location_id": [STOCK, "WH/Stock"],
        "quantity": quantity,
        "reserved_quantity": reserved,
        "in_date": in_date,
        "lot_id": false
    })
}

/// A completed shipment from stock to a customer
pub fn shipment(product_id: i64, qty: f64, date: &str) -> Value {
    stock_move(product_id, qty, date, "done", (STOCK, "internal"), (CUSTOMERS, "customer"))
}

/// A completed receipt from a vendor into stock
pub fn receipt(product_id: i64, qty: f64, date: &str) -> Value {
    stock_move(product_id, qty, date, "done", (VENDORS, "supplier"), (STOCK, "internal"))
}

pub fn stock_move(
    product_id: i64,
    qty: f64,
    date: &str,
    state: &str,
    from: (i64, &str),
    to: (i64, &str),
) -> Value {
    json!({
        "product_id": [product_id, format!("Product {}", product_id)],
        "product_uom_qty": qty,
        "date": date,
        "state": state,
        "location_id": [from.0, "From"],
        "location_dest_id": [to.0, "To"],
        "location_id.usage": from.1,
        "location_dest_id.usage": to.1
    })
}

pub fn orderpoint(product_id: i64, min: f64, max: f64) -> Value {
    json!({
        "product_id": [product_id, format!("Product {}", product_id)],
        "product_min_qty": min,
        "product_max_qty": max,
        "qty_multiple": 1.0,
        "qty_to_order": 0.0,
        "trigger": "auto",
        "location_id": [STOCK, "WH/Stock"],
        "warehouse_id": [1, "WH"],
        "active": true
    })
}

pub fn supplier(tmpl_id: i64, partner: &str, delay: i64, sequence: i64) -> Value {
    json!({
        "id": tmpl_id * 10 + sequence,
        "product_tmpl_id": [tmpl_id, "Template"],
        "partner_id": [900 + sequence, partner],
        "delay": delay,
        "min_qty": 1.0,
        "price": 10.0,
        "sequence": sequence
    })
}

pub fn category(id: i64, name: &str, complete_name: &str, parent: Option<(i64, &str)>) -> Value {
    json!({
        "id": id,
        "name": name,
        "complete_name": complete_name,
        "parent_id": parent.map_or(Value::Bool(false), |(pid, pname)| json!([pid, pname]))
    })
}
