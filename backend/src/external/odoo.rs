//! Odoo JSON-RPC client
//!
//! Talks to the ERP's `/jsonrpc` endpoint. Authentication happens on the
//! first call and the resulting uid is reused for the life of the client.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::domain::Domain;
use crate::config::OdooConfig;
use crate::error::{AppError, AppResult};

/// A `search`/`search_read` request
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub domain: Domain,
    pub fields: Vec<String>,
    pub limit: Option<u32>,
    pub offset: u32,
    pub order: Option<String>,
}

impl Query {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            ..Self::default()
        }
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    fn kwargs(&self, with_fields: bool) -> Value {
        let mut kwargs = Map::new();
        if with_fields && !self.fields.is_empty() {
            kwargs.insert("fields".into(), json!(self.fields));
        }
        kwargs.insert("offset".into(), json!(self.offset));
        if let Some(limit) = self.limit {
            kwargs.insert("limit".into(), json!(limit));
        }
        if let Some(order) = &self.order {
            kwargs.insert("order".into(), json!(order));
        }
        Value::Object(kwargs)
    }
}

/// Read-only access to ERP collections
///
/// Implementors supply the raw primitives; the typed helpers decode
/// records into the shapes in [`super::records`].
pub trait OdooGateway: Send + Sync {
    fn search_read_values(
        &self,
        model: &str,
        query: &Query,
    ) -> impl Future<Output = AppResult<Vec<Value>>> + Send;

    fn read_values(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> impl Future<Output = AppResult<Vec<Value>>> + Send;

    fn search(&self, model: &str, query: &Query)
        -> impl Future<Output = AppResult<Vec<i64>>> + Send;

    fn search_count(
        &self,
        model: &str,
        domain: &Domain,
    ) -> impl Future<Output = AppResult<u64>> + Send;

    fn search_read<T: DeserializeOwned + Send>(
        &self,
        model: &str,
        query: &Query,
    ) -> impl Future<Output = AppResult<Vec<T>>> + Send {
        async move { decode_all(model, self.search_read_values(model, query).await?) }
    }

    fn read<T: DeserializeOwned + Send>(
        &self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> impl Future<Output = AppResult<Vec<T>>> + Send {
        async move {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            decode_all(model, self.read_values(model, ids, fields).await?)
        }
    }
}

fn decode_all<T: DeserializeOwned>(model: &str, values: Vec<Value>) -> AppResult<Vec<T>> {
    values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).map_err(|e| {
                AppError::RemoteFault(format!("Unexpected {} record: {}", model, e))
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<RpcErrorData>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorData {
    #[serde(default)]
    message: String,
}

impl RpcError {
    fn detail(&self) -> String {
        match &self.data {
            Some(data) if !data.message.is_empty() => data.message.clone(),
            _ => self.message.clone(),
        }
    }
}

/// ERP JSON-RPC client
#[derive(Clone)]
pub struct OdooClient {
    client: Client,
    config: Arc<OdooConfig>,
    uid: Arc<OnceCell<i64>>,
    next_id: Arc<AtomicU64>,
}

impl OdooClient {
    /// Create a new OdooClient
    pub fn new(config: &OdooConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config.clone()),
            uid: Arc::new(OnceCell::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    async fn call(&self, service: &str, method: &str, args: Value) -> AppResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": "call",
            "params": {
                "service": service,
                "method": method,
                "args": args,
            },
            "id": id,
        });

        let response: RpcResponse = self
            .client
            .post(format!("{}/jsonrpc", self.config.url))
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(AppError::RemoteFault(error.detail()));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Authenticated user id, logging in on first use
    pub async fn uid(&self) -> AppResult<i64> {
        let uid = self
            .uid
            .get_or_try_init(|| async {
                tracing::debug!(username = %self.config.username, "Authenticating with Odoo");
                let result = self
                    .call(
                        "common",
                        "authenticate",
                        json!([
                            self.config.database,
                            self.config.username,
                            self.config.api_key,
                            {}
                        ]),
                    )
                    .await?;

                match result.as_i64() {
                    Some(uid) if uid > 0 => Ok(uid),
                    _ => Err(AppError::Authentication(format!(
                        "no user id returned for '{}' on database '{}'",
                        self.config.username, self.config.database
                    ))),
                }
            })
            .await?;
        Ok(*uid)
    }

    /// Run a model method through `object.execute_kw`
    pub async fn execute_kw(
        &self,
        model: &str,
        method: &str,
        args: Value,
        kwargs: Value,
    ) -> AppResult<Value> {
        let uid = self.uid().await?;
        tracing::debug!(model, method, "execute_kw");
        self.call(
            "object",
            "execute_kw",
            json!([
                self.config.database,
                uid,
                self.config.api_key,
                model,
                method,
                args,
                kwargs
            ]),
        )
        .await
    }
}

impl OdooGateway for OdooClient {
    async fn search_read_values(&self, model: &str, query: &Query) -> AppResult<Vec<Value>> {
        let result = self
            .execute_kw(model, "search_read", json!([query.domain]), query.kwargs(true))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn read_values(&self, model: &str, ids: &[i64], fields: &[&str]) -> AppResult<Vec<Value>> {
        let result = self
            .execute_kw(model, "read", json!([ids]), json!({ "fields": fields }))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn search(&self, model: &str, query: &Query) -> AppResult<Vec<i64>> {
        let result = self
            .execute_kw(model, "search", json!([query.domain]), query.kwargs(false))
            .await?;
        Ok(serde_json::from_value(result)?)
    }

    async fn search_count(&self, model: &str, domain: &Domain) -> AppResult<u64> {
        let result = self
            .execute_kw(model, "search_count", json!([domain]), json!({}))
            .await?;
        Ok(serde_json::from_value(result)?)
    }
}
