//! Hosted record store over the PostgREST API
//!
//! Row-level security is enforced server-side from the bearer token, so this
//! client only has to forward the session. Requests go through a governor
//! rate limiter to stay under the hosted plan's quota.

use crate::modules::records::domain::{QueryFilter, Record, RecordStore, SortDirection};
use crate::shared::config::RemoteStoreConfig;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::utils::logger::TimedOperation;
use async_trait::async_trait;
use governor::{Quota, RateLimiter as GovernorRateLimiter};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

type DirectRateLimiter = GovernorRateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
    governor::middleware::NoOpMiddleware,
>;

pub struct PostgrestRecordStore {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
    rate_limiter: DirectRateLimiter,
}

impl PostgrestRecordStore {
    pub fn new(config: &RemoteStoreConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("fieldcrm/0.1")
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: config.access_token.clone(),
            rate_limiter: Self::create_rate_limiter(config.requests_per_second, 5),
        })
    }

    /// Create a rate limiter with specified requests per second and burst capacity
    fn create_rate_limiter(requests_per_second: f64, burst_size: u32) -> DirectRateLimiter {
        let period = if requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / requests_per_second)
        } else {
            Duration::from_secs(1)
        };

        let burst = NonZeroU32::new(burst_size.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        GovernorRateLimiter::direct(quota)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Render a filter as PostgREST query parameters
    pub fn query_params(filter: &QueryFilter) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];

        for (column, value) in &filter.equals {
            params.push((column.clone(), format!("eq.{}", render_value(value))));
        }

        if let Some((column, direction)) = &filter.order_by {
            let suffix = match direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", column, suffix)));
        }

        if let Some(limit) = filter.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }

    /// Build the full request URL with encoded parameters
    fn url_with_params(&self, table: &str, params: &[(String, String)]) -> String {
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect();
        format!("{}?{}", self.table_url(table), query.join("&"))
    }

    async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.rate_limiter.until_ready().await;

        let bearer = self.access_token.as_deref().unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .header("Prefer", "return=representation")
    }

    /// Turn an HTTP response into rows or a typed error
    async fn read_rows(response: Response, context: &str) -> AppResult<Vec<Record>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Record store rejected {}: {} {}", context, status, body);
            return Err(status_error(status, context, &body));
        }

        let body: Value = response.json().await?;
        match body {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect()),
            Value::Object(record) => Ok(vec![record]),
            other => Err(AppError::ApiError(format!(
                "Unexpected response for {}: {}",
                context, other
            ))),
        }
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn status_error(status: StatusCode, context: &str, body: &str) -> AppError {
    match status.as_u16() {
        401 | 403 => AppError::Unauthorized(format!("{} was denied: {}", context, body)),
        404 => AppError::NotFound(format!("{}: {}", context, body)),
        409 => AppError::DatabaseError(format!("{} conflicted: {}", context, body)),
        429 => AppError::RateLimitError(format!("{} was throttled", context)),
        500..=599 => AppError::ExternalServiceError(format!("{} failed: HTTP {}", context, status)),
        _ => AppError::ApiError(format!("{} failed: HTTP {} {}", context, status, body)),
    }
}

#[async_trait]
impl RecordStore for PostgrestRecordStore {
    async fn insert(&self, table: &str, record: Record) -> AppResult<Record> {
        let timer = TimedOperation::new(&format!("insert into {}", table));
        let url = self.table_url(table);

        let response = self
            .request(Method::POST, &url)
            .await
            .json(&Value::Object(record))
            .send()
            .await?;
        let mut rows = Self::read_rows(response, &format!("insert into {}", table)).await?;
        timer.finish();

        if rows.is_empty() {
            return Err(AppError::ApiError(format!(
                "Insert into {} returned no row",
                table
            )));
        }
        Ok(rows.swap_remove(0))
    }

    async fn query(&self, table: &str, filter: &QueryFilter) -> AppResult<Vec<Record>> {
        let url = self.url_with_params(table, &Self::query_params(filter));
        debug!("Querying {}", url);

        let response = self.request(Method::GET, &url).await.send().await?;
        Self::read_rows(response, &format!("query on {}", table)).await
    }

    async fn update(&self, table: &str, id: Uuid, patch: Record) -> AppResult<()> {
        let params = vec![("id".to_string(), format!("eq.{}", id))];
        let url = self.url_with_params(table, &params);

        let response = self
            .request(Method::PATCH, &url)
            .await
            .json(&Value::Object(patch))
            .send()
            .await?;
        let rows = Self::read_rows(response, &format!("update on {}", table)).await?;

        // RLS hides foreign rows, which surfaces as an empty representation
        if rows.is_empty() {
            return Err(AppError::NotFound(format!("No row {} in '{}'", id, table)));
        }
        Ok(())
    }

    async fn update_where(
        &self,
        table: &str,
        id: Uuid,
        condition: &QueryFilter,
        patch: Record,
    ) -> AppResult<bool> {
        // PostgREST applies every filter in the same UPDATE statement
        let mut params = vec![("id".to_string(), format!("eq.{}", id))];
        for (column, value) in &condition.equals {
            params.push((column.clone(), format!("eq.{}", render_value(value))));
        }
        let url = self.url_with_params(table, &params);

        let response = self
            .request(Method::PATCH, &url)
            .await
            .json(&Value::Object(patch))
            .send()
            .await?;
        let rows = Self::read_rows(response, &format!("conditional update on {}", table)).await?;

        Ok(!rows.is_empty())
    }

    async fn delete(&self, table: &str, id: Uuid) -> AppResult<()> {
        let params = vec![("id".to_string(), format!("eq.{}", id))];
        let url = self.url_with_params(table, &params);

        let response = self.request(Method::DELETE, &url).await.send().await?;
        let rows = Self::read_rows(response, &format!("delete on {}", table)).await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(format!("No row {} in '{}'", id, table)));
        }
        Ok(())
    }
}
