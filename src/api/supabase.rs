use super::{ensure_success, read_json};
use crate::config::SupabaseConfig;
use crate::error::BlundersError;
use crate::types::profile::AuthUser;
use reqwest::StatusCode;
use reqwest::header::CONTENT_RANGE;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

const SERVICE: &str = "database";

/// Which credentials a database call runs under.
#[derive(Debug, Clone, Copy)]
pub enum Access<'a> {
    /// Service-role key; bypasses row-level security.
    Service,
    /// The caller's own access token; row-level security applies.
    User(&'a str),
}

/// Thin client over the managed database's REST (`/rest/v1`) and auth
/// (`/auth/v1`) surfaces.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    rest: Url,
    auth: Url,
    anon_key: Arc<str>,
    service_key: Arc<str>,
}

impl SupabaseClient {
    pub fn new(http: reqwest::Client, cfg: &SupabaseConfig) -> Result<Self, BlundersError> {
        Ok(Self {
            http,
            rest: cfg.url.join("rest/v1/")?,
            auth: cfg.url.join("auth/v1/")?,
            anon_key: Arc::from(cfg.anon_key.as_str()),
            service_key: Arc::from(cfg.service_role_key.as_str()),
        })
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        access: Access<'_>,
    ) -> reqwest::RequestBuilder {
        let (apikey, bearer) = match access {
            Access::Service => (self.service_key.as_ref(), self.service_key.as_ref()),
            Access::User(token) => (self.anon_key.as_ref(), token),
        };
        self.http
            .request(method, url)
            .header("apikey", apikey)
            .bearer_auth(bearer)
    }

    fn table_url(&self, table: &str) -> Result<Url, BlundersError> {
        Ok(self.rest.join(table)?)
    }

    /// `GET /rest/v1/{table}` with PostgREST query parameters.
    pub async fn select(
        &self,
        table: &str,
        query: &[(&str, String)],
        access: Access<'_>,
    ) -> Result<Value, BlundersError> {
        debug!(table, "select");
        let resp = self
            .request(reqwest::Method::GET, self.table_url(table)?, access)
            .query(query)
            .send()
            .await?;
        read_json(SERVICE, resp).await
    }

    /// Like [`select`](Self::select) but yields only the first row, if any.
    pub async fn select_one(
        &self,
        table: &str,
        query: &[(&str, String)],
        access: Access<'_>,
    ) -> Result<Option<Value>, BlundersError> {
        let rows = self.select(table, query, access).await?;
        Ok(match rows {
            Value::Array(mut rows) if !rows.is_empty() => Some(rows.swap_remove(0)),
            _ => None,
        })
    }

    /// Exact row count via `HEAD` with `Prefer: count=exact`.
    pub async fn count(
        &self,
        table: &str,
        filters: &[(&str, String)],
        access: Access<'_>,
    ) -> Result<u64, BlundersError> {
        let resp = self
            .request(reqwest::Method::HEAD, self.table_url(table)?, access)
            .header("Prefer", "count=exact")
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await?;
        let resp = ensure_success(SERVICE, resp).await?;
        Ok(resp
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .unwrap_or(0))
    }

    /// Insert one row and return it.
    pub async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        row: &T,
        access: Access<'_>,
    ) -> Result<Value, BlundersError> {
        debug!(table, "insert");
        let resp = self
            .request(reqwest::Method::POST, self.table_url(table)?, access)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let rows: Value = read_json(SERVICE, resp).await?;
        Ok(first_row(rows))
    }

    /// Patch rows matching `filters` and return the updated rows.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        patch: &T,
        access: Access<'_>,
    ) -> Result<Value, BlundersError> {
        debug!(table, "update");
        let resp = self
            .request(reqwest::Method::PATCH, self.table_url(table)?, access)
            .header("Prefer", "return=representation")
            .query(filters)
            .json(patch)
            .send()
            .await?;
        read_json(SERVICE, resp).await
    }

    /// Call a stored procedure: `POST /rest/v1/rpc/{function}`.
    pub async fn rpc<T: Serialize + ?Sized>(
        &self,
        function: &str,
        args: &T,
        access: Access<'_>,
    ) -> Result<Value, BlundersError> {
        debug!(function, "rpc");
        let url = self.rest.join(&format!("rpc/{function}"))?;
        let resp = self
            .request(reqwest::Method::POST, url, access)
            .json(args)
            .send()
            .await?;
        read_json(SERVICE, resp).await
    }

    /// Resolve an access token to its user. Rejected tokens map to
    /// `Unauthorized`.
    pub async fn get_user(&self, token: &str) -> Result<AuthUser, BlundersError> {
        let resp = self
            .request(reqwest::Method::GET, self.auth.join("user")?, Access::User(token))
            .send()
            .await?;
        if matches!(
            resp.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(BlundersError::Unauthorized);
        }
        read_json(SERVICE, resp).await
    }
}

fn first_row(rows: Value) -> Value {
    match rows {
        Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
        other => other,
    }
}

/// `Content-Range: 0-24/3573` or `*/0` -> total.
fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// PostgREST equality filter value.
pub fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn first_row_unwraps_arrays() {
        let rows = serde_json::json!([{"id": 1}, {"id": 2}]);
        assert_eq!(first_row(rows), serde_json::json!({"id": 1}));
        assert_eq!(first_row(serde_json::json!([])), serde_json::json!([]));
    }

    #[test]
    fn joins_rest_and_auth_paths() {
        let cfg = SupabaseConfig {
            url: Url::parse("https://demo.supabase.co").unwrap(),
            anon_key: "anon".into(),
            service_role_key: "service".into(),
        };
        let client = SupabaseClient::new(reqwest::Client::new(), &cfg).unwrap();
        assert_eq!(
            client.table_url("profiles").unwrap().as_str(),
            "https://demo.supabase.co/rest/v1/profiles"
        );
        assert_eq!(client.auth.as_str(), "https://demo.supabase.co/auth/v1/");
    }
}
