//! Minimal PostgREST client for the `/rest/v1` table API.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{RemoteError, RemoteResult};
use crate::auth::parse_api_error;
use crate::config::RemoteConfig;

/// Query parameters: column filters (`user_id=eq.x`) plus `select`/`order`.
pub type Query<'a> = [(&'a str, String)];

#[derive(Clone)]
pub struct PostgrestClient {
    rest_url: String,
    anon_key: String,
    client: Client,
}

impl PostgrestClient {
    pub fn new(config: &RemoteConfig) -> RemoteResult<Self> {
        Ok(Self {
            rest_url: config.rest_url(),
            anon_key: config.anon_key().to_string(),
            client: Client::builder().build()?,
        })
    }

    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query<'_>,
        access_token: &str,
    ) -> RemoteResult<Vec<T>> {
        let request = self.authorized(self.client.get(self.table_url(table)), access_token);
        let response = Self::send(request.query(query)).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|error| RemoteError::InvalidPayload(error.to_string()))
    }

    /// Insert rows, merging into existing rows on the `on_conflict` columns.
    pub async fn upsert<T: Serialize + Sync>(
        &self,
        table: &str,
        rows: &[T],
        on_conflict: &str,
        access_token: &str,
    ) -> RemoteResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let request = self
            .authorized(self.client.post(self.table_url(table)), access_token)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        Self::send(request).await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        table: &str,
        query: &Query<'_>,
        access_token: &str,
    ) -> RemoteResult<()> {
        let request = self
            .authorized(self.client.delete(self.table_url(table)), access_token)
            .query(query)
            .header("Prefer", "return=minimal");
        Self::send(request).await?;
        Ok(())
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    fn authorized(&self, request: RequestBuilder, access_token: &str) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    async fn send(request: RequestBuilder) -> RemoteResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status,
                message: parse_api_error(status, &body),
            });
        }
        Ok(response)
    }
}

/// `eq.<value>` filter.
pub fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

/// `not.in.("a","b")` filter; values are quoted so commas and parentheses in
/// ids stay literal.
pub fn not_in<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted = values
        .into_iter()
        .map(|value| format!("\"{}\"", value.as_ref().replace('\\', "\\\\").replace('"', "\\\"")))
        .collect::<Vec<_>>()
        .join(",");
    format!("not.in.({quoted})")
}
