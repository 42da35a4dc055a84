//! Remote sync adapter.
//!
//! Every operation is best-effort: callers treat an error or `None` as
//! "no remote data" and carry on with the local store.

mod rest;
mod supabase;

use std::future::Future;

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{Activity, GridData, MonthGrid, MonthKey, Theme};

pub use rest::PostgrestClient;
pub use supabase::SupabaseRemote;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {message}")]
    Api { status: StatusCode, message: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Remote persistence strategy.
///
/// Reads return `Ok(None)` when there is nothing to ask (no backend, no
/// session). Writes are skipped, not failed, when no owner can be resolved.
pub trait RemoteStore: Send + Sync + 'static {
    fn is_configured(&self) -> bool;

    /// Activities of the signed-in user, oldest first.
    fn fetch_activities(&self) -> impl Future<Output = RemoteResult<Option<Vec<Activity>>>> + Send;

    fn fetch_grid_data(
        &self,
        month: MonthKey,
    ) -> impl Future<Output = RemoteResult<Option<MonthGrid>>> + Send;

    fn fetch_all_grid_data(&self) -> impl Future<Output = RemoteResult<Option<GridData>>> + Send;

    fn upsert_activities(
        &self,
        user_id: &str,
        activities: &[Activity],
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    fn upsert_grid_data(
        &self,
        user_id: &str,
        grid: &GridData,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    fn get_theme(&self, user_id: &str) -> impl Future<Output = RemoteResult<Option<Theme>>> + Send;

    fn set_theme(&self, user_id: &str, theme: Theme)
        -> impl Future<Output = RemoteResult<()>> + Send;
}

/// Local-only strategy: nothing is ever fetched or sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteStore for NoRemote {
    fn is_configured(&self) -> bool {
        false
    }

    async fn fetch_activities(&self) -> RemoteResult<Option<Vec<Activity>>> {
        Ok(None)
    }

    async fn fetch_grid_data(&self, _month: MonthKey) -> RemoteResult<Option<MonthGrid>> {
        Ok(None)
    }

    async fn fetch_all_grid_data(&self) -> RemoteResult<Option<GridData>> {
        Ok(None)
    }

    async fn upsert_activities(&self, _user_id: &str, _activities: &[Activity]) -> RemoteResult<()> {
        Ok(())
    }

    async fn upsert_grid_data(&self, _user_id: &str, _grid: &GridData) -> RemoteResult<()> {
        Ok(())
    }

    async fn get_theme(&self, _user_id: &str) -> RemoteResult<Option<Theme>> {
        Ok(None)
    }

    async fn set_theme(&self, _user_id: &str, _theme: Theme) -> RemoteResult<()> {
        Ok(())
    }
}
