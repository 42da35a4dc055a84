//! Supabase table backend: `activities`, `grid_cells`, `user_preferences`.

use serde::{Deserialize, Serialize};

use super::rest::{eq, not_in, PostgrestClient};
use super::{RemoteResult, RemoteStore};
use crate::auth::AuthSession;
use crate::config::RemoteConfig;
use crate::models::{
    Activity, ActivityId, CellKey, GridCell, GridData, MonthGrid, MonthKey, Theme,
};
use crate::session::SessionHandle;

const ACTIVITIES_TABLE: &str = "activities";
const GRID_CELLS_TABLE: &str = "grid_cells";
const PREFERENCES_TABLE: &str = "user_preferences";

#[derive(Debug, Serialize)]
struct ActivityRow<'a> {
    id: &'a str,
    user_id: &'a str,
    name: &'a str,
    color: &'a str,
}

#[derive(Debug, Deserialize)]
struct ActivityRecord {
    id: String,
    name: String,
    color: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GridCellRow {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    user_id: String,
    month_key: String,
    date_key: String,
    hour: String,
    activity_id: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl GridCellRow {
    fn from_cell(user_id: &str, month: MonthKey, key: CellKey, cell: &GridCell) -> Self {
        Self {
            user_id: user_id.to_string(),
            month_key: month.to_string(),
            date_key: key.date_key(),
            hour: key.hour.label(),
            activity_id: Some(cell.activity_id.to_string()),
            note: Some(cell.note.clone()),
        }
    }

    /// Parse a stored row; rows without an activity count as absent cells.
    fn into_cell(self) -> Option<(MonthKey, CellKey, GridCell)> {
        let activity_id = self.activity_id.filter(|id| !id.trim().is_empty())?;
        let month = match self.month_key.parse::<MonthKey>() {
            Ok(month) => month,
            Err(error) => {
                tracing::warn!("Skipping remote grid cell: {}", error);
                return None;
            }
        };
        let key = match format!("{}_{}", self.date_key, self.hour).parse::<CellKey>() {
            Ok(key) => key,
            Err(error) => {
                tracing::warn!("Skipping remote grid cell: {}", error);
                return None;
            }
        };
        Some((
            month,
            key,
            GridCell {
                activity_id: ActivityId::from(activity_id),
                note: self.note.unwrap_or_default(),
            },
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferenceRow {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    user_id: String,
    theme: String,
}

/// Remote store scoped to whoever holds the shared session.
#[derive(Clone)]
pub struct SupabaseRemote {
    rest: PostgrestClient,
    session: SessionHandle,
}

impl SupabaseRemote {
    pub fn new(config: &RemoteConfig, session: SessionHandle) -> RemoteResult<Self> {
        Ok(Self {
            rest: PostgrestClient::new(config)?,
            session,
        })
    }

    fn active_session(&self) -> Option<AuthSession> {
        self.session.current()
    }

    /// Session allowed to write on behalf of `user_id`.
    fn owner_session(&self, user_id: &str) -> Option<AuthSession> {
        match self.active_session() {
            Some(session) if session.user.id == user_id => Some(session),
            Some(_) => {
                tracing::warn!("Skipping remote write: session belongs to another user");
                None
            }
            None => {
                tracing::debug!("Skipping remote write: no authenticated user");
                None
            }
        }
    }

    async fn select_cells(
        &self,
        session: &AuthSession,
        month: Option<MonthKey>,
    ) -> RemoteResult<GridData> {
        let mut query = vec![
            ("select", "month_key,date_key,hour,activity_id,note".to_string()),
            ("user_id", eq(&session.user.id)),
        ];
        if let Some(month) = month {
            query.push(("month_key", eq(month)));
        }
        let rows: Vec<GridCellRow> = self
            .rest
            .select(GRID_CELLS_TABLE, &query, &session.access_token)
            .await?;

        let mut grid = GridData::new();
        for (month, key, cell) in rows.into_iter().filter_map(GridCellRow::into_cell) {
            grid.set_cell(month, key, cell);
        }
        Ok(grid)
    }
}

impl RemoteStore for SupabaseRemote {
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_activities(&self) -> RemoteResult<Option<Vec<Activity>>> {
        let Some(session) = self.active_session() else {
            return Ok(None);
        };
        let query = [
            ("select", "id,name,color".to_string()),
            ("user_id", eq(&session.user.id)),
            ("order", "created_at.asc,id.asc".to_string()),
        ];
        let records: Vec<ActivityRecord> = self
            .rest
            .select(ACTIVITIES_TABLE, &query, &session.access_token)
            .await?;

        Ok(Some(
            records
                .into_iter()
                .map(|record| Activity {
                    id: ActivityId::from(record.id),
                    name: record.name,
                    color: record.color,
                })
                .collect(),
        ))
    }

    async fn fetch_grid_data(&self, month: MonthKey) -> RemoteResult<Option<MonthGrid>> {
        let Some(session) = self.active_session() else {
            return Ok(None);
        };
        let grid = self.select_cells(&session, Some(month)).await?;
        Ok(Some(grid.month(month).cloned().unwrap_or_default()))
    }

    async fn fetch_all_grid_data(&self) -> RemoteResult<Option<GridData>> {
        let Some(session) = self.active_session() else {
            return Ok(None);
        };
        Ok(Some(self.select_cells(&session, None).await?))
    }

    /// Make the remote activity set equal to `activities`.
    async fn upsert_activities(&self, user_id: &str, activities: &[Activity]) -> RemoteResult<()> {
        let Some(session) = self.owner_session(user_id) else {
            return Ok(());
        };
        let rows: Vec<ActivityRow<'_>> = activities
            .iter()
            .map(|activity| ActivityRow {
                id: activity.id.as_str(),
                user_id,
                name: &activity.name,
                color: &activity.color,
            })
            .collect();
        self.rest
            .upsert(ACTIVITIES_TABLE, &rows, "user_id,id", &session.access_token)
            .await?;

        let mut stale = vec![("user_id", eq(user_id))];
        if !activities.is_empty() {
            stale.push((
                "id",
                not_in(activities.iter().map(|activity| activity.id.as_str())),
            ));
        }
        self.rest
            .delete(ACTIVITIES_TABLE, &stale, &session.access_token)
            .await?;

        tracing::debug!("Upserted {} remote activities", activities.len());
        Ok(())
    }

    /// Replace every month present in `grid`, so cleared cells disappear
    /// remotely as well.
    async fn upsert_grid_data(&self, user_id: &str, grid: &GridData) -> RemoteResult<()> {
        let Some(session) = self.owner_session(user_id) else {
            return Ok(());
        };
        for (month, cells) in grid.months() {
            let scope = [("user_id", eq(user_id)), ("month_key", eq(month))];
            self.rest
                .delete(GRID_CELLS_TABLE, &scope, &session.access_token)
                .await?;

            let rows: Vec<GridCellRow> = cells
                .iter()
                .map(|(key, cell)| GridCellRow::from_cell(user_id, *month, *key, cell))
                .collect();
            self.rest
                .upsert(
                    GRID_CELLS_TABLE,
                    &rows,
                    "user_id,month_key,date_key,hour",
                    &session.access_token,
                )
                .await?;
        }
        tracing::debug!("Upserted {} remote grid cells", grid.cell_count());
        Ok(())
    }

    async fn get_theme(&self, user_id: &str) -> RemoteResult<Option<Theme>> {
        let Some(session) = self.owner_session(user_id) else {
            return Ok(None);
        };
        let query = [("select", "theme".to_string()), ("user_id", eq(user_id))];
        let rows: Vec<PreferenceRow> = self
            .rest
            .select(PREFERENCES_TABLE, &query, &session.access_token)
            .await?;
        Ok(rows.into_iter().find_map(|row| row.theme.parse().ok()))
    }

    async fn set_theme(&self, user_id: &str, theme: Theme) -> RemoteResult<()> {
        let Some(session) = self.owner_session(user_id) else {
            return Ok(());
        };
        let row = PreferenceRow {
            user_id: user_id.to_string(),
            theme: theme.to_string(),
        };
        self.rest
            .upsert(PREFERENCES_TABLE, &[row], "user_id", &session.access_token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::AuthUser;
    use crate::models::Hour;

    fn config(server: &MockServer) -> RemoteConfig {
        RemoteConfig::resolve(Some(server.uri()), Some("anon".to_string()))
            .unwrap()
            .unwrap()
    }

    fn signed_in() -> SessionHandle {
        SessionHandle::with_session(AuthSession {
            access_token: "token-1".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: AuthUser {
                id: "user-1".to_string(),
                email: "ada@example.com".to_string(),
                created_at: None,
            },
        })
    }

    fn january() -> MonthKey {
        MonthKey::new(2025, 1).unwrap()
    }

    fn key(day: u32, hour: u8) -> CellKey {
        CellKey::new(
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            Hour::new(hour).unwrap(),
        )
    }

    #[tokio::test]
    async fn fetch_activities_orders_by_creation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/activities"))
            .and(query_param("user_id", "eq.user-1"))
            .and(query_param("order", "created_at.asc,id.asc"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer token-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": "a", "name": "Sleep", "color": "#9b59b6" },
                { "id": "b", "name": "Work", "color": "#3498db" }
            ])))
            .mount(&server)
            .await;

        let remote = SupabaseRemote::new(&config(&server), signed_in()).unwrap();
        let activities = remote.fetch_activities().await.unwrap().unwrap();

        let names: Vec<_> = activities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Sleep", "Work"]);
    }

    #[tokio::test]
    async fn reads_without_session_return_none() {
        let server = MockServer::start().await;
        let remote = SupabaseRemote::new(&config(&server), SessionHandle::new()).unwrap();

        assert!(remote.fetch_activities().await.unwrap().is_none());
        assert!(remote.fetch_all_grid_data().await.unwrap().is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_without_owner_are_skipped() {
        let server = MockServer::start().await;
        let remote = SupabaseRemote::new(&config(&server), SessionHandle::new()).unwrap();
        remote
            .upsert_activities("user-1", &crate::models::default_activities())
            .await
            .unwrap();
        remote.set_theme("user-1", Theme::Dark).await.unwrap();

        let other_user = SupabaseRemote::new(&config(&server), signed_in()).unwrap();
        other_user.set_theme("user-2", Theme::Dark).await.unwrap();

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_grid_data_builds_cells_for_month() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/grid_cells"))
            .and(query_param("month_key", "eq.2025-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "month_key": "2025-01", "date_key": "2025-01-05", "hour": "3pm", "activity_id": "2", "note": "standup" },
                { "month_key": "2025-01", "date_key": "2025-01-05", "hour": "4pm", "activity_id": null, "note": "" },
                { "month_key": "2025-01", "date_key": "bogus", "hour": "4pm", "activity_id": "2", "note": null }
            ])))
            .mount(&server)
            .await;

        let remote = SupabaseRemote::new(&config(&server), signed_in()).unwrap();
        let cells = remote.fetch_grid_data(january()).await.unwrap().unwrap();

        assert_eq!(cells.len(), 1);
        assert_eq!(
            cells.get(&key(5, 15)),
            Some(&GridCell {
                activity_id: ActivityId::from("2"),
                note: "standup".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn upsert_activities_replaces_remote_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/activities"))
            .and(query_param("on_conflict", "user_id,id"))
            .and(body_json(serde_json::json!([
                { "id": "1", "user_id": "user-1", "name": "Sleep", "color": "#9b59b6" }
            ])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/activities"))
            .and(query_param("user_id", "eq.user-1"))
            .and(query_param("id", "not.in.(\"1\")"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let remote = SupabaseRemote::new(&config(&server), signed_in()).unwrap();
        let sleep = crate::models::default_activities().remove(0);
        remote.upsert_activities("user-1", &[sleep]).await.unwrap();
    }

    #[tokio::test]
    async fn upsert_grid_data_rewrites_each_month() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/grid_cells"))
            .and(query_param("month_key", "eq.2025-01"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/grid_cells"))
            .and(body_json(serde_json::json!([{
                "user_id": "user-1",
                "month_key": "2025-01",
                "date_key": "2025-01-05",
                "hour": "12am",
                "activity_id": "1",
                "note": ""
            }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let mut grid = GridData::new();
        grid.set_cell(
            january(),
            key(5, 0),
            GridCell {
                activity_id: ActivityId::from("1"),
                note: String::new(),
            },
        );

        let remote = SupabaseRemote::new(&config(&server), signed_in()).unwrap();
        remote.upsert_grid_data("user-1", &grid).await.unwrap();
    }

    #[tokio::test]
    async fn server_errors_are_reported_not_panicked() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_preferences"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let remote = SupabaseRemote::new(&config(&server), signed_in()).unwrap();
        let error = remote.get_theme("user-1").await.unwrap_err();
        assert!(error.to_string().contains("unavailable (503)"));
    }

    #[tokio::test]
    async fn theme_roundtrips_through_preferences_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/user_preferences"))
            .and(query_param("user_id", "eq.user-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{ "theme": "dark" }])),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/user_preferences"))
            .and(body_json(serde_json::json!([{ "user_id": "user-1", "theme": "light" }])))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let remote = SupabaseRemote::new(&config(&server), signed_in()).unwrap();
        assert_eq!(remote.get_theme("user-1").await.unwrap(), Some(Theme::Dark));
        remote.set_theme("user-1", Theme::Light).await.unwrap();
    }
}
