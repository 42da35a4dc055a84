//! Storage facade over the local store and the remote adapter.
//!
//! Reads prefer non-empty remote data and mirror it locally; writes always
//! land in the local store and are pushed to the remote on a best-effort
//! basis. Everything is scoped to the user currently held by the
//! [`SessionHandle`].

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::local::LocalStore;
use crate::models::{Activity, GridData, MonthGrid, MonthKey, Theme};
use crate::remote::{RemoteResult, RemoteStore};
use crate::session::SessionHandle;
use crate::Result;

/// A persisted value: where it lives locally and how remote and local
/// copies combine.
struct Resource<T> {
    key: &'static str,
    /// Empty remote values never override local ones.
    is_empty: fn(&T) -> bool,
    /// Combine the stored value with an incoming one.
    merge: fn(T, T) -> T,
}

fn replace<T>(_stored: T, incoming: T) -> T {
    incoming
}

fn merge_grid(mut stored: GridData, incoming: GridData) -> GridData {
    stored.merge_months(incoming);
    stored
}

const ACTIVITIES: Resource<Vec<Activity>> = Resource {
    key: "activities",
    is_empty: |activities| activities.is_empty(),
    merge: replace,
};

const GRID_DATA: Resource<GridData> = Resource {
    key: "gridData",
    is_empty: GridData::is_empty,
    merge: merge_grid,
};

const THEME: Resource<Theme> = Resource {
    key: "theme",
    is_empty: |_| false,
    merge: replace,
};

/// Unified persistence used by the application state.
pub struct StorageFacade<R: RemoteStore> {
    local: Arc<LocalStore>,
    remote: R,
    session: SessionHandle,
}

impl<R: RemoteStore> StorageFacade<R> {
    pub fn new(local: Arc<LocalStore>, remote: R, session: SessionHandle) -> Self {
        Self {
            local,
            remote,
            session,
        }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub const fn remote(&self) -> &R {
        &self.remote
    }

    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub async fn get_activities(&self) -> Vec<Activity> {
        self.read_through(&ACTIVITIES, self.remote.fetch_activities())
            .await
    }

    pub async fn save_activities(&self, activities: &[Activity]) -> Result<()> {
        let value = activities.to_vec();
        self.write_through(&ACTIVITIES, value, |user_id| async move {
            self.remote.upsert_activities(&user_id, activities).await
        })
        .await
    }

    /// Cells of one month.
    pub async fn get_grid_data(&self, month: MonthKey) -> MonthGrid {
        let fetch = async {
            let cells = self.remote.fetch_grid_data(month).await?;
            Ok(cells.map(|cells| {
                let mut grid = GridData::new();
                grid.insert_month(month, cells);
                grid
            }))
        };
        self.read_through(&GRID_DATA, fetch)
            .await
            .month(month)
            .cloned()
            .unwrap_or_default()
    }

    /// Every stored month. Remote months replace the same local months;
    /// months only known locally are kept.
    pub async fn get_all_grid_data(&self) -> GridData {
        self.read_through(&GRID_DATA, self.remote.fetch_all_grid_data())
            .await
    }

    /// Persist the months present in `grid`. Other stored months are left
    /// untouched.
    pub async fn save_grid_data(&self, grid: &GridData) -> Result<()> {
        self.write_through(&GRID_DATA, grid.clone(), |user_id| async move {
            self.remote.upsert_grid_data(&user_id, grid).await
        })
        .await
    }

    pub async fn get_theme(&self) -> Theme {
        let fetch = async {
            match self.session.user_id() {
                Some(user_id) => self.remote.get_theme(&user_id).await,
                None => Ok(None),
            }
        };
        self.read_through(&THEME, fetch).await
    }

    pub async fn save_theme(&self, theme: Theme) -> Result<()> {
        self.write_through(&THEME, theme, |user_id| async move {
            self.remote.set_theme(&user_id, theme).await
        })
        .await
    }

    async fn read_through<T, F>(&self, resource: &Resource<T>, fetch: F) -> T
    where
        T: Serialize + DeserializeOwned + Default,
        F: Future<Output = RemoteResult<Option<T>>>,
    {
        let Some(user_id) = self.session.user_id() else {
            tracing::debug!("No signed-in user; using default {}", resource.key);
            return T::default();
        };

        let stored = self.local.read::<T>(&user_id, resource.key);
        let remote = match fetch.await {
            Ok(Some(value)) if !(resource.is_empty)(&value) => Some(value),
            Ok(_) => None,
            Err(error) => {
                tracing::warn!("Remote read of {} failed: {}", resource.key, error);
                None
            }
        };

        let Some(remote) = remote else {
            return stored.unwrap_or_default();
        };
        let value = (resource.merge)(stored.unwrap_or_default(), remote);
        if let Err(error) = self.local.write(&user_id, resource.key, &value) {
            tracing::warn!("Failed to mirror remote {} locally: {}", resource.key, error);
        }
        value
    }

    async fn write_through<T, P, Fut>(&self, resource: &Resource<T>, value: T, push: P) -> Result<()>
    where
        T: Serialize + DeserializeOwned + Default,
        P: FnOnce(String) -> Fut,
        Fut: Future<Output = RemoteResult<()>>,
    {
        let Some(user_id) = self.session.user_id() else {
            tracing::warn!("No signed-in user; {} not saved", resource.key);
            return Ok(());
        };

        let stored = self.local.read::<T>(&user_id, resource.key).unwrap_or_default();
        let local = self
            .local
            .write(&user_id, resource.key, &(resource.merge)(stored, value));

        if self.remote.is_configured() {
            if let Err(error) = push(user_id).await {
                tracing::warn!("Remote save of {} failed: {}", resource.key, error);
            }
        }
        local
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::{AuthSession, AuthUser};
    use crate::models::{default_activities, ActivityId, CellKey, GridCell, Hour};
    use crate::remote::{NoRemote, RemoteError};

    /// Remote whose reads and writes can be scripted per test.
    #[derive(Default)]
    struct ScriptedRemote {
        failing: bool,
        activities: Option<Vec<Activity>>,
        grid: Option<GridData>,
        theme: Option<Theme>,
        pushed_activities: Mutex<Vec<Vec<Activity>>>,
    }

    impl ScriptedRemote {
        fn failing() -> Self {
            Self {
                failing: true,
                ..Self::default()
            }
        }

        fn check(&self) -> RemoteResult<()> {
            if self.failing {
                Err(RemoteError::InvalidPayload("backend unreachable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl RemoteStore for ScriptedRemote {
        fn is_configured(&self) -> bool {
            true
        }

        async fn fetch_activities(&self) -> RemoteResult<Option<Vec<Activity>>> {
            self.check()?;
            Ok(self.activities.clone())
        }

        async fn fetch_grid_data(&self, month: MonthKey) -> RemoteResult<Option<MonthGrid>> {
            self.check()?;
            Ok(self
                .grid
                .as_ref()
                .map(|grid| grid.month(month).cloned().unwrap_or_default()))
        }

        async fn fetch_all_grid_data(&self) -> RemoteResult<Option<GridData>> {
            self.check()?;
            Ok(self.grid.clone())
        }

        async fn upsert_activities(&self, _user_id: &str, activities: &[Activity]) -> RemoteResult<()> {
            self.check()?;
            self.pushed_activities
                .lock()
                .unwrap()
                .push(activities.to_vec());
            Ok(())
        }

        async fn upsert_grid_data(&self, _user_id: &str, _grid: &GridData) -> RemoteResult<()> {
            self.check()
        }

        async fn get_theme(&self, _user_id: &str) -> RemoteResult<Option<Theme>> {
            self.check()?;
            Ok(self.theme)
        }

        async fn set_theme(&self, _user_id: &str, _theme: Theme) -> RemoteResult<()> {
            self.check()
        }
    }

    fn session_for(user_id: &str) -> SessionHandle {
        SessionHandle::with_session(AuthSession {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: AuthUser {
                id: user_id.to_string(),
                email: format!("{user_id}@example.com"),
                created_at: None,
            },
        })
    }

    fn facade<R: RemoteStore>(remote: R, user_id: &str) -> StorageFacade<R> {
        StorageFacade::new(
            Arc::new(LocalStore::open_in_memory().unwrap()),
            remote,
            session_for(user_id),
        )
    }

    fn month(value: u32) -> MonthKey {
        MonthKey::new(2025, value).unwrap()
    }

    fn cell_key(month: u32, day: u32, hour: u8) -> CellKey {
        CellKey::new(
            NaiveDate::from_ymd_opt(2025, month, day).unwrap(),
            Hour::new(hour).unwrap(),
        )
    }

    fn tagged(activity: &str) -> GridCell {
        GridCell {
            activity_id: ActivityId::from(activity),
            note: String::new(),
        }
    }

    #[tokio::test]
    async fn saved_activities_survive_remote_failure() {
        let storage = facade(ScriptedRemote::failing(), "alice");
        let activities = default_activities();

        storage.save_activities(&activities).await.unwrap();

        assert_eq!(storage.get_activities().await, activities);
    }

    #[tokio::test]
    async fn failing_remote_read_falls_back_to_local() {
        let storage = facade(ScriptedRemote::failing(), "alice");
        let activities = vec![Activity::new("Reading", "#123456").unwrap()];
        storage
            .local()
            .write("alice", "activities", &activities)
            .unwrap();

        assert_eq!(storage.get_activities().await, activities);
    }

    #[tokio::test]
    async fn non_empty_remote_wins_and_is_mirrored() {
        let remote_list = vec![Activity::new("Remote", "#abcdef").unwrap()];
        let storage = facade(
            ScriptedRemote {
                activities: Some(remote_list.clone()),
                ..ScriptedRemote::default()
            },
            "alice",
        );
        storage
            .local()
            .write("alice", "activities", &default_activities())
            .unwrap();

        assert_eq!(storage.get_activities().await, remote_list);
        assert_eq!(
            storage.local().read::<Vec<Activity>>("alice", "activities"),
            Some(remote_list)
        );
    }

    #[tokio::test]
    async fn empty_remote_does_not_override_local() {
        let storage = facade(
            ScriptedRemote {
                activities: Some(Vec::new()),
                ..ScriptedRemote::default()
            },
            "alice",
        );
        storage.save_activities(&default_activities()).await.unwrap();

        assert_eq!(storage.get_activities().await, default_activities());
    }

    #[tokio::test]
    async fn remote_months_replace_local_months_only() {
        let mut remote_grid = GridData::new();
        remote_grid.set_cell(month(2), cell_key(2, 1, 9), tagged("2"));
        let storage = facade(
            ScriptedRemote {
                grid: Some(remote_grid),
                ..ScriptedRemote::default()
            },
            "alice",
        );

        let mut local_grid = GridData::new();
        local_grid.set_cell(month(1), cell_key(1, 3, 8), tagged("1"));
        local_grid.set_cell(month(2), cell_key(2, 5, 8), tagged("1"));
        storage.local().write("alice", "gridData", &local_grid).unwrap();

        let merged = storage.get_all_grid_data().await;

        assert_eq!(merged.cell(month(1), cell_key(1, 3, 8)), Some(&tagged("1")));
        assert_eq!(merged.cell(month(2), cell_key(2, 1, 9)), Some(&tagged("2")));
        assert_eq!(merged.cell(month(2), cell_key(2, 5, 8)), None);
    }

    #[tokio::test]
    async fn remote_month_wins_and_is_mirrored_locally() {
        let mut remote_grid = GridData::new();
        remote_grid.set_cell(month(3), cell_key(3, 2, 7), tagged("2"));
        let storage = facade(
            ScriptedRemote {
                grid: Some(remote_grid),
                ..ScriptedRemote::default()
            },
            "alice",
        );

        let mut local_grid = GridData::new();
        local_grid.set_cell(month(3), cell_key(3, 9, 7), tagged("1"));
        local_grid.set_cell(month(4), cell_key(4, 1, 6), tagged("1"));
        storage.local().write("alice", "gridData", &local_grid).unwrap();

        let march = storage.get_grid_data(month(3)).await;
        assert_eq!(march.len(), 1);
        assert_eq!(march.get(&cell_key(3, 2, 7)), Some(&tagged("2")));

        let mirrored: GridData = storage.local().read("alice", "gridData").unwrap();
        assert_eq!(mirrored.cell(month(3), cell_key(3, 2, 7)), Some(&tagged("2")));
        assert_eq!(mirrored.cell(month(3), cell_key(3, 9, 7)), None);
        assert_eq!(mirrored.cell(month(4), cell_key(4, 1, 6)), Some(&tagged("1")));
    }

    #[tokio::test]
    async fn empty_remote_month_falls_back_to_local() {
        let mut remote_grid = GridData::new();
        remote_grid.set_cell(month(5), cell_key(5, 1, 1), tagged("2"));
        let storage = facade(
            ScriptedRemote {
                grid: Some(remote_grid),
                ..ScriptedRemote::default()
            },
            "alice",
        );

        let mut local_grid = GridData::new();
        local_grid.set_cell(month(3), cell_key(3, 9, 7), tagged("1"));
        storage.local().write("alice", "gridData", &local_grid).unwrap();

        let march = storage.get_grid_data(month(3)).await;

        assert_eq!(march.get(&cell_key(3, 9, 7)), Some(&tagged("1")));
        let stored: GridData = storage.local().read("alice", "gridData").unwrap();
        assert_eq!(stored, local_grid);
    }

    #[tokio::test]
    async fn saving_one_month_keeps_other_months() {
        let storage = facade(NoRemote, "alice");
        let mut january = GridData::new();
        january.set_cell(month(1), cell_key(1, 3, 8), tagged("1"));
        storage.save_grid_data(&january).await.unwrap();

        let mut february = GridData::new();
        february.set_cell(month(2), cell_key(2, 4, 10), tagged("3"));
        storage.save_grid_data(&february).await.unwrap();

        let all = storage.get_all_grid_data().await;
        assert_eq!(all.cell_count(), 2);
        assert_eq!(
            storage.get_grid_data(month(2)).await.get(&cell_key(2, 4, 10)),
            Some(&tagged("3"))
        );
    }

    #[tokio::test]
    async fn users_never_see_each_others_data() {
        let local = Arc::new(LocalStore::open_in_memory().unwrap());
        let alice = StorageFacade::new(Arc::clone(&local), NoRemote, session_for("alice"));
        let bob = StorageFacade::new(Arc::clone(&local), NoRemote, session_for("bob"));

        alice.save_theme(Theme::Dark).await.unwrap();
        alice.save_activities(&default_activities()).await.unwrap();

        assert_eq!(bob.get_theme().await, Theme::Light);
        assert!(bob.get_activities().await.is_empty());
        assert_eq!(alice.get_theme().await, Theme::Dark);
    }

    #[tokio::test]
    async fn without_user_reads_default_and_writes_skip() {
        let local = Arc::new(LocalStore::open_in_memory().unwrap());
        let storage = StorageFacade::new(Arc::clone(&local), NoRemote, SessionHandle::new());

        storage.save_theme(Theme::Dark).await.unwrap();

        assert_eq!(storage.get_theme().await, Theme::Light);
        assert!(storage.get_all_grid_data().await.is_empty());
    }

    #[tokio::test]
    async fn saves_are_pushed_to_configured_remote() {
        let storage = facade(ScriptedRemote::default(), "alice");
        storage.save_activities(&default_activities()).await.unwrap();

        let pushed = storage.remote().pushed_activities.lock().unwrap().clone();
        assert_eq!(pushed, vec![default_activities()]);
    }

    #[tokio::test]
    async fn remote_theme_is_preferred() {
        let storage = facade(
            ScriptedRemote {
                theme: Some(Theme::Dark),
                ..ScriptedRemote::default()
            },
            "alice",
        );
        assert_eq!(storage.get_theme().await, Theme::Dark);
    }
}
