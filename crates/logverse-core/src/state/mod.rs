//! Application state: the in-memory activity log of the signed-in user.
//!
//! Mutations apply synchronously to memory and hand a snapshot to a single
//! background worker, so persistence happens in mutation order without
//! blocking the caller.

mod persistence;

use std::sync::Arc;

use crate::models::{
    default_activities, normalize_color, normalize_name, parse_date_key, Activity, ActivityId,
    CellKey, GridCell, GridData, Hour, MonthGrid, MonthKey, Theme,
};
use crate::remote::RemoteStore;
use crate::storage::StorageFacade;
use crate::{Error, Result};

pub use persistence::Snapshot;
use persistence::PersistenceQueue;

pub struct ActivityLog<R: RemoteStore> {
    activities: Vec<Activity>,
    grid: GridData,
    theme: Theme,
    storage: Arc<StorageFacade<R>>,
    queue: PersistenceQueue,
}

impl<R: RemoteStore> ActivityLog<R> {
    /// Load the current user's activities, grid and theme.
    ///
    /// A user without activities gets the default set, which is persisted
    /// right away.
    pub async fn load(storage: Arc<StorageFacade<R>>) -> Self {
        let mut activities = storage.get_activities().await;
        let grid = storage.get_all_grid_data().await;
        let theme = storage.get_theme().await;
        let queue = PersistenceQueue::spawn(Arc::clone(&storage));

        if activities.is_empty() {
            tracing::info!("No activities stored; seeding defaults");
            activities = default_activities();
            queue.enqueue(Snapshot::Activities(activities.clone()));
        }
        tracing::info!(
            "Loaded {} activities and {} grid cells",
            activities.len(),
            grid.cell_count()
        );

        Self {
            activities,
            grid,
            theme,
            storage,
            queue,
        }
    }

    pub fn storage(&self) -> &StorageFacade<R> {
        &self.storage
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn activity(&self, id: &str) -> Option<&Activity> {
        self.activities.iter().find(|activity| activity.id.as_str() == id)
    }

    pub const fn grid_data(&self) -> &GridData {
        &self.grid
    }

    pub fn month(&self, month: MonthKey) -> Option<&MonthGrid> {
        self.grid.month(month)
    }

    pub fn cell(&self, month: MonthKey, date_key: &str, hour: Hour) -> Option<&GridCell> {
        let date = parse_date_key(date_key).ok()?;
        self.grid.cell(month, CellKey::new(date, hour))
    }

    pub const fn theme(&self) -> Theme {
        self.theme
    }

    pub fn add_activity(&mut self, name: &str, color: &str) -> Result<ActivityId> {
        let activity = Activity::new(name, color)?;
        let id = activity.id.clone();
        tracing::debug!("Adding activity {} ({})", activity.name, id);
        self.activities.push(activity);
        self.persist_activities();
        Ok(id)
    }

    /// Rename and recolour an activity. Returns `false` when no activity
    /// has that id.
    pub fn update_activity(&mut self, id: &str, name: &str, color: &str) -> Result<bool> {
        let name = normalize_name(name)?;
        let color = normalize_color(color)?;
        let Some(activity) = self
            .activities
            .iter_mut()
            .find(|activity| activity.id.as_str() == id)
        else {
            return Ok(false);
        };
        activity.name = name;
        activity.color = color;
        self.persist_activities();
        Ok(true)
    }

    /// Delete an activity together with every cell tagged with it.
    pub fn delete_activity(&mut self, id: &str) -> bool {
        let before = self.activities.len();
        self.activities.retain(|activity| activity.id.as_str() != id);
        if self.activities.len() == before {
            return false;
        }
        self.persist_activities();

        let id = ActivityId::from(id);
        let touched: Vec<MonthKey> = self
            .grid
            .months()
            .filter(|(_, cells)| cells.values().any(|cell| cell.activity_id == id))
            .map(|(month, _)| *month)
            .collect();
        let removed = self.grid.remove_activity(&id);
        if removed > 0 {
            tracing::debug!("Removed {} cells tagged with {}", removed, id);
            self.persist_months(&touched);
        }
        true
    }

    /// Tag a cell, or clear it when `activity_id` is `None` or empty.
    pub fn update_cell(
        &mut self,
        month: MonthKey,
        date_key: &str,
        hour: Hour,
        activity_id: Option<&str>,
        note: &str,
    ) -> Result<()> {
        let date = parse_date_key(date_key)?;
        if !month.contains(date) {
            return Err(Error::InvalidInput(format!(
                "date {date_key} is not in month {month}"
            )));
        }
        let key = CellKey::new(date, hour);

        match activity_id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => {
                if self.activity(id).is_none() {
                    return Err(Error::InvalidInput(format!("unknown activity '{id}'")));
                }
                self.grid.set_cell(
                    month,
                    key,
                    GridCell {
                        activity_id: ActivityId::from(id),
                        note: note.to_string(),
                    },
                );
            }
            None => {
                self.grid.remove_cell(month, key);
            }
        }
        self.persist_months(&[month]);
        Ok(())
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.queue.enqueue(Snapshot::Theme(theme));
    }

    /// Wait for every queued write to finish.
    pub async fn flush(&self) {
        self.queue.flush().await;
    }

    /// Flush pending writes and stop the persistence worker.
    pub async fn close(mut self) {
        self.queue.close().await;
    }

    fn persist_activities(&self) {
        self.queue
            .enqueue(Snapshot::Activities(self.activities.clone()));
    }

    fn persist_months(&self, months: &[MonthKey]) {
        let mut snapshot = GridData::new();
        for month in months {
            snapshot.insert_month(*month, self.grid.month(*month).cloned().unwrap_or_default());
        }
        self.queue.enqueue(Snapshot::Grid(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::{AuthSession, AuthUser};
    use crate::local::LocalStore;
    use crate::remote::NoRemote;
    use crate::session::SessionHandle;

    fn storage() -> Arc<StorageFacade<NoRemote>> {
        let session = SessionHandle::with_session(AuthSession {
            access_token: "token".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: AuthUser {
                id: "alice".to_string(),
                email: "alice@example.com".to_string(),
                created_at: None,
            },
        });
        Arc::new(StorageFacade::new(
            Arc::new(LocalStore::open_in_memory().unwrap()),
            NoRemote,
            session,
        ))
    }

    fn january() -> MonthKey {
        MonthKey::new(2025, 1).unwrap()
    }

    fn february() -> MonthKey {
        MonthKey::new(2025, 2).unwrap()
    }

    fn hour(value: u8) -> Hour {
        Hour::new(value).unwrap()
    }

    #[tokio::test]
    async fn empty_state_loads_default_activities() {
        let storage = storage();
        let log = ActivityLog::load(Arc::clone(&storage)).await;

        let names: Vec<_> = log.activities().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Sleep", "Work", "Exercise", "Social", "Learning"]);

        log.close().await;
        assert_eq!(storage.get_activities().await, default_activities());
    }

    #[tokio::test]
    async fn deleting_activity_removes_its_cells_everywhere() {
        let storage = storage();
        let mut log = ActivityLog::load(Arc::clone(&storage)).await;

        log.update_cell(january(), "2025-01-05", hour(9), Some("2"), "standup")
            .unwrap();
        log.update_cell(february(), "2025-02-10", hour(14), Some("2"), "")
            .unwrap();
        log.update_cell(february(), "2025-02-10", hour(7), Some("3"), "run")
            .unwrap();

        assert!(log.delete_activity("2"));
        assert!(log.activity("2").is_none());
        assert_eq!(log.cell(january(), "2025-01-05", hour(9)), None);
        assert_eq!(log.cell(february(), "2025-02-10", hour(14)), None);
        assert!(log.cell(february(), "2025-02-10", hour(7)).is_some());

        log.close().await;
        let stored = storage.get_all_grid_data().await;
        assert_eq!(stored.cell_count(), 1);
        assert!(storage
            .get_activities()
            .await
            .iter()
            .all(|activity| activity.id.as_str() != "2"));
    }

    #[tokio::test]
    async fn deleting_unknown_activity_is_a_noop() {
        let mut log = ActivityLog::load(storage()).await;
        assert!(!log.delete_activity("missing"));
        assert_eq!(log.activities().len(), 5);
    }

    #[tokio::test]
    async fn clearing_a_cell_leaves_it_absent() {
        let storage = storage();
        let mut log = ActivityLog::load(Arc::clone(&storage)).await;

        log.update_cell(january(), "2025-01-05", hour(22), Some("1"), "early night")
            .unwrap();
        log.update_cell(january(), "2025-01-05", hour(22), None, "")
            .unwrap();
        assert_eq!(log.cell(january(), "2025-01-05", hour(22)), None);

        log.update_cell(january(), "2025-01-06", hour(22), Some("1"), "")
            .unwrap();
        log.update_cell(january(), "2025-01-06", hour(22), Some(""), "ignored")
            .unwrap();
        assert_eq!(log.cell(january(), "2025-01-06", hour(22)), None);

        log.flush().await;
        assert!(storage.get_grid_data(january()).await.is_empty());
    }

    #[tokio::test]
    async fn update_cell_rejects_bad_input() {
        let mut log = ActivityLog::load(storage()).await;

        assert!(log
            .update_cell(january(), "2025-02-01", hour(1), Some("1"), "")
            .is_err());
        assert!(log
            .update_cell(january(), "not-a-date", hour(1), Some("1"), "")
            .is_err());
        assert!(log
            .update_cell(january(), "2025-01-01", hour(1), Some("nope"), "")
            .is_err());
        assert!(log.grid_data().is_empty());
    }

    #[tokio::test]
    async fn toggling_theme_twice_restores_it() {
        let storage = storage();
        let mut log = ActivityLog::load(Arc::clone(&storage)).await;
        let original = log.theme();

        assert_eq!(log.toggle_theme(), original.toggled());
        assert_eq!(log.toggle_theme(), original);

        log.flush().await;
        assert_eq!(storage.get_theme().await, original);
    }

    #[tokio::test]
    async fn activities_are_validated_and_persisted() {
        let storage = storage();
        let mut log = ActivityLog::load(Arc::clone(&storage)).await;

        assert!(log.add_activity("   ", "#ffffff").is_err());
        assert!(log.add_activity("Reading", "blue").is_err());

        let id = log.add_activity("  Reading ", "#ABC").unwrap();
        assert_eq!(log.activity(id.as_str()).unwrap().name, "Reading");

        assert!(log
            .update_activity(id.as_str(), "Books", "#112233")
            .unwrap());
        assert!(!log.update_activity("missing", "Books", "#112233").unwrap());

        log.close().await;
        let stored = storage.get_activities().await;
        let books = stored.iter().find(|a| a.id == id).unwrap();
        assert_eq!(books.name, "Books");
        assert_eq!(books.color, "#112233");
    }

    #[tokio::test]
    async fn state_reloads_from_storage() {
        let storage = storage();
        let mut log = ActivityLog::load(Arc::clone(&storage)).await;
        log.update_cell(january(), "2025-01-31", hour(23), Some("4"), "party")
            .unwrap();
        log.set_theme(Theme::Dark);
        log.close().await;

        let reloaded = ActivityLog::load(storage).await;
        assert_eq!(reloaded.theme(), Theme::Dark);
        assert_eq!(
            reloaded
                .cell(january(), "2025-01-31", hour(23))
                .map(|cell| cell.note.as_str()),
            Some("party")
        );
        reloaded.close().await;
    }
}
