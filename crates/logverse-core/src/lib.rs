//! logverse-core - Core library for LogVerse
//!
//! Hour-by-hour activity logging: the models, the session store, and the
//! local/remote persistence that keeps a user's log in sync. Used by the
//! `logverse` command-line client.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod local;
pub mod models;
pub mod remote;
pub mod session;
pub mod state;
pub mod storage;
pub mod util;

pub use error::{Error, Result};
pub use models::{Activity, ActivityId, GridData, MonthKey, Theme};
pub use state::ActivityLog;
pub use storage::StorageFacade;
