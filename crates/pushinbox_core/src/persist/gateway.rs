//! Persistence gateway contract.

use crate::db::DbError;
use crate::model::notification::NotificationRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PersistResult<T> = Result<T, PersistenceError>;

/// Load/save failure reported by a gateway.
#[derive(Debug)]
pub enum PersistenceError {
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
    Unavailable(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "snapshot serialization failed: {err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted notification data: {message}")
            }
            Self::Unavailable(message) => write!(f, "persistence unavailable: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Full-snapshot storage contract consumed by `NotificationStore`.
///
/// Gateways are moved onto the save worker thread after the initial load,
/// hence the `Send` bound.
pub trait PersistenceGateway: Send {
    /// Returns the last saved snapshot, newest-first.
    fn load(&mut self) -> PersistResult<Vec<NotificationRecord>>;
    /// Replaces the stored snapshot with `snapshot`.
    fn save(&mut self, snapshot: &[NotificationRecord]) -> PersistResult<()>;
}
