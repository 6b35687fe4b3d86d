use thiserror::Error;

use crate::category::CategoryId;
use crate::habit::HabitId;

pub type Result<T, E = HabitError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum HabitError {
    #[error("habit {0} not found")]
    HabitNotFound(HabitId),
    #[error("category {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("name must not be blank")]
    BlankName,
    #[error("weekday index {0} is out of range (expected 0-6)")]
    InvalidWeekday(u8),
    #[error("a habit must stay active on at least one day")]
    LastActiveDay,
    #[error("{year}-{month} is not a valid month")]
    InvalidMonth { year: i32, month: u32 },
    #[error("no {0} ids left above the largest stored id")]
    IdsExhausted(&'static str),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend failed: {0}")]
    Backend(String),
    #[error("failed to serialize `{key}`")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
