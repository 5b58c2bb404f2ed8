use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// One catalog entry.
///
/// `id` is assigned by the caller on create and never changes afterwards.
/// `length` and `genre_id` are nullable columns; `None` means the column is
/// NULL, never zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    pub title: String,
    pub rating: f64,
    pub awards: i32,
    #[serde(default)]
    pub release_date: String,
    pub length: Option<i32>,
    pub genre_id: Option<i32>,
}
