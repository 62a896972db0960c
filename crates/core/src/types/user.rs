//! Customer account record.

use serde::{Deserialize, Serialize};

/// A customer account as returned by the profile endpoint.
///
/// Different backend builds have exposed the primary key under different
/// names (`id`, `pk`, `user_id`, `uid`), so the id field accepts all of
/// them via serde aliases instead of duck-typed lookup at call sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Primary key. Absent on registration payloads.
    #[serde(default, alias = "pk", alias = "user_id", alias = "uid")]
    pub id: Option<super::UserId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    /// Date of birth, `YYYY-MM-DD`.
    #[serde(default)]
    pub dob: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
}
