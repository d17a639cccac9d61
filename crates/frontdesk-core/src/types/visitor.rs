//! Visitor profile.

use serde::{Deserialize, Serialize};

pub type VisitorId = i64;

/// An identity record. Deleted only by the retention cleanup job, and only
/// once it has no visits left and is not banned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: VisitorId,
    pub first_name: String,
    pub last_name: String,
    /// Reference to the stored photo. The photo bytes live outside the database.
    pub photo_path: Option<String>,
    pub is_banned: bool,
    pub created_at: String,
}

impl Visitor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVisitor {
    pub first_name: String,
    pub last_name: String,
    pub photo_path: Option<String>,
}
