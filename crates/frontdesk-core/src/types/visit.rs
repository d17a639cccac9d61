//! Visits and the dependents accompanying them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::visitor::VisitorId;

pub type VisitId = i64;

/// One sign-in/sign-out event. `exit_time` is `None` while the visitor is on site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub visitor_id: VisitorId,
    pub entry_time: String,
    pub exit_time: Option<String>,
    pub unit: String,
    pub person_visited: String,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub dependents: Vec<Dependent>,
}

impl Visit {
    pub fn is_active(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// A person accompanying a visitor on one specific visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    pub id: i64,
    pub visit_id: VisitId,
    pub full_name: String,
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDependent {
    pub full_name: String,
    pub age: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVisit {
    pub visitor_id: VisitorId,
    pub unit: String,
    pub person_visited: String,
    pub purpose: Option<String>,
    pub notes: Option<String>,
    pub dependents: Vec<NewDependent>,
}

/// A visit joined with the visitor it belongs to, as returned by history search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitHistoryRow {
    pub visit: Visit,
    pub first_name: String,
    pub last_name: String,
    pub is_banned: bool,
}

/// History search filter. Empty filter returns the newest visits.
#[derive(Debug, Clone, Default)]
pub struct VisitQuery {
    /// Case-insensitive fragment matched against first or last name.
    pub name: Option<String>,
    pub unit: Option<String>,
    /// Inclusive lower bound on entry time.
    pub entered_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on entry time.
    pub entered_before: Option<DateTime<Utc>>,
    /// Default: 100.
    pub limit: Option<u32>,
}

impl VisitQuery {
    pub fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(100)
    }
}
