//! Domain types shared by storage, maintenance jobs and the CLI.

pub mod audit;
pub mod visit;
pub mod visitor;

pub use audit::{AuditRecord, AuditStatus, NewAuditRecord};
pub use visit::{Dependent, NewDependent, NewVisit, Visit, VisitHistoryRow, VisitId, VisitQuery};
pub use visitor::{NewVisitor, Visitor, VisitorId};
