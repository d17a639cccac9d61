//! SQL query modules. Each function takes a borrowed `Connection` and maps
//! driver errors through `connection::sqlite_err`.

pub mod audit;
pub mod cleanup;
pub mod visitors;
pub mod visits;
