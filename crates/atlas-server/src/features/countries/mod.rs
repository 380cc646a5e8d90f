//! Countries feature slice
//!
//! Read API over the persisted countries dataset plus the on-demand ETL
//! trigger. Write access goes exclusively through the ETL pipeline; this
//! slice only queries.

pub mod queries;
pub mod routes;
pub mod types;

pub use routes::countries_routes;
