//! Atlas Server
//!
//! Refreshes a relational store of country records from an external data
//! provider and serves it through a paginated, filterable read API.
//!
//! # Modules
//!
//! - [`etl`]: the extract/transform/load pipeline, its policies and the
//!   refresh scheduler
//! - [`features`]: the HTTP API as vertical feature slices
//! - [`api`]: shared response envelopes
//! - [`config`]: environment-driven configuration

pub mod api;
pub mod config;
pub mod etl;
pub mod features;
