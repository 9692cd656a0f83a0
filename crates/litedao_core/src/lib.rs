//! Generic data-access helpers over SQLite.
//!
//! Two cooperating layers: trait-driven entity-to-table mapping with dynamic
//! CRUD SQL generation, and an XML-backed SQL template registry with
//! modification-time refresh.

pub mod db;
pub mod logging;
pub mod meta;
pub mod service;
pub mod sql;
pub mod tpl;

pub use logging::{default_log_level, init_logging, logging_status};
pub use meta::{camel_to_snake, Entity, FieldDef, MetaError, MetaResult, TableMeta};
pub use service::{DaoError, DaoResult, Page, PageRequest, SqlService};
pub use sql::{Clause, FieldValue, SqlSet};
pub use tpl::{
    Template, TemplateLoader, TemplateLoaderBuilder, TemplateRegistry, TplError, TplResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
