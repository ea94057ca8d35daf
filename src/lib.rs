//! Filter-and-aggregate core for the customer service requests dashboard.
//!
//! Loader → filter → aggregate: a JSON dataset is loaded once into a
//! read-only [`Table`], narrowed by [`Criteria`], and summarised into the
//! tables the dashboard renders.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod map;
pub mod models;
pub mod options;
pub mod report;
pub mod session;

pub use aggregate::Granularity;
pub use config::Config;
pub use error::{ConfigError, LoadError};
pub use filter::{filter, Criteria, Selection};
pub use loader::{load, DatasetCache};
pub use models::{RequestRecord, Table};
pub use session::{AggregateSettings, Dashboard, DashboardView};
