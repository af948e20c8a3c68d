#![forbid(unsafe_code)]

//! Core domain model and business logic for Newton Notes.
//!
//! This crate provides:
//! - Domain types (routines, exercises, sets, templates, analytics logs)
//! - The data store with its ordering rules and versioned on-disk schema
//! - The workout session manager and its rest countdown ticker
//! - JSON backup export and import
//! - Analytics queries, CSV export and the plate calculator

pub mod types;
pub mod error;
pub mod ordering;
pub mod store;
pub mod schema;
pub mod persist;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod units;
pub mod clock;
pub mod live;
pub mod session;
pub mod ticker;
pub mod backup;
pub mod analytics;
pub mod plates;
pub mod csv_export;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use store::DataStore;
pub use persist::{JsonFileSink, StoreSink};
pub use config::Config;
pub use units::{DistanceUnit, Theme, WeightUnit};
pub use clock::{Clock, ManualClock, SystemClock};
pub use live::{LiveSnapshot, LiveStatus, LoggingLiveStatus, NoopLiveStatus};
pub use session::{SessionManager, SessionPhase, SessionSnapshot, SetKey};
pub use ticker::SessionHandle;
pub use backup::{BackupDocument, ImportReport};
pub use analytics::TimeRange;
pub use plates::{calculate_plates, PlateCount};
