//! Dialer Connectivity Funnel
//!
//! Turns one dialer export (one row per lead per attempt) into the
//! connectivity dashboard for a single campaign: first-attempt connect rate,
//! second-attempt recovery rate on first-attempt non-connects, and the spread
//! of still-unresolved leads across attempt buckets.
//!
//! # Architecture
//!
//! - **I/O**: spreadsheet, CSV/TSV and Parquet uploads into a `RawTable`
//! - **Schema**: column mappings for the supported export layouts
//! - **Pipeline**: validate, normalize, filter by campaign, aggregate
//! - **Session**: shared-secret gate and per-session upload snapshot
//! - **Report**: terminal dashboard and JSON rendering
//!
//! # Usage
//!
//! ```no_run
//! use dialer_funnel::{io, run_pipeline, SchemaPreset};
//!
//! fn main() -> anyhow::Result<()> {
//!     let table = io::load_table("dialer.xlsx".as_ref())?;
//!     let mapping = SchemaPreset::Auto.resolve(&table);
//!     let report = run_pipeline(&table, mapping, None)?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod schema;
pub mod session;

pub use config::{Config, OutputFormat};
pub use error::FunnelError;
pub use io::{RawTable, Upload};
pub use pipeline::{run_pipeline, ConnectivityReport, Dataset};
pub use schema::{SchemaMapping, SchemaPreset};
pub use session::{AccessGate, Session};
