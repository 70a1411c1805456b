//! Runs one surface unit through lowering and rendering.
//!
//! Parsing and build orchestration belong to the caller; this crate ties the
//! lowering engine, the reference renderer, configuration discovery, dumps
//! and diagnostic reporting together.

mod config;
mod dump;
mod pipeline;

pub use config::{find_config_root, load_options, CONFIG_FILE};
pub use dump::{decl_summaries, format_line_map, DeclSummary};
pub use pipeline::{lower_source_unit, write_output, DriverError, LoweredUnit};
