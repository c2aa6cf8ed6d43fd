//! CLI command implementations.

mod ask;
mod build;
mod config;
mod index;
mod ingest;
mod list;
mod search;
mod upsert;

pub use ask::run_ask;
pub use build::run_build;
pub use config::run_config;
pub use index::run_index;
pub use ingest::run_ingest;
pub use list::run_list;
pub use search::run_search;
pub use upsert::run_upsert;
