pub mod cli;
pub mod load_config;
pub mod output;

pub use cli::{init_tracing, run, run_in, Cli, RunSummary};
