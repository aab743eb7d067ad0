//! Terminal shell over [`crate::core::LedgerStore`].

pub mod context;
pub mod io;
pub mod output;
pub mod render;
pub mod shell;

pub use context::{CliError, CliMode, CommandError, ShellContext};
pub use shell::run_cli;
