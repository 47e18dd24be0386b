pub mod cli_args;
pub mod formatter;
pub mod loader;

pub use cli_args::{CliArgs, Command};
pub use formatter::{OutputFormatter, TreeStats};
pub use loader::{DatasetItem, LoadError, Record};
