pub mod account;
pub mod config;
pub mod error;
pub mod helpers;
pub mod process;

pub use account::AccountTable;
pub use error::{ConfigError, ProcessError};
pub use process::{find_process, native_reader, processes, Process, ProcessReader};
