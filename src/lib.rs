pub mod config;
pub mod error;
pub mod process;

pub use config::Settings;
pub use error::{MergeError, Result};
pub use process::{run, RunSummary};
