// Library interface for the droplet SYN flood classifier
// The binary only adds CLI, logging setup and output formatting on top.

pub mod classifier;
pub mod clock;
pub mod config;
pub mod detector;
pub mod error;
pub mod packet;
pub mod replay;
pub mod state;
pub mod testing;
pub mod verdict;

pub use classifier::{Decision, Outcome, SynGuard};
pub use config::Config;
pub use error::{ConfigError, ParseError};
pub use state::{CoreTable, CounterState};
pub use verdict::Verdict;
