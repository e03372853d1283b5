pub mod config;
pub mod error;
pub mod matcher;
pub mod policy;
pub mod record;

pub use config::{HttpLoggingConfig, WiretapConfig};
pub use error::WiretapError;
pub use matcher::{ExclusionRule, PathPattern};
pub use policy::{LoggingPolicy, LoggingPolicyBuilder, Verbosity};
pub use record::{Direction, HeaderList, HttpLogRecord, Origin};
