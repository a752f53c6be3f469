//! Utility modules for snowdrop-dev

pub mod dryrun;
pub mod errors;
pub mod logger;
pub mod progress;

// Re-export commonly used items
pub use errors::{SdError, display_error_and_exit, enhance_error};
pub use logger::{init_logging, log_info, log_warn};
