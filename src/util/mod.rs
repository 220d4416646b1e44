//! Utility functions shared by the CLI and the catalog client.
//!
//! - **URL validation**: the catalog API base URL must be https (or loopback http)
//! - **Text processing**: terminal-safe, width-aware rendering of remote strings
//! - **Prompts**: yes/no confirmation before destructive commands

mod prompt;
mod text;
mod url_validator;

pub use prompt::confirm;
pub use text::{display_width, fit_to_width, single_line, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_base_url, UrlValidationError};
