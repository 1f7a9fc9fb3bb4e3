//! jsonext Library
//!
//! JSON output rendering and JSON configuration loading for pluggable CLI
//! applications, together with the small application host they plug into.

pub mod cli;
pub mod core;
pub mod domain;
pub mod ext;
pub mod infrastructure;

pub use crate::core::app::{App, AppMeta};
pub use crate::core::handler::{HandlerRegistry, HandlerType};
pub use crate::core::hooks::Hook;
pub use crate::core::output::{OutputHandler, OutputSink, SharedBuffer};
pub use crate::domain::config::{ConfigDict, ConfigStore};
pub use crate::domain::error::{JsonExtError, JsonExtResult};
pub use crate::ext::json::{JsonConfigDecoder, JsonOutputHandler};
pub use crate::infrastructure::config::{ConfigDecoder, ConfigLoader};
