// Core module - Application lifecycle, handlers and hooks
pub mod app;
pub mod handler;
pub mod hooks;
pub mod output;

pub use app::{App, AppMeta, ExtensionFn};
pub use handler::{HandlerRegistry, HandlerType};
pub use hooks::{Hook, HookFn, HookRegistry};
pub use output::{OutputHandler, OutputSink, SharedBuffer};
