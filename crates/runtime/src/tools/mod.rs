//! Tool specs, the registry, the dispatcher and the built-in tools.

pub mod builtin;
mod dispatcher;
pub mod errors;
mod registry;
mod r#trait;
pub mod types;

pub use dispatcher::Dispatcher;
pub use errors::{ArgumentError, DispatchError};
pub use registry::ToolRegistry;
pub use r#trait::Tool;
pub use types::{ParamType, ParameterSpec, ToolArguments, ToolInvocation, ToolSpec};
