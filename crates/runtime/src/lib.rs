//! Parley runtime: tool-calling orchestration over a chat model.
//!
//! The runtime is organized around these concepts:
//!
//! - **Normalizers** ([`normalize`]): turn free-form dates, city names and
//!   currency codes into canonical values.
//! - **Tools** ([`tools`]): schema-described capabilities held in a
//!   [`ToolRegistry`] and executed by a [`Dispatcher`] that writes one audit
//!   record per completed call.
//! - **Gateway** ([`gateway`]): sends conversations to a [`Backend`] and reads
//!   replies against the structured-output contract.
//! - **Assistant** ([`turn`]): runs one user turn, at most two model passes
//!   and one tool call.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use runtime::{Assistant, Dispatcher, ModelBackend, ModelSettings, TurnRequest};
//! use runtime::tools::builtin::{ToolSettings, default_registry};
//! use storage::AuditStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = default_registry(&ToolSettings::default())?;
//! let audit = Arc::new(AuditStore::open("function_calls.db")?);
//! let dispatcher = Dispatcher::new(Arc::new(registry), audit);
//! let backend = ModelBackend::from_settings(&ModelSettings::default())?;
//!
//! let assistant = Assistant::new(backend, dispatcher);
//! let outcome = assistant
//!     .handle_turn(&TurnRequest::new("demo", "Convert 500 INR to USD"))
//!     .await?;
//! println!("{}", outcome.response());
//! # Ok(())
//! # }
//! ```

mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod tools;
pub mod turn;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use gateway::{Gateway, Reply, extract_tool_call, parse_reply};
pub use model::{Backend, Message, ModelError, ModelRequest, ModelResponse, Role, ToolCallRequest};
pub use normalize::{InvalidInput, normalize_city, normalize_currency, normalize_date};
pub use providers::{ModelBackend, ModelSettings, Provider};
pub use tools::{ArgumentError, DispatchError, Dispatcher, Tool, ToolRegistry, ToolSpec};
pub use turn::{Assistant, TurnOutcome, TurnRequest};
