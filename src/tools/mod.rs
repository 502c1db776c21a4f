//! Tool system
//!
//! Tools give the model shell execution, file manipulation, and screen
//! capture. Each tool carries its own safety policy, configured once at
//! construction and immutable afterwards.

mod error;
mod policy;
mod registry;
mod traits;

pub mod builtin;

pub use error::ToolError;
pub use policy::{CommandPolicy, PathPolicy};
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolResult};
