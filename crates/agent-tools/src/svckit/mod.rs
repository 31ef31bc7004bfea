//! Service Kit - Agent Tools
//!
//! Built-in tools that implement `agent_core::Tool`, one module per category.

mod files;
mod math;
mod time;
mod web_search;
mod wikipedia;

pub use files::{FileAccess, FileContentTool, ListFilesTool, SearchFilesTool};
pub use math::{MathOp, MathTool};
pub use time::{Clock, CurrentDateTool, CurrentTimeTool, FixedClock, SystemClock};
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaSearchTool;
