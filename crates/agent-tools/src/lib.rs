//! # agent-tools
//!
//! Built-in tool categories for the conversation engine.
//!
//! ```text
//! ┌──────────┬────────────────────────────────────────────────────────────┐
//! │ math     │ multiply, add, subtract, divide, power, square_root, ...   │
//! │ web      │ web_search                (SearchBackend: SerpAPI)         │
//! │ time     │ get_current_date, get_current_time          (Clock)        │
//! │ wiki     │ wikipedia_search          (MediaWiki API)                  │
//! │ files    │ list_uploaded_files, search_files, get_file_content        │
//! │          │                (DocumentStore + AuthorizationCheck)        │
//! └──────────┴────────────────────────────────────────────────────────────┘
//! ```

pub mod documents;
pub mod error;
pub mod search;
pub mod svckit;

use std::sync::Arc;

use agent_core::{AuthorizationCheck, Tool, ToolRegistry};

pub use error::{Result, ToolsError};

use documents::DocumentStore;
use search::{SearchBackend, WikipediaClient};
use svckit::{
    Clock, CurrentDateTool, CurrentTimeTool, FileAccess, FileContentTool, ListFilesTool, MathTool, SearchFilesTool,
    WebSearchTool, WikipediaSearchTool,
};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        CurrentDateTool, CurrentTimeTool, FileContentTool, ListFilesTool, MathTool, SearchFilesTool, WebSearchTool,
        WikipediaSearchTool,
    };
}

/// External collaborators the built-in tools run against
pub struct ToolBackends {
    /// `None` leaves `web_search` registered but reporting that search is not configured
    pub search: Option<Arc<dyn SearchBackend>>,
    pub wikipedia: Arc<WikipediaClient>,
    pub clock: Arc<dyn Clock>,
    pub documents: Arc<dyn DocumentStore>,
    pub access: Arc<dyn AuthorizationCheck>,
}

/// Registry with every built-in category
pub fn default_registry(backends: ToolBackends) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(
        "math",
        "Math Tools",
        "Mathematical operations and calculations",
        MathTool::all()
            .into_iter()
            .map(|t| Arc::new(t) as Arc<dyn Tool>)
            .collect(),
    );
    registry.register(
        "web",
        "Web Search",
        "Web search and information retrieval",
        vec![Arc::new(WebSearchTool::new(backends.search))],
    );
    registry.register(
        "time",
        "Time & Date",
        "Date and time related operations",
        vec![
            Arc::new(CurrentDateTool::new(backends.clock.clone())),
            Arc::new(CurrentTimeTool::new(backends.clock)),
        ],
    );
    registry.register(
        "wiki",
        "Wikipedia",
        "Wikipedia search and article retrieval",
        vec![Arc::new(WikipediaSearchTool::new(backends.wikipedia))],
    );

    let files = FileAccess::new(backends.documents, backends.access);
    registry.register(
        "files",
        "Files",
        "Uploaded file listing, search and retrieval",
        vec![
            Arc::new(ListFilesTool::new(files.clone())),
            Arc::new(SearchFilesTool::new(files.clone())),
            Arc::new(FileContentTool::new(files)),
        ],
    );

    registry
}
