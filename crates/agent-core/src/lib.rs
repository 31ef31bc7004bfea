//! # agent-core
//!
//! Conversation engine with provider-agnostic chat models, categorized tools,
//! token-budgeted history windows, and step-by-step answer traces.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      ConversationEngine                           │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────────┐  │
//! │  │   Context   │  │  Reasoning  │  │  ModelProvider           │  │
//! │  │   Budget    │──│    Loop     │──│  (ProviderAdapter)       │  │
//! │  └─────────────┘  └──────┬──────┘  └──────────────────────────┘  │
//! │         ▲                │                                        │
//! │  ┌──────┴──────┐  ┌──────┴──────┐  ┌──────────────────────────┐  │
//! │  │HistoryStore │  │ToolRegistry │  │  Response Parser         │  │
//! │  └─────────────┘  └─────────────┘  └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ProviderAdapter` trait enables swapping between Anthropic, OpenAI,
//! Google, Ollama, or any other vendor without changing agent logic.

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod history;
pub mod message;
pub mod mock;
pub mod model;
pub mod parser;
pub mod provider;
pub mod reasoning;
pub mod tool;
pub mod trace;

pub use config::{Credentials, EngineConfig};
pub use context::ContextBudgetAssembler;
pub use engine::{AgentRequest, AskResponse, ConversationEngine};
pub use error::{AgentError, Result};
pub use history::{AuthorizationCheck, HistoryStore, MemoryHistoryStore};
pub use message::{AgentResponse, ConversationStep, Message, Role, StepOutput};
pub use model::{ModelConfig, ModelProvider};
pub use parser::parse_trace;
pub use provider::{ChatModel, ChatRequest, Completion, GenerationOptions, ModelInfo, ProviderAdapter};
pub use reasoning::{Agent, AgentConfig};
pub use tool::{RunContext, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema, ToolSet};
pub use trace::TraceMessage;
