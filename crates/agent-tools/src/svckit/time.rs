//! Date & Time Tools

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use agent_core::{tool::RunContext, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

/// Source of the current local time
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the process's local timezone
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// `get_current_date`: today as `YYYY-MM-DD`
pub struct CurrentDateTool {
    clock: Arc<dyn Clock>,
}

impl CurrentDateTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Tool for CurrentDateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_date".into(),
            description: "Returns the current date in YYYY-MM-DD format.".into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _call: &ToolCall, _ctx: &RunContext) -> CoreResult<ToolResult> {
        let today = self.clock.now().format("%Y-%m-%d").to_string();
        Ok(ToolResult::success("get_current_date", today))
    }
}

/// `get_current_time`: now as `HH:MM:SS`
pub struct CurrentTimeTool {
    clock: Arc<dyn Clock>,
}

impl CurrentTimeTool {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Tool for CurrentTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_current_time".into(),
            description: "Returns the current time in HH:MM:SS format.".into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _call: &ToolCall, _ctx: &RunContext) -> CoreResult<ToolResult> {
        let now = self.clock.now().format("%H:%M:%S").to_string();
        Ok(ToolResult::success("get_current_time", now))
    }
}
