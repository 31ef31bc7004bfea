//! Uploaded File Tools
//!
//! List, search and read the files uploaded for the running agent. Every call
//! takes the user and agent from the run context and checks ownership before
//! touching storage.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use agent_core::{
    tool::{ParameterSchema, RunContext},
    AgentError, AuthorizationCheck, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema,
};

use crate::documents::{format_file_size, pdf, DocumentStore, FileRecord};
use crate::error::ToolsError;

/// Shared collaborators for the file tools
#[derive(Clone)]
pub struct FileAccess {
    store: Arc<dyn DocumentStore>,
    access: Arc<dyn AuthorizationCheck>,
}

impl FileAccess {
    pub fn new(store: Arc<dyn DocumentStore>, access: Arc<dyn AuthorizationCheck>) -> Self {
        Self { store, access }
    }

    async fn authorize(&self, user_id: &str, agent_id: &str) -> CoreResult<()> {
        if self.access.is_authorized(user_id, agent_id).await? {
            Ok(())
        } else {
            tracing::warn!(user_id, agent_id, "File access denied");
            Err(AgentError::Unauthorized("not authorized to access files for this agent".into()))
        }
    }

    /// Authorized listing for the run's agent
    async fn agent_files(&self, ctx: &RunContext) -> CoreResult<Vec<FileRecord>> {
        let (Some(user_id), Some(agent_id)) = (ctx.user_id.as_deref(), ctx.agent_id.as_deref()) else {
            return Err(AgentError::ToolValidation("user_id and agent_id are required".into()));
        };
        self.authorize(user_id, agent_id).await?;
        Ok(self.store.list(agent_id).await?)
    }
}

fn file_summary(record: &FileRecord) -> Value {
    json!({
        "id": record.id,
        "name": record.filename,
        "size": format_file_size(record.size_bytes),
        "type": record.mime_type,
        "uploaded_at": record.uploaded_at,
    })
}

/// `list_uploaded_files`
pub struct ListFilesTool {
    files: FileAccess,
}

impl ListFilesTool {
    pub fn new(files: FileAccess) -> Self {
        Self { files }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_uploaded_files".into(),
            description: "Returns the files that have been uploaded for this agent (id, name, size, type, upload time), newest first.".into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _call: &ToolCall, ctx: &RunContext) -> CoreResult<ToolResult> {
        let records = self.files.agent_files(ctx).await?;
        if records.is_empty() {
            return Ok(ToolResult::success("list_uploaded_files", "No files found for this agent"));
        }
        let listing: Vec<Value> = records.iter().map(file_summary).collect();
        Ok(ToolResult::json("list_uploaded_files", &Value::Array(listing)))
    }
}

/// `search_files`: case-insensitive match on file name or type
pub struct SearchFilesTool {
    files: FileAccess,
}

impl SearchFilesTool {
    pub fn new(files: FileAccess) -> Self {
        Self { files }
    }
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_files".into(),
            description: "Searches this agent's uploaded files by name or type.".into(),
            parameters: vec![ParameterSchema::required("query", "string", "Text to look for in file names or types")],
        }
    }

    async fn execute(&self, call: &ToolCall, ctx: &RunContext) -> CoreResult<ToolResult> {
        let query = call.string("query")?.trim().to_lowercase();
        if query.is_empty() {
            return Err(AgentError::ToolValidation("Missing query parameter".into()));
        }

        let matched: Vec<Value> = self
            .files
            .agent_files(ctx)
            .await?
            .iter()
            .filter(|r| r.filename.to_lowercase().contains(&query) || r.mime_type.to_lowercase().contains(&query))
            .map(file_summary)
            .collect();

        if matched.is_empty() {
            return Ok(ToolResult::success("search_files", format!("No files found matching '{}'", query)));
        }
        Ok(ToolResult::json("search_files", &Value::Array(matched)))
    }
}

/// `get_file_content`: text and JSON verbatim, CSV as JSON records, PDF page by page
pub struct FileContentTool {
    files: FileAccess,
}

impl FileContentTool {
    pub fn new(files: FileAccess) -> Self {
        Self { files }
    }
}

#[async_trait]
impl Tool for FileContentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_file_content".into(),
            description: "Retrieves the content of an uploaded file. Text, JSON, CSV and PDF files can be read directly.".into(),
            parameters: vec![ParameterSchema::required("file_id", "string", "The ID of the file to retrieve")],
        }
    }

    async fn execute(&self, call: &ToolCall, ctx: &RunContext) -> CoreResult<ToolResult> {
        let file_id = call.string("file_id")?;
        let user_id = ctx
            .user_id
            .as_deref()
            .ok_or_else(|| AgentError::ToolValidation("user_id is required".into()))?;

        let record = self
            .files
            .store
            .get(file_id)
            .await?
            .ok_or_else(|| ToolsError::FileNotFound(file_id.to_string()))?;
        self.files.authorize(user_id, &record.agent_id).await?;

        let mime = record.mime_type.to_lowercase();
        let output = if mime.contains("text/csv") {
            let bytes = self.files.store.read(&record.id).await?;
            let records = csv_to_records(&String::from_utf8_lossy(&bytes))?;
            format!("CSV File: {}\n\n{}", record.filename, Value::Array(records))
        } else if mime.contains("application/pdf") {
            let bytes = self.files.store.read(&record.id).await?;
            let pages = pdf::extract_pages_blocking(bytes).await?;
            pdf::format_pages(&record.filename, &pages)
        } else if mime.starts_with("text/") || mime.contains("application/json") {
            let bytes = self.files.store.read(&record.id).await?;
            format!("File: {}\n\n{}", record.filename, String::from_utf8_lossy(&bytes))
        } else {
            format!(
                "File available: {} (ID: {})\nFile type: {}\nThis file cannot be read directly. Please use external tools to process this file type.",
                record.filename, record.id, record.mime_type
            )
        };

        Ok(ToolResult::success("get_file_content", output))
    }
}

/// Parse CSV with a header row into JSON objects. Numeric cells become
/// numbers, empty cells become null.
fn csv_to_records(text: &str) -> Result<Vec<Value>, ToolsError> {
    let mut rows = parse_csv(text)?.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    rows.enumerate()
        .map(|(i, row)| {
            if row.len() != header.len() {
                return Err(ToolsError::Csv(format!(
                    "row {} has {} fields, expected {}",
                    i + 2,
                    row.len(),
                    header.len()
                )));
            }
            let object: Map<String, Value> = header.iter().cloned().zip(row.into_iter().map(csv_cell)).collect();
            Ok(Value::Object(object))
        })
        .collect()
}

fn csv_cell(raw: String) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return json!(int);
    }
    match trimmed.parse::<f64>() {
        Ok(float) if float.is_finite() => json!(float),
        _ => Value::String(raw),
    }
}

/// RFC 4180 records: quoted fields may hold commas, newlines and `""` escapes
fn parse_csv(text: &str) -> Result<Vec<Vec<String>>, ToolsError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ToolsError::Csv("unterminated quoted field".into()));
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows.retain(|r| !(r.len() == 1 && r[0].trim().is_empty()));
    Ok(rows)
}
