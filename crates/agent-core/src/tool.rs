//! Tool System
//!
//! Extensible tool framework for agent capabilities.
//! Tools are registered once at startup under a category and resolved into a
//! per-run [`ToolSet`] that the reasoning loop dispatches against.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        let arguments = match arguments {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Self {
            name: name.into(),
            arguments,
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Arguments as a JSON object, keys sorted
    pub fn arguments_object(&self) -> serde_json::Map<String, serde_json::Value> {
        let sorted: BTreeMap<_, _> = self.arguments.iter().collect();
        sorted
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn number(&self, key: &str) -> Result<f64> {
        let value = self.arguments.get(key).ok_or_else(|| {
            AgentError::ToolValidation(format!("Missing required parameter: {}", key))
        })?;
        let parsed = match value {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.ok_or_else(|| AgentError::ToolValidation(format!("Parameter '{}' must be a number", key)))
    }

    pub fn optional_number(&self, key: &str) -> Result<Option<f64>> {
        match self.arguments.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(_) => self.number(key).map(Some),
        }
    }

    pub fn string(&self, key: &str) -> Result<&str> {
        self.arguments
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::ToolValidation(format!("Missing required parameter: {}", key)))
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    pub id: Option<String>,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (success message or error)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            success: false,
            output: error.into(),
        }
    }

    /// Success carrying a JSON value rendered as text
    pub fn json(name: impl Into<String>, value: &serde_json::Value) -> Self {
        Self::success(name, value.to_string())
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, integer, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Default value if not provided
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl ParameterSchema {
    pub fn required(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &str, param_type: &str, description: &str, default: Option<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: false,
            default,
        }
    }
}

/// Tool definition schema (for LLM function calling)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// JSON Schema object describing the parameters, as vendors expect it
    pub fn input_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = serde_json::json!({
                "type": param.param_type,
                "description": param.description,
            });
            if param.param_type == "array" {
                prop["items"] = serde_json::json!({"type": "number"});
            }
            if let Some(default) = &param.default {
                prop["default"] = default.clone();
            }
            properties.insert(param.name.clone(), prop);
            if param.required {
                required.push(serde_json::Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Read-only identity of the run, handed to tools that authorize their own access
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub user_id: Option<String>,
    pub agent_id: Option<String>,
}

impl RunContext {
    pub fn new(user_id: Option<String>, agent_id: Option<String>) -> Self {
        Self { user_id, agent_id }
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolCall, ctx: &RunContext) -> Result<ToolResult>;

    /// Validate arguments before execution (optional)
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AgentError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Flat, name-unique set of tools enabled for one run
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut seen = HashSet::new();
        let tools = tools
            .into_iter()
            .filter(|t| seen.insert(t.schema().name))
            .collect();
        Self { tools }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.schema().name == name).cloned()
    }

    /// Execute a tool call. Every failure comes back as a failed result so one
    /// bad call never aborts the run.
    pub async fn execute(&self, call: &ToolCall, ctx: &RunContext) -> ToolResult {
        let outcome = match self.get(&call.name) {
            Some(tool) => match tool.validate(call) {
                Ok(()) => tool.execute(call, ctx).await,
                Err(e) => Err(e),
            },
            None => Err(AgentError::ToolNotFound(call.name.clone())),
        };

        match outcome {
            Ok(result) => ToolResult {
                name: call.name.clone(),
                id: call.id.clone(),
                ..result
            },
            Err(e) => {
                tracing::warn!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::failure(call.name.clone(), format!("Error: {}", e)).with_id(call.id.clone())
            }
        }
    }

    /// Get all tool schemas (for function calling)
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema().name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Generate a system prompt section describing tools, for models without native function calling
pub fn generate_prompt_section(schemas: &[ToolSchema]) -> String {
    let mut prompt = String::from("## Available Tools\n\n");
    prompt.push_str("You can use the following tools by responding with a JSON block:\n\n");
    prompt.push_str("```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n");

    for schema in schemas {
        prompt.push_str(&format!("### {}\n", schema.name));
        prompt.push_str(&format!("{}\n", schema.description));

        if !schema.parameters.is_empty() {
            prompt.push_str("**Parameters:**\n");
            for param in &schema.parameters {
                let required = if param.required { " (required)" } else { "" };
                prompt.push_str(&format!(
                    "- `{}` ({}){}: {}\n",
                    param.name, param.param_type, required, param.description
                ));
            }
        }
        prompt.push('\n');
    }

    prompt
}

struct ToolCategory {
    key: String,
    name: String,
    description: String,
    tools: Vec<Arc<dyn Tool>>,
}

/// Listing entry for one tool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Listing entry for one category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub name: String,
    pub description: String,
    pub tools: Vec<ToolInfo>,
}

/// Registry of tools grouped by category. Read-only once startup is done.
#[derive(Default)]
pub struct ToolRegistry {
    categories: Vec<ToolCategory>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register tools under a category; registering an existing key extends it.
    pub fn register(
        &mut self,
        category: impl Into<String>,
        display_name: impl Into<String>,
        description: impl Into<String>,
        tools: Vec<Arc<dyn Tool>>,
    ) {
        let key = category.into();
        if let Some(existing) = self.categories.iter_mut().find(|c| c.key == key) {
            existing.tools.extend(tools);
            return;
        }
        self.categories.push(ToolCategory {
            key,
            name: display_name.into(),
            description: description.into(),
            tools,
        });
    }

    /// Flatten the named categories into a tool set. `None` or an empty list
    /// selects everything; unknown names contribute nothing.
    pub fn resolve(&self, categories: Option<&[String]>) -> ToolSet {
        let selected = categories.filter(|c| !c.is_empty());
        let tools = self
            .categories
            .iter()
            .filter(|c| selected.is_none_or(|wanted| wanted.iter().any(|w| *w == c.key)))
            .flat_map(|c| c.tools.iter().cloned())
            .collect();
        ToolSet::new(tools)
    }

    /// Category listing for introspection endpoints
    pub fn describe(&self) -> BTreeMap<String, CategoryInfo> {
        self.categories
            .iter()
            .map(|c| {
                let tools = c
                    .tools
                    .iter()
                    .map(|t| {
                        let schema = t.schema();
                        ToolInfo {
                            name: schema.name,
                            description: schema.description,
                        }
                    })
                    .collect();
                (
                    c.key.clone(),
                    CategoryInfo {
                        name: c.name.clone(),
                        description: c.description.clone(),
                        tools,
                    },
                )
            })
            .collect()
    }

    pub fn category_keys(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.key.as_str()).collect()
    }

    /// Total registered tools across categories
    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Tool for Named {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.0.into(),
                description: format!("{} tool", self.0),
                parameters: vec![ParameterSchema::required("x", "number", "input")],
            }
        }

        async fn execute(&self, call: &ToolCall, _ctx: &RunContext) -> Result<ToolResult> {
            let x = call.number("x")?;
            if x < 0.0 {
                return Err(AgentError::ToolExecution("negative".into()));
            }
            Ok(ToolResult::success(self.0, format!("{}", x * 2.0)))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register("math", "Math Tools", "Math", vec![Arc::new(Named("add")), Arc::new(Named("multiply"))]);
        registry.register("time", "Time & Date", "Time", vec![Arc::new(Named("get_current_date"))]);
        registry.register("extra", "Extra", "Dup", vec![Arc::new(Named("add"))]);
        registry
    }

    #[test]
    fn test_resolve_by_category() {
        let set = registry().resolve(Some(&["math".to_string()]));
        assert_eq!(set.names(), vec!["add", "multiply"]);
    }

    #[test]
    fn test_resolve_all_without_duplicates() {
        let registry = registry();
        assert_eq!(registry.resolve(None).names(), vec!["add", "multiply", "get_current_date"]);
        assert_eq!(registry.resolve(Some(&[])).len(), 3);
    }

    #[test]
    fn test_resolve_unknown_category_is_empty() {
        let set = registry().resolve(Some(&["nope".to_string()]));
        assert!(set.is_empty());
    }

    #[test]
    fn test_describe() {
        let listing = registry().describe();
        let math = &listing["math"];
        assert_eq!(math.name, "Math Tools");
        assert_eq!(math.tools[1].name, "multiply");
        assert_eq!(math.tools[1].description, "multiply tool");
    }

    #[test]
    fn test_input_schema() {
        let schema = Named("add").schema().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["x"]["type"], "number");
        assert_eq!(schema["required"][0], "x");
    }

    #[tokio::test]
    async fn test_execute_isolates_failures() {
        let set = registry().resolve(None);
        let ctx = RunContext::default();

        let ok = set.execute(&ToolCall::new("add", serde_json::json!({"x": 2})).with_id("c1"), &ctx).await;
        assert!(ok.success);
        assert_eq!(ok.output, "4");
        assert_eq!(ok.id.as_deref(), Some("c1"));

        let missing = set.execute(&ToolCall::new("nope", serde_json::json!({})), &ctx).await;
        assert!(!missing.success);
        assert!(missing.output.contains("Tool not found: nope"));

        let invalid = set.execute(&ToolCall::new("add", serde_json::json!({})), &ctx).await;
        assert!(invalid.output.contains("Missing required parameter: x"));

        let failed = set.execute(&ToolCall::new("add", serde_json::json!({"x": -1})), &ctx).await;
        assert!(!failed.success);
        assert!(failed.output.contains("negative"));
    }
}
