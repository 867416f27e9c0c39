//! Declared tools the model may call

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ToolError;

/// Name, description and schemas of a callable capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_description: String,
}

impl ToolDefinition {
    /// OpenAI `tools[]` entry; the output description is folded into the text
    #[must_use]
    pub fn to_openai_tool_json(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": format!("{} Output: {}", self.description, self.output_description),
                "parameters": self.input_schema,
            }
        })
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, arguments: Value) -> Result<Value, ToolError>;
}

/// Lookup table from tool name to implementation
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.retain(|t| t.definition().name != name);
        self.tools.push(tool);
    }

    #[must_use]
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run a call, turning every failure into an error payload for the model
    pub async fn invoke(&self, call: &ToolCall) -> Value {
        match self.dispatch(call).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool call failed");
                json!({ "error": e.to_string() })
            }
        }
    }

    async fn dispatch(&self, call: &ToolCall) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition().name == call.name)
            .ok_or_else(|| ToolError::UnknownTool(call.name.clone()))?;

        debug!(tool = %call.name, arguments = %call.arguments, "Invoking tool");
        tool.call(call.arguments.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "Echo the arguments.".into(),
                input_schema: json!({"type": "object"}),
                output_description: "The same object.".into(),
            }
        }

        async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
            Ok(arguments)
        }
    }

    #[tokio::test]
    async fn test_invoke_known_tool() {
        let registry = ToolRegistry::new().with(Arc::new(Echo));
        let call = ToolCall {
            id: "call_1".into(),
            name: "echo".into(),
            arguments: json!({"x": 1}),
        };
        assert_eq!(registry.invoke(&call).await, json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_payload() {
        let registry = ToolRegistry::new().with(Arc::new(Echo));
        let call = ToolCall {
            id: "call_1".into(),
            name: "teleport".into(),
            arguments: json!({}),
        };
        let output = registry.invoke(&call).await;
        assert!(output["error"].as_str().unwrap().contains("teleport"));
    }

    #[test]
    fn test_register_replaces_same_name() {
        let registry = ToolRegistry::new().with(Arc::new(Echo)).with(Arc::new(Echo));
        assert_eq!(registry.definitions().len(), 1);
    }

    #[test]
    fn test_openai_tool_json() {
        let json = Echo.definition().to_openai_tool_json();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "echo");
        assert_eq!(
            json["function"]["description"],
            "Echo the arguments. Output: The same object."
        );
    }
}
