// Copyright (c) 2025-2026 Reagent Contributors
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::{json, Value};

use reagent_core::{Error, Result};

use crate::{Tool, ToolContext};

type Handler = Box<dyn Fn(&str, &ToolContext<'_>) -> Result<String> + Send + Sync>;

/// A tool backed by a plain closure, for embedders that want to declare
/// tools without writing a struct per tool.  Long-running or I/O-bound tools
/// should implement [`Tool`] directly instead.
pub struct FnTool {
    name: String,
    description: String,
    parameters: Value,
    handler: Handler,
}

impl FnTool {
    pub fn builder(name: impl Into<String>) -> FnToolBuilder {
        FnToolBuilder {
            name: name.into(),
            description: String::new(),
            parameters: json!({ "type": "object", "properties": {} }),
            handler: None,
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> Value {
        self.parameters.clone()
    }

    async fn execute(&self, args_json: &str, ctx: &ToolContext<'_>) -> Result<String> {
        (self.handler)(args_json, ctx)
    }
}

pub struct FnToolBuilder {
    name: String,
    description: String,
    parameters: Value,
    handler: Option<Handler>,
}

impl FnToolBuilder {
    pub fn description(mut self, d: impl Into<String>) -> Self {
        self.description = d.into();
        self
    }

    /// JSON Schema of the argument object.
    pub fn parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }

    pub fn handler(
        mut self,
        f: impl Fn(&str, &ToolContext<'_>) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Result<FnTool> {
        if self.name.is_empty() {
            return Err(Error::InvalidArg("tool name must be non-empty".into()));
        }
        let handler = self
            .handler
            .ok_or_else(|| Error::InvalidArg(format!("tool {:?} has no handler", self.name)))?;
        Ok(FnTool {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            handler,
        })
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> FnTool {
        FnTool::builder("calculator")
            .description("adds two numbers")
            .parameters(json!({
                "type": "object",
                "properties": {
                    "a": { "type": "number" },
                    "b": { "type": "number" }
                },
                "required": ["a", "b"]
            }))
            .handler(|args, _ctx| {
                let v: Value =
                    serde_json::from_str(args).map_err(|e| Error::Parse(e.to_string()))?;
                let sum = v["a"].as_f64().unwrap_or(0.0) + v["b"].as_f64().unwrap_or(0.0);
                Ok(json!({ "result": sum }).to_string())
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn handler_runs_with_args() {
        let tool = calculator();
        let out =
            tool.execute(r#"{"a":2,"b":3}"#, &ToolContext::default()).await.unwrap();
        let v: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["result"], 5.0);
    }

    #[tokio::test]
    async fn handler_error_propagates_as_result() {
        let tool = calculator();
        let err = tool.execute("not json", &ToolContext::default()).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn builder_requires_handler() {
        let result = FnTool::builder("x").build();
        assert!(result.is_err());
    }

    #[test]
    fn builder_requires_name() {
        let result = FnTool::builder("").handler(|_, _| Ok("{}".into())).build();
        assert!(result.is_err());
    }

    #[test]
    fn default_schema_is_empty_object() {
        let tool = FnTool::builder("t").handler(|_, _| Ok("{}".into())).build().unwrap();
        let schema = tool.parameters_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].as_object().unwrap().is_empty());
    }
}
