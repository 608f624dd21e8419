//! Capabilities granted to the generative model.
//!
//! A [`Tool`] is a named function with a declared JSON-schema input that the
//! model may call mid-generation. A [`Toolbox`] collects the tools for one
//! invocation together with the built-in web-search switch.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::citation::ScholarClient;

/// The declaration sent to the model: name, purpose, and parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    /// OpenAPI-style object schema.
    pub parameters: Value,
}

/// A function the model may call.
#[async_trait]
pub trait Tool: Send + Sync {
    fn declaration(&self) -> FunctionDeclaration;

    /// Run the function with the model-supplied arguments. Failures are
    /// reported inside the returned payload; the model decides what to do
    /// with them.
    async fn call(&self, args: &Value) -> Value;
}

/// The capabilities granted to one model invocation.
#[derive(Clone, Default)]
pub struct Toolbox {
    pub web_search: bool,
    functions: Vec<Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant the model's built-in web search.
    pub fn with_web_search(mut self) -> Self {
        self.web_search = true;
        self
    }

    pub fn with_function(mut self, tool: Arc<dyn Tool>) -> Self {
        self.functions.push(tool);
        self
    }

    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.functions.iter().map(|t| t.declaration()).collect()
    }

    /// Route a call to the tool registered under `name`.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Value {
        match self.functions.iter().find(|t| t.declaration().name == name) {
            Some(tool) => tool.call(args).await,
            None => json!({ "error": format!("unknown function {name:?}") }),
        }
    }
}

/// Exposes [`ScholarClient::verify_paper_tool`] to the model.
pub struct CitationTool {
    scholar: ScholarClient,
}

impl CitationTool {
    pub const NAME: &'static str = "verify_paper_tool";

    pub fn new(scholar: ScholarClient) -> Self {
        Self { scholar }
    }
}

#[async_trait]
impl Tool for CitationTool {
    fn declaration(&self) -> FunctionDeclaration {
        FunctionDeclaration {
            name: Self::NAME.into(),
            description: "Verifies whether a research paper exists using the Semantic Scholar \
                          index. Use this when the text mentions a specific paper, author, or \
                          study year. Returns FOUND with bibliographic details, or NOT FOUND."
                .into(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The title, author name, or citation to search for."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: &Value) -> Value {
        match args.get("query").and_then(Value::as_str) {
            Some(query) => json!({ "result": self.scholar.verify_paper_tool(query).await }),
            None => json!({ "error": "missing required string argument 'query'" }),
        }
    }
}
