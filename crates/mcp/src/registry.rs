//! Exact-name tool registry.
//!
//! Each [`ToolCategory`] owns a set of tool names; the registry indexes them
//! once at startup and rejects duplicates, so every call resolves to exactly
//! one handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde_json::Value;
use thiserror::Error;
use tiendanube_client::StoreApi;

use crate::error::{Domain, ToolError};

#[derive(Clone, Debug)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Arc<JsonObject>,
}

impl ToolDefinition {
    /// Describes a tool whose arguments deserialize into `T`.
    pub fn new<T: JsonSchema>(name: &'static str, description: &'static str) -> Self {
        Self { name, description, input_schema: Arc::new(input_schema::<T>()) }
    }

    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name, self.description, self.input_schema.clone())
    }
}

/// JSON schema of `T` as an MCP `inputSchema` object.
pub fn input_schema<T: JsonSchema>() -> JsonObject {
    let schema = schemars::schema_for!(T);
    let mut object = match serde_json::to_value(&schema) {
        Ok(Value::Object(object)) => object,
        _ => JsonObject::new(),
    };
    object.remove("$schema");
    object.remove("title");
    object.entry("type").or_insert_with(|| Value::String("object".to_string()));
    object.entry("properties").or_insert_with(|| Value::Object(JsonObject::new()));
    object
}

/// A family of tools sharing a REST resource and an error envelope type.
#[async_trait]
pub trait ToolCategory: Send + Sync {
    fn category_name(&self) -> &'static str;

    fn domain(&self) -> Domain;

    fn definitions(&self) -> Vec<ToolDefinition>;

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool `{name}` is registered by both `{first}` and `{second}`")]
    DuplicateTool { name: &'static str, first: &'static str, second: &'static str },
}

/// Result of a registered tool call.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolReply {
    pub payload: Value,
    pub is_error: bool,
}

pub struct ToolRegistry {
    categories: Vec<Box<dyn ToolCategory>>,
    definitions: Vec<(usize, ToolDefinition)>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    pub fn new(categories: Vec<Box<dyn ToolCategory>>) -> Result<Self, RegistryError> {
        let mut definitions = Vec::new();
        let mut index: HashMap<&'static str, usize> = HashMap::new();

        for (position, category) in categories.iter().enumerate() {
            for definition in category.definitions() {
                if let Some(existing) = index.get(definition.name) {
                    return Err(RegistryError::DuplicateTool {
                        name: definition.name,
                        first: categories[*existing].category_name(),
                        second: category.category_name(),
                    });
                }
                index.insert(definition.name, definitions.len());
                definitions.push((position, definition));
            }
        }

        Ok(Self { categories, definitions, index })
    }

    /// Registry with every built-in Tienda Nube tool category.
    pub fn builtin() -> Result<Self, RegistryError> {
        Self::new(crate::tools::all_categories())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.definitions.iter().map(|(_, definition)| definition)
    }

    /// `(category, definitions)` pairs in registration order.
    pub fn by_category(&self) -> Vec<(&'static str, Vec<&ToolDefinition>)> {
        self.categories
            .iter()
            .enumerate()
            .map(|(position, category)| {
                let tools = self
                    .definitions
                    .iter()
                    .filter(|(owner, _)| *owner == position)
                    .map(|(_, definition)| definition)
                    .collect();
                (category.category_name(), tools)
            })
            .collect()
    }

    pub fn tools(&self) -> Vec<Tool> {
        self.definitions().map(ToolDefinition::to_tool).collect()
    }

    /// Runs a tool. Failures inside the tool become envelopes; only an
    /// unregistered name is an error.
    pub async fn dispatch(
        &self,
        name: &str,
        args: Value,
        api: &dyn StoreApi,
    ) -> Result<ToolReply, ToolError> {
        let slot = self.index.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let (owner, _) = &self.definitions[*slot];
        let category = &self.categories[*owner];

        match category.call(name, args, api).await {
            Ok(payload) => Ok(ToolReply { payload, is_error: false }),
            Err(ToolError::UnknownTool(_)) => Err(ToolError::UnknownTool(name.to_string())),
            Err(error) => {
                tracing::warn!(
                    event_name = "tool.call.failed",
                    tool = name,
                    category = category.category_name(),
                    error_kind = %error.kind(),
                    error = %error,
                    "tool call failed"
                );
                Ok(ToolReply { payload: error.envelope(category.domain(), name), is_error: true })
            }
        }
    }
}
