use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tiendanube_client::StoreApi;

use crate::args::{ensure_not_blank, ensure_positive, parse, query_from, to_body, PageArgs, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{fetch_page, or_success};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListMetafieldsArgs {
    /// Owner resource type, e.g. Product or Order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_resource: Option<String>,
    /// Owner resource ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
    /// Metafield key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Metafield namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(flatten)]
    pub paging: PageArgs,
}

impl Validate for ListMetafieldsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if let Some(owner_id) = self.owner_id {
            ensure_positive("owner_id", owner_id)?;
        }
        self.paging.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MetafieldIdArgs {
    /// Metafield ID
    pub metafield_id: u64,
}

impl Validate for MetafieldIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("metafield_id", self.metafield_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateMetafieldArgs {
    /// Owner resource type, e.g. Product or Order
    pub owner_resource: String,
    /// Owner resource ID
    pub owner_id: u64,
    /// Metafield key
    pub key: String,
    /// Value (string, number, boolean or null)
    pub value: Value,
    /// Metafield namespace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Value type hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
}

impl Validate for CreateMetafieldArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("owner_resource", &self.owner_resource)?;
        ensure_positive("owner_id", self.owner_id)?;
        ensure_not_blank("key", &self.key)?;
        ensure_scalar("value", &self.value)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateMetafieldArgs {
    /// Metafield ID
    pub metafield_id: u64,
    /// New value (string, number, boolean or null)
    pub value: Value,
}

impl Validate for UpdateMetafieldArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("metafield_id", self.metafield_id)?;
        ensure_scalar("value", &self.value)
    }
}

fn ensure_scalar(field: &str, value: &Value) -> Result<(), ToolError> {
    if matches!(value, Value::Array(_) | Value::Object(_)) {
        return Err(ToolError::invalid(format!(
            "{field} must be a string, number, boolean or null"
        )));
    }
    Ok(())
}

pub struct MetafieldTools;

#[async_trait]
impl ToolCategory for MetafieldTools {
    fn category_name(&self) -> &'static str {
        "metafields"
    }

    fn domain(&self) -> Domain {
        Domain::Metafield
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListMetafieldsArgs>(
                "tiendanube_list_metafields",
                "List metafields, filtered by owner, key or namespace.",
            ),
            ToolDefinition::new::<MetafieldIdArgs>(
                "tiendanube_get_metafield",
                "Get a metafield by ID.",
            ),
            ToolDefinition::new::<CreateMetafieldArgs>(
                "tiendanube_create_metafield",
                "Attach a metafield to a store resource.",
            ),
            ToolDefinition::new::<UpdateMetafieldArgs>(
                "tiendanube_update_metafield",
                "Change the value of a metafield.",
            ),
            ToolDefinition::new::<MetafieldIdArgs>(
                "tiendanube_delete_metafield",
                "Delete a metafield.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_metafields" => {
                let args: ListMetafieldsArgs = parse(args)?;
                fetch_page(api, "/metafields", query_from(&args), &args.paging).await
            }
            "tiendanube_get_metafield" => {
                let args: MetafieldIdArgs = parse(args)?;
                Ok(api.get(&format!("/metafields/{}", args.metafield_id), Vec::new()).await?)
            }
            "tiendanube_create_metafield" => {
                let args: CreateMetafieldArgs = parse(args)?;
                Ok(api.post("/metafields", to_body(&args)?).await?)
            }
            "tiendanube_update_metafield" => {
                let args: UpdateMetafieldArgs = parse(args)?;
                let path = format!("/metafields/{}", args.metafield_id);
                Ok(api.put(&path, json!({ "value": args.value })).await?)
            }
            "tiendanube_delete_metafield" => {
                let args: MetafieldIdArgs = parse(args)?;
                Ok(or_success(api.delete(&format!("/metafields/{}", args.metafield_id)).await?))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
