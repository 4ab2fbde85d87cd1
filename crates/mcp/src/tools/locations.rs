use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{ensure_positive, parse, query_from, ListArgs, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::fetch_page;

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListLocationsArgs {
    #[serde(flatten)]
    pub list: ListArgs,
}

impl Validate for ListLocationsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetLocationArgs {
    /// Location ID
    #[serde(skip_serializing)]
    pub location_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetLocationArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("location_id", self.location_id)
    }
}

pub struct LocationTools;

#[async_trait]
impl ToolCategory for LocationTools {
    fn category_name(&self) -> &'static str {
        "locations"
    }

    fn domain(&self) -> Domain {
        Domain::Location
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListLocationsArgs>(
                "tiendanube_list_locations",
                "List the store's inventory locations (warehouses, shops).",
            ),
            ToolDefinition::new::<GetLocationArgs>(
                "tiendanube_get_location",
                "Get an inventory location by ID.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_locations" => {
                let args: ListLocationsArgs = parse(args)?;
                fetch_page(api, "/locations", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_location" => {
                let args: GetLocationArgs = parse(args)?;
                Ok(api.get(&format!("/locations/{}", args.location_id), query_from(&args)).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
