use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{ensure_positive, parse, query_from, BasicListArgs, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::fetch_page;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ShippingCarrierIdArgs {
    /// Shipping carrier ID
    pub carrier_id: u64,
}

impl Validate for ShippingCarrierIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("carrier_id", self.carrier_id)
    }
}

pub struct ShippingTools;

#[async_trait]
impl ToolCategory for ShippingTools {
    fn category_name(&self) -> &'static str {
        "shipping"
    }

    fn domain(&self) -> Domain {
        Domain::Shipping
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<BasicListArgs>(
                "tiendanube_list_shipping_carriers",
                "List the custom shipping carriers registered in the store.",
            ),
            ToolDefinition::new::<ShippingCarrierIdArgs>(
                "tiendanube_get_shipping_carrier",
                "Get a shipping carrier by ID.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_shipping_carriers" => {
                let args: BasicListArgs = parse(args)?;
                fetch_page(api, "/shipping_carriers", query_from(&args), &args.paging).await
            }
            "tiendanube_get_shipping_carrier" => {
                let args: ShippingCarrierIdArgs = parse(args)?;
                Ok(api.get(&format!("/shipping_carriers/{}", args.carrier_id), Vec::new()).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
