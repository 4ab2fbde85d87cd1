use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{parse, query_from, ResourceId, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetCheckoutArgs {
    /// Checkout ID
    #[serde(skip_serializing)]
    pub checkout_id: ResourceId,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetCheckoutArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.checkout_id.check("checkout_id")
    }
}

pub struct CheckoutTools;

#[async_trait]
impl ToolCategory for CheckoutTools {
    fn category_name(&self) -> &'static str {
        "checkouts"
    }

    fn domain(&self) -> Domain {
        Domain::Checkout
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition::new::<GetCheckoutArgs>(
            "tiendanube_get_checkout",
            "Get a checkout by ID with its products, totals and customer data.",
        )]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_get_checkout" => {
                let args: GetCheckoutArgs = parse(args)?;
                let path = format!("/checkouts/{}", args.checkout_id.segment());
                Ok(api.get(&path, query_from(&args)).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
