use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{parse, query_from, BasicListArgs, ResourceId, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::fetch_page;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetPaymentProviderArgs {
    /// Payment provider ID
    #[serde(skip_serializing)]
    pub provider_id: ResourceId,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetPaymentProviderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.provider_id.check("provider_id")
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetPaymentOptionArgs {
    /// Payment option ID
    #[serde(skip_serializing)]
    pub option_id: ResourceId,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetPaymentOptionArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.option_id.check("option_id")
    }
}

pub struct PaymentTools;

#[async_trait]
impl ToolCategory for PaymentTools {
    fn category_name(&self) -> &'static str {
        "payments"
    }

    fn domain(&self) -> Domain {
        Domain::Payment
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<BasicListArgs>(
                "tiendanube_list_payment_providers_dedicated",
                "List the payment providers installed in the store.",
            ),
            ToolDefinition::new::<GetPaymentProviderArgs>(
                "tiendanube_get_payment_provider",
                "Get a payment provider by ID.",
            ),
            ToolDefinition::new::<BasicListArgs>(
                "tiendanube_list_payment_options",
                "List the payment options offered at checkout.",
            ),
            ToolDefinition::new::<GetPaymentOptionArgs>(
                "tiendanube_get_payment_option",
                "Get a payment option by ID.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_payment_providers_dedicated" => {
                let args: BasicListArgs = parse(args)?;
                fetch_page(api, "/payment_providers", query_from(&args), &args.paging).await
            }
            "tiendanube_get_payment_provider" => {
                let args: GetPaymentProviderArgs = parse(args)?;
                let path = format!("/payment_providers/{}", args.provider_id.segment());
                Ok(api.get(&path, query_from(&args)).await?)
            }
            "tiendanube_list_payment_options" => {
                let args: BasicListArgs = parse(args)?;
                fetch_page(api, "/payment_options", query_from(&args), &args.paging).await
            }
            "tiendanube_get_payment_option" => {
                let args: GetPaymentOptionArgs = parse(args)?;
                let path = format!("/payment_options/{}", args.option_id.segment());
                Ok(api.get(&path, query_from(&args)).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
