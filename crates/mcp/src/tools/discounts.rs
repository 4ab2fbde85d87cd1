//! Store-wide discounts and the legacy business rules summary.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{parse, query_from, BasicListArgs, ResourceId, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::fetch_page;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DiscountIdArgs {
    /// Discount ID
    pub discount_id: ResourceId,
}

impl Validate for DiscountIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.discount_id.check("discount_id")
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct BusinessRulesSummaryArgs {}

impl Validate for BusinessRulesSummaryArgs {}

pub struct DiscountTools;

#[async_trait]
impl ToolCategory for DiscountTools {
    fn category_name(&self) -> &'static str {
        "discounts"
    }

    fn domain(&self) -> Domain {
        Domain::Misc
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<BasicListArgs>(
                "tiendanube_list_discounts",
                "List the store's automatic discounts.",
            ),
            ToolDefinition::new::<DiscountIdArgs>(
                "tiendanube_get_discount",
                "Get a discount by ID.",
            ),
            ToolDefinition::new::<BusinessRulesSummaryArgs>(
                "tiendanube_get_business_rules",
                "Get the store's business rules configuration.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_discounts" => {
                let args: BasicListArgs = parse(args)?;
                fetch_page(api, "/discounts", query_from(&args), &args.paging).await
            }
            "tiendanube_get_discount" => {
                let args: DiscountIdArgs = parse(args)?;
                Ok(api.get(&format!("/discounts/{}", args.discount_id.segment()), Vec::new()).await?)
            }
            "tiendanube_get_business_rules" => {
                parse::<BusinessRulesSummaryArgs>(args)?;
                Ok(api.get("/business_rules", Vec::new()).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::DiscountTools;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn business_rules_summary_uses_underscore_path() {
        let api = RecordingApi::new();

        DiscountTools.call("tiendanube_get_business_rules", json!({}), &api).await.expect("rules");

        assert_eq!(api.last().path, "/business_rules");
    }

    #[tokio::test]
    async fn list_discounts_forwards_since_id() {
        let api = RecordingApi::new().respond(json!([]));

        DiscountTools
            .call("tiendanube_list_discounts", json!({"since_id": 10}), &api)
            .await
            .expect("discounts");

        assert_eq!(api.query("since_id").as_deref(), Some("10"));
    }
}
