use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_positive, normalize_date_field, parse, query_from, to_body, ListArgs, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{acknowledged, fetch_page};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    Percentage,
    Absolute,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListCouponsArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Exact coupon code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Discount type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CouponType>,
    /// Only currently valid (or invalid) coupons
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

impl Validate for ListCouponsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetCouponArgs {
    /// Coupon ID
    #[serde(skip_serializing)]
    pub coupon_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetCouponArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("coupon_id", self.coupon_id)
    }
}

/// Coupon attributes shared by create and update.
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct CouponTerms {
    /// Whether the coupon can be used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    /// Maximum number of uses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u64>,
    /// Minimum cart total required
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<String>,
    /// First day the coupon applies (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Last day the coupon applies (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Restrict to these category IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<u64>>,
    /// Restrict to these product IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<u64>>,
}

impl CouponTerms {
    fn check(&mut self) -> Result<(), ToolError> {
        if let Some(max_uses) = self.max_uses {
            ensure_positive("max_uses", max_uses)?;
        }
        normalize_date_field("start_date", &mut self.start_date)?;
        normalize_date_field("end_date", &mut self.end_date)?;
        for id in self.categories.iter().flatten() {
            ensure_positive("categories", *id)?;
        }
        for id in self.products.iter().flatten() {
            ensure_positive("products", *id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateCouponArgs {
    /// Code the customer types at checkout
    pub code: String,
    /// Discount type
    #[serde(rename = "type")]
    pub kind: CouponType,
    /// Discount value (percentage or amount)
    pub value: String,
    #[serde(flatten)]
    pub terms: CouponTerms,
}

impl Validate for CreateCouponArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if self.code.is_empty() {
            return Err(ToolError::invalid("Coupon code is required"));
        }
        if self.value.is_empty() {
            return Err(ToolError::invalid("Coupon value is required"));
        }
        self.terms.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateCouponArgs {
    /// Coupon ID
    #[serde(skip_serializing)]
    pub coupon_id: u64,
    /// Code the customer types at checkout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Discount type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CouponType>,
    /// Discount value (percentage or amount)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(flatten)]
    pub terms: CouponTerms,
}

impl Validate for UpdateCouponArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("coupon_id", self.coupon_id)?;
        self.terms.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CouponIdArgs {
    /// Coupon ID
    pub coupon_id: u64,
}

impl Validate for CouponIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("coupon_id", self.coupon_id)
    }
}

pub struct CouponTools;

#[async_trait]
impl ToolCategory for CouponTools {
    fn category_name(&self) -> &'static str {
        "coupons"
    }

    fn domain(&self) -> Domain {
        Domain::Coupon
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListCouponsArgs>(
                "tiendanube_list_coupons",
                "List discount coupons, filtered by code, type, validity or dates.",
            ),
            ToolDefinition::new::<GetCouponArgs>("tiendanube_get_coupon", "Get a coupon by ID."),
            ToolDefinition::new::<CreateCouponArgs>(
                "tiendanube_create_coupon",
                "Create a percentage or fixed-amount coupon, optionally limited by uses, \
                 dates, minimum price, categories or products.",
            ),
            ToolDefinition::new::<UpdateCouponArgs>(
                "tiendanube_update_coupon",
                "Update the terms of a coupon.",
            ),
            ToolDefinition::new::<CouponIdArgs>("tiendanube_delete_coupon", "Delete a coupon."),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_coupons" => {
                let args: ListCouponsArgs = parse(args)?;
                fetch_page(api, "/coupons", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_coupon" => {
                let args: GetCouponArgs = parse(args)?;
                Ok(api.get(&format!("/coupons/{}", args.coupon_id), query_from(&args)).await?)
            }
            "tiendanube_create_coupon" => {
                let args: CreateCouponArgs = parse(args)?;
                Ok(api.post("/coupons", to_body(&args)?).await?)
            }
            "tiendanube_update_coupon" => {
                let args: UpdateCouponArgs = parse(args)?;
                Ok(api.put(&format!("/coupons/{}", args.coupon_id), to_body(&args)?).await?)
            }
            "tiendanube_delete_coupon" => {
                let args: CouponIdArgs = parse(args)?;
                api.delete(&format!("/coupons/{}", args.coupon_id)).await?;
                Ok(acknowledged(format!("Coupon {} deleted successfully", args.coupon_id)))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::CouponTools;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn create_coupon_sends_type_and_normalized_dates() {
        let api = RecordingApi::new();

        CouponTools
            .call(
                "tiendanube_create_coupon",
                json!({
                    "code": "VERANO10",
                    "type": "percentage",
                    "value": "10",
                    "end_date": "2025-01-31",
                    "products": [4, 5],
                }),
                &api,
            )
            .await
            .expect("created");

        assert_eq!(
            api.last().body,
            Some(json!({
                "code": "VERANO10",
                "type": "percentage",
                "value": "10",
                "end_date": "2025-01-31T00:00:00.000Z",
                "products": [4, 5],
            }))
        );
    }

    #[tokio::test]
    async fn list_coupons_filters_by_type() {
        let api = RecordingApi::new().respond(json!([]));

        CouponTools
            .call("tiendanube_list_coupons", json!({"type": "absolute", "valid": true}), &api)
            .await
            .expect("listed");

        assert_eq!(api.last().path, "/coupons");
        assert_eq!(api.query("type").as_deref(), Some("absolute"));
        assert_eq!(api.query("valid").as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn rejects_unknown_type_and_zero_uses() {
        let api = RecordingApi::new();

        assert!(CouponTools
            .call(
                "tiendanube_create_coupon",
                json!({"code": "X", "type": "bogus", "value": "1"}),
                &api
            )
            .await
            .is_err());
        let error = CouponTools
            .call(
                "tiendanube_create_coupon",
                json!({"code": "X", "type": "absolute", "value": "1", "max_uses": 0}),
                &api,
            )
            .await
            .expect_err("zero uses");
        assert!(error.to_string().contains("max_uses"));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn delete_coupon_acknowledges() {
        let api = RecordingApi::new();

        let result = CouponTools
            .call("tiendanube_delete_coupon", json!({"coupon_id": 5}), &api)
            .await
            .expect("deleted");

        assert_eq!(result["message"], "Coupon 5 deleted successfully");
    }
}
