//! Abandoned checkouts. Stores on newer API versions expose them under
//! `/checkouts`; older ones only answer on `/abandoned_checkouts`.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tiendanube_client::{ApiRequest, Method, Page, StoreApi};

use crate::args::{ensure_email, ensure_positive, parse, query_from, ListArgs, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::products::check_language;
use crate::tools::{first_found, or_success};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListAbandonedCheckoutsArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Filter by customer email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Search query across relevant fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl Validate for ListAbandonedCheckoutsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if let Some(email) = &self.email {
            ensure_email("email", email)?;
        }
        self.list.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetAbandonedCheckoutArgs {
    /// Abandoned checkout ID
    pub checkout_id: u64,
    /// Comma-separated list of fields; omit or use `all`/`*` for everything
    pub fields: Option<String>,
}

impl GetAbandonedCheckoutArgs {
    fn query(&self) -> Vec<(String, String)> {
        match self.fields.as_deref().map(str::trim) {
            None | Some("" | "all" | "*") => Vec::new(),
            Some(fields) => vec![("fields".to_string(), fields.to_string())],
        }
    }
}

impl Validate for GetAbandonedCheckoutArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("checkout_id", self.checkout_id)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RecoveryEmailArgs {
    /// Abandoned checkout ID
    pub checkout_id: u64,
    /// Two-letter language code for the email (es, pt, en)
    pub language: Option<String>,
}

impl Validate for RecoveryEmailArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("checkout_id", self.checkout_id)?;
        check_language(&self.language)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddCouponArgs {
    /// Abandoned checkout (cart) ID
    pub cart_id: u64,
    /// Coupon ID to apply
    pub coupon_id: u64,
}

impl Validate for AddCouponArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("cart_id", self.cart_id)?;
        ensure_positive("coupon_id", self.coupon_id)
    }
}

pub struct AbandonedCheckoutTools;

#[async_trait]
impl ToolCategory for AbandonedCheckoutTools {
    fn category_name(&self) -> &'static str {
        "abandoned_checkouts"
    }

    fn domain(&self) -> Domain {
        Domain::AbandonedCheckout
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListAbandonedCheckoutsArgs>(
                "tiendanube_list_abandoned_checkouts",
                "List abandoned checkouts, filtered by dates, email or a search query. \
                 Useful for finding recovery opportunities.",
            ),
            ToolDefinition::new::<GetAbandonedCheckoutArgs>(
                "tiendanube_get_abandoned_checkout",
                "Get an abandoned checkout with its customer, items and totals.",
            ),
            ToolDefinition::new::<RecoveryEmailArgs>(
                "tiendanube_send_abandoned_checkout_recovery_email",
                "Send the recovery email for an abandoned checkout, where the store's API version supports it.",
            ),
            ToolDefinition::new::<AddCouponArgs>(
                "tiendanube_add_coupon_to_abandoned_checkout",
                "Apply a coupon to an abandoned checkout.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_abandoned_checkouts" => {
                let args: ListAbandonedCheckoutsArgs = parse(args)?;
                let query = query_from(&args);
                let paths = ["/checkouts".to_string(), "/abandoned_checkouts".to_string()];
                let response = first_found(api, &paths, "Abandoned checkouts are not available", |path| {
                    ApiRequest::get(path).with_query(query.clone())
                })
                .await?;
                let paging = &args.list.paging;
                Ok(Page::from_response(response, paging.page, paging.per_page).into_value())
            }
            "tiendanube_get_abandoned_checkout" => {
                let args: GetAbandonedCheckoutArgs = parse(args)?;
                let query = args.query();
                let paths = [
                    format!("/checkouts/{}", args.checkout_id),
                    format!("/abandoned_checkouts/{}", args.checkout_id),
                ];
                let missing = format!("Abandoned checkout {} not found", args.checkout_id);
                let response = first_found(api, &paths, &missing, |path| {
                    ApiRequest::get(path).with_query(query.clone())
                })
                .await?;
                Ok(response.body)
            }
            "tiendanube_send_abandoned_checkout_recovery_email" => {
                let args: RecoveryEmailArgs = parse(args)?;
                let body = args.language.as_ref().map(|language| json!({ "language": language }));
                let paths = [
                    format!("/abandoned_checkouts/{}/recovery_email", args.checkout_id),
                    format!("/checkouts/{}/recovery_email", args.checkout_id),
                ];
                let response = first_found(
                    api,
                    &paths,
                    "Recovery email endpoint is not available for this store/API version.",
                    |path| match &body {
                        Some(body) => ApiRequest::post(path, body.clone()),
                        None => ApiRequest::new(Method::POST, path),
                    },
                )
                .await?;
                Ok(or_success(response.body))
            }
            "tiendanube_add_coupon_to_abandoned_checkout" => {
                let args: AddCouponArgs = parse(args)?;
                let path = format!("/checkouts/{}/coupon", args.cart_id);
                Ok(api.post(&path, json!({ "coupon_id": args.coupon_id })).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::AbandonedCheckoutTools;
    use crate::error::ToolError;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn list_falls_back_to_legacy_path() {
        let api = RecordingApi::new().fail(404).respond(json!([{"id": 1}]));

        let result = AbandonedCheckoutTools
            .call(
                "tiendanube_list_abandoned_checkouts",
                json!({"email": "ana@example.com", "created_at_min": "2024-05-01"}),
                &api,
            )
            .await
            .expect("listed");

        let requests = api.requests();
        assert_eq!(requests[0].path, "/checkouts");
        assert_eq!(requests[1].path, "/abandoned_checkouts");
        assert_eq!(api.query("created_at_min").as_deref(), Some("2024-05-01T00:00:00.000Z"));
        assert_eq!(result["data"][0]["id"], 1);
    }

    #[tokio::test]
    async fn get_drops_wildcard_fields() {
        let api = RecordingApi::new();

        AbandonedCheckoutTools
            .call("tiendanube_get_abandoned_checkout", json!({"checkout_id": 8, "fields": "*"}), &api)
            .await
            .expect("checkout");

        assert_eq!(api.last().path, "/checkouts/8");
        assert!(api.last().query.is_empty());
    }

    #[tokio::test]
    async fn recovery_email_tries_checkouts_path_and_reports_success() {
        let api = RecordingApi::new().fail(404).respond(Value::Null);

        let result = AbandonedCheckoutTools
            .call(
                "tiendanube_send_abandoned_checkout_recovery_email",
                json!({"checkout_id": 8, "language": "es"}),
                &api,
            )
            .await
            .expect("sent");

        assert_eq!(api.requests()[0].path, "/abandoned_checkouts/8/recovery_email");
        assert_eq!(api.last().path, "/checkouts/8/recovery_email");
        assert_eq!(api.last().body, Some(json!({"language": "es"})));
        assert_eq!(result, json!({"success": true}));
    }

    #[tokio::test]
    async fn recovery_email_reports_unsupported_stores() {
        let api = RecordingApi::new().fail(404).fail(404);

        let error = AbandonedCheckoutTools
            .call("tiendanube_send_abandoned_checkout_recovery_email", json!({"checkout_id": 8}), &api)
            .await
            .expect_err("unsupported");

        assert!(matches!(error, ToolError::Failed(_)));
        assert!(api.last().body.is_none());
    }

    #[tokio::test]
    async fn coupon_is_posted_to_checkout() {
        let api = RecordingApi::new();

        AbandonedCheckoutTools
            .call("tiendanube_add_coupon_to_abandoned_checkout", json!({"cart_id": 3, "coupon_id": 9}), &api)
            .await
            .expect("applied");

        assert_eq!(api.last().path, "/checkouts/3/coupon");
        assert_eq!(api.last().body, Some(json!({"coupon_id": 9})));
    }
}
