//! Tool categories, one module per Tienda Nube resource family.

use serde_json::Value;
use tiendanube_client::{ApiRequest, ApiResponse, Method, Page, StoreApi};

use crate::args::PageArgs;
use crate::error::ToolError;
use crate::registry::ToolCategory;

mod abandoned_checkouts;
mod authentication;
mod business_rules;
mod cart;
mod categories;
mod checkout_sdk;
mod checkouts;
mod coupons;
mod custom_fields;
mod customers;
mod discounts;
mod fulfillment_orders;
mod locations;
mod metafields;
mod orders;
mod payments;
mod product_custom_fields;
mod products;
mod scripts;
mod shipping;
mod transactions;
mod variant_custom_fields;
mod webhooks;

pub use abandoned_checkouts::AbandonedCheckoutTools;
pub use authentication::AuthenticationTools;
pub use business_rules::BusinessRuleTools;
pub use cart::CartTools;
pub use categories::CategoryTools;
pub use checkout_sdk::CheckoutSdkTools;
pub use checkouts::CheckoutTools;
pub use coupons::CouponTools;
pub use customers::CustomerTools;
pub use discounts::DiscountTools;
pub use fulfillment_orders::FulfillmentOrderTools;
pub use locations::LocationTools;
pub use metafields::MetafieldTools;
pub use orders::OrderTools;
pub use payments::PaymentTools;
pub use product_custom_fields::ProductCustomFieldTools;
pub use products::ProductTools;
pub use scripts::ScriptTools;
pub use shipping::ShippingTools;
pub use transactions::TransactionTools;
pub use variant_custom_fields::VariantCustomFieldTools;
pub use webhooks::WebhookTools;

/// Every built-in category in the order tools are listed to clients.
pub fn all_categories() -> Vec<Box<dyn ToolCategory>> {
    vec![
        Box::new(AuthenticationTools),
        Box::new(ProductTools),
        Box::new(OrderTools),
        Box::new(CustomerTools),
        Box::new(CategoryTools),
        Box::new(CouponTools),
        Box::new(WebhookTools),
        Box::new(ScriptTools),
        Box::new(LocationTools),
        Box::new(PaymentTools),
        Box::new(ShippingTools),
        Box::new(MetafieldTools),
        Box::new(DiscountTools),
        Box::new(CheckoutTools),
        Box::new(AbandonedCheckoutTools),
        Box::new(CartTools),
        Box::new(CheckoutSdkTools),
        Box::new(TransactionTools),
        Box::new(FulfillmentOrderTools),
        Box::new(BusinessRuleTools),
        Box::new(ProductCustomFieldTools),
        Box::new(VariantCustomFieldTools),
    ]
}

/// GETs a collection and wraps it with pagination metadata.
pub(crate) async fn fetch_page(
    api: &dyn StoreApi,
    path: &str,
    query: Vec<(String, String)>,
    paging: &PageArgs,
) -> Result<Value, ToolError> {
    let response = api.send(ApiRequest::get(path).with_query(query)).await?;
    Ok(Page::from_response(response, paging.page, paging.per_page).into_value())
}

/// POST without a request body, for action endpoints such as `/orders/{id}/close`.
pub(crate) async fn post_action(api: &dyn StoreApi, path: &str) -> Result<Value, ToolError> {
    Ok(api.send(ApiRequest::new(Method::POST, path)).await?.body)
}

/// Tries each candidate path in order and returns the first answer that is
/// not a 404. When every candidate is missing the call fails with `missing`.
pub(crate) async fn first_found<F>(
    api: &dyn StoreApi,
    paths: &[String],
    missing: &str,
    build: F,
) -> Result<ApiResponse, ToolError>
where
    F: Fn(&str) -> ApiRequest + Send + Sync,
{
    for path in paths {
        match api.send(build(path)).await {
            Err(error) if error.status() == Some(404) => {
                tracing::debug!(path = %path, "candidate path not found, trying next");
            }
            outcome => return Ok(outcome?),
        }
    }
    Err(ToolError::Failed(missing.to_string()))
}

/// `{"success": true, "message": ...}` acknowledgement for calls whose
/// response carries nothing useful.
pub(crate) fn acknowledged(message: impl Into<String>) -> Value {
    serde_json::json!({ "success": true, "message": message.into() })
}

/// Replaces an empty upstream body with `{"success": true}`.
pub(crate) fn or_success(body: Value) -> Value {
    match &body {
        Value::Null => serde_json::json!({ "success": true }),
        Value::String(text) if text.is_empty() => serde_json::json!({ "success": true }),
        _ => body,
    }
}
