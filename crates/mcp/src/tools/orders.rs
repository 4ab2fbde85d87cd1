//! Orders, draft orders, invoices, order history and order transactions.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_email, ensure_len, ensure_positive, parse, query_from, ListArgs, PageArgs, ResourceId,
    Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::products::ensure_scalar_values;
use crate::tools::{fetch_page, post_action};

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusFilter {
    Any,
    Open,
    Closed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Closed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    Form,
    Store,
    Api,
    Meli,
    Pos,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatusFilter {
    Any,
    Pending,
    Authorized,
    Paid,
    Abandoned,
    Refunded,
    Voided,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Paid,
    Voided,
    Refunded,
    Abandoned,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatusFilter {
    Any,
    Unpacked,
    Unfulfilled,
    Fulfilled,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderAggregate {
    FulfillmentOrders,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PickupType {
    Pickup,
    Ship,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListOrdersArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Order status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatusFilter>,
    /// Sales channel the order came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<SalesChannel>,
    /// Payment status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatusFilter>,
    /// Shipping status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_status: Option<ShippingStatusFilter>,
    /// Minimum order total
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_min: Option<String>,
    /// Maximum order total
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_max: Option<String>,
    /// Comma-separated customer IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_ids: Option<String>,
    /// Search by order number, customer name or email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Only orders created by this app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<u64>,
    /// Comma-separated payment methods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<String>,
    /// Payment provider name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_provider: Option<String>,
    /// Extra data to embed in each order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregates: Option<OrderAggregate>,
}

impl Validate for ListOrdersArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()?;
        if let Some(app_id) = self.app_id {
            ensure_positive("app_id", app_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetOrderArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OrderIdArgs {
    /// Order ID
    pub order_id: u64,
}

impl Validate for OrderIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct OrderLine {
    /// Variant ID
    pub variant_id: u64,
    /// Units ordered
    pub quantity: u64,
    /// Unit price override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateOrderArgs {
    /// Customer full name
    pub customer_name: String,
    /// Customer email
    pub customer_email: String,
    /// Customer phone
    pub customer_phone: Option<String>,
    /// Customer identification document
    pub customer_document: Option<String>,
    /// Ordered variants (at least one)
    pub products: Vec<OrderLine>,
    /// Billing street
    pub billing_address: String,
    /// Billing city
    pub billing_city: String,
    /// Billing province or state
    pub billing_province: String,
    /// Billing country code
    pub billing_country: String,
    /// Billing zip code
    pub billing_zipcode: String,
    /// Billing street number
    pub billing_number: String,
    /// Billing floor or apartment
    pub billing_floor: Option<String>,
    /// Billing phone
    pub billing_phone: Option<String>,
    /// Shipping street (defaults to billing)
    pub shipping_address: Option<String>,
    /// Shipping city (defaults to billing)
    pub shipping_city: Option<String>,
    /// Shipping province (defaults to billing)
    pub shipping_province: Option<String>,
    /// Shipping country (defaults to billing)
    pub shipping_country: Option<String>,
    /// Shipping zip code (defaults to billing)
    pub shipping_zipcode: Option<String>,
    /// Shipping street number (defaults to billing)
    pub shipping_number: Option<String>,
    /// Shipping floor (defaults to billing)
    pub shipping_floor: Option<String>,
    /// Shipping phone (defaults to billing)
    pub shipping_phone: Option<String>,
    /// ISO 4217 currency code, default USD
    pub currency: Option<String>,
    /// Two-letter language code, default es
    pub language: Option<String>,
    /// Payment gateway
    pub gateway: Option<String>,
    /// Payment status, default pending
    pub payment_status: Option<PaymentStatus>,
    /// Order status, default open
    pub status: Option<OrderStatus>,
    /// Customer note
    pub note: Option<String>,
    /// Delivery type, default ship
    pub shipping_pickup_type: Option<PickupType>,
    /// Shipping cost charged to the customer
    pub shipping_cost_customer: Option<String>,
    /// Shipping cost paid by the store
    pub shipping_cost_owner: Option<String>,
    /// Email the order confirmation, default true
    pub send_confirmation_email: Option<bool>,
    /// Email the fulfillment notice, default true
    pub send_fulfillment_email: Option<bool>,
    /// Stock location
    pub location_id: Option<String>,
}

impl Validate for CreateOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if self.customer_name.is_empty() {
            return Err(ToolError::invalid("Customer name is required"));
        }
        ensure_email("customer_email", &self.customer_email)?;
        if self.products.is_empty() {
            return Err(ToolError::invalid("At least one product is required"));
        }
        for line in &self.products {
            ensure_positive("products[].variant_id", line.variant_id)?;
            ensure_positive("products[].quantity", line.quantity)?;
        }
        for (field, value) in [
            ("Billing address", &self.billing_address),
            ("Billing city", &self.billing_city),
            ("Billing province", &self.billing_province),
            ("Billing country", &self.billing_country),
            ("Billing zipcode", &self.billing_zipcode),
            ("Billing number", &self.billing_number),
        ] {
            if value.is_empty() {
                return Err(ToolError::invalid(format!("{field} is required")));
            }
        }
        if let Some(currency) = &self.currency {
            ensure_len("currency", currency, 3)?;
        }
        if let Some(language) = &self.language {
            ensure_len("language", language, 2)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateOrderArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Private note visible to the store owner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_note: Option<String>,
    /// New order status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl Validate for UpdateOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CancelOrderArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Cancellation reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Validate for CancelOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateOrderCustomFieldsArgs {
    /// Order ID
    pub order_id: u64,
    /// Key-value pairs of custom fields (string, number, boolean or null)
    pub custom_fields: Map<String, Value>,
}

impl Validate for UpdateOrderCustomFieldsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        ensure_scalar_values(&self.custom_fields)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ListOrderTransactionsArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    #[serde(flatten)]
    pub paging: PageArgs,
}

impl Validate for ListOrderTransactionsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        self.paging.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OrderTransactionArgs {
    /// Order ID
    pub order_id: u64,
    /// Transaction ID
    pub transaction_id: ResourceId,
}

impl Validate for OrderTransactionArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        self.transaction_id.check("transaction_id")
    }
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListDraftOrdersArgs {
    #[serde(flatten)]
    pub list: ListArgs,
}

impl Validate for ListDraftOrdersArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetDraftOrderArgs {
    /// Draft order ID
    #[serde(skip_serializing)]
    pub draft_order_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetDraftOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("draft_order_id", self.draft_order_id)
    }
}

pub struct OrderTools;

#[async_trait]
impl ToolCategory for OrderTools {
    fn category_name(&self) -> &'static str {
        "orders"
    }

    fn domain(&self) -> Domain {
        Domain::Order
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListOrdersArgs>(
                "tiendanube_list_orders",
                "List orders with pagination and filters for status, payment, shipping, \
                 channel, totals, customers and dates.",
            ),
            ToolDefinition::new::<GetOrderArgs>(
                "tiendanube_get_order",
                "Get an order by ID with its products, customer, addresses and payment details.",
            ),
            ToolDefinition::new::<CreateOrderArgs>(
                "tiendanube_create_order",
                "Create an order for a customer. Shipping address fields default to the \
                 billing address.",
            ),
            ToolDefinition::new::<UpdateOrderArgs>(
                "tiendanube_update_order",
                "Update the owner note or status of an order.",
            ),
            ToolDefinition::new::<CancelOrderArgs>(
                "tiendanube_cancel_order",
                "Cancel an order, optionally recording a reason.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_close_order",
                "Close (archive) an order.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_reopen_order",
                "Reopen a closed order.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_mark_order_as_paid",
                "Mark an order as paid.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_create_invoice",
                "Generate the invoice of an order.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_get_invoice",
                "Get the invoice of an order.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_get_order_fulfillment",
                "Get the fulfillment orders (shipments) of an order.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_get_order_value_history",
                "Get the history of value changes of an order.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_get_order_edit_history",
                "Get the history of edits made to an order.",
            ),
            ToolDefinition::new::<OrderIdArgs>(
                "tiendanube_get_order_custom_fields",
                "Get the custom field values set on an order.",
            ),
            ToolDefinition::new::<UpdateOrderCustomFieldsArgs>(
                "tiendanube_update_order_custom_fields",
                "Replace or set the custom field values of an order.",
            ),
            ToolDefinition::new::<ListOrderTransactionsArgs>(
                "tiendanube_list_order_transactions",
                "List the payment transactions of an order.",
            ),
            ToolDefinition::new::<OrderTransactionArgs>(
                "tiendanube_get_order_transaction",
                "Get one payment transaction of an order.",
            ),
            ToolDefinition::new::<ListDraftOrdersArgs>(
                "tiendanube_list_draft_orders",
                "List draft orders (quotes) with pagination and date filters.",
            ),
            ToolDefinition::new::<GetDraftOrderArgs>(
                "tiendanube_get_draft_order",
                "Get a draft order by ID.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_orders" => {
                let args: ListOrdersArgs = parse(args)?;
                fetch_page(api, "/orders", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_order" => {
                let args: GetOrderArgs = parse(args)?;
                Ok(api.get(&format!("/orders/{}", args.order_id), query_from(&args)).await?)
            }
            "tiendanube_create_order" => {
                let args: CreateOrderArgs = parse(args)?;
                Ok(api.post("/orders", create_order_body(&args)).await?)
            }
            "tiendanube_update_order" => {
                let args: UpdateOrderArgs = parse(args)?;
                let body = json!({
                    "owner_note": args.owner_note,
                    "status": args.status,
                });
                Ok(api.put(&format!("/orders/{}", args.order_id), without_nulls(body)).await?)
            }
            "tiendanube_cancel_order" => {
                let args: CancelOrderArgs = parse(args)?;
                let body = without_nulls(json!({ "reason": args.reason }));
                let order = api.post(&format!("/orders/{}/cancel", args.order_id), body).await?;
                Ok(json!({
                    "success": true,
                    "message": format!("Order {} cancelled successfully", args.order_id),
                    "order": order,
                }))
            }
            "tiendanube_close_order" => order_action(api, args, "close").await,
            "tiendanube_reopen_order" => order_action(api, args, "reopen").await,
            "tiendanube_mark_order_as_paid" => order_action(api, args, "pay").await,
            "tiendanube_create_invoice" => order_action(api, args, "invoice").await,
            "tiendanube_get_invoice" => order_lookup(api, args, "invoice").await,
            "tiendanube_get_order_fulfillment" => {
                order_lookup(api, args, "fulfillment_orders").await
            }
            "tiendanube_get_order_value_history" => {
                order_lookup(api, args, "history/values").await
            }
            "tiendanube_get_order_edit_history" => {
                order_lookup(api, args, "history/editions").await
            }
            "tiendanube_get_order_custom_fields" => order_lookup(api, args, "custom_fields").await,
            "tiendanube_update_order_custom_fields" => {
                let args: UpdateOrderCustomFieldsArgs = parse(args)?;
                let path = format!("/orders/{}/custom_fields", args.order_id);
                Ok(api.put(&path, Value::Object(args.custom_fields)).await?)
            }
            "tiendanube_list_order_transactions" => {
                let args: ListOrderTransactionsArgs = parse(args)?;
                let path = format!("/orders/{}/transactions", args.order_id);
                fetch_page(api, &path, query_from(&args), &args.paging).await
            }
            "tiendanube_get_order_transaction" => {
                let args: OrderTransactionArgs = parse(args)?;
                let path = format!(
                    "/orders/{}/transactions/{}",
                    args.order_id,
                    args.transaction_id.segment()
                );
                Ok(api.get(&path, Vec::new()).await?)
            }
            "tiendanube_list_draft_orders" => {
                let args: ListDraftOrdersArgs = parse(args)?;
                fetch_page(api, "/draft_orders", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_draft_order" => {
                let args: GetDraftOrderArgs = parse(args)?;
                let path = format!("/draft_orders/{}", args.draft_order_id);
                Ok(api.get(&path, query_from(&args)).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

async fn order_action(api: &dyn StoreApi, args: Value, action: &str) -> Result<Value, ToolError> {
    let args: OrderIdArgs = parse(args)?;
    post_action(api, &format!("/orders/{}/{action}", args.order_id)).await
}

async fn order_lookup(api: &dyn StoreApi, args: Value, suffix: &str) -> Result<Value, ToolError> {
    let args: OrderIdArgs = parse(args)?;
    Ok(api.get(&format!("/orders/{}/{suffix}", args.order_id), Vec::new()).await?)
}

fn create_order_body(args: &CreateOrderArgs) -> Value {
    let or_billing = |shipping: &Option<String>, billing: &str| -> String {
        shipping.as_deref().filter(|value| !value.is_empty()).unwrap_or(billing).to_string()
    };
    let or_billing_opt = |shipping: &Option<String>, billing: &Option<String>| -> Value {
        shipping
            .as_deref()
            .filter(|value| !value.is_empty())
            .or(billing.as_deref())
            .map_or(Value::Null, |value| json!(value))
    };

    let body = json!({
        "currency": args.currency.as_deref().filter(|c| !c.is_empty()).unwrap_or("USD"),
        "language": args.language.as_deref().filter(|l| !l.is_empty()).unwrap_or("es"),
        "gateway": args.gateway,
        "payment_status": args.payment_status.unwrap_or(PaymentStatus::Pending),
        "status": args.status.unwrap_or(OrderStatus::Open),
        "products": args.products,
        "customer": without_nulls(json!({
            "name": args.customer_name,
            "email": args.customer_email,
            "phone": args.customer_phone,
            "document": args.customer_document,
        })),
        "note": args.note,
        "billing_address": without_nulls(json!({
            "address": args.billing_address,
            "city": args.billing_city,
            "province": args.billing_province,
            "country": args.billing_country,
            "zipcode": args.billing_zipcode,
            "number": args.billing_number,
            "floor": args.billing_floor,
            "phone": args.billing_phone,
            "name": args.customer_name,
        })),
        "shipping_address": without_nulls(json!({
            "address": or_billing(&args.shipping_address, &args.billing_address),
            "city": or_billing(&args.shipping_city, &args.billing_city),
            "province": or_billing(&args.shipping_province, &args.billing_province),
            "country": or_billing(&args.shipping_country, &args.billing_country),
            "zipcode": or_billing(&args.shipping_zipcode, &args.billing_zipcode),
            "number": or_billing(&args.shipping_number, &args.billing_number),
            "floor": or_billing_opt(&args.shipping_floor, &args.billing_floor),
            "phone": or_billing_opt(&args.shipping_phone, &args.billing_phone),
            "name": args.customer_name,
        })),
        "shipping_pickup_type": args.shipping_pickup_type.unwrap_or(PickupType::Ship),
        "shipping_cost_customer": args.shipping_cost_customer,
        "shipping_cost_owner": args.shipping_cost_owner,
        "send_confirmation_email": args.send_confirmation_email != Some(false),
        "send_fulfillment_email": args.send_fulfillment_email != Some(false),
        "location_id": args.location_id,
    });

    without_nulls(body)
}

/// Drops top-level `null` members so absent optionals stay off the wire.
pub(crate) fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            Value::Object(map.into_iter().filter(|(_, value)| !value.is_null()).collect())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tiendanube_client::Method;

    use super::OrderTools;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    fn order_args() -> serde_json::Value {
        json!({
            "customer_name": "Ana Pérez",
            "customer_email": "ana@example.com",
            "products": [{"variant_id": 101, "quantity": 2}],
            "billing_address": "Av. Corrientes",
            "billing_city": "CABA",
            "billing_province": "Buenos Aires",
            "billing_country": "AR",
            "billing_zipcode": "1043",
            "billing_number": "1234",
            "shipping_city": "Rosario",
        })
    }

    #[tokio::test]
    async fn create_order_applies_defaults_and_billing_fallbacks() {
        let api = RecordingApi::new();

        OrderTools.call("tiendanube_create_order", order_args(), &api).await.expect("created");

        let request = api.last();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/orders");
        let body = request.body.expect("body");
        assert_eq!(body["currency"], "USD");
        assert_eq!(body["language"], "es");
        assert_eq!(body["payment_status"], "pending");
        assert_eq!(body["status"], "open");
        assert_eq!(body["shipping_pickup_type"], "ship");
        assert_eq!(body["send_confirmation_email"], true);
        assert_eq!(body["products"], json!([{"variant_id": 101, "quantity": 2}]));
        assert_eq!(body["billing_address"]["name"], "Ana Pérez");
        assert_eq!(body["shipping_address"]["city"], "Rosario");
        assert_eq!(body["shipping_address"]["address"], "Av. Corrientes");
        assert!(body.get("gateway").is_none());
    }

    #[tokio::test]
    async fn create_order_requires_products_and_valid_email() {
        let api = RecordingApi::new();

        let mut args = order_args();
        args["products"] = json!([]);
        let error = OrderTools.call("tiendanube_create_order", args, &api).await.expect_err("empty");
        assert_eq!(error.to_string(), "invalid arguments: At least one product is required");

        let mut args = order_args();
        args["customer_email"] = json!("ana-at-example");
        let error = OrderTools.call("tiendanube_create_order", args, &api).await.expect_err("email");
        assert!(error.to_string().contains("customer_email"));

        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn cancel_order_wraps_response() {
        let api = RecordingApi::new().respond(json!({"id": 55, "status": "cancelled"}));

        let result = OrderTools
            .call("tiendanube_cancel_order", json!({"order_id": 55, "reason": "customer"}), &api)
            .await
            .expect("cancelled");

        assert_eq!(api.last().path, "/orders/55/cancel");
        assert_eq!(api.last().body, Some(json!({"reason": "customer"})));
        assert_eq!(result["message"], "Order 55 cancelled successfully");
        assert_eq!(result["order"]["status"], "cancelled");
    }

    #[tokio::test]
    async fn order_actions_post_without_body() {
        let api = RecordingApi::new();

        for (tool, suffix) in [
            ("tiendanube_close_order", "close"),
            ("tiendanube_reopen_order", "reopen"),
            ("tiendanube_mark_order_as_paid", "pay"),
            ("tiendanube_create_invoice", "invoice"),
        ] {
            OrderTools.call(tool, json!({"order_id": 9}), &api).await.expect("action");
            let request = api.last();
            assert_eq!(request.method, Method::POST);
            assert_eq!(request.path, format!("/orders/9/{suffix}"));
            assert!(request.body.is_none());
        }
    }

    #[tokio::test]
    async fn list_orders_sends_enum_filters() {
        let api = RecordingApi::new().respond(json!([]));

        let result = OrderTools
            .call(
                "tiendanube_list_orders",
                json!({"payment_status": "paid", "channels": "pos", "aggregates": "fulfillment_orders"}),
                &api,
            )
            .await
            .expect("listed");

        assert_eq!(api.query("payment_status").as_deref(), Some("paid"));
        assert_eq!(api.query("channels").as_deref(), Some("pos"));
        assert_eq!(api.query("aggregates").as_deref(), Some("fulfillment_orders"));
        assert_eq!(result["pagination"]["has_next"], false);
    }

    #[tokio::test]
    async fn history_lookups_hit_nested_paths() {
        let api = RecordingApi::new();

        OrderTools
            .call("tiendanube_get_order_edit_history", json!({"order_id": 3}), &api)
            .await
            .expect("history");
        assert_eq!(api.last().path, "/orders/3/history/editions");

        OrderTools
            .call("tiendanube_get_order_fulfillment", json!({"order_id": 3}), &api)
            .await
            .expect("fulfillment");
        assert_eq!(api.last().path, "/orders/3/fulfillment_orders");
    }
}
