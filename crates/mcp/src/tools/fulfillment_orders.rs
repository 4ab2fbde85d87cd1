use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_positive, ensure_url, normalize_date_field, parse, query_from, to_body, DateRange,
    PageArgs, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{acknowledged, fetch_page};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentStatus {
    Open,
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentEventStatus {
    LabelPrinted,
    LabelPurchased,
    AttemptedDelivery,
    ReadyForPickup,
    PickedUp,
    InTransit,
    OutForDelivery,
    Delivered,
    Failure,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ListFulfillmentOrdersArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    #[serde(flatten)]
    pub paging: PageArgs,
    /// Filter by fulfillment status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FulfillmentStatus>,
    #[serde(flatten)]
    pub dates: DateRange,
}

impl Validate for ListFulfillmentOrdersArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        self.paging.check()?;
        self.dates.normalize()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFulfillmentOrderArgs {
    /// Fulfillment order ID
    pub fulfillment_order_id: u64,
    /// Order ID; when given the order-scoped path is used
    pub order_id: Option<u64>,
}

impl Validate for GetFulfillmentOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("fulfillment_order_id", self.fulfillment_order_id)?;
        if let Some(order_id) = self.order_id {
            ensure_positive("order_id", order_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FulfillmentOrderRef {
    /// Order ID
    pub order_id: u64,
    /// Fulfillment order ID
    pub fulfillment_order_id: u64,
}

impl FulfillmentOrderRef {
    fn check(&self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        ensure_positive("fulfillment_order_id", self.fulfillment_order_id)
    }

    fn path(&self) -> String {
        format!("/orders/{}/fulfillment_orders/{}", self.order_id, self.fulfillment_order_id)
    }
}

impl Validate for FulfillmentOrderRef {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FulfillmentLineItem {
    /// Order line item ID
    pub order_line_item_id: u64,
    /// Quantity to fulfill
    pub quantity: u32,
}

/// Location and tracking details shared by create and update.
#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct TrackingDetails {
    /// Fulfillment location ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u64>,
    /// Shipping company name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_company: Option<String>,
    /// Tracking number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    /// Tracking URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_url: Option<String>,
    /// Notify the customer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notify_customer: Option<bool>,
}

impl TrackingDetails {
    fn check(&self) -> Result<(), ToolError> {
        if let Some(location_id) = self.location_id {
            ensure_positive("location_id", location_id)?;
        }
        if let Some(url) = &self.tracking_url {
            ensure_url("tracking_url", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateFulfillmentOrderArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Line items to fulfill
    pub line_items: Vec<FulfillmentLineItem>,
    #[serde(flatten)]
    pub tracking: TrackingDetails,
}

impl Validate for CreateFulfillmentOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        if self.line_items.is_empty() {
            return Err(ToolError::invalid("line_items must contain at least one item"));
        }
        for item in &self.line_items {
            ensure_positive("line_items.order_line_item_id", item.order_line_item_id)?;
            ensure_positive("line_items.quantity", u64::from(item.quantity))?;
        }
        self.tracking.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateFulfillmentOrderArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Fulfillment order ID
    #[serde(skip_serializing)]
    pub fulfillment_order_id: u64,
    /// New fulfillment status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FulfillmentStatus>,
    #[serde(flatten)]
    pub tracking: TrackingDetails,
}

impl UpdateFulfillmentOrderArgs {
    fn target(&self) -> FulfillmentOrderRef {
        FulfillmentOrderRef {
            order_id: self.order_id,
            fulfillment_order_id: self.fulfillment_order_id,
        }
    }
}

impl Validate for UpdateFulfillmentOrderArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.target().check()?;
        self.tracking.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateFulfillmentEventArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Fulfillment order ID
    #[serde(skip_serializing)]
    pub fulfillment_order_id: u64,
    /// Event status
    pub status: FulfillmentEventStatus,
    /// When the event happened (ISO 8601)
    pub happened_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// Free-text note about the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Estimated delivery date (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_delivery_at: Option<String>,
}

impl CreateFulfillmentEventArgs {
    fn target(&self) -> FulfillmentOrderRef {
        FulfillmentOrderRef {
            order_id: self.order_id,
            fulfillment_order_id: self.fulfillment_order_id,
        }
    }
}

impl Validate for CreateFulfillmentEventArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.target().check()?;
        let mut happened_at = Some(std::mem::take(&mut self.happened_at));
        normalize_date_field("happened_at", &mut happened_at)?;
        self.happened_at = happened_at.unwrap_or_default();
        normalize_date_field("estimated_delivery_at", &mut self.estimated_delivery_at)
    }
}

pub struct FulfillmentOrderTools;

#[async_trait]
impl ToolCategory for FulfillmentOrderTools {
    fn category_name(&self) -> &'static str {
        "fulfillment_orders"
    }

    fn domain(&self) -> Domain {
        Domain::FulfillmentOrder
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListFulfillmentOrdersArgs>(
                "tiendanube_list_fulfillment_orders",
                "List the fulfillment orders of an order, filtered by status or dates.",
            ),
            ToolDefinition::new::<GetFulfillmentOrderArgs>(
                "tiendanube_get_fulfillment_order",
                "Get a fulfillment order by ID.",
            ),
            ToolDefinition::new::<CreateFulfillmentOrderArgs>(
                "tiendanube_create_fulfillment_order",
                "Create a fulfillment order for some of an order's line items.",
            ),
            ToolDefinition::new::<UpdateFulfillmentOrderArgs>(
                "tiendanube_update_fulfillment_order",
                "Update the status, location or tracking of a fulfillment order.",
            ),
            ToolDefinition::new::<FulfillmentOrderRef>(
                "tiendanube_delete_fulfillment_order",
                "Delete (cancel) a fulfillment order.",
            ),
            ToolDefinition::new::<CreateFulfillmentEventArgs>(
                "tiendanube_create_fulfillment_event",
                "Record a tracking event on a fulfillment order.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_fulfillment_orders" => {
                let args: ListFulfillmentOrdersArgs = parse(args)?;
                let path = format!("/orders/{}/fulfillment_orders", args.order_id);
                fetch_page(api, &path, query_from(&args), &args.paging).await
            }
            "tiendanube_get_fulfillment_order" => {
                let args: GetFulfillmentOrderArgs = parse(args)?;
                let path = match args.order_id {
                    Some(order_id) => format!(
                        "/orders/{order_id}/fulfillment_orders/{}",
                        args.fulfillment_order_id
                    ),
                    None => format!("/fulfillment_orders/{}", args.fulfillment_order_id),
                };
                Ok(api.get(&path, Vec::new()).await?)
            }
            "tiendanube_create_fulfillment_order" => {
                let args: CreateFulfillmentOrderArgs = parse(args)?;
                let path = format!("/orders/{}/fulfillment_orders", args.order_id);
                Ok(api.post(&path, to_body(&args)?).await?)
            }
            "tiendanube_update_fulfillment_order" => {
                let args: UpdateFulfillmentOrderArgs = parse(args)?;
                Ok(api.put(&args.target().path(), to_body(&args)?).await?)
            }
            "tiendanube_delete_fulfillment_order" => {
                let args: FulfillmentOrderRef = parse(args)?;
                api.delete(&args.path()).await?;
                Ok(acknowledged(format!(
                    "Fulfillment order {} deleted successfully",
                    args.fulfillment_order_id
                )))
            }
            "tiendanube_create_fulfillment_event" => {
                let args: CreateFulfillmentEventArgs = parse(args)?;
                let path = format!("{}/events", args.target().path());
                Ok(api.post(&path, to_body(&args)?).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
