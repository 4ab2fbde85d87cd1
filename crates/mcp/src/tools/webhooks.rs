use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_https_url, ensure_positive, ensure_url, parse, query_from, to_body, ListArgs, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{acknowledged, fetch_page};

const URL_LABEL: &str = "Webhook URL";

/// Store events a webhook can subscribe to.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum WebhookEvent {
    #[serde(rename = "app/uninstalled")]
    AppUninstalled,
    #[serde(rename = "category/created")]
    CategoryCreated,
    #[serde(rename = "category/updated")]
    CategoryUpdated,
    #[serde(rename = "category/deleted")]
    CategoryDeleted,
    #[serde(rename = "customer/created")]
    CustomerCreated,
    #[serde(rename = "customer/updated")]
    CustomerUpdated,
    #[serde(rename = "customer/deleted")]
    CustomerDeleted,
    #[serde(rename = "order/created")]
    OrderCreated,
    #[serde(rename = "order/updated")]
    OrderUpdated,
    #[serde(rename = "order/paid")]
    OrderPaid,
    #[serde(rename = "order/packed")]
    OrderPacked,
    #[serde(rename = "order/fulfilled")]
    OrderFulfilled,
    #[serde(rename = "order/cancelled")]
    OrderCancelled,
    #[serde(rename = "order/custom_fields_updated")]
    OrderCustomFieldsUpdated,
    #[serde(rename = "order/edited")]
    OrderEdited,
    #[serde(rename = "order/pending")]
    OrderPending,
    #[serde(rename = "order/voided")]
    OrderVoided,
    #[serde(rename = "product/created")]
    ProductCreated,
    #[serde(rename = "product/updated")]
    ProductUpdated,
    #[serde(rename = "product/deleted")]
    ProductDeleted,
    #[serde(rename = "product_variant/custom_fields_updated")]
    ProductVariantCustomFieldsUpdated,
    #[serde(rename = "domain/updated")]
    DomainUpdated,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListWebhooksArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Filter by webhook URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Filter by event type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<WebhookEvent>,
}

impl Validate for ListWebhooksArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()?;
        if let Some(url) = &self.url {
            ensure_url("url", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetWebhookArgs {
    /// Webhook ID
    #[serde(skip_serializing)]
    pub webhook_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetWebhookArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("webhook_id", self.webhook_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateWebhookArgs {
    /// HTTPS endpoint that receives the notifications
    pub url: String,
    /// Event that triggers the webhook
    pub event: WebhookEvent,
}

impl Validate for CreateWebhookArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_https_url("url", &self.url, URL_LABEL)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateWebhookArgs {
    /// Webhook ID
    #[serde(skip_serializing)]
    pub webhook_id: u64,
    /// HTTPS endpoint that receives the notifications
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Event that triggers the webhook
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<WebhookEvent>,
}

impl Validate for UpdateWebhookArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("webhook_id", self.webhook_id)?;
        if let Some(url) = &self.url {
            ensure_https_url("url", url, URL_LABEL)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WebhookIdArgs {
    /// Webhook ID
    pub webhook_id: u64,
}

impl Validate for WebhookIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("webhook_id", self.webhook_id)
    }
}

pub struct WebhookTools;

#[async_trait]
impl ToolCategory for WebhookTools {
    fn category_name(&self) -> &'static str {
        "webhooks"
    }

    fn domain(&self) -> Domain {
        Domain::Webhook
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListWebhooksArgs>(
                "tiendanube_list_webhooks",
                "List the store's webhooks, filtered by URL, event or dates.",
            ),
            ToolDefinition::new::<GetWebhookArgs>("tiendanube_get_webhook", "Get a webhook by ID."),
            ToolDefinition::new::<CreateWebhookArgs>(
                "tiendanube_create_webhook",
                "Subscribe an HTTPS endpoint to a store event.",
            ),
            ToolDefinition::new::<UpdateWebhookArgs>(
                "tiendanube_update_webhook",
                "Change the URL or event of a webhook.",
            ),
            ToolDefinition::new::<WebhookIdArgs>(
                "tiendanube_delete_webhook",
                "Delete a webhook.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_webhooks" => {
                let args: ListWebhooksArgs = parse(args)?;
                fetch_page(api, "/webhooks", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_webhook" => {
                let args: GetWebhookArgs = parse(args)?;
                Ok(api.get(&format!("/webhooks/{}", args.webhook_id), query_from(&args)).await?)
            }
            "tiendanube_create_webhook" => {
                let args: CreateWebhookArgs = parse(args)?;
                Ok(api.post("/webhooks", to_body(&args)?).await?)
            }
            "tiendanube_update_webhook" => {
                let args: UpdateWebhookArgs = parse(args)?;
                Ok(api.put(&format!("/webhooks/{}", args.webhook_id), to_body(&args)?).await?)
            }
            "tiendanube_delete_webhook" => {
                let args: WebhookIdArgs = parse(args)?;
                api.delete(&format!("/webhooks/{}", args.webhook_id)).await?;
                Ok(acknowledged(format!("Webhook {} deleted successfully", args.webhook_id)))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{WebhookEvent, WebhookTools};
    use crate::args::wire_name;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn create_webhook_requires_https() {
        let api = RecordingApi::new();

        let error = WebhookTools
            .call(
                "tiendanube_create_webhook",
                json!({"url": "http://hooks.example.com", "event": "order/paid"}),
                &api,
            )
            .await
            .expect_err("plain http");
        assert_eq!(error.to_string(), "invalid arguments: Webhook URL must use HTTPS");
        assert!(api.requests().is_empty());

        WebhookTools
            .call(
                "tiendanube_create_webhook",
                json!({"url": "https://hooks.example.com/tn", "event": "order/paid"}),
                &api,
            )
            .await
            .expect("created");
        assert_eq!(
            api.last().body,
            Some(json!({"url": "https://hooks.example.com/tn", "event": "order/paid"}))
        );
    }

    #[tokio::test]
    async fn unknown_events_are_rejected() {
        let api = RecordingApi::new();

        let error = WebhookTools
            .call(
                "tiendanube_create_webhook",
                json!({"url": "https://hooks.example.com", "event": "order/teleported"}),
                &api,
            )
            .await
            .expect_err("unknown event");

        assert!(error.to_string().starts_with("invalid arguments"));
    }

    #[test]
    fn events_keep_their_slash_names() {
        assert_eq!(
            wire_name(&WebhookEvent::ProductVariantCustomFieldsUpdated),
            "product_variant/custom_fields_updated"
        );
        assert_eq!(wire_name(&WebhookEvent::AppUninstalled), "app/uninstalled");
    }

    #[tokio::test]
    async fn delete_webhook_acknowledges() {
        let api = RecordingApi::new();

        let result = WebhookTools
            .call("tiendanube_delete_webhook", json!({"webhook_id": 77}), &api)
            .await
            .expect("deleted");

        assert_eq!(api.last().path, "/webhooks/77");
        assert_eq!(result["message"], "Webhook 77 deleted successfully");
    }
}
