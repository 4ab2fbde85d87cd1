use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_len, ensure_not_blank, ensure_positive, normalize_date_field, parse, to_body,
    ResourceId, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Boleto,
    Pix,
    Wallet,
    BankTransfer,
    Cash,
    Check,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Sale,
    Authorization,
    Capture,
    Refund,
    Void,
    Expiration,
    InFraudAnalysis,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Authorized,
    Paid,
    Pending,
    Failed,
    Refunded,
    Voided,
}

/// Fills in `happened_at` with the current time when absent, otherwise normalizes it.
fn stamp(happened_at: &mut Option<String>) -> Result<(), ToolError> {
    if happened_at.is_none() {
        *happened_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        return Ok(());
    }
    normalize_date_field("happened_at", happened_at)
}

fn ensure_amount(field: &str, amount: Option<f64>) -> Result<(), ToolError> {
    match amount {
        Some(amount) if amount.is_nan() || amount <= 0.0 => {
            Err(ToolError::invalid(format!("{field} must be greater than 0")))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FirstEvent {
    /// Event type
    #[serde(rename = "type")]
    pub kind: EventType,
    /// Resulting transaction status
    pub status: EventStatus,
    /// When the event happened (ISO 8601); defaults to now
    pub happened_at: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct TransactionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installments: Option<u32>,
    /// Last four digits of the card
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_last_four_digits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_brand: Option<String>,
    /// Reference assigned by the payment gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// ISO 4217 currency code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl TransactionInfo {
    fn check(&self) -> Result<(), ToolError> {
        if self.installments == Some(0) {
            return Err(ToolError::invalid("info.installments must be at least 1"));
        }
        if let Some(digits) = &self.card_last_four_digits {
            ensure_len("info.card_last_four_digits", digits, 4)?;
        }
        if let Some(currency) = &self.currency {
            ensure_len("info.currency", currency, 3)?;
        }
        ensure_amount("info.amount", self.amount)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateTransactionArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Payment provider ID
    pub payment_provider_id: String,
    pub payment_method: PaymentMethod,
    /// Initial event of the transaction
    pub first_event: FirstEvent,
    /// Payment details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<TransactionInfo>,
}

impl Validate for CreateTransactionArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        ensure_not_blank("payment_provider_id", &self.payment_provider_id)?;
        if let Some(info) = &self.info {
            info.check()?;
        }
        stamp(&mut self.first_event.happened_at)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateTransactionEventArgs {
    /// Order ID
    #[serde(skip_serializing)]
    pub order_id: u64,
    /// Transaction ID
    #[serde(skip_serializing)]
    pub transaction_id: ResourceId,
    /// Event type
    #[serde(rename = "type")]
    pub kind: EventType,
    /// Resulting transaction status
    pub status: EventStatus,
    /// When the event happened (ISO 8601); defaults to now
    pub happened_at: Option<String>,
    /// Amount involved in the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Provider-specific details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Map<String, Value>>,
}

impl Validate for CreateTransactionEventArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("order_id", self.order_id)?;
        self.transaction_id.check("transaction_id")?;
        ensure_amount("amount", self.amount)?;
        stamp(&mut self.happened_at)
    }
}

pub struct TransactionTools;

#[async_trait]
impl ToolCategory for TransactionTools {
    fn category_name(&self) -> &'static str {
        "transactions"
    }

    fn domain(&self) -> Domain {
        Domain::Transaction
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<CreateTransactionArgs>(
                "tiendanube_create_transaction",
                "Register a payment transaction on an order (payment apps).",
            ),
            ToolDefinition::new::<CreateTransactionEventArgs>(
                "tiendanube_create_transaction_event",
                "Append an event (capture, refund, void...) to an order transaction.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_create_transaction" => {
                let args: CreateTransactionArgs = parse(args)?;
                let path = format!("/orders/{}/transactions", args.order_id);
                Ok(api.post(&path, to_body(&args)?).await?)
            }
            "tiendanube_create_transaction_event" => {
                let args: CreateTransactionEventArgs = parse(args)?;
                let path = format!(
                    "/orders/{}/transactions/{}/events",
                    args.order_id,
                    args.transaction_id.segment()
                );
                Ok(api.post(&path, to_body(&args)?).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TransactionTools;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn create_transaction_posts_without_order_id() {
        let api = RecordingApi::new();

        TransactionTools
            .call(
                "tiendanube_create_transaction",
                json!({
                    "order_id": 450,
                    "payment_provider_id": "c2e6a6b3",
                    "payment_method": "pix",
                    "first_event": {"type": "sale", "status": "paid", "happened_at": "2024-03-10"},
                    "info": {"amount": 199.9, "currency": "BRL"},
                }),
                &api,
            )
            .await
            .expect("created");

        let request = api.last();
        assert_eq!(request.path, "/orders/450/transactions");
        assert_eq!(
            request.body,
            Some(json!({
                "payment_provider_id": "c2e6a6b3",
                "payment_method": "pix",
                "first_event": {"type": "sale", "status": "paid", "happened_at": "2024-03-10T00:00:00.000Z"},
                "info": {"amount": 199.9, "currency": "BRL"},
            }))
        );
    }

    #[tokio::test]
    async fn missing_event_time_defaults_to_now() {
        let api = RecordingApi::new();

        TransactionTools
            .call(
                "tiendanube_create_transaction_event",
                json!({"order_id": 450, "transaction_id": "tx-9", "type": "refund", "status": "refunded"}),
                &api,
            )
            .await
            .expect("event");

        let request = api.last();
        assert_eq!(request.path, "/orders/450/transactions/tx-9/events");
        let body = request.body.expect("body");
        assert_eq!(body["type"], "refund");
        assert!(body["happened_at"].as_str().is_some_and(|ts| ts.ends_with('Z')));
    }

    #[tokio::test]
    async fn info_rules_are_enforced() {
        let api = RecordingApi::new();
        let with_info = |info: serde_json::Value| {
            json!({
                "order_id": 450,
                "payment_provider_id": "p",
                "payment_method": "credit_card",
                "first_event": {"type": "authorization", "status": "authorized"},
                "info": info,
            })
        };

        for info in [
            json!({"currency": "REAL"}),
            json!({"card_last_four_digits": "12"}),
            json!({"installments": 0}),
            json!({"amount": 0}),
        ] {
            let outcome = TransactionTools.call("tiendanube_create_transaction", with_info(info), &api).await;
            assert!(outcome.is_err());
        }
        assert!(api.requests().is_empty());
    }
}
