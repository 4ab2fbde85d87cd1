use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;
use tiendanube_client::ApiError;
use tiendanube_core::ErrorKind;

/// Resource family a tool belongs to; selects the `type` tag of failure envelopes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Domain {
    Authentication,
    Product,
    Order,
    Customer,
    Category,
    Coupon,
    Webhook,
    Script,
    Location,
    Payment,
    Shipping,
    Metafield,
    Misc,
    Checkout,
    CheckoutSdk,
    AbandonedCheckout,
    Cart,
    Transaction,
    FulfillmentOrder,
    BusinessRules,
    ProductCustomFields,
    ProductVariantCustomFields,
}

impl Domain {
    /// Envelope `type` tag. The checkout SDK generator reports failures with
    /// the tool name and a timestamp instead.
    pub fn error_type(self) -> Option<&'static str> {
        let tag = match self {
            Self::Authentication => "AuthenticationError",
            Self::Product => "ProductError",
            Self::Order => "OrderError",
            Self::Customer => "CustomerError",
            Self::Category => "CategoryError",
            Self::Coupon => "CouponError",
            Self::Webhook => "WebhookError",
            Self::Script => "ScriptError",
            Self::Location => "LocationError",
            Self::Payment => "PaymentError",
            Self::Shipping => "ShippingError",
            Self::Metafield => "MetafieldError",
            Self::Misc => "MiscError",
            Self::Checkout => "CheckoutError",
            Self::CheckoutSdk => return None,
            Self::AbandonedCheckout => "AbandonedCheckoutError",
            Self::Cart => "CartError",
            Self::Transaction => "TransactionError",
            Self::FulfillmentOrder => "FulfillmentOrderError",
            Self::BusinessRules => "BusinessRulesError",
            Self::ProductCustomFields => "ProductCustomFieldsError",
            Self::ProductVariantCustomFields => "ProductVariantCustomFieldsError",
        };
        Some(tag)
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Policy(String),

    #[error("{0}")]
    Failed(String),

    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArguments(_) => ErrorKind::Validation,
            Self::Api(error) => error.kind(),
            Self::Policy(_) => ErrorKind::Policy,
            Self::Failed(_) => ErrorKind::NotFound,
            Self::Encode(_) | Self::UnknownTool(_) => ErrorKind::Internal,
        }
    }

    /// The JSON object returned to the agent in place of a result.
    pub fn envelope(&self, domain: Domain, tool: &str) -> Value {
        let mut envelope = json!({
            "success": false,
            "error": self.to_string(),
        });

        match domain.error_type() {
            Some(tag) => {
                envelope["type"] = json!(tag);
            }
            None => {
                envelope["tool"] = json!(tool);
                envelope["timestamp"] =
                    json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
            }
        }

        if let Self::Api(api) = self {
            if let Some(status) = api.status() {
                envelope["status"] = json!(status);
            }
            if let Some(body) = api.body() {
                envelope["details"] = body.clone();
            }
        }

        envelope
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tiendanube_client::ApiError;
    use tiendanube_core::ErrorKind;

    use super::{Domain, ToolError};

    #[test]
    fn envelope_carries_domain_type() {
        let envelope = ToolError::invalid("product_id must be a positive integer")
            .envelope(Domain::Product, "tiendanube_get_product");

        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["type"], "ProductError");
        assert_eq!(envelope["error"], "invalid arguments: product_id must be a positive integer");
        assert!(envelope.get("tool").is_none());
    }

    #[test]
    fn api_failures_include_status_and_details() {
        let error = ToolError::from(ApiError::Status {
            status: 422,
            path: "/coupons".to_string(),
            message: "code has already been taken".to_string(),
            body: Some(json!({"code": ["has already been taken"]})),
        });

        let envelope = error.envelope(Domain::Coupon, "tiendanube_create_coupon");

        assert_eq!(envelope["type"], "CouponError");
        assert_eq!(envelope["status"], 422);
        assert_eq!(envelope["details"]["code"][0], "has already been taken");
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn untagged_domains_report_tool_and_timestamp() {
        let envelope = ToolError::invalid("bad version")
            .envelope(Domain::CheckoutSdk, "tiendanube_generate_checkout_sdk_template");

        assert!(envelope.get("type").is_none());
        assert_eq!(envelope["tool"], "tiendanube_generate_checkout_sdk_template");
        assert!(envelope["timestamp"].as_str().is_some_and(|ts| ts.ends_with('Z')));
    }
}
