use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tiendanube_client::{ApiRequest, Credentials, StoreApi};
use tracing::info;

use crate::args::{ensure_not_blank, parse, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};

const STORE_INFO_FIELDS: &[&str] = &[
    "id",
    "name",
    "description",
    "logo",
    "main_domain",
    "original_domain",
    "plan_name",
    "currency",
    "country",
    "language",
    "languages",
    "business_id",
    "business_name",
    "business_address",
    "contact_email",
    "customer_accounts",
    "created_at",
    "updated_at",
    "design",
    "features",
    "payment_providers",
    "shipping_providers",
];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AuthenticateArgs {
    /// OAuth 2.0 access token for the Tienda Nube API
    pub access_token: String,
    /// Store ID for the Tienda Nube store
    pub store_id: String,
}

impl Validate for AuthenticateArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("access_token", &self.access_token)?;
        ensure_not_blank("store_id", &self.store_id)
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct StoreInfoArgs {}

impl Validate for StoreInfoArgs {}

pub struct AuthenticationTools;

#[async_trait]
impl ToolCategory for AuthenticationTools {
    fn category_name(&self) -> &'static str {
        "authentication"
    }

    fn domain(&self) -> Domain {
        Domain::Authentication
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<AuthenticateArgs>(
                "tiendanube_authenticate",
                "Authenticate with the Tienda Nube API using an access token and store ID. \
                 The credentials are used for every subsequent API call.",
            ),
            ToolDefinition::new::<StoreInfoArgs>(
                "tiendanube_get_store_info",
                "Get information about the authenticated store: name, plan, domains, \
                 languages, configuration and enabled features.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_authenticate" => authenticate(api, parse(args)?).await,
            "tiendanube_get_store_info" => {
                parse::<StoreInfoArgs>(args)?;
                let store = api.get("/store", Vec::new()).await?;
                Ok(project(&store, STORE_INFO_FIELDS))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

async fn authenticate(api: &dyn StoreApi, args: AuthenticateArgs) -> Result<Value, ToolError> {
    let candidate = Credentials::new(args.store_id.trim(), args.access_token.trim());
    let store = api.send_as(ApiRequest::get("/store"), &candidate).await?.body;
    api.set_credentials(Some(candidate));

    info!(event_name = "auth.store.connected", store_id = %args.store_id.trim(), "authenticated store");

    Ok(json!({
        "success": true,
        "message": "Successfully authenticated with Tienda Nube API",
        "store": {
            "id": store.get("id"),
            "name": localized_name(&store),
            "domain": store.get("main_domain"),
            "plan": store.get("plan_name"),
            "currency": store.get("currency"),
            "country": store.get("country"),
            "language": store.get("language"),
        },
    }))
}

/// First non-empty translation of the store name, es before pt before en.
fn localized_name(store: &Value) -> String {
    ["es", "pt", "en"]
        .iter()
        .filter_map(|lang| store.pointer(&format!("/name/{lang}")).and_then(Value::as_str))
        .find(|name| !name.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

fn project(source: &Value, fields: &[&str]) -> Value {
    let projected: Map<String, Value> = fields
        .iter()
        .filter_map(|field| source.get(*field).map(|value| (field.to_string(), value.clone())))
        .collect();
    Value::Object(projected)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tiendanube_client::{Credentials, Method, StoreApi};

    use super::AuthenticationTools;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn authenticate_swaps_credentials_and_summarizes_store() {
        let api = RecordingApi::new().respond(json!({
            "id": 42,
            "name": {"es": "", "pt": "Loja Azul"},
            "main_domain": "azul.com.br",
            "plan_name": "evolution",
            "currency": "BRL",
        }));

        let result = AuthenticationTools
            .call(
                "tiendanube_authenticate",
                json!({"access_token": "tok", "store_id": "42"}),
                &api,
            )
            .await
            .expect("authenticated");

        assert_eq!(result["success"], true);
        assert_eq!(result["store"]["name"], "Loja Azul");
        assert_eq!(result["store"]["domain"], "azul.com.br");
        assert_eq!(api.last().method, Method::GET);
        assert_eq!(api.last().path, "/store");
        assert_eq!(api.senders(), vec![Some("42".to_string())]);
        assert_eq!(api.credentials().map(|c| c.store_id), Some("42".to_string()));
    }

    #[tokio::test]
    async fn failed_authentication_never_installs_the_candidate() {
        let api = RecordingApi::new().with_credentials(Credentials::new("1", "old")).fail(401);

        let error = AuthenticationTools
            .call(
                "tiendanube_authenticate",
                json!({"access_token": "bad", "store_id": "2"}),
                &api,
            )
            .await
            .expect_err("rejected token");

        assert!(error.to_string().contains("401"));
        assert_eq!(api.senders(), vec![Some("2".to_string())]);
        assert_eq!(api.credentials().map(|c| c.store_id), Some("1".to_string()));
    }

    #[tokio::test]
    async fn store_info_keeps_only_known_fields() {
        let api = RecordingApi::new().respond(json!({
            "id": 7,
            "name": {"es": "Tienda"},
            "plan_name": "free",
            "internal_flag": true,
        }));

        let result = AuthenticationTools
            .call("tiendanube_get_store_info", json!({}), &api)
            .await
            .expect("store info");

        assert_eq!(result, json!({"id": 7, "name": {"es": "Tienda"}, "plan_name": "free"}));
    }
}
