use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_email, ensure_not_blank, ensure_positive, parse, query_from, to_body, ListArgs,
    PageArgs, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{acknowledged, fetch_page};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListCustomersArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Search by name, email or identification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl Validate for ListCustomersArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetCustomerArgs {
    /// Customer ID
    #[serde(skip_serializing)]
    pub customer_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetCustomerArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("customer_id", self.customer_id)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchCustomersArgs {
    /// Search query (name, email or identification)
    pub query: String,
    #[serde(flatten)]
    pub paging: PageArgs,
}

impl Validate for SearchCustomersArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("query", &self.query)?;
        self.paging.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCustomerArgs {
    /// Full name
    pub name: String,
    /// Email address
    pub email: String,
    /// Phone number
    pub phone: Option<String>,
    /// Identification document (DNI, CPF, CUIT...)
    pub identification: Option<String>,
    /// Internal note about the customer
    pub note: Option<String>,
    /// Street
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// Province or state
    pub province: Option<String>,
    /// Country code
    pub country: Option<String>,
    /// Zip code
    pub zipcode: Option<String>,
    /// Street number
    pub number: Option<String>,
    /// Floor or apartment
    pub floor: Option<String>,
}

impl CreateCustomerArgs {
    fn address_fields(&self) -> [&Option<String>; 7] {
        [
            &self.address,
            &self.city,
            &self.province,
            &self.country,
            &self.zipcode,
            &self.number,
            &self.floor,
        ]
    }
}

impl Validate for CreateCustomerArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if self.name.is_empty() {
            return Err(ToolError::invalid("Name is required"));
        }
        ensure_email("email", &self.email)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateCustomerArgs {
    /// Customer ID
    #[serde(skip_serializing)]
    pub customer_id: u64,
    /// Full name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Identification document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identification: Option<String>,
    /// Internal note about the customer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Validate for UpdateCustomerArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("customer_id", self.customer_id)?;
        if let Some(email) = &self.email {
            ensure_email("email", email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CustomerIdArgs {
    /// Customer ID
    pub customer_id: u64,
}

impl Validate for CustomerIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("customer_id", self.customer_id)
    }
}

pub struct CustomerTools;

#[async_trait]
impl ToolCategory for CustomerTools {
    fn category_name(&self) -> &'static str {
        "customers"
    }

    fn domain(&self) -> Domain {
        Domain::Customer
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListCustomersArgs>(
                "tiendanube_list_customers",
                "List customers with pagination, date filters and text search.",
            ),
            ToolDefinition::new::<GetCustomerArgs>(
                "tiendanube_get_customer",
                "Get a customer by ID, including addresses and order statistics.",
            ),
            ToolDefinition::new::<SearchCustomersArgs>(
                "tiendanube_search_customers",
                "Search customers by name, email or identification.",
            ),
            ToolDefinition::new::<CreateCustomerArgs>(
                "tiendanube_create_customer",
                "Create a customer. Address fields, when given, become the default address.",
            ),
            ToolDefinition::new::<UpdateCustomerArgs>(
                "tiendanube_update_customer",
                "Update the contact details or note of a customer.",
            ),
            ToolDefinition::new::<CustomerIdArgs>(
                "tiendanube_delete_customer",
                "Delete a customer.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_customers" => {
                let args: ListCustomersArgs = parse(args)?;
                fetch_page(api, "/customers", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_customer" => {
                let args: GetCustomerArgs = parse(args)?;
                Ok(api.get(&format!("/customers/{}", args.customer_id), query_from(&args)).await?)
            }
            "tiendanube_search_customers" => {
                let args: SearchCustomersArgs = parse(args)?;
                let mut query = vec![("q".to_string(), args.query.clone())];
                query.extend(query_from(&args.paging));
                fetch_page(api, "/customers", query, &args.paging).await
            }
            "tiendanube_create_customer" => {
                let args: CreateCustomerArgs = parse(args)?;
                Ok(api.post("/customers", create_customer_body(&args)).await?)
            }
            "tiendanube_update_customer" => {
                let args: UpdateCustomerArgs = parse(args)?;
                let path = format!("/customers/{}", args.customer_id);
                Ok(api.put(&path, to_body(&args)?).await?)
            }
            "tiendanube_delete_customer" => {
                let args: CustomerIdArgs = parse(args)?;
                api.delete(&format!("/customers/{}", args.customer_id)).await?;
                Ok(acknowledged(format!("Customer {} deleted successfully", args.customer_id)))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

fn create_customer_body(args: &CreateCustomerArgs) -> Value {
    let mut body = json!({ "name": args.name, "email": args.email });
    for (key, value) in [
        ("phone", &args.phone),
        ("identification", &args.identification),
        ("note", &args.note),
    ] {
        if let Some(value) = value {
            body[key] = json!(value);
        }
    }

    let has_address =
        args.address_fields().iter().any(|field| field.as_deref().is_some_and(|v| !v.is_empty()));
    if has_address {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();
        body["addresses"] = json!([{
            "address": text(&args.address),
            "city": text(&args.city),
            "province": text(&args.province),
            "country": text(&args.country),
            "zipcode": text(&args.zipcode),
            "number": text(&args.number),
            "floor": text(&args.floor),
            "name": args.name,
            "phone": text(&args.phone),
        }]);
    }

    body
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tiendanube_client::Method;

    use super::CustomerTools;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn create_customer_adds_address_when_any_field_is_set() {
        let api = RecordingApi::new();

        CustomerTools
            .call(
                "tiendanube_create_customer",
                json!({"name": "Juan", "email": "juan@example.com", "city": "Córdoba"}),
                &api,
            )
            .await
            .expect("created");

        let body = api.last().body.expect("body");
        assert_eq!(body["name"], "Juan");
        assert!(body.get("phone").is_none());
        assert_eq!(body["addresses"][0]["city"], "Córdoba");
        assert_eq!(body["addresses"][0]["address"], "");
        assert_eq!(body["addresses"][0]["name"], "Juan");
    }

    #[tokio::test]
    async fn create_customer_without_address_fields_sends_no_addresses() {
        let api = RecordingApi::new();

        CustomerTools
            .call(
                "tiendanube_create_customer",
                json!({"name": "Juan", "email": "juan@example.com", "phone": "+54 11 5555"}),
                &api,
            )
            .await
            .expect("created");

        let body = api.last().body.expect("body");
        assert_eq!(body["phone"], "+54 11 5555");
        assert!(body.get("addresses").is_none());
    }

    #[tokio::test]
    async fn search_maps_query_to_q() {
        let api = RecordingApi::new().respond(json!([]));

        CustomerTools
            .call("tiendanube_search_customers", json!({"query": "juan", "page": 2}), &api)
            .await
            .expect("searched");

        assert_eq!(api.query("q").as_deref(), Some("juan"));
        assert_eq!(api.query("page").as_deref(), Some("2"));
        assert!(api.query("query").is_none());
    }

    #[tokio::test]
    async fn delete_customer_acknowledges() {
        let api = RecordingApi::new().respond(serde_json::Value::Null);

        let result = CustomerTools
            .call("tiendanube_delete_customer", json!({"customer_id": 12}), &api)
            .await
            .expect("deleted");

        assert_eq!(api.last().method, Method::DELETE);
        assert_eq!(api.last().path, "/customers/12");
        assert_eq!(result, json!({"success": true, "message": "Customer 12 deleted successfully"}));
    }

    #[tokio::test]
    async fn rejects_bad_email_before_sending() {
        let api = RecordingApi::new();

        let error = CustomerTools
            .call("tiendanube_update_customer", json!({"customer_id": 3, "email": "nope"}), &api)
            .await
            .expect_err("bad email");

        assert!(error.to_string().contains("email"));
        assert!(api.requests().is_empty());
    }
}
