use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tiendanube_client::StoreApi;

use crate::args::{ensure_positive, parse, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::custom_fields::{check_field_values, FieldCatalog, FieldValues};

const CATALOG: FieldCatalog = FieldCatalog {
    base: "/products/custom-fields",
    list: ("tiendanube_list_product_custom_fields", "List product custom fields."),
    get: ("tiendanube_get_product_custom_field", "Get a product custom field by UUID."),
    create: ("tiendanube_create_product_custom_field", "Create a product custom field."),
    update: ("tiendanube_update_product_custom_field", "Update a product custom field."),
    delete: (
        "tiendanube_delete_product_custom_field",
        "Delete a product custom field. Only fields created by this app can be deleted.",
    ),
    owners: (
        "tiendanube_get_custom_field_owners",
        "List the products that carry a given custom field.",
    ),
};

const UPDATE_VALUES: &str = "tiendanube_update_product_custom_field_values";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductFieldValuesArgs {
    /// Product ID
    pub product_id: u64,
    /// Custom field values for the product
    pub custom_fields: Vec<FieldValues>,
}

impl Validate for ProductFieldValuesArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        check_field_values(&self.custom_fields)
    }
}

pub struct ProductCustomFieldTools;

#[async_trait]
impl ToolCategory for ProductCustomFieldTools {
    fn category_name(&self) -> &'static str {
        "product_custom_fields"
    }

    fn domain(&self) -> Domain {
        Domain::ProductCustomFields
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = CATALOG.definitions();
        definitions.push(ToolDefinition::new::<ProductFieldValuesArgs>(
            UPDATE_VALUES,
            "Attach or detach custom field values on a product.",
        ));
        definitions
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        if name == UPDATE_VALUES {
            let args: ProductFieldValuesArgs = parse(args)?;
            let path = format!("/products/{}/custom-fields/values", args.product_id);
            return Ok(api.put(&path, json!({ "custom_fields": args.custom_fields })).await?);
        }
        CATALOG.call(name, args, api).await
    }
}
