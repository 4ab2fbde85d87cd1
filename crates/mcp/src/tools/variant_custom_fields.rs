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
    base: "/products/variants/custom-fields",
    list: ("tiendanube_list_product_variant_custom_fields", "List variant custom fields."),
    get: ("tiendanube_get_product_variant_custom_field", "Get a variant custom field by UUID."),
    create: ("tiendanube_create_product_variant_custom_field", "Create a variant custom field."),
    update: ("tiendanube_update_product_variant_custom_field", "Update a variant custom field."),
    delete: (
        "tiendanube_delete_product_variant_custom_field",
        "Delete a variant custom field. Only fields created by this app can be deleted.",
    ),
    owners: (
        "tiendanube_get_variant_custom_field_owners",
        "List the variants that carry a given custom field.",
    ),
};

const UPDATE_VALUES: &str = "tiendanube_update_product_variant_custom_field_values";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VariantFieldValuesArgs {
    /// Product ID
    pub product_id: u64,
    /// Variant ID
    pub variant_id: u64,
    /// Custom field values for the variant
    pub custom_fields: Vec<FieldValues>,
}

impl Validate for VariantFieldValuesArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_positive("variant_id", self.variant_id)?;
        check_field_values(&self.custom_fields)
    }
}

pub struct VariantCustomFieldTools;

#[async_trait]
impl ToolCategory for VariantCustomFieldTools {
    fn category_name(&self) -> &'static str {
        "product_variant_custom_fields"
    }

    fn domain(&self) -> Domain {
        Domain::ProductVariantCustomFields
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = CATALOG.definitions();
        definitions.push(ToolDefinition::new::<VariantFieldValuesArgs>(
            UPDATE_VALUES,
            "Attach or detach custom field values on a product variant.",
        ));
        definitions
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        if name == UPDATE_VALUES {
            let args: VariantFieldValuesArgs = parse(args)?;
            let path = format!(
                "/products/{}/variants/{}/custom-fields/values",
                args.product_id, args.variant_id
            );
            return Ok(api.put(&path, json!({ "custom_fields": args.custom_fields })).await?);
        }
        CATALOG.call(name, args, api).await
    }
}
