//! Custom field catalogues shared by products and product variants. Both live
//! under their own base path and differ only in tool names and in how values
//! are attached to an owner.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_len_between, ensure_not_blank, parse, path_segment, query_from, to_body, PageArgs,
    Validate,
};
use crate::error::ToolError;
use crate::registry::ToolDefinition;
use crate::tools::{acknowledged, fetch_page};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Text,
    TextList,
    Numeric,
    Date,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListCustomFieldsArgs {
    #[serde(flatten)]
    pub paging: PageArgs,
}

impl Validate for ListCustomFieldsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.paging.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CustomFieldIdArgs {
    /// Custom field UUID
    pub custom_field_id: String,
}

impl Validate for CustomFieldIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("custom_field_id", &self.custom_field_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateCustomFieldArgs {
    /// Field name (1-255 characters)
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Kind of values the field accepts
    pub value_type: ValueType,
    /// Allowed values; required for `text_list`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl Validate for CreateCustomFieldArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_len_between("name", &self.name, 1, 255)?;
        let has_values = self.values.as_ref().is_some_and(|values| !values.is_empty());
        if self.value_type == ValueType::TextList && !has_values {
            return Err(ToolError::invalid("values are required for text_list custom fields"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateCustomFieldArgs {
    /// Custom field UUID
    #[serde(skip_serializing)]
    pub custom_field_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl Validate for UpdateCustomFieldArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("custom_field_id", &self.custom_field_id)?;
        if let Some(name) = &self.name {
            ensure_len_between("name", name, 1, 255)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CustomFieldOwnersArgs {
    /// Custom field UUID
    #[serde(skip_serializing)]
    pub custom_field_id: String,
    #[serde(flatten)]
    pub paging: PageArgs,
}

impl Validate for CustomFieldOwnersArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("custom_field_id", &self.custom_field_id)?;
        self.paging.check()
    }
}

/// Values attached to one owner for one custom field.
#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct FieldValues {
    /// Custom field UUID
    pub id: String,
    /// Values to attach; an empty list detaches the field
    pub values: Vec<String>,
}

pub(crate) fn check_field_values(fields: &[FieldValues]) -> Result<(), ToolError> {
    if fields.is_empty() {
        return Err(ToolError::invalid("custom_fields must contain at least one entry"));
    }
    fields.iter().try_for_each(|field| ensure_not_blank("custom_fields.id", &field.id))
}

/// Tool names and descriptions for one catalogue.
pub(crate) struct FieldCatalog {
    pub base: &'static str,
    pub list: (&'static str, &'static str),
    pub get: (&'static str, &'static str),
    pub create: (&'static str, &'static str),
    pub update: (&'static str, &'static str),
    pub delete: (&'static str, &'static str),
    pub owners: (&'static str, &'static str),
}

impl FieldCatalog {
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListCustomFieldsArgs>(self.list.0, self.list.1),
            ToolDefinition::new::<CustomFieldIdArgs>(self.get.0, self.get.1),
            ToolDefinition::new::<CreateCustomFieldArgs>(self.create.0, self.create.1),
            ToolDefinition::new::<UpdateCustomFieldArgs>(self.update.0, self.update.1),
            ToolDefinition::new::<CustomFieldIdArgs>(self.delete.0, self.delete.1),
            ToolDefinition::new::<CustomFieldOwnersArgs>(self.owners.0, self.owners.1),
        ]
    }

    fn field_path(&self, id: &str) -> String {
        format!("{}/{}", self.base, path_segment(id.trim()))
    }

    pub async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        if name == self.list.0 {
            let args: ListCustomFieldsArgs = parse(args)?;
            fetch_page(api, self.base, query_from(&args), &args.paging).await
        } else if name == self.get.0 {
            let args: CustomFieldIdArgs = parse(args)?;
            Ok(api.get(&self.field_path(&args.custom_field_id), Vec::new()).await?)
        } else if name == self.create.0 {
            let args: CreateCustomFieldArgs = parse(args)?;
            Ok(api.post(self.base, to_body(&args)?).await?)
        } else if name == self.update.0 {
            let args: UpdateCustomFieldArgs = parse(args)?;
            Ok(api.put(&self.field_path(&args.custom_field_id), to_body(&args)?).await?)
        } else if name == self.delete.0 {
            let args: CustomFieldIdArgs = parse(args)?;
            api.delete(&self.field_path(&args.custom_field_id)).await?;
            Ok(acknowledged(format!("Custom field {} deleted successfully", args.custom_field_id)))
        } else if name == self.owners.0 {
            let args: CustomFieldOwnersArgs = parse(args)?;
            let path = format!("{}/owners", self.field_path(&args.custom_field_id));
            fetch_page(api, &path, query_from(&args), &args.paging).await
        } else {
            Err(ToolError::UnknownTool(name.to_string()))
        }
    }
}
