use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tiendanube_client::StoreApi;

use crate::args::{ensure_positive, parse, query_from, ListArgs, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::products::{check_language, localized, non_empty};
use crate::tools::{acknowledged, fetch_page};

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListCategoriesArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Language code (es, pt, en) for localized content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Search by name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Only direct children of this category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<u64>,
}

impl Validate for ListCategoriesArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()?;
        check_language(&self.language)?;
        if let Some(parent_id) = self.parent_id {
            ensure_positive("parent_id", parent_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetCategoryArgs {
    /// Category ID
    #[serde(skip_serializing)]
    pub category_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    /// Language code (es, pt, en) for localized content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Validate for GetCategoryArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("category_id", self.category_id)?;
        check_language(&self.language)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCategoryArgs {
    /// Category name in Spanish (required)
    pub name_es: String,
    /// Category name in Portuguese
    pub name_pt: Option<String>,
    /// Category name in English
    pub name_en: Option<String>,
    /// Description in Spanish
    pub description_es: Option<String>,
    /// Description in Portuguese
    pub description_pt: Option<String>,
    /// Description in English
    pub description_en: Option<String>,
    /// Parent category ID
    pub parent_id: Option<u64>,
    /// Google Shopping taxonomy category
    pub google_shopping_category: Option<String>,
}

impl Validate for CreateCategoryArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if self.name_es.is_empty() {
            return Err(ToolError::invalid("Spanish name is required"));
        }
        if let Some(parent_id) = self.parent_id {
            ensure_positive("parent_id", parent_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCategoryArgs {
    /// Category ID
    pub category_id: u64,
    /// Category name in Spanish
    pub name_es: Option<String>,
    /// Category name in Portuguese
    pub name_pt: Option<String>,
    /// Category name in English
    pub name_en: Option<String>,
    /// Description in Spanish
    pub description_es: Option<String>,
    /// Description in Portuguese
    pub description_pt: Option<String>,
    /// Description in English
    pub description_en: Option<String>,
    /// Parent category ID
    pub parent_id: Option<u64>,
    /// Google Shopping taxonomy category
    pub google_shopping_category: Option<String>,
}

impl Validate for UpdateCategoryArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("category_id", self.category_id)?;
        if let Some(parent_id) = self.parent_id {
            ensure_positive("parent_id", parent_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CategoryIdArgs {
    /// Category ID
    pub category_id: u64,
}

impl Validate for CategoryIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("category_id", self.category_id)
    }
}

pub struct CategoryTools;

#[async_trait]
impl ToolCategory for CategoryTools {
    fn category_name(&self) -> &'static str {
        "categories"
    }

    fn domain(&self) -> Domain {
        Domain::Category
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListCategoriesArgs>(
                "tiendanube_list_categories",
                "List product categories with pagination, parent and date filters.",
            ),
            ToolDefinition::new::<GetCategoryArgs>(
                "tiendanube_get_category",
                "Get a category by ID.",
            ),
            ToolDefinition::new::<CreateCategoryArgs>(
                "tiendanube_create_category",
                "Create a category, optionally nested under a parent category.",
            ),
            ToolDefinition::new::<UpdateCategoryArgs>(
                "tiendanube_update_category",
                "Update the names, descriptions or parent of a category.",
            ),
            ToolDefinition::new::<CategoryIdArgs>(
                "tiendanube_delete_category",
                "Delete a category.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_categories" => {
                let args: ListCategoriesArgs = parse(args)?;
                fetch_page(api, "/categories", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_category" => {
                let args: GetCategoryArgs = parse(args)?;
                let path = format!("/categories/{}", args.category_id);
                Ok(api.get(&path, query_from(&args)).await?)
            }
            "tiendanube_create_category" => {
                let args: CreateCategoryArgs = parse(args)?;
                let body = json!({
                    "name": localized([&Some(args.name_es.clone()), &args.name_pt, &args.name_en]),
                    "description": localized([&args.description_es, &args.description_pt, &args.description_en]),
                    "parent": args.parent_id,
                    "google_shopping_category": non_empty(&args.google_shopping_category),
                });
                Ok(api.post("/categories", body).await?)
            }
            "tiendanube_update_category" => {
                let args: UpdateCategoryArgs = parse(args)?;
                let path = format!("/categories/{}", args.category_id);
                Ok(api.put(&path, update_category_body(&args)).await?)
            }
            "tiendanube_delete_category" => {
                let args: CategoryIdArgs = parse(args)?;
                api.delete(&format!("/categories/{}", args.category_id)).await?;
                Ok(acknowledged(format!("Category {} deleted successfully", args.category_id)))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

fn update_category_body(args: &UpdateCategoryArgs) -> Value {
    let mut body = Map::new();

    let names = [&args.name_es, &args.name_pt, &args.name_en];
    if names.iter().any(|name| name.is_some()) {
        body.insert("name".to_string(), localized(names));
    }
    let descriptions = [&args.description_es, &args.description_pt, &args.description_en];
    if descriptions.iter().any(|description| description.is_some()) {
        body.insert("description".to_string(), localized(descriptions));
    }
    if let Some(parent_id) = args.parent_id {
        body.insert("parent".to_string(), json!(parent_id));
    }
    if let Some(category) = &args.google_shopping_category {
        body.insert("google_shopping_category".to_string(), json!(category));
    }

    Value::Object(body)
}
