//! Products, their variants, images and per-product custom field values.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_len, ensure_not_blank, ensure_positive, ensure_url, parse, path_segment, query_from,
    to_body, ListArgs, PageArgs, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::fetch_page;

pub(crate) const DELETE_DISABLED: &str = "Delete operations are disabled by policy";

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    User,
    PriceAscending,
    PriceDescending,
    CostAscending,
    CostDescending,
    AlphaAscending,
    AlphaDescending,
    NameAscending,
    NameDescending,
    CreatedAtAscending,
    CreatedAtDescending,
    BestSelling,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListProductsArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Comma-separated list of product IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids: Option<String>,
    /// Language code (es, pt, en) for localized content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Free-text search over name, SKU and tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Product URL handle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    /// Only products in this category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    /// Filter by publication status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// Filter by free shipping
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_shipping: Option<bool>,
    /// Only products with at most this much stock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stock: Option<u64>,
    /// Only products with at least this much stock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stock: Option<u64>,
    /// Only products with (or without) a promotional price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_promotional_price: Option<bool>,
    /// Only products with (or without) a weight
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_weight: Option<bool>,
    /// Only products with (or without) width, height and depth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_all_dimensions: Option<bool>,
    /// Only products with (or without) weight and all dimensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_weight_and_all_dimensions: Option<bool>,
    /// Sort order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<ProductSort>,
}

impl Validate for ListProductsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()?;
        check_language(&self.language)?;
        if let Some(category_id) = self.category_id {
            ensure_positive("category_id", category_id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetProductArgs {
    /// Product ID
    #[serde(skip_serializing)]
    pub product_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    /// Language code (es, pt, en) for localized content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Validate for GetProductArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        check_language(&self.language)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductBySkuArgs {
    /// Variant SKU
    pub sku: String,
}

impl Validate for ProductBySkuArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("sku", &self.sku)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchProductsArgs {
    /// Search query to find products
    pub query: String,
    #[serde(flatten)]
    pub paging: PageArgs,
    /// Language code (es, pt, en) for localized content
    pub language: Option<String>,
    /// Filter by category ID
    pub category_id: Option<u64>,
    /// Filter by publication status
    pub published: Option<bool>,
}

impl Validate for SearchProductsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_not_blank("query", &self.query)?;
        self.paging.check()?;
        check_language(&self.language)?;
        if let Some(category_id) = self.category_id {
            ensure_positive("category_id", category_id)?;
        }
        Ok(())
    }
}

/// Variant attributes other than price.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct VariantDetails {
    /// Promotional (sale) price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotional_price: Option<String>,
    /// Units in stock
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u64>,
    /// Whether the store tracks stock for this variant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_management: Option<bool>,
    /// Stock keeping unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Weight in kg
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    /// Width in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// Height in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    /// Depth in cm
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<String>,
    /// Cost price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
}

impl VariantDetails {
    fn is_empty(&self) -> bool {
        self.promotional_price.is_none()
            && self.stock.is_none()
            && self.stock_management.is_none()
            && self.sku.is_none()
            && self.weight.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.depth.is_none()
            && self.cost.is_none()
    }
}

/// Product-level attributes shared by create and update.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ProductAttributes {
    /// Whether the product is visible in the storefront
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// Whether the product ships for free
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_shipping: Option<bool>,
    /// Whether the product needs shipping (false for digital goods)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_shipping: Option<bool>,
    /// Brand name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Product video URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// SEO title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    /// SEO description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    /// Comma-separated tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    /// Category IDs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<u64>>,
}

impl ProductAttributes {
    fn check(&self) -> Result<(), ToolError> {
        if let Some(url) = &self.video_url {
            ensure_url("video_url", url)?;
        }
        for category in self.categories.iter().flatten() {
            ensure_positive("categories", *category)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProductArgs {
    /// Product name in Spanish (required)
    pub name_es: String,
    /// Product name in Portuguese
    pub name_pt: Option<String>,
    /// Product name in English
    pub name_en: Option<String>,
    /// Product description in Spanish (HTML allowed)
    pub description_es: Option<String>,
    /// Product description in Portuguese (HTML allowed)
    pub description_pt: Option<String>,
    /// Product description in English (HTML allowed)
    pub description_en: Option<String>,
    /// Price of the default variant
    pub price: String,
    #[serde(flatten)]
    pub variant: VariantDetails,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
    /// Image URLs, added in order
    pub image_urls: Option<Vec<String>>,
}

impl Validate for CreateProductArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if self.name_es.is_empty() {
            return Err(ToolError::invalid("Spanish name is required"));
        }
        if self.price.is_empty() {
            return Err(ToolError::invalid("Price is required"));
        }
        self.attributes.check()?;
        for url in self.image_urls.iter().flatten() {
            ensure_url("image_urls", url)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateProductArgs {
    /// Product ID
    pub product_id: u64,
    /// Product name in Spanish
    pub name_es: Option<String>,
    /// Product name in Portuguese
    pub name_pt: Option<String>,
    /// Product name in English
    pub name_en: Option<String>,
    /// Product description in Spanish
    pub description_es: Option<String>,
    /// Product description in Portuguese
    pub description_pt: Option<String>,
    /// Product description in English
    pub description_en: Option<String>,
    /// Price of the default variant
    pub price: Option<String>,
    #[serde(flatten)]
    pub variant: VariantDetails,
    #[serde(flatten)]
    pub attributes: ProductAttributes,
}

impl Validate for UpdateProductArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        self.attributes.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StockPriceEntry {
    /// Product or variant ID
    pub id: u64,
    /// New price
    pub price: Option<String>,
    /// New stock
    pub stock: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateStockPriceArgs {
    /// Products or variants to update
    pub products: Vec<StockPriceEntry>,
}

impl Validate for UpdateStockPriceArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        if self.products.is_empty() {
            return Err(ToolError::invalid("products must contain at least one entry"));
        }
        for entry in &self.products {
            ensure_positive("products[].id", entry.id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProductIdArgs {
    /// Product ID
    pub product_id: u64,
}

impl Validate for ProductIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VariantIdArgs {
    /// Product ID
    pub product_id: u64,
    /// Variant ID
    pub variant_id: u64,
}

impl Validate for VariantIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_positive("variant_id", self.variant_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateVariantArgs {
    /// Product ID
    #[serde(skip_serializing)]
    pub product_id: u64,
    /// Variant price
    pub price: String,
    #[serde(flatten)]
    pub details: VariantDetails,
}

impl Validate for CreateVariantArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_not_blank("price", &self.price)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateVariantArgs {
    /// Product ID
    #[serde(skip_serializing)]
    pub product_id: u64,
    /// Variant ID
    #[serde(skip_serializing)]
    pub variant_id: u64,
    /// Variant price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(flatten)]
    pub details: VariantDetails,
}

impl Validate for UpdateVariantArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_positive("variant_id", self.variant_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateImageArgs {
    /// Product ID
    #[serde(skip_serializing)]
    pub product_id: u64,
    /// Public URL of the image
    pub src: String,
    /// Position in the gallery, starting at 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    /// Alternative texts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<Vec<String>>,
}

impl Validate for CreateImageArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_url("src", &self.src)?;
        if let Some(position) = self.position {
            ensure_positive("position", position)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateImageArgs {
    /// Product ID
    #[serde(skip_serializing)]
    pub product_id: u64,
    /// Image ID
    #[serde(skip_serializing)]
    pub image_id: u64,
    /// Public URL of the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Position in the gallery, starting at 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    /// Alternative texts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<Vec<String>>,
}

impl Validate for UpdateImageArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_positive("image_id", self.image_id)?;
        if let Some(src) = &self.src {
            ensure_url("src", src)?;
        }
        if let Some(position) = self.position {
            ensure_positive("position", position)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImageIdArgs {
    /// Product ID
    pub product_id: u64,
    /// Image ID
    pub image_id: u64,
}

impl Validate for ImageIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_positive("image_id", self.image_id)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCustomFieldValuesArgs {
    /// Product ID
    pub product_id: u64,
    /// Key-value pairs of custom fields (string, number, boolean or null)
    pub custom_fields: Map<String, Value>,
}

impl Validate for UpdateCustomFieldValuesArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_scalar_values(&self.custom_fields)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateVariantCustomFieldValuesArgs {
    /// Product ID
    pub product_id: u64,
    /// Variant ID
    pub variant_id: u64,
    /// Key-value pairs of custom fields (string, number, boolean or null)
    pub custom_fields: Map<String, Value>,
}

impl Validate for UpdateVariantCustomFieldValuesArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("product_id", self.product_id)?;
        ensure_positive("variant_id", self.variant_id)?;
        ensure_scalar_values(&self.custom_fields)
    }
}

pub struct ProductTools;

#[async_trait]
impl ToolCategory for ProductTools {
    fn category_name(&self) -> &'static str {
        "products"
    }

    fn domain(&self) -> Domain {
        Domain::Product
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListProductsArgs>(
                "tiendanube_list_products",
                "List products with pagination and filters: text search, category, \
                 publication status, stock ranges, dates and sort order.",
            ),
            ToolDefinition::new::<GetProductArgs>(
                "tiendanube_get_product",
                "Get a product by ID, including variants, images and categories.",
            ),
            ToolDefinition::new::<ProductBySkuArgs>(
                "tiendanube_get_product_by_sku",
                "Get the product that owns the variant with the given SKU.",
            ),
            ToolDefinition::new::<SearchProductsArgs>(
                "tiendanube_search_products",
                "Search products by text, optionally filtered by category and publication status.",
            ),
            ToolDefinition::new::<CreateProductArgs>(
                "tiendanube_create_product",
                "Create a product. Requires a Spanish name and a price; accepts other \
                 languages, a default variant, images, categories and SEO metadata.",
            ),
            ToolDefinition::new::<UpdateProductArgs>(
                "tiendanube_update_product",
                "Update a product. Only the fields provided are changed; price and stock \
                 fields apply to the default variant.",
            ),
            ToolDefinition::new::<ProductIdArgs>(
                "tiendanube_delete_product",
                "Delete a product. Disabled in this server; always refused.",
            ),
            ToolDefinition::new::<UpdateStockPriceArgs>(
                "tiendanube_update_stock_and_price",
                "Update the stock and/or price of several products or variants at once.",
            ),
            ToolDefinition::new::<ProductIdArgs>(
                "tiendanube_list_product_variants",
                "List the variants of a product.",
            ),
            ToolDefinition::new::<VariantIdArgs>(
                "tiendanube_get_product_variant",
                "Get one variant of a product.",
            ),
            ToolDefinition::new::<CreateVariantArgs>(
                "tiendanube_create_product_variant",
                "Add a variant to a product. Requires a price.",
            ),
            ToolDefinition::new::<UpdateVariantArgs>(
                "tiendanube_update_product_variant",
                "Update price, stock, SKU or dimensions of a product variant.",
            ),
            ToolDefinition::new::<VariantIdArgs>(
                "tiendanube_delete_product_variant",
                "Delete a product variant. Disabled in this server; always refused.",
            ),
            ToolDefinition::new::<ProductIdArgs>(
                "tiendanube_list_product_images",
                "List the images of a product.",
            ),
            ToolDefinition::new::<CreateImageArgs>(
                "tiendanube_create_product_image",
                "Add an image to a product from a public URL.",
            ),
            ToolDefinition::new::<UpdateImageArgs>(
                "tiendanube_update_product_image",
                "Change the URL, position or alt texts of a product image.",
            ),
            ToolDefinition::new::<ImageIdArgs>(
                "tiendanube_delete_product_image",
                "Delete a product image. Disabled in this server; always refused.",
            ),
            ToolDefinition::new::<ProductIdArgs>(
                "tiendanube_get_product_custom_fields",
                "Get the custom field values set on a product.",
            ),
            ToolDefinition::new::<UpdateCustomFieldValuesArgs>(
                "tiendanube_update_product_custom_fields",
                "Replace or set the custom field values of a product.",
            ),
            ToolDefinition::new::<VariantIdArgs>(
                "tiendanube_get_product_variant_custom_fields",
                "Get the custom field values set on a product variant.",
            ),
            ToolDefinition::new::<UpdateVariantCustomFieldValuesArgs>(
                "tiendanube_update_product_variant_custom_fields",
                "Replace or set the custom field values of a product variant.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_products" => {
                let args: ListProductsArgs = parse(args)?;
                fetch_page(api, "/products", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_product" => {
                let args: GetProductArgs = parse(args)?;
                let path = format!("/products/{}", args.product_id);
                Ok(api.get(&path, query_from(&args)).await?)
            }
            "tiendanube_get_product_by_sku" => {
                let args: ProductBySkuArgs = parse(args)?;
                let path = format!("/products/sku/{}", path_segment(&args.sku));
                Ok(api.get(&path, Vec::new()).await?)
            }
            "tiendanube_search_products" => search_products(api, parse(args)?).await,
            "tiendanube_create_product" => {
                let args: CreateProductArgs = parse(args)?;
                Ok(api.post("/products", create_product_body(&args)).await?)
            }
            "tiendanube_update_product" => {
                let args: UpdateProductArgs = parse(args)?;
                let path = format!("/products/{}", args.product_id);
                Ok(api.put(&path, update_product_body(&args)?).await?)
            }
            "tiendanube_update_stock_and_price" => {
                let args: UpdateStockPriceArgs = parse(args)?;
                let products: Vec<Value> = args
                    .products
                    .iter()
                    .map(|entry| {
                        let mut item = json!({ "id": entry.id });
                        if let Some(price) = &entry.price {
                            item["price"] = json!(price);
                        }
                        if let Some(stock) = entry.stock {
                            item["stock"] = json!(stock);
                        }
                        item
                    })
                    .collect();
                Ok(api.patch("/products/stock-price", json!({ "products": products })).await?)
            }
            "tiendanube_list_product_variants" => {
                let args: ProductIdArgs = parse(args)?;
                Ok(api.get(&format!("/products/{}/variants", args.product_id), Vec::new()).await?)
            }
            "tiendanube_get_product_variant" => {
                let args: VariantIdArgs = parse(args)?;
                let path = format!("/products/{}/variants/{}", args.product_id, args.variant_id);
                Ok(api.get(&path, Vec::new()).await?)
            }
            "tiendanube_create_product_variant" => {
                let args: CreateVariantArgs = parse(args)?;
                let path = format!("/products/{}/variants", args.product_id);
                Ok(api.post(&path, to_body(&args)?).await?)
            }
            "tiendanube_update_product_variant" => {
                let args: UpdateVariantArgs = parse(args)?;
                let path = format!("/products/{}/variants/{}", args.product_id, args.variant_id);
                Ok(api.put(&path, to_body(&args)?).await?)
            }
            "tiendanube_list_product_images" => {
                let args: ProductIdArgs = parse(args)?;
                Ok(api.get(&format!("/products/{}/images", args.product_id), Vec::new()).await?)
            }
            "tiendanube_create_product_image" => {
                let args: CreateImageArgs = parse(args)?;
                let path = format!("/products/{}/images", args.product_id);
                Ok(api.post(&path, to_body(&args)?).await?)
            }
            "tiendanube_update_product_image" => {
                let args: UpdateImageArgs = parse(args)?;
                let path = format!("/products/{}/images/{}", args.product_id, args.image_id);
                Ok(api.put(&path, to_body(&args)?).await?)
            }
            "tiendanube_delete_product" => {
                parse::<ProductIdArgs>(args)?;
                Err(ToolError::Policy(DELETE_DISABLED.to_string()))
            }
            "tiendanube_delete_product_variant" => {
                parse::<VariantIdArgs>(args)?;
                Err(ToolError::Policy(DELETE_DISABLED.to_string()))
            }
            "tiendanube_delete_product_image" => {
                parse::<ImageIdArgs>(args)?;
                Err(ToolError::Policy(DELETE_DISABLED.to_string()))
            }
            "tiendanube_get_product_custom_fields" => {
                let args: ProductIdArgs = parse(args)?;
                let path = format!("/products/{}/custom_fields", args.product_id);
                Ok(api.get(&path, Vec::new()).await?)
            }
            "tiendanube_update_product_custom_fields" => {
                let args: UpdateCustomFieldValuesArgs = parse(args)?;
                let path = format!("/products/{}/custom_fields", args.product_id);
                Ok(api.put(&path, Value::Object(args.custom_fields)).await?)
            }
            "tiendanube_get_product_variant_custom_fields" => {
                let args: VariantIdArgs = parse(args)?;
                let path = format!(
                    "/products/{}/variants/{}/custom_fields",
                    args.product_id, args.variant_id
                );
                Ok(api.get(&path, Vec::new()).await?)
            }
            "tiendanube_update_product_variant_custom_fields" => {
                let args: UpdateVariantCustomFieldValuesArgs = parse(args)?;
                let path = format!(
                    "/products/{}/variants/{}/custom_fields",
                    args.product_id, args.variant_id
                );
                Ok(api.put(&path, Value::Object(args.custom_fields)).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

async fn search_products(api: &dyn StoreApi, args: SearchProductsArgs) -> Result<Value, ToolError> {
    let mut query = vec![("q".to_string(), args.query.clone())];
    query.extend(query_from(&args.paging));
    if let Some(language) = &args.language {
        query.push(("language".to_string(), language.clone()));
    }
    if let Some(category_id) = args.category_id {
        query.push(("category_id".to_string(), category_id.to_string()));
    }
    if let Some(published) = args.published {
        query.push(("published".to_string(), published.to_string()));
    }
    fetch_page(api, "/products", query, &args.paging).await
}

fn create_product_body(args: &CreateProductArgs) -> Value {
    let variant = &args.variant;
    let attributes = &args.attributes;

    let mut body = json!({
        "name": localized([&Some(args.name_es.clone()), &args.name_pt, &args.name_en]),
        "description": localized([&args.description_es, &args.description_pt, &args.description_en]),
        "variants": [{
            "price": args.price,
            "promotional_price": non_empty(&variant.promotional_price),
            "stock": variant.stock.unwrap_or(0),
            "stock_management": variant.stock_management.unwrap_or(false),
            "sku": non_empty(&variant.sku),
            "weight": non_empty(&variant.weight),
            "width": non_empty(&variant.width),
            "height": non_empty(&variant.height),
            "depth": non_empty(&variant.depth),
            "cost": non_empty(&variant.cost),
        }],
        "published": attributes.published.unwrap_or(true),
        "free_shipping": attributes.free_shipping.unwrap_or(false),
        "requires_shipping": attributes.requires_shipping != Some(false),
        "brand": non_empty(&attributes.brand),
        "video_url": non_empty(&attributes.video_url),
        "seo_title": non_empty(&attributes.seo_title),
        "seo_description": non_empty(&attributes.seo_description),
        "tags": non_empty(&attributes.tags),
        "categories": attributes.categories.clone().unwrap_or_default(),
    });

    let images: Vec<Value> = args
        .image_urls
        .iter()
        .flatten()
        .enumerate()
        .map(|(index, src)| json!({ "src": src, "position": index + 1 }))
        .collect();
    if !images.is_empty() {
        body["images"] = Value::Array(images);
    }

    body
}

fn update_product_body(args: &UpdateProductArgs) -> Result<Value, ToolError> {
    let mut body = match to_body(&args.attributes)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let names = [&args.name_es, &args.name_pt, &args.name_en];
    if names.iter().any(|name| name.is_some()) {
        body.insert("name".to_string(), localized(names));
    }
    let descriptions = [&args.description_es, &args.description_pt, &args.description_en];
    if descriptions.iter().any(|description| description.is_some()) {
        body.insert("description".to_string(), localized(descriptions));
    }

    if args.price.is_some() || !args.variant.is_empty() {
        let mut variant = match to_body(&args.variant)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        if let Some(price) = &args.price {
            variant.insert("price".to_string(), json!(price));
        }
        body.insert("variants".to_string(), json!([variant]));
    }

    Ok(Value::Object(body))
}

/// `{es, pt, en}` object holding only the non-empty translations.
pub(crate) fn localized(values: [&Option<String>; 3]) -> Value {
    let map: Map<String, Value> = ["es", "pt", "en"]
        .into_iter()
        .zip(values)
        .filter_map(|(lang, value)| match value.as_deref() {
            Some(text) if !text.is_empty() => Some((lang.to_string(), json!(text))),
            _ => None,
        })
        .collect();
    Value::Object(map)
}

pub(crate) fn non_empty(value: &Option<String>) -> Value {
    match value.as_deref() {
        Some(text) if !text.is_empty() => json!(text),
        _ => Value::Null,
    }
}

pub(crate) fn check_language(language: &Option<String>) -> Result<(), ToolError> {
    match language {
        Some(language) => ensure_len("language", language, 2),
        None => Ok(()),
    }
}

pub(crate) fn ensure_scalar_values(fields: &Map<String, Value>) -> Result<(), ToolError> {
    for (key, value) in fields {
        if matches!(value, Value::Array(_) | Value::Object(_)) {
            return Err(ToolError::invalid(format!(
                "custom_fields.{key} must be a string, number, boolean or null"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tiendanube_client::Method;

    use super::{ProductSort, ProductTools};
    use crate::args::wire_name;
    use crate::error::ToolError;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn list_products_forwards_filters_and_wraps_pagination() {
        let api = RecordingApi::new().respond(json!([{"id": 1}, {"id": 2}]));

        let result = ProductTools
            .call(
                "tiendanube_list_products",
                json!({
                    "per_page": 2,
                    "q": "remera",
                    "published": true,
                    "sort_by": "price-descending",
                    "created_at_min": "2024-05-01",
                }),
                &api,
            )
            .await
            .expect("listed");

        let request = api.last();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/products");
        assert_eq!(api.query("sort_by").as_deref(), Some("price-descending"));
        assert_eq!(api.query("published").as_deref(), Some("true"));
        assert_eq!(api.query("created_at_min").as_deref(), Some("2024-05-01T00:00:00.000Z"));
        assert_eq!(result["data"][1]["id"], 2);
        assert_eq!(result["pagination"]["per_page"], 2);
        assert_eq!(result["pagination"]["has_next"], true);
    }

    #[tokio::test]
    async fn create_product_builds_localized_body_with_defaults() {
        let api = RecordingApi::new();

        ProductTools
            .call(
                "tiendanube_create_product",
                json!({
                    "name_es": "Remera",
                    "name_en": "T-shirt",
                    "price": "1500.00",
                    "stock": 4,
                    "image_urls": ["https://cdn.example.com/a.jpg", "https://cdn.example.com/b.jpg"],
                }),
                &api,
            )
            .await
            .expect("created");

        let body = api.last().body.expect("body");
        assert_eq!(body["name"], json!({"es": "Remera", "en": "T-shirt"}));
        assert_eq!(body["description"], json!({}));
        assert_eq!(body["variants"][0]["price"], "1500.00");
        assert_eq!(body["variants"][0]["stock"], 4);
        assert_eq!(body["variants"][0]["sku"], json!(null));
        assert_eq!(body["published"], true);
        assert_eq!(body["requires_shipping"], true);
        assert_eq!(body["tags"], json!(null));
        assert_eq!(body["categories"], json!([]));
        assert_eq!(body["images"][1], json!({"src": "https://cdn.example.com/b.jpg", "position": 2}));
    }

    #[tokio::test]
    async fn update_product_only_sends_touched_groups() {
        let api = RecordingApi::new();

        ProductTools
            .call(
                "tiendanube_update_product",
                json!({"product_id": 10, "stock": 0, "brand": "Acme"}),
                &api,
            )
            .await
            .expect("updated");

        let request = api.last();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/products/10");
        assert_eq!(request.body, Some(json!({"brand": "Acme", "variants": [{"stock": 0}]})));
    }

    #[tokio::test]
    async fn sku_is_percent_encoded() {
        let api = RecordingApi::new();

        ProductTools
            .call("tiendanube_get_product_by_sku", json!({"sku": "REM 01/A"}), &api)
            .await
            .expect("found");

        assert_eq!(api.last().path, "/products/sku/REM%2001%2FA");
    }

    #[tokio::test]
    async fn deletes_are_refused_without_a_request() {
        let api = RecordingApi::new();

        for (name, args) in [
            ("tiendanube_delete_product", json!({"product_id": 1})),
            ("tiendanube_delete_product_variant", json!({"product_id": 1, "variant_id": 2})),
            ("tiendanube_delete_product_image", json!({"product_id": 1, "image_id": 3})),
        ] {
            let error = ProductTools.call(name, args, &api).await.expect_err("refused");
            assert!(matches!(error, ToolError::Policy(ref message) if message == super::DELETE_DISABLED));
        }

        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_store() {
        let api = RecordingApi::new();

        let missing_price = ProductTools
            .call("tiendanube_create_product", json!({"name_es": "Remera", "price": ""}), &api)
            .await
            .expect_err("empty price");
        assert_eq!(missing_price.to_string(), "invalid arguments: Price is required");

        let bad_image = ProductTools
            .call(
                "tiendanube_create_product_image",
                json!({"product_id": 4, "src": "not-a-url"}),
                &api,
            )
            .await
            .expect_err("bad src");
        assert!(bad_image.to_string().contains("src"));

        let nested = ProductTools
            .call(
                "tiendanube_update_product_custom_fields",
                json!({"product_id": 4, "custom_fields": {"color": ["red"]}}),
                &api,
            )
            .await
            .expect_err("nested value");
        assert!(nested.to_string().contains("custom_fields.color"));

        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn stock_and_price_patch_keeps_only_given_fields() {
        let api = RecordingApi::new();

        ProductTools
            .call(
                "tiendanube_update_stock_and_price",
                json!({"products": [{"id": 5, "stock": 12}, {"id": 6, "price": "99.90"}]}),
                &api,
            )
            .await
            .expect("patched");

        let request = api.last();
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.path, "/products/stock-price");
        assert_eq!(
            request.body,
            Some(json!({"products": [{"id": 5, "stock": 12}, {"id": 6, "price": "99.90"}]}))
        );
    }

    #[test]
    fn sort_options_use_kebab_case() {
        assert_eq!(wire_name(&ProductSort::CreatedAtDescending), "created-at-descending");
        assert_eq!(wire_name(&ProductSort::BestSelling), "best-selling");
    }
}
