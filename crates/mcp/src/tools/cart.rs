//! Storefront carts. A cart is addressed either by numeric id or by token, and
//! stores disagree on whether the collection lives at `/carts` or `/cart`, so
//! every call walks both candidates.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tiendanube_client::{ApiRequest, StoreApi};

use crate::args::{ensure_not_blank, ensure_positive, parse, path_segment, Validate};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{first_found, or_success};

const CART_NOT_FOUND: &str = "Cart not found using provided identifier";

/// Identifies a cart by exactly one of `cart_id` or `cart_token`.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CartRef {
    /// Cart numeric ID
    pub cart_id: Option<u64>,
    /// Cart token
    pub cart_token: Option<String>,
}

impl CartRef {
    fn check(&self) -> Result<(), ToolError> {
        match (self.cart_id, self.cart_token.as_deref()) {
            (Some(id), None) => ensure_positive("cart_id", id),
            (None, Some(token)) => ensure_not_blank("cart_token", token),
            (None, None) => Err(ToolError::invalid("either cart_id or cart_token is required")),
            (Some(_), Some(_)) => {
                Err(ToolError::invalid("provide only one of cart_id or cart_token"))
            }
        }
    }

    /// Candidate paths for `suffix` (empty, `/items`, `/coupon`, ...).
    /// Numeric ids try `/carts` first, tokens try `/cart` first.
    fn candidates(&self, suffix: &str) -> Vec<String> {
        let (key, order) = match (self.cart_id, &self.cart_token) {
            (Some(id), _) => (id.to_string(), ["carts", "cart"]),
            (None, Some(token)) => (path_segment(token), ["cart", "carts"]),
            (None, None) => return Vec::new(),
        };
        order.iter().map(|collection| format!("/{collection}/{key}{suffix}")).collect()
    }

    async fn fetch(&self, api: &dyn StoreApi) -> Result<Value, ToolError> {
        let response =
            first_found(api, &self.candidates(""), CART_NOT_FOUND, |path| ApiRequest::get(path))
                .await?;
        Ok(response.body)
    }

    /// Deletes one line, treating a line that is already gone as removed.
    async fn delete_line(&self, api: &dyn StoreApi, line_id: u64) -> Result<bool, ToolError> {
        for path in self.candidates(&format!("/items/{line_id}")) {
            match api.send(ApiRequest::delete(path)).await {
                Err(error) if error.status() == Some(404) => continue,
                outcome => {
                    outcome?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    async fn add_line(
        &self,
        api: &dyn StoreApi,
        variant_id: u64,
        quantity: u32,
    ) -> Result<Value, ToolError> {
        let body = json!({ "variant_id": variant_id, "quantity": quantity });
        let response =
            first_found(api, &self.candidates("/items"), "Failed to add item: cart not found", |path| {
                ApiRequest::post(path, body.clone())
            })
            .await?;
        Ok(response.body)
    }
}

/// Line items of a cart; older payloads call them `products`.
fn cart_lines(cart: &Value) -> &[Value] {
    cart.get("items")
        .or_else(|| cart.get("products"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn line_variant(line: &Value) -> Option<u64> {
    line.get("variant_id")
        .and_then(Value::as_u64)
        .or_else(|| line.pointer("/variant/id").and_then(Value::as_u64))
}

fn line_for_variant(cart: &Value, variant_id: u64) -> Option<u64> {
    cart_lines(cart)
        .iter()
        .find(|line| line_variant(line) == Some(variant_id))
        .and_then(|line| line.get("id").and_then(Value::as_u64))
}

fn variant_for_line(cart: &Value, line_id: u64) -> Option<u64> {
    cart_lines(cart)
        .iter()
        .find(|line| line.get("id").and_then(Value::as_u64) == Some(line_id))
        .and_then(line_variant)
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetCartArgs {
    #[serde(flatten)]
    pub cart: CartRef,
    /// Comma-separated list of fields to include in the response
    pub fields: Option<String>,
}

impl Validate for GetCartArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.cart.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddCartItemArgs {
    #[serde(flatten)]
    pub cart: CartRef,
    /// Variant ID to add
    pub variant_id: u64,
    /// Quantity to add (at least 1)
    pub quantity: u32,
}

impl Validate for AddCartItemArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.cart.check()?;
        ensure_positive("variant_id", self.variant_id)?;
        ensure_positive("quantity", u64::from(self.quantity))
    }
}

/// A cart line, given directly or through the variant it holds.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct LineSelector {
    /// Cart line item ID
    pub item_id: Option<u64>,
    /// Variant ID, used to find the line when item_id is absent
    pub variant_id: Option<u64>,
}

impl LineSelector {
    fn check(&self) -> Result<(), ToolError> {
        match (self.item_id, self.variant_id) {
            (None, None) => Err(ToolError::invalid("either item_id or variant_id is required")),
            (item_id, variant_id) => {
                if let Some(item_id) = item_id {
                    ensure_positive("item_id", item_id)?;
                }
                if let Some(variant_id) = variant_id {
                    ensure_positive("variant_id", variant_id)?;
                }
                Ok(())
            }
        }
    }

    async fn resolve(&self, cart: &CartRef, api: &dyn StoreApi) -> Result<u64, ToolError> {
        if let Some(item_id) = self.item_id {
            return Ok(item_id);
        }
        let variant_id = self
            .variant_id
            .ok_or_else(|| ToolError::invalid("either item_id or variant_id is required"))?;
        let contents = cart.fetch(api).await?;
        line_for_variant(&contents, variant_id).ok_or_else(|| {
            ToolError::Failed(
                "Could not resolve item_id from variant_id; provide item_id explicitly".to_string(),
            )
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveCartItemArgs {
    #[serde(flatten)]
    pub cart: CartRef,
    #[serde(flatten)]
    pub line: LineSelector,
}

impl Validate for RemoveCartItemArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.cart.check()?;
        self.line.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateCartItemQuantityArgs {
    #[serde(flatten)]
    pub cart: CartRef,
    #[serde(flatten)]
    pub line: LineSelector,
    /// New quantity (at least 1)
    pub quantity: u32,
}

impl Validate for UpdateCartItemQuantityArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.cart.check()?;
        self.line.check()?;
        ensure_positive("quantity", u64::from(self.quantity))
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ClearCartArgs {
    #[serde(flatten)]
    pub cart: CartRef,
}

impl Validate for ClearCartArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.cart.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApplyCartCouponArgs {
    #[serde(flatten)]
    pub cart: CartRef,
    /// Coupon code
    pub code: String,
}

impl Validate for ApplyCartCouponArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.cart.check()?;
        ensure_not_blank("code", &self.code)
    }
}

pub struct CartTools;

impl CartTools {
    async fn update_quantity(
        args: UpdateCartItemQuantityArgs,
        api: &dyn StoreApi,
    ) -> Result<Value, ToolError> {
        let line_id = args.line.resolve(&args.cart, api).await?;
        let body = json!({ "quantity": args.quantity });

        for path in args.cart.candidates(&format!("/items/{line_id}")) {
            match api.send(ApiRequest::put(path, body.clone())).await {
                Err(error) if matches!(error.status(), Some(404 | 405)) => continue,
                outcome => return Ok(outcome?.body),
            }
        }

        // No in-place update: replace the line instead.
        let variant_id = match args.line.variant_id {
            Some(variant_id) => variant_id,
            None => variant_for_line(&args.cart.fetch(api).await?, line_id).ok_or_else(|| {
                ToolError::Failed(
                    "Cart does not support quantity updates; provide variant_id so the line can be re-added"
                        .to_string(),
                )
            })?,
        };
        tracing::debug!(line_id, variant_id, "replacing cart line to change its quantity");
        args.cart.delete_line(api, line_id).await?;
        args.cart.add_line(api, variant_id, args.quantity).await
    }

    async fn clear(args: ClearCartArgs, api: &dyn StoreApi) -> Result<Value, ToolError> {
        let contents = args.cart.fetch(api).await?;
        let line_ids: Vec<u64> = cart_lines(&contents)
            .iter()
            .filter_map(|line| line.get("id").and_then(Value::as_u64))
            .collect();

        let mut removed = 0;
        for line_id in line_ids {
            if args.cart.delete_line(api, line_id).await? {
                removed += 1;
            }
        }
        Ok(json!({ "success": true, "removed": removed }))
    }
}

#[async_trait]
impl ToolCategory for CartTools {
    fn category_name(&self) -> &'static str {
        "cart"
    }

    fn domain(&self) -> Domain {
        Domain::Cart
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<GetCartArgs>(
                "tiendanube_get_cart",
                "Get a shopping cart by numeric id or token, with its items and totals.",
            ),
            ToolDefinition::new::<AddCartItemArgs>(
                "tiendanube_add_cart_item",
                "Add a product variant to a cart.",
            ),
            ToolDefinition::new::<RemoveCartItemArgs>(
                "tiendanube_remove_cart_item",
                "Remove a line from a cart by item_id, or by the variant it holds.",
            ),
            ToolDefinition::new::<UpdateCartItemQuantityArgs>(
                "tiendanube_update_cart_item_quantity",
                "Change the quantity of a cart line. Falls back to removing and re-adding it.",
            ),
            ToolDefinition::new::<ClearCartArgs>(
                "tiendanube_clear_cart",
                "Remove every line from a cart.",
            ),
            ToolDefinition::new::<ApplyCartCouponArgs>(
                "tiendanube_apply_cart_coupon",
                "Apply a coupon code to a cart.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_get_cart" => {
                let args: GetCartArgs = parse(args)?;
                let query: Vec<(String, String)> =
                    args.fields.iter().map(|fields| ("fields".to_string(), fields.clone())).collect();
                let response = first_found(api, &args.cart.candidates(""), CART_NOT_FOUND, |path| {
                    ApiRequest::get(path).with_query(query.clone())
                })
                .await?;
                Ok(response.body)
            }
            "tiendanube_add_cart_item" => {
                let args: AddCartItemArgs = parse(args)?;
                args.cart.add_line(api, args.variant_id, args.quantity).await
            }
            "tiendanube_remove_cart_item" => {
                let args: RemoveCartItemArgs = parse(args)?;
                let line_id = args.line.resolve(&args.cart, api).await?;
                let response = first_found(
                    api,
                    &args.cart.candidates(&format!("/items/{line_id}")),
                    "Failed to remove item: cart not found",
                    |path| ApiRequest::delete(path),
                )
                .await?;
                Ok(or_success(response.body))
            }
            "tiendanube_update_cart_item_quantity" => {
                Self::update_quantity(parse(args)?, api).await
            }
            "tiendanube_clear_cart" => Self::clear(parse(args)?, api).await,
            "tiendanube_apply_cart_coupon" => {
                let args: ApplyCartCouponArgs = parse(args)?;
                let body = json!({ "code": args.code });
                let response = first_found(
                    api,
                    &args.cart.candidates("/coupon"),
                    "Failed to apply coupon: cart not found",
                    |path| ApiRequest::post(path, body.clone()),
                )
                .await?;
                Ok(response.body)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tiendanube_client::Method;

    use super::CartTools;
    use crate::error::ToolError;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn tokens_try_singular_collection_first() {
        let api = RecordingApi::new().fail(404).respond(json!({"id": 1}));

        CartTools
            .call("tiendanube_get_cart", json!({"cart_token": "abc123"}), &api)
            .await
            .expect("cart");

        let paths: Vec<String> = api.requests().into_iter().map(|request| request.path).collect();
        assert_eq!(paths, ["/cart/abc123", "/carts/abc123"]);
    }

    #[tokio::test]
    async fn exactly_one_identifier_is_required() {
        let api = RecordingApi::new();

        let neither = CartTools.call("tiendanube_get_cart", json!({}), &api).await;
        let both = CartTools
            .call("tiendanube_get_cart", json!({"cart_id": 1, "cart_token": "t"}), &api)
            .await;

        assert!(matches!(neither, Err(ToolError::InvalidArguments(_))));
        assert!(matches!(both, Err(ToolError::InvalidArguments(_))));
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_cart_is_reported() {
        let api = RecordingApi::new().fail(404).fail(404);

        let error = CartTools
            .call("tiendanube_get_cart", json!({"cart_id": 7}), &api)
            .await
            .expect_err("no cart");

        assert_eq!(error.to_string(), "Cart not found using provided identifier");
    }

    #[tokio::test]
    async fn remove_resolves_line_from_nested_variant() {
        let cart = json!({"items": [
            {"id": 100, "variant_id": 1},
            {"id": 200, "variant": {"id": 2}},
        ]});
        let api = RecordingApi::new().respond(cart).respond(Value::Null);

        let result = CartTools
            .call("tiendanube_remove_cart_item", json!({"cart_id": 7, "variant_id": 2}), &api)
            .await
            .expect("removed");

        assert_eq!(api.last().method, Method::DELETE);
        assert_eq!(api.last().path, "/carts/7/items/200");
        assert_eq!(result, json!({"success": true}));
    }

    #[tokio::test]
    async fn quantity_update_falls_back_to_replace() {
        let api = RecordingApi::new()
            .fail(405)
            .fail(405)
            .respond(Value::Null)
            .respond(json!({"id": 300, "quantity": 4}));

        let result = CartTools
            .call(
                "tiendanube_update_cart_item_quantity",
                json!({"cart_id": 7, "item_id": 100, "variant_id": 1, "quantity": 4}),
                &api,
            )
            .await
            .expect("updated");

        let requests = api.requests();
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[2].method, Method::DELETE);
        assert_eq!(requests[2].path, "/carts/7/items/100");
        assert_eq!(requests[3].path, "/carts/7/items");
        assert_eq!(requests[3].body, Some(json!({"variant_id": 1, "quantity": 4})));
        assert_eq!(result["quantity"], 4);
    }

    #[tokio::test]
    async fn clear_cart_counts_removed_lines() {
        let cart = json!({"products": [{"id": 1}, {"id": 2}, {"name": "no id"}]});
        let api = RecordingApi::new().respond(cart);

        let result =
            CartTools.call("tiendanube_clear_cart", json!({"cart_id": 7}), &api).await.expect("cleared");

        assert_eq!(result, json!({"success": true, "removed": 2}));
        assert_eq!(api.requests().len(), 3);
    }

    #[tokio::test]
    async fn coupon_code_is_posted() {
        let api = RecordingApi::new();

        CartTools
            .call("tiendanube_apply_cart_coupon", json!({"cart_id": 7, "code": "PROMO10"}), &api)
            .await
            .expect("applied");

        assert_eq!(api.last().path, "/carts/7/coupon");
        assert_eq!(api.last().body, Some(json!({"code": "PROMO10"})));
    }
}
