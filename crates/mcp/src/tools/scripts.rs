use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_https_url, ensure_positive, ensure_url, parse, query_from, to_body, ListArgs, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{fetch_page, or_success};

const URL_LABEL: &str = "Script tag URL";

#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptEvent {
    Onload,
    Onfocus,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListScriptTagsArgs {
    #[serde(flatten)]
    pub list: ListArgs,
    /// Filter by script URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

impl Validate for ListScriptTagsArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.list.check()?;
        if let Some(src) = &self.src {
            ensure_url("src", src)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetScriptTagArgs {
    /// Script tag ID
    #[serde(skip_serializing)]
    pub script_tag_id: u64,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
}

impl Validate for GetScriptTagArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("script_tag_id", self.script_tag_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateScriptTagArgs {
    /// HTTPS script URL
    pub src: String,
    /// Storefront event that loads the script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<ScriptEvent>,
}

impl Validate for CreateScriptTagArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_https_url("src", &self.src, URL_LABEL)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateScriptTagArgs {
    /// Script tag ID
    #[serde(skip_serializing)]
    pub script_tag_id: u64,
    /// HTTPS script URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Storefront event that loads the script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<ScriptEvent>,
}

impl Validate for UpdateScriptTagArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("script_tag_id", self.script_tag_id)?;
        if let Some(src) = &self.src {
            ensure_https_url("src", src, URL_LABEL)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScriptTagIdArgs {
    /// Script tag ID
    pub script_tag_id: u64,
}

impl Validate for ScriptTagIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("script_tag_id", self.script_tag_id)
    }
}

pub struct ScriptTools;

#[async_trait]
impl ToolCategory for ScriptTools {
    fn category_name(&self) -> &'static str {
        "scripts"
    }

    fn domain(&self) -> Domain {
        Domain::Script
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListScriptTagsArgs>(
                "tiendanube_list_script_tags",
                "List the storefront script tags registered by the app.",
            ),
            ToolDefinition::new::<GetScriptTagArgs>(
                "tiendanube_get_script_tag",
                "Get a script tag by ID.",
            ),
            ToolDefinition::new::<CreateScriptTagArgs>(
                "tiendanube_create_script_tag",
                "Register a storefront script tag. Only HTTPS URLs are accepted.",
            ),
            ToolDefinition::new::<UpdateScriptTagArgs>(
                "tiendanube_update_script_tag",
                "Change the URL or load event of a script tag.",
            ),
            ToolDefinition::new::<ScriptTagIdArgs>(
                "tiendanube_delete_script_tag",
                "Remove a script tag.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_script_tags" => {
                let args: ListScriptTagsArgs = parse(args)?;
                fetch_page(api, "/scripts", query_from(&args), &args.list.paging).await
            }
            "tiendanube_get_script_tag" => {
                let args: GetScriptTagArgs = parse(args)?;
                Ok(api.get(&format!("/scripts/{}", args.script_tag_id), query_from(&args)).await?)
            }
            "tiendanube_create_script_tag" => {
                let args: CreateScriptTagArgs = parse(args)?;
                Ok(api.post("/scripts", to_body(&args)?).await?)
            }
            "tiendanube_update_script_tag" => {
                let args: UpdateScriptTagArgs = parse(args)?;
                Ok(api.put(&format!("/scripts/{}", args.script_tag_id), to_body(&args)?).await?)
            }
            "tiendanube_delete_script_tag" => {
                let args: ScriptTagIdArgs = parse(args)?;
                Ok(or_success(api.delete(&format!("/scripts/{}", args.script_tag_id)).await?))
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tiendanube_client::Method;

    use super::ScriptTools;
    use crate::registry::ToolCategory;
    use crate::testing::RecordingApi;

    #[tokio::test]
    async fn create_script_tag_posts_src_and_event() {
        let api = RecordingApi::new();

        ScriptTools
            .call(
                "tiendanube_create_script_tag",
                json!({"src": "https://cdn.example.com/widget.js", "event": "onload"}),
                &api,
            )
            .await
            .expect("created");

        assert_eq!(api.last().path, "/scripts");
        assert_eq!(
            api.last().body,
            Some(json!({"src": "https://cdn.example.com/widget.js", "event": "onload"}))
        );
    }

    #[tokio::test]
    async fn insecure_sources_are_rejected() {
        let api = RecordingApi::new();

        let error = ScriptTools
            .call(
                "tiendanube_update_script_tag",
                json!({"script_tag_id": 2, "src": "http://cdn.example.com/widget.js"}),
                &api,
            )
            .await
            .expect_err("http");

        assert_eq!(error.to_string(), "invalid arguments: Script tag URL must use HTTPS");
        assert!(api.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_delete_response_becomes_success() {
        let api = RecordingApi::new().respond(Value::Null);

        let result = ScriptTools
            .call("tiendanube_delete_script_tag", json!({"script_tag_id": 2}), &api)
            .await
            .expect("deleted");

        assert_eq!(api.last().method, Method::DELETE);
        assert_eq!(result, json!({"success": true}));
    }
}
