//! Business rules (`/business-rules`) and payment disputes (`/disputes`).

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tiendanube_client::StoreApi;

use crate::args::{
    ensure_len_between, ensure_not_blank, ensure_positive, ensure_url, parse, query_from, to_body,
    DateRange, PageArgs, Validate,
};
use crate::error::{Domain, ToolError};
use crate::registry::{ToolCategory, ToolDefinition};
use crate::tools::{acknowledged, fetch_page};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    ProductFilter,
    CustomerFilter,
    OrderFilter,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    #[default]
    Active,
    Inactive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    In,
    NotIn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Hide,
    Show,
    ApplyDiscount,
    SetPrice,
    BlockPurchase,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RuleCondition {
    /// Field to filter on
    pub field: String,
    pub operator: ConditionOperator,
    /// String, number, or a list of strings and numbers
    pub value: Value,
}

impl RuleCondition {
    fn check(&self) -> Result<(), ToolError> {
        ensure_not_blank("conditions.field", &self.field)?;
        let ok = match &self.value {
            Value::String(_) | Value::Number(_) => true,
            Value::Array(items) => {
                items.iter().all(|item| matches!(item, Value::String(_) | Value::Number(_)))
            }
            _ => false,
        };
        if !ok {
            return Err(ToolError::invalid(
                "conditions.value must be a string, a number or a list of them",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub kind: ActionType,
    /// String or number, when the action takes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl RuleAction {
    fn check(&self) -> Result<(), ToolError> {
        match &self.value {
            None | Some(Value::String(_) | Value::Number(_)) => Ok(()),
            Some(_) => Err(ToolError::invalid("actions.value must be a string or a number")),
        }
    }
}

fn check_rules(conditions: &[RuleCondition], actions: &[RuleAction]) -> Result<(), ToolError> {
    conditions.iter().try_for_each(RuleCondition::check)?;
    actions.iter().try_for_each(RuleAction::check)
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListBusinessRulesArgs {
    #[serde(flatten)]
    pub paging: PageArgs,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RuleType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RuleStatus>,
}

impl Validate for ListBusinessRulesArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.paging.check()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BusinessRuleIdArgs {
    /// Business rule ID
    pub business_rule_id: u64,
}

impl Validate for BusinessRuleIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("business_rule_id", self.business_rule_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateBusinessRuleArgs {
    /// Rule name (1-255 characters)
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: RuleType,
    /// Defaults to active
    #[serde(default)]
    pub status: RuleStatus,
    /// Filter conditions
    pub conditions: Vec<RuleCondition>,
    /// Actions taken when the conditions match
    pub actions: Vec<RuleAction>,
}

impl Validate for CreateBusinessRuleArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_len_between("name", &self.name, 1, 255)?;
        check_rules(&self.conditions, &self.actions)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateBusinessRuleArgs {
    /// Business rule ID
    #[serde(skip_serializing)]
    pub business_rule_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RuleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<RuleCondition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<RuleAction>>,
}

impl Validate for UpdateBusinessRuleArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("business_rule_id", self.business_rule_id)?;
        if let Some(name) = &self.name {
            ensure_len_between("name", name, 1, 255)?;
        }
        check_rules(
            self.conditions.as_deref().unwrap_or_default(),
            self.actions.as_deref().unwrap_or_default(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    UnderReview,
    Accepted,
    Declined,
    NeedsResponse,
    WarningClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    Chargeback,
    Inquiry,
    RefundRequest,
    QualityIssue,
    ShippingIssue,
    Other,
}

/// Statuses a merchant may move a dispute to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DisputeResolution {
    UnderReview,
    Accepted,
    Declined,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceType {
    Receipt,
    Communication,
    ShippingDocumentation,
    Other,
}

#[derive(Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListDisputesArgs {
    #[serde(flatten)]
    pub paging: PageArgs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DisputeStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DisputeReason>,
    #[serde(flatten)]
    pub dates: DateRange,
}

impl Validate for ListDisputesArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.paging.check()?;
        self.dates.normalize()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DisputeIdArgs {
    /// Dispute ID
    pub dispute_id: u64,
}

impl Validate for DisputeIdArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("dispute_id", self.dispute_id)
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: EvidenceType,
    /// Link to the evidence file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct UpdateDisputeArgs {
    /// Dispute ID
    #[serde(skip_serializing)]
    pub dispute_id: u64,
    pub status: DisputeResolution,
    /// Merchant response to the dispute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Supporting evidence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<Evidence>>,
}

impl Validate for UpdateDisputeArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        ensure_positive("dispute_id", self.dispute_id)?;
        for evidence in self.evidence.iter().flatten() {
            if let Some(url) = &evidence.url {
                ensure_url("evidence.url", url)?;
            }
        }
        Ok(())
    }
}

pub struct BusinessRuleTools;

#[async_trait]
impl ToolCategory for BusinessRuleTools {
    fn category_name(&self) -> &'static str {
        "business_rules"
    }

    fn domain(&self) -> Domain {
        Domain::BusinessRules
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition::new::<ListBusinessRulesArgs>(
                "tiendanube_list_business_rules",
                "List business rules, filtered by type or status.",
            ),
            ToolDefinition::new::<BusinessRuleIdArgs>(
                "tiendanube_get_business_rule",
                "Get a business rule by ID.",
            ),
            ToolDefinition::new::<CreateBusinessRuleArgs>(
                "tiendanube_create_business_rule",
                "Create a business rule from conditions and the actions they trigger.",
            ),
            ToolDefinition::new::<UpdateBusinessRuleArgs>(
                "tiendanube_update_business_rule",
                "Update a business rule.",
            ),
            ToolDefinition::new::<BusinessRuleIdArgs>(
                "tiendanube_delete_business_rule",
                "Delete a business rule.",
            ),
            ToolDefinition::new::<ListDisputesArgs>(
                "tiendanube_list_disputes",
                "List payment disputes, filtered by status, reason or creation date.",
            ),
            ToolDefinition::new::<DisputeIdArgs>(
                "tiendanube_get_dispute",
                "Get a payment dispute by ID.",
            ),
            ToolDefinition::new::<UpdateDisputeArgs>(
                "tiendanube_update_dispute",
                "Respond to a payment dispute, optionally attaching evidence.",
            ),
        ]
    }

    async fn call(&self, name: &str, args: Value, api: &dyn StoreApi) -> Result<Value, ToolError> {
        match name {
            "tiendanube_list_business_rules" => {
                let args: ListBusinessRulesArgs = parse(args)?;
                fetch_page(api, "/business-rules", query_from(&args), &args.paging).await
            }
            "tiendanube_get_business_rule" => {
                let args: BusinessRuleIdArgs = parse(args)?;
                Ok(api.get(&format!("/business-rules/{}", args.business_rule_id), Vec::new()).await?)
            }
            "tiendanube_create_business_rule" => {
                let args: CreateBusinessRuleArgs = parse(args)?;
                Ok(api.post("/business-rules", to_body(&args)?).await?)
            }
            "tiendanube_update_business_rule" => {
                let args: UpdateBusinessRuleArgs = parse(args)?;
                let path = format!("/business-rules/{}", args.business_rule_id);
                Ok(api.put(&path, to_body(&args)?).await?)
            }
            "tiendanube_delete_business_rule" => {
                let args: BusinessRuleIdArgs = parse(args)?;
                api.delete(&format!("/business-rules/{}", args.business_rule_id)).await?;
                Ok(acknowledged(format!(
                    "Business rule {} deleted successfully",
                    args.business_rule_id
                )))
            }
            "tiendanube_list_disputes" => {
                let args: ListDisputesArgs = parse(args)?;
                fetch_page(api, "/disputes", query_from(&args), &args.paging).await
            }
            "tiendanube_get_dispute" => {
                let args: DisputeIdArgs = parse(args)?;
                Ok(api.get(&format!("/disputes/{}", args.dispute_id), Vec::new()).await?)
            }
            "tiendanube_update_dispute" => {
                let args: UpdateDisputeArgs = parse(args)?;
                let path = format!("/disputes/{}", args.dispute_id);
                Ok(api.put(&path, to_body(&args)?).await?)
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }
}
