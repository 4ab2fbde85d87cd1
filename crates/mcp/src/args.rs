//! Argument parsing, validation and request-shaping helpers shared by all
//! tool modules.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tiendanube_client::MAX_PER_PAGE;
use url::Url;

use crate::error::ToolError;

/// Tool-specific rules applied after deserialization. May normalize fields in place.
pub trait Validate {
    fn validate(&mut self) -> Result<(), ToolError> {
        Ok(())
    }
}

/// Deserializes tool arguments (absent arguments count as `{}`) and validates them.
pub fn parse<T>(args: Value) -> Result<T, ToolError>
where
    T: DeserializeOwned + Validate,
{
    let args = if args.is_null() { Value::Object(Map::new()) } else { args };
    let mut parsed: T =
        serde_json::from_value(args).map_err(|error| ToolError::invalid(error.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct PageArgs {
    /// Page number, starting at 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Results per page (max 200)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl PageArgs {
    pub fn check(&self) -> Result<(), ToolError> {
        if self.page == Some(0) {
            return Err(ToolError::invalid("page must be a positive integer"));
        }
        if let Some(per_page) = self.per_page {
            if per_page == 0 || per_page > MAX_PER_PAGE {
                return Err(ToolError::invalid(format!(
                    "per_page must be between 1 and {MAX_PER_PAGE}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct DateRange {
    /// Only return resources created on or after this ISO 8601 date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_min: Option<String>,
    /// Only return resources created on or before this ISO 8601 date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_max: Option<String>,
    /// Only return resources updated on or after this ISO 8601 date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at_min: Option<String>,
    /// Only return resources updated on or before this ISO 8601 date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at_max: Option<String>,
}

impl DateRange {
    /// Rewrites every bound to `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub fn normalize(&mut self) -> Result<(), ToolError> {
        let created = (
            normalize_bound("created_at_min", &mut self.created_at_min)?,
            normalize_bound("created_at_max", &mut self.created_at_max)?,
        );
        let updated = (
            normalize_bound("updated_at_min", &mut self.updated_at_min)?,
            normalize_bound("updated_at_max", &mut self.updated_at_max)?,
        );

        ensure_ordered("created_at", created)?;
        ensure_ordered("updated_at", updated)
    }
}

fn ensure_ordered(
    prefix: &str,
    (min, max): (Option<DateTime<Utc>>, Option<DateTime<Utc>>),
) -> Result<(), ToolError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(ToolError::invalid(format!(
                "{prefix}_min must not be later than {prefix}_max"
            )));
        }
    }
    Ok(())
}

fn normalize_bound(
    field: &str,
    slot: &mut Option<String>,
) -> Result<Option<DateTime<Utc>>, ToolError> {
    let Some(raw) = slot.as_deref() else {
        return Ok(None);
    };
    let parsed = parse_date(raw).ok_or_else(|| {
        ToolError::invalid(format!("{field} must be an ISO 8601 date, got `{raw}`"))
    })?;
    *slot = Some(render_date(parsed));
    Ok(Some(parsed))
}

pub fn normalize_date_field(field: &str, slot: &mut Option<String>) -> Result<(), ToolError> {
    normalize_bound(field, slot).map(|_| ())
}

/// Common filters accepted by most `list_*` tools.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct ListArgs {
    #[serde(flatten)]
    pub paging: PageArgs,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    /// Only return resources with an ID greater than this value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_id: Option<u64>,
    #[serde(flatten)]
    pub dates: DateRange,
}

impl ListArgs {
    pub fn check(&mut self) -> Result<(), ToolError> {
        self.paging.check()?;
        if let Some(since_id) = self.since_id {
            ensure_positive("since_id", since_id)?;
        }
        self.dates.normalize()
    }
}

/// Paging plus `fields`/`since_id`, for collections without date filters.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
pub struct BasicListArgs {
    #[serde(flatten)]
    pub paging: PageArgs,
    /// Comma-separated list of fields to include in the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    /// Only return resources with an ID greater than this value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_id: Option<u64>,
}

impl BasicListArgs {
    pub fn check(&self) -> Result<(), ToolError> {
        self.paging.check()?;
        if let Some(since_id) = self.since_id {
            ensure_positive("since_id", since_id)?;
        }
        Ok(())
    }
}

impl Validate for BasicListArgs {
    fn validate(&mut self) -> Result<(), ToolError> {
        self.check()
    }
}

/// Parses an ISO 8601 date or datetime and renders it as UTC with millisecond precision.
pub fn normalize_date(value: &str) -> Option<String> {
    parse_date(value).map(render_date)
}

fn render_date(utc: DateTime<Utc>) -> String {
    utc.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
    {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Identifier the store issues either as a number or as an opaque string.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

impl ResourceId {
    pub fn check(&self, field: &str) -> Result<(), ToolError> {
        match self {
            Self::Number(value) => ensure_positive(field, *value),
            Self::Text(value) => ensure_not_blank(field, value),
        }
    }

    /// Percent-encoded form for use inside a path.
    pub fn segment(&self) -> String {
        path_segment(&self.to_string())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value.trim()),
        }
    }
}

pub fn ensure_positive(field: &str, value: u64) -> Result<(), ToolError> {
    if value == 0 {
        return Err(ToolError::invalid(format!("{field} must be a positive integer")));
    }
    Ok(())
}

pub fn ensure_not_blank(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::invalid(format!("{field} is required")));
    }
    Ok(())
}

pub fn ensure_len(field: &str, value: &str, len: usize) -> Result<(), ToolError> {
    if value.chars().count() != len {
        return Err(ToolError::invalid(format!("{field} must be exactly {len} characters")));
    }
    Ok(())
}

pub fn ensure_len_between(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ToolError> {
    let count = value.chars().count();
    if count < min || count > max {
        return Err(ToolError::invalid(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

pub fn ensure_email(field: &str, value: &str) -> Result<(), ToolError> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());
    let valid = pattern.as_ref().is_some_and(|regex| regex.is_match(value.trim()));
    if !valid {
        return Err(ToolError::invalid(format!("{field} must be a valid email address")));
    }
    Ok(())
}

pub fn ensure_url(field: &str, value: &str) -> Result<(), ToolError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ToolError::invalid(format!("{field} must be a valid URL"))),
    }
}

/// `label` names the resource in the message, e.g. "Webhook URL".
pub fn ensure_https_url(field: &str, value: &str, label: &str) -> Result<(), ToolError> {
    ensure_url(field, value)?;
    if !value.starts_with("https://") {
        return Err(ToolError::invalid(format!("{label} must use HTTPS")));
    }
    Ok(())
}

/// Flattens a serializable argument struct into query pairs. `null`s are
/// dropped, arrays are comma-joined and nested objects are sent as JSON.
pub fn query_from<T: Serialize>(args: &T) -> Vec<(String, String)> {
    let Ok(Value::Object(map)) = serde_json::to_value(args) else {
        return Vec::new();
    };

    map.into_iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::Null => return None,
                Value::String(text) => text,
                Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(","),
                other => scalar_text(&other),
            };
            Some((key, rendered))
        })
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn to_body<T: Serialize>(value: &T) -> Result<Value, ToolError> {
    Ok(serde_json::to_value(value)?)
}

/// Serde name of an enum variant, e.g. `price-ascending`.
pub fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default()
}

/// Percent-encodes a free-form value for use as one path segment.
pub fn path_segment(raw: &str) -> String {
    let Ok(mut url) = Url::parse("https://segment.invalid/") else {
        return raw.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push(raw);
    }
    url.path().trim_start_matches('/').to_string()
}

pub fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use serde::Serialize;
    use serde_json::json;

    use super::{
        ensure_email, ensure_https_url, normalize_date, parse, path_segment, query_from, ListArgs,
        ResourceId, Validate,
    };
    use crate::error::ToolError;

    #[derive(Debug, serde::Deserialize)]
    struct Listing {
        #[serde(flatten)]
        list: ListArgs,
    }

    impl Validate for Listing {
        fn validate(&mut self) -> Result<(), ToolError> {
            self.list.check()
        }
    }

    #[test]
    fn normalizes_supported_date_shapes() {
        assert_eq!(normalize_date("2024-03-01").as_deref(), Some("2024-03-01T00:00:00.000Z"));
        assert_eq!(
            normalize_date("2024-03-01T10:15:00-03:00").as_deref(),
            Some("2024-03-01T13:15:00.000Z")
        );
        assert_eq!(
            normalize_date("2024-03-01T10:15:30.5").as_deref(),
            Some("2024-03-01T10:15:30.500Z")
        );
        assert_eq!(normalize_date("yesterday"), None);
    }

    #[test]
    fn list_args_normalize_dates_and_check_paging() {
        let parsed: Listing = parse(json!({
            "page": 2,
            "per_page": 50,
            "created_at_min": "2024-01-01",
        }))
        .expect("valid listing");
        assert_eq!(parsed.list.dates.created_at_min.as_deref(), Some("2024-01-01T00:00:00.000Z"));

        let too_many = parse::<Listing>(json!({"per_page": 250})).expect_err("per_page too large");
        assert_eq!(too_many.to_string(), "invalid arguments: per_page must be between 1 and 200");

        let inverted = parse::<Listing>(json!({
            "updated_at_min": "2024-02-01",
            "updated_at_max": "2024-01-01",
        }))
        .expect_err("inverted range");
        assert!(inverted.to_string().contains("updated_at_min"));
    }

    #[test]
    fn date_ranges_compare_instants_not_text() {
        let far_future = parse::<Listing>(json!({
            "created_at_min": "2024-01-01",
            "created_at_max": "+10000-01-01",
        }))
        .expect("five digit years sort after 2024");
        assert!(far_future.list.dates.created_at_max.is_some());

        let inverted = parse::<Listing>(json!({
            "created_at_min": "+10000-01-01",
            "created_at_max": "2024-01-01",
        }))
        .expect_err("min after max");
        assert!(inverted.to_string().contains("created_at_min must not be later"));

        let same_instant = parse::<Listing>(json!({
            "updated_at_min": "2024-03-01T10:00:00-03:00",
            "updated_at_max": "2024-03-01T13:00:00Z",
        }));
        assert!(same_instant.is_ok());
    }

    #[test]
    fn absent_arguments_count_as_empty_object() {
        let parsed: Listing = parse(serde_json::Value::Null).expect("empty args");
        assert!(parsed.list.paging.page.is_none());
    }

    #[test]
    fn query_pairs_skip_absent_and_join_arrays() {
        #[derive(Serialize)]
        struct Filters {
            q: Option<String>,
            published: Option<bool>,
            ids: Vec<u64>,
            #[serde(skip_serializing_if = "Option::is_none")]
            handle: Option<String>,
        }

        let pairs = query_from(&Filters {
            q: Some("remera".to_string()),
            published: Some(true),
            ids: vec![1, 2],
            handle: None,
        });

        assert!(pairs.contains(&("q".to_string(), "remera".to_string())));
        assert!(pairs.contains(&("published".to_string(), "true".to_string())));
        assert!(pairs.contains(&("ids".to_string(), "1,2".to_string())));
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn https_rule_names_the_resource() {
        let error = ensure_https_url("url", "http://example.com/hook", "Webhook URL")
            .expect_err("plain http");
        assert_eq!(error.to_string(), "invalid arguments: Webhook URL must use HTTPS");
        assert!(ensure_https_url("url", "not a url", "Webhook URL").is_err());
        assert!(ensure_https_url("url", "https://example.com/hook", "Webhook URL").is_ok());
    }

    #[test]
    fn email_rule_rejects_obvious_garbage() {
        assert!(ensure_email("email", "cliente@tienda.com.ar").is_ok());
        assert!(ensure_email("email", "cliente@").is_err());
        assert!(ensure_email("email", "no spaces@tienda.com").is_err());
    }

    #[test]
    fn resource_ids_accept_numbers_and_strings() {
        let numeric: ResourceId = serde_json::from_value(json!(42)).expect("number");
        let opaque: ResourceId = serde_json::from_value(json!("01H8 X")).expect("string");

        assert_eq!(numeric.segment(), "42");
        assert_eq!(opaque.segment(), "01H8%20X");
        assert!(ResourceId::Number(0).check("id").is_err());
        assert!(ResourceId::Text("  ".to_string()).check("id").is_err());
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        assert_eq!(path_segment("REM-01"), "REM-01");
        assert_eq!(path_segment("A B/C"), "A%20B%2FC");
    }
}
