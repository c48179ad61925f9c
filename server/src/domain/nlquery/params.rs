//! Restricted trace search parameter schema
//!
//! `SearchParams` is the only shape extraction can ever produce. Model output
//! is deserialized straight into it, so fields outside the schema are dropped
//! by serde and never reach the search layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::NlQueryError;
use crate::data::TraceQuery;
use crate::utils::time::parse_duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    /// Target service name, e.g. `payment-service`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service: String,

    /// Span/operation name, e.g. `GET /api/checkout`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub operation: String,

    /// Attribute filters, e.g. `{"http.status_code": "500"}`
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// Minimum duration, e.g. `2s`
    #[serde(rename = "minDuration", skip_serializing_if = "String::is_empty")]
    pub min_duration: String,

    /// Maximum duration, e.g. `10s`
    #[serde(rename = "maxDuration", skip_serializing_if = "String::is_empty")]
    pub max_duration: String,

    /// Maximum number of traces to return
    #[serde(rename = "searchDepth", skip_serializing_if = "is_zero")]
    pub search_depth: u32,
}

/// Field decoding for `SearchParams`; only ever fed a JSON object
#[derive(Deserialize)]
struct ParamFields {
    #[serde(default, deserialize_with = "null_as_default")]
    service: String,
    #[serde(default, deserialize_with = "null_as_default")]
    operation: String,
    #[serde(default, deserialize_with = "null_as_default")]
    tags: BTreeMap<String, String>,
    #[serde(rename = "minDuration", default, deserialize_with = "null_as_default")]
    min_duration: String,
    #[serde(rename = "maxDuration", default, deserialize_with = "null_as_default")]
    max_duration: String,
    #[serde(rename = "searchDepth", default, deserialize_with = "null_as_default")]
    search_depth: u32,
}

impl From<ParamFields> for SearchParams {
    fn from(fields: ParamFields) -> Self {
        Self {
            service: fields.service,
            operation: fields.operation,
            tags: fields.tags,
            min_duration: fields.min_duration,
            max_duration: fields.max_duration,
            search_depth: fields.search_depth,
        }
    }
}

/// Accepts JSON objects only. A derived struct impl would also take arrays
/// and fill fields by position.
impl<'de> Deserialize<'de> for SearchParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        serde_json::from_value::<ParamFields>(serde_json::Value::Object(object))
            .map(Self::from)
            .map_err(serde::de::Error::custom)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl SearchParams {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Convert into a backend query, validating duration strings
    pub fn to_trace_query(&self) -> Result<TraceQuery, NlQueryError> {
        let duration_min = parse_optional_duration("minDuration", &self.min_duration)?;
        let duration_max = parse_optional_duration("maxDuration", &self.max_duration)?;

        Ok(TraceQuery {
            service_name: self.service.clone(),
            operation_name: self.operation.clone(),
            attributes: self.tags.clone(),
            duration_min,
            duration_max,
            search_depth: self.search_depth,
            start_time_min: None,
            start_time_max: None,
        })
    }

    /// Rename fields to the search tool vocabulary, omitting empty values
    pub fn to_search_args(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut args = serde_json::Map::new();
        if !self.service.is_empty() {
            args.insert("service_name".into(), self.service.clone().into());
        }
        if !self.operation.is_empty() {
            args.insert("span_name".into(), self.operation.clone().into());
        }
        if !self.min_duration.is_empty() {
            args.insert("duration_min".into(), self.min_duration.clone().into());
        }
        if !self.max_duration.is_empty() {
            args.insert("duration_max".into(), self.max_duration.clone().into());
        }
        if self.search_depth > 0 {
            args.insert("search_depth".into(), self.search_depth.into());
        }
        if !self.tags.is_empty() {
            let attributes = self
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            args.insert(
                "attributes".into(),
                serde_json::Value::Object(attributes),
            );
        }
        args
    }
}

fn parse_optional_duration(
    field: &'static str,
    value: &str,
) -> Result<Option<std::time::Duration>, NlQueryError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_duration(value)
        .map(Some)
        .map_err(|e| NlQueryError::validation(field, format!("invalid {field} {value:?}: {e}")))
}
