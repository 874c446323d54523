//! Agent models

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::FlowError;

/// Default model for agents that do not name one
pub const DEFAULT_MODEL: &str = "qwen3-max";

/// Agent archetype.
///
/// The well-known kinds are enumerated; any other string survives a
/// round-trip as [`AgentKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Router,
    Code,
    Pptx,
    Data,
    Policy,
    Ocr,
    SkillCreator,
    Custom,
    Other(String),
}

impl AgentKind {
    pub fn as_str(&self) -> &str {
        match self {
            AgentKind::Router => "router",
            AgentKind::Code => "code",
            AgentKind::Pptx => "pptx",
            AgentKind::Data => "data",
            AgentKind::Policy => "policy",
            AgentKind::Ocr => "ocr",
            AgentKind::SkillCreator => "skill-creator",
            AgentKind::Custom => "custom",
            AgentKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for AgentKind {
    fn from(s: &str) -> Self {
        match s {
            "router" => AgentKind::Router,
            "code" => AgentKind::Code,
            "pptx" => AgentKind::Pptx,
            "data" => AgentKind::Data,
            "policy" => AgentKind::Policy,
            "ocr" => AgentKind::Ocr,
            "skill-creator" => AgentKind::SkillCreator,
            "custom" => AgentKind::Custom,
            other => AgentKind::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AgentKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AgentKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(AgentKind::from(s.as_str()))
    }
}

/// An agent configuration attachable to a workflow node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Agent ID (template key for catalog entries)
    pub id: String,

    /// Display name
    pub name: String,

    /// Agent archetype
    #[serde(rename = "type")]
    pub kind: AgentKind,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Instructions given to the agent
    #[serde(default)]
    pub system_prompt: String,

    /// Skills the agent may invoke, in order
    #[serde(default)]
    pub skills: Vec<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Upper bound on reasoning iterations
    #[serde(default = "default_max_iters")]
    pub max_iters: NonZeroU32,

    /// Sampling temperature
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Enable extended thinking
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_thinking: Option<bool>,

    /// Stream responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Free-form typed parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_params: Option<Vec<CustomParam>>,

    /// Named inputs the agent expects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_variables: Option<Vec<InputVariable>>,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_max_iters() -> NonZeroU32 {
    max_iters(30)
}

/// Build an iteration bound, clamping zero to one
pub fn max_iters(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

/// Declared type of a custom parameter value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Boolean,
    Json,
}

/// A key/value parameter whose value is stored as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomParam {
    pub key: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub param_type: ParamType,
}

impl CustomParam {
    pub fn new(key: impl Into<String>, value: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            param_type,
        }
    }

    /// Coerce the textual value according to its declared type
    pub fn coerce(&self) -> Result<Value, FlowError> {
        let raw = self.value.trim();
        match self.param_type {
            ParamType::String => Ok(Value::String(self.value.clone())),
            ParamType::Number => {
                let number = if raw.contains('.') {
                    raw.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                } else {
                    raw.parse::<i64>().ok().map(Value::from)
                };
                number.ok_or_else(|| {
                    FlowError::ValidationError(format!(
                        "parameter '{}' is not a number: {}",
                        self.key, self.value
                    ))
                })
            }
            ParamType::Boolean => match raw.to_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(FlowError::ValidationError(format!(
                    "parameter '{}' is not a boolean: {}",
                    self.key, self.value
                ))),
            },
            ParamType::Json => serde_json::from_str(raw).map_err(|e| {
                FlowError::ValidationError(format!("parameter '{}' is not valid JSON: {}", self.key, e))
            }),
        }
    }

    /// Value used when coercion fails
    pub fn zero_value(&self) -> Value {
        match self.param_type {
            ParamType::String => Value::String(String::new()),
            ParamType::Number => Value::from(0),
            ParamType::Boolean => Value::Bool(false),
            ParamType::Json => Value::Object(Map::new()),
        }
    }
}

/// A named input an agent expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputVariable {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl AgentConfig {
    /// Coerced custom parameters in declared order.
    ///
    /// Parameters with an empty key are skipped. A value that does not
    /// coerce is replaced by the zero value of its type. A repeated key
    /// keeps its first position and takes the later value.
    pub fn coerced_params(&self) -> Vec<(&str, Value)> {
        let mut values: Vec<(&str, Value)> = Vec::new();
        for param in self.custom_params.iter().flatten() {
            if param.key.is_empty() {
                continue;
            }
            let value = match param.coerce() {
                Ok(value) => value,
                Err(e) => {
                    warn!("Agent {}: {}, using default", self.id, e);
                    param.zero_value()
                }
            };
            match values.iter_mut().find(|(key, _)| *key == param.key) {
                Some(slot) => slot.1 = value,
                None => values.push((param.key.as_str(), value)),
            }
        }
        values
    }

    /// Coerced custom parameters keyed by name
    pub fn param_values(&self) -> Map<String, Value> {
        self.coerced_params()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }

    /// Merge provided input values with declared defaults
    pub fn resolve_inputs(
        &self,
        provided: &HashMap<String, String>,
    ) -> Result<BTreeMap<String, String>, FlowError> {
        let mut resolved: BTreeMap<String, String> = provided
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for var in self.input_variables.iter().flatten() {
            if resolved.contains_key(&var.name) {
                continue;
            }
            match &var.default_value {
                Some(default) => {
                    resolved.insert(var.name.clone(), default.clone());
                }
                None if var.required => {
                    return Err(FlowError::ValidationError(format!(
                        "agent '{}' requires input variable '{}'",
                        self.id, var.name
                    )));
                }
                None => {}
            }
        }

        Ok(resolved)
    }

    /// Prefix the request with the agent's parameters, if it has any
    pub fn compose_input(&self, input: &str) -> String {
        let params = self.coerced_params();
        if params.is_empty() {
            return input.to_string();
        }

        let lines: Vec<String> = params
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("- {}: {}", key, s),
                other => format!("- {}: {}", key, other),
            })
            .collect();

        format!("Parameters:\n{}\n\nUser request:\n{}", lines.join("\n"), input)
    }
}

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("placeholder pattern is valid"));

/// Replace `{{name}}` placeholders; unknown names are left as written
pub fn substitute_variables(text: &str, vars: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
