//! Tool-related types.

use super::ArgumentError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl ParameterSpec {
    pub fn required(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            description: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamType) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn range(mut self, minimum: f64, maximum: f64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.kind));
        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }
        if let Some(minimum) = self.minimum {
            schema.insert("minimum".into(), json!(minimum));
        }
        if let Some(maximum) = self.maximum {
            schema.insert("maximum".into(), json!(maximum));
        }
        Value::Object(schema)
    }
}

/// A tool definition: what is advertised to the model and what the
/// dispatcher validates against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterSpec>,
    /// Extra guidance for phrasing the final answer after this tool ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_hint: Option<String>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            presentation_hint: None,
        }
    }

    pub fn param(mut self, parameter: ParameterSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn presentation_hint(mut self, hint: impl Into<String>) -> Self {
        self.presentation_hint = Some(hint.into());
        self
    }

    /// Whether `key` is a declared parameter.
    pub fn declares(&self, key: &str) -> bool {
        self.parameters.iter().any(|p| p.name == key)
    }

    /// Parameters as a JSON Schema object.
    pub fn json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.clone(), p.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// The `{name, description, parameters}` entry shown to the model.
    pub fn advertised(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.json_schema(),
        })
    }

    /// Call signature such as `convert_currency(amount, base, target)`.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// Arguments handed to a tool, already filtered to its declared keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments(pub Map<String, Value>);

impl ToolArguments {
    /// Keep only the keys `spec` declares. Returns the arguments and the
    /// names of the dropped keys.
    pub fn sanitize(spec: &ToolSpec, raw: &Map<String, Value>) -> (Self, Vec<String>) {
        let mut kept = Map::new();
        let mut dropped = Vec::new();
        for (key, value) in raw {
            if spec.declares(key) {
                kept.insert(key.clone(), value.clone());
            } else {
                dropped.push(key.clone());
            }
        }
        (Self(kept), dropped)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// A required string parameter.
    pub fn get_str(&self, key: &str) -> Result<&str, ArgumentError> {
        self.0
            .get(key)
            .ok_or_else(|| ArgumentError::Missing(key.to_string()))?
            .as_str()
            .ok_or_else(|| ArgumentError::invalid(key, "expected string"))
    }

    /// A required number. Numeric strings such as `"500"` are accepted.
    pub fn get_f64(&self, key: &str) -> Result<f64, ArgumentError> {
        let value = self
            .0
            .get(key)
            .ok_or_else(|| ArgumentError::Missing(key.to_string()))?;
        as_f64(value).ok_or_else(|| ArgumentError::invalid(key, "expected number"))
    }

    /// An optional integer. Numeric strings and whole floats are accepted.
    pub fn get_i64_opt(&self, key: &str) -> Result<Option<i64>, ArgumentError> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => as_i64(value)
                .map(Some)
                .ok_or_else(|| ArgumentError::invalid(key, "expected integer")),
        }
    }
}

impl From<Map<String, Value>> for ToolArguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The only form in which arguments ever reach a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: ToolArguments,
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
