//! Declared parameters and bound arguments
//!
//! A method declares an ordered list of [`ParamSpec`]s. The binder turns
//! whatever the caller sent (positional or named) into [`BoundParams`], a
//! name-keyed mapping that is the only thing a handler ever sees.

use jrpc_core::{Error, JsonRpcErrorData, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// Descriptive type tag for a declared parameter
///
/// Only checked at bind time when the descriptor enables type enforcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Any JSON value
    #[default]
    Any,
    Null,
    Bool,
    /// Any JSON number
    Number,
    /// A number representable as i64 or u64
    Integer,
    String,
    Array,
    Object,
}

impl ParamType {
    /// Whether `value` satisfies this tag
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::Null => value.is_null(),
            ParamType::Bool => value.is_boolean(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::String => value.is_string(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }

    /// Lowercase tag name as used on the wire in error data
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::Null => "null",
            ParamType::Bool => "bool",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::String => "string",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    /// Name of the JSON shape of `value`, using the same vocabulary
    pub fn name_of(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared parameter of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Name used as the key in [`BoundParams`]
    pub name: String,
    /// Informational type tag
    pub type_tag: ParamType,
    /// Whether binding fails when the argument is missing
    pub required: bool,
}

impl ParamSpec {
    /// A parameter that must be supplied
    pub fn required(name: impl Into<String>, type_tag: ParamType) -> Self {
        Self {
            name: name.into(),
            type_tag,
            required: true,
        }
    }

    /// A parameter that may be omitted; omitted arguments are absent from
    /// the bound mapping rather than defaulted
    pub fn optional(name: impl Into<String>, type_tag: ParamType) -> Self {
        Self {
            name: name.into(),
            type_tag,
            required: false,
        }
    }
}

/// What to do with named arguments that match no declared parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownParamPolicy {
    /// Reject the call with Invalid params
    #[default]
    Strict,
    /// Drop the unknown keys and bind the rest
    Lenient,
}

/// Name-keyed arguments handed to a method
///
/// The typed accessors fail with an Invalid params error naming the
/// offending parameter, so handlers can use `?` directly.
///
/// ```rust
/// use jrpc_dispatch::BoundParams;
/// use serde_json::json;
///
/// let params = BoundParams::from_value(json!({"a": 2, "b": 3})).unwrap();
/// let a: i64 = params.get_as("a").unwrap();
/// let c: Option<i64> = params.get_opt("c").unwrap();
/// assert_eq!(a, 2);
/// assert_eq!(c, None);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundParams(Map<String, Value>);

impl BoundParams {
    /// Empty argument mapping
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build from a JSON object, `None` for any other shape
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Raw value of an argument
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether an argument was supplied
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Deserialize a required argument
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self
            .0
            .get(name)
            .ok_or_else(|| param_error(name, format!("Missing parameter '{}'", name)))?;
        decode_param(name, value)
    }

    /// Deserialize an optional argument, `None` when it was not supplied
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.0
            .get(name)
            .map(|value| decode_param(name, value))
            .transpose()
    }

    /// Deserialize the whole mapping into a struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.0.clone()))
            .map_err(|e| Error::InvalidParams(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// The underlying JSON object
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// The mapping as a JSON object value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for BoundParams {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn decode_param<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T> {
    T::deserialize(value)
        .map_err(|e| param_error(name, format!("Invalid parameter '{}': {}", name, e)))
}

fn param_error(name: &str, message: String) -> Error {
    Error::JsonRpc(JsonRpcErrorData::invalid_params(message).data(json!({ "param": name })))
}
