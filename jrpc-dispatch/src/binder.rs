//! Parameter binding
//!
//! Maps the `params` member of a request onto a method's declared parameter
//! list. The result is always a name-keyed [`BoundParams`]:
//!
//! - **Positional**: element *i* binds to declared parameter *i*
//! - **Named**: keys bind by name, unknown keys follow the descriptor policy
//! - **Absent**: binds to an empty mapping
//!
//! Missing required parameters fail in every shape. Values are only checked
//! against their type tag when the descriptor enables type enforcement.

use crate::descriptor::MethodDescriptor;
use crate::params::{BoundParams, ParamSpec, ParamType, UnknownParamPolicy};
use jrpc_core::{JsonRpcErrorData, Params};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Why binding failed; always reported as Invalid params (-32602)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// More positional arguments than declared parameters
    #[error("Too many positional parameters: expected at most {expected}, got {actual}")]
    TooManyPositional {
        /// Number of declared parameters
        expected: usize,
        /// Number of supplied arguments
        actual: usize,
    },

    #[error("Missing required parameter '{0}'")]
    MissingRequired(String),

    /// Named argument with no declared counterpart under the strict policy
    #[error("Unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("Parameter '{param}' expected {expected}, got {actual}")]
    TypeMismatch {
        param: String,
        expected: ParamType,
        actual: &'static str,
    },
}

impl BindError {
    /// Wire error object, with `data` naming the offending parameter
    pub fn to_error_data(&self) -> JsonRpcErrorData {
        let data = match self {
            BindError::TooManyPositional { expected, actual } => {
                json!({ "expected": expected, "actual": actual })
            }
            BindError::MissingRequired(param) | BindError::UnknownParam(param) => {
                json!({ "param": param })
            }
            BindError::TypeMismatch {
                param,
                expected,
                actual,
            } => json!({ "param": param, "expected": expected.as_str(), "actual": actual }),
        };
        JsonRpcErrorData::invalid_params(self.to_string()).data(data)
    }
}

impl From<BindError> for JsonRpcErrorData {
    fn from(err: BindError) -> Self {
        err.to_error_data()
    }
}

impl From<BindError> for jrpc_core::Error {
    fn from(err: BindError) -> Self {
        jrpc_core::Error::JsonRpc(err.to_error_data())
    }
}

/// Bind a request's params against a descriptor
pub fn bind(
    descriptor: &MethodDescriptor,
    params: Option<Params>,
) -> Result<BoundParams, BindError> {
    let bound = match params {
        None => bind_absent(descriptor.params())?,
        Some(Params::Positional(values)) => bind_positional(descriptor.params(), values)?,
        Some(Params::Named(map)) => {
            bind_named(descriptor.params(), descriptor.unknown_param_policy(), map)?
        }
    };

    if descriptor.enforces_types() {
        check_types(descriptor.params(), &bound)?;
    }

    Ok(bound)
}

fn bind_absent(specs: &[ParamSpec]) -> Result<BoundParams, BindError> {
    match specs.iter().find(|spec| spec.required) {
        Some(spec) => Err(BindError::MissingRequired(spec.name.clone())),
        None => Ok(BoundParams::new()),
    }
}

fn bind_positional(specs: &[ParamSpec], values: Vec<Value>) -> Result<BoundParams, BindError> {
    if values.len() > specs.len() {
        return Err(BindError::TooManyPositional {
            expected: specs.len(),
            actual: values.len(),
        });
    }

    if let Some(missing) = specs[values.len()..].iter().find(|spec| spec.required) {
        return Err(BindError::MissingRequired(missing.name.clone()));
    }

    let mut bound = BoundParams::new();
    for (spec, value) in specs.iter().zip(values) {
        bound.insert(spec.name.clone(), value);
    }
    Ok(bound)
}

fn bind_named(
    specs: &[ParamSpec],
    policy: UnknownParamPolicy,
    mut map: Map<String, Value>,
) -> Result<BoundParams, BindError> {
    let is_declared = |key: &str| specs.iter().any(|spec| spec.name == key);

    match policy {
        UnknownParamPolicy::Strict => {
            if let Some(unknown) = map.keys().find(|key| !is_declared(key.as_str())) {
                return Err(BindError::UnknownParam(unknown.clone()));
            }
        }
        UnknownParamPolicy::Lenient => map.retain(|key, _| is_declared(key.as_str())),
    }

    if let Some(missing) = specs
        .iter()
        .find(|spec| spec.required && !map.contains_key(&spec.name))
    {
        return Err(BindError::MissingRequired(missing.name.clone()));
    }

    Ok(BoundParams::from(map))
}

fn check_types(specs: &[ParamSpec], bound: &BoundParams) -> Result<(), BindError> {
    for spec in specs {
        if let Some(value) = bound.get(&spec.name) {
            if !spec.type_tag.matches(value) {
                return Err(BindError::TypeMismatch {
                    param: spec.name.clone(),
                    expected: spec.type_tag,
                    actual: ParamType::name_of(value),
                });
            }
        }
    }
    Ok(())
}
