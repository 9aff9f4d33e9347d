//! Method descriptors
//!
//! A descriptor is the registered record for one method: its name, declared
//! parameters, binding policy and invocation function.
//!
//! ```rust
//! use jrpc_dispatch::{from_fn, MethodDescriptor, ParamType};
//! use std::time::Duration;
//!
//! let sum = MethodDescriptor::new("sum", from_fn(|p| async move {
//!     Ok(serde_json::json!(p.get_as::<i64>("a")? + p.get_as::<i64>("b")?))
//! }))
//! .required("a", ParamType::Integer)
//! .required("b", ParamType::Integer)
//! .enforce_types()
//! .deadline(Duration::from_secs(1));
//!
//! assert_eq!(sum.params().len(), 2);
//! ```

use crate::handler::{Handler, HandlerResult};
use crate::params::{BoundParams, ParamSpec, ParamType, UnknownParamPolicy};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A registered method
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    params: Vec<ParamSpec>,
    policy: UnknownParamPolicy,
    enforce_types: bool,
    deadline: Option<Duration>,
    handler: Arc<dyn Handler>,
}

impl MethodDescriptor {
    /// Create a descriptor with no declared parameters, strict unknown-key
    /// policy, no type enforcement and no deadline
    pub fn new(name: impl Into<String>, handler: Box<dyn Handler>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            policy: UnknownParamPolicy::default(),
            enforce_types: false,
            deadline: None,
            handler: Arc::from(handler),
        }
    }

    /// Append a declared parameter
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Append a required parameter
    pub fn required(self, name: impl Into<String>, type_tag: ParamType) -> Self {
        self.param(ParamSpec::required(name, type_tag))
    }

    /// Append an optional parameter
    pub fn optional(self, name: impl Into<String>, type_tag: ParamType) -> Self {
        self.param(ParamSpec::optional(name, type_tag))
    }

    /// Set the policy for named arguments that match no declared parameter
    pub fn policy(mut self, policy: UnknownParamPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shorthand for `policy(UnknownParamPolicy::Lenient)`
    pub fn lenient(self) -> Self {
        self.policy(UnknownParamPolicy::Lenient)
    }

    /// Check bound values against their declared type tags
    pub fn enforce_types(mut self) -> Self {
        self.enforce_types = true;
        self
    }

    /// Abandon invocations of this method after `deadline`
    ///
    /// Overrides the dispatcher-wide default.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters, in positional order
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn unknown_param_policy(&self) -> UnknownParamPolicy {
        self.policy
    }

    pub fn enforces_types(&self) -> bool {
        self.enforce_types
    }

    pub fn invocation_deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Run the invocation function
    pub fn invoke(&self, params: BoundParams) -> HandlerResult {
        self.handler.handle(params)
    }

    /// First parameter name declared more than once, if any
    pub(crate) fn duplicate_param(&self) -> Option<&str> {
        self.params.iter().enumerate().find_map(|(i, spec)| {
            self.params[..i]
                .iter()
                .any(|earlier| earlier.name == spec.name)
                .then_some(spec.name.as_str())
        })
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("policy", &self.policy)
            .field("enforce_types", &self.enforce_types)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Two descriptors are equal when their metadata matches and they share the
/// same invocation function instance
impl PartialEq for MethodDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.params == other.params
            && self.policy == other.policy
            && self.enforce_types == other.enforce_types
            && self.deadline == other.deadline
            && Arc::ptr_eq(&self.handler, &other.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_sync_fn;
    use serde_json::json;

    fn noop() -> Box<dyn Handler> {
        from_sync_fn(|_| Ok(json!(null)))
    }

    #[test]
    fn test_builder_methods() {
        let desc = MethodDescriptor::new("greet", noop())
            .required("name", ParamType::String)
            .optional("greeting", ParamType::String)
            .lenient()
            .deadline(Duration::from_millis(20));

        assert_eq!(desc.name(), "greet");
        assert_eq!(desc.params()[0], ParamSpec::required("name", ParamType::String));
        assert!(!desc.params()[1].required);
        assert_eq!(desc.unknown_param_policy(), UnknownParamPolicy::Lenient);
        assert!(!desc.enforces_types());
        assert_eq!(desc.invocation_deadline(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_default_policy_is_strict() {
        let desc = MethodDescriptor::new("m", noop());
        assert_eq!(desc.unknown_param_policy(), UnknownParamPolicy::Strict);
    }

    #[test]
    fn test_duplicate_param_detection() {
        let desc = MethodDescriptor::new("m", noop())
            .required("a", ParamType::Any)
            .optional("b", ParamType::Any)
            .optional("a", ParamType::Any);
        assert_eq!(desc.duplicate_param(), Some("a"));

        let desc = MethodDescriptor::new("m", noop()).required("a", ParamType::Any);
        assert_eq!(desc.duplicate_param(), None);
    }

    #[test]
    fn test_equality_tracks_handler_identity() {
        let desc = MethodDescriptor::new("m", noop());
        let clone = desc.clone();
        let other = MethodDescriptor::new("m", noop());

        assert_eq!(desc, clone);
        assert_ne!(desc, other);
    }

    #[tokio::test]
    async fn test_invoke() {
        let desc = MethodDescriptor::new("count", from_sync_fn(|p| Ok(json!(p.len()))));
        let result = desc
            .invoke(BoundParams::from_value(json!({"a": 1})).unwrap())
            .await
            .unwrap();
        assert_eq!(result, json!(1));
    }
}
