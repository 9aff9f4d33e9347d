//! Method registry
//!
//! Maps method names to their descriptors. The registry is an explicitly
//! constructed shared handle: clones see the same mapping, so configuration
//! code can keep one clone for `add`/`remove` while dispatchers look up
//! through another.
//!
//! # Thread Safety
//!
//! The map is guarded by a reader-writer lock that is never held across an
//! await point or an invocation. Descriptors are stored as `Arc` snapshots:
//! a lookup either sees a fully registered descriptor or none at all, and a
//! descriptor removed mid-invocation stays alive until that invocation ends.
//!
//! # Examples
//!
//! ```rust
//! use jrpc_dispatch::{from_sync_fn, MethodDescriptor, MethodRegistry};
//!
//! let registry = MethodRegistry::new();
//! registry
//!     .add(MethodDescriptor::new("ping", from_sync_fn(|_| Ok("pong".into()))))
//!     .unwrap();
//!
//! assert!(registry.lookup("ping").is_some());
//! assert!(registry.remove("ping").is_some());
//! assert!(registry.lookup("ping").is_none());
//! ```

use crate::descriptor::MethodDescriptor;
use jrpc_core::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix reserved for protocol-internal methods
pub const RESERVED_PREFIX: &str = "rpc.";

/// Concurrent-safe mapping from method name to descriptor
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: Arc<RwLock<HashMap<String, Arc<MethodDescriptor>>>>,
}

impl MethodRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an ordinary method, replacing any descriptor with the same name
    ///
    /// Returns the replaced descriptor, if there was one.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidMethodName` for an empty name or one starting with `rpc.`
    /// - `Error::DuplicateParam` if a parameter name is declared twice
    pub fn add(&self, descriptor: MethodDescriptor) -> Result<Option<Arc<MethodDescriptor>>> {
        let name = descriptor.name();
        if name.is_empty() || name.starts_with(RESERVED_PREFIX) {
            return Err(Error::InvalidMethodName(name.to_string()));
        }
        self.insert(descriptor)
    }

    /// Register a protocol-internal `rpc.*` method
    ///
    /// # Errors
    ///
    /// - `Error::InvalidMethodName` unless the name starts with `rpc.` and has
    ///   something after it
    /// - `Error::DuplicateParam` if a parameter name is declared twice
    pub fn add_extension(
        &self,
        descriptor: MethodDescriptor,
    ) -> Result<Option<Arc<MethodDescriptor>>> {
        let name = descriptor.name();
        if name.len() <= RESERVED_PREFIX.len() || !name.starts_with(RESERVED_PREFIX) {
            return Err(Error::InvalidMethodName(name.to_string()));
        }
        self.insert(descriptor)
    }

    fn insert(&self, descriptor: MethodDescriptor) -> Result<Option<Arc<MethodDescriptor>>> {
        if let Some(param) = descriptor.duplicate_param() {
            return Err(Error::DuplicateParam {
                method: descriptor.name().to_string(),
                param: param.to_string(),
            });
        }

        let name = descriptor.name().to_string();
        let descriptor = Arc::new(descriptor);
        let replaced = self
            .methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), descriptor);

        tracing::debug!(method = %name, replaced = replaced.is_some(), "Method registered");
        Ok(replaced)
    }

    /// Remove a method, returning its descriptor; absent names are a no-op
    pub fn remove(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        let removed = self
            .methods
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);

        if removed.is_some() {
            tracing::debug!(method = %name, "Method removed");
        }
        removed
    }

    /// Find a method by name
    pub fn lookup(&self, name: &str) -> Option<Arc<MethodDescriptor>> {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered method names, sorted
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.methods
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}
