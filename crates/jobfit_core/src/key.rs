//! Cache keys for analysis results.

use crate::OperationKind;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::fmt;

const DELIMITER: char = ':';

/// Identity of a cacheable analysis: who asked, about what, for which operation.
///
/// Equal triples produce equal keys. The rendered form escapes the delimiter inside
/// components, so `("ab", "c")` and `("a", "bc")`, or components containing `:`,
/// never collide.
///
/// # Examples
///
/// ```
/// use jobfit_core::{CacheKey, OperationKind};
///
/// let key = CacheKey::new("userA", "job123", OperationKind::JobFit);
/// assert_eq!(key.to_string(), "userA:job123:jobFit");
///
/// let tricky = CacheKey::new("user:A", "job", OperationKind::JobFit);
/// assert_eq!(tricky.to_string(), "user%3AA:job:jobFit");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Getters)]
pub struct CacheKey {
    identity: String,
    resource_id: String,
    operation: OperationKind,
}

impl CacheKey {
    /// Build a key from its components.
    pub fn new(
        identity: impl Into<String>,
        resource_id: impl Into<String>,
        operation: OperationKind,
    ) -> Self {
        Self {
            identity: identity.into(),
            resource_id: resource_id.into(),
            operation,
        }
    }
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            DELIMITER => out.push_str("%3A"),
            other => out.push(other),
        }
    }
    out
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{DELIMITER}{}{DELIMITER}{}",
            escape(&self.identity),
            escape(&self.resource_id),
            self.operation
        )
    }
}
