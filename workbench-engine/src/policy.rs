//! Capability policy for the script sandbox
//!
//! The sandbox starts from a bare V8 global object. Everything not named
//! here (plus the host surface the sandbox installs itself) is deleted
//! before user code runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Language built-ins a snippet may keep
const LANGUAGE_GLOBALS: &[&str] = &[
    "globalThis",
    "undefined",
    "NaN",
    "Infinity",
    "Object",
    "Function",
    "Array",
    "Number",
    "Boolean",
    "String",
    "Symbol",
    "BigInt",
    "Math",
    "Date",
    "RegExp",
    "JSON",
    "Promise",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "WeakRef",
    "Reflect",
    "Proxy",
    "Intl",
    "Error",
    "TypeError",
    "RangeError",
    "SyntaxError",
    "ReferenceError",
    "EvalError",
    "URIError",
    "AggregateError",
    "parseInt",
    "parseFloat",
    "isNaN",
    "isFinite",
    "encodeURI",
    "encodeURIComponent",
    "decodeURI",
    "decodeURIComponent",
    "ArrayBuffer",
    "DataView",
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
    "BigInt64Array",
    "BigUint64Array",
    "queueMicrotask",
];

/// Which globals survive sandbox bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityPolicy {
    allowed_globals: BTreeSet<String>,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self {
            allowed_globals: LANGUAGE_GLOBALS.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl CapabilityPolicy {
    /// Keep an extra global, e.g. one provided by a custom extension
    pub fn allow_global(mut self, name: impl Into<String>) -> Self {
        self.allowed_globals.insert(name.into());
        self
    }

    pub fn allows(&self, name: &str) -> bool {
        self.allowed_globals.contains(name)
    }

    pub fn allowed_globals(&self) -> impl Iterator<Item = &str> {
        self.allowed_globals.iter().map(String::as_str)
    }
}
