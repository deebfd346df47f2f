//! Device Attribute Value Object
//!
//! Values presented to policy evaluation, matched against expressions
//! where `*` stands for any (possibly empty) run of characters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum DeviceAttribute {
    StringLiteral(String),
}

impl DeviceAttribute {
    /// Whether this attribute satisfies `expression`
    pub fn matches(&self, expression: &str) -> bool {
        match self {
            DeviceAttribute::StringLiteral(value) => wildcard_match(expression, value),
        }
    }
}

/// Glob match supporting `*` only
fn wildcard_match(pattern: &str, value: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();

    let (mut p, mut v) = (0, 0);
    // Position of the last `*` seen and the value index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, v));
            p += 1;
        } else if p < pattern.len() && pattern[p] == value[v] {
            p += 1;
            v += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            v = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}
