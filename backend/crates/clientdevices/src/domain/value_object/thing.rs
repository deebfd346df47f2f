//! Thing Value Object
//!
//! A Thing is the registry identity of a client device. Certificates are
//! attached to things by name.
//!
//! ## 不変条件
//! - 1文字以上
//! - 使用可能文字: `a-z`, `A-Z`, `0-9`, `-`, `_`, `:`
//! - 生成後は不変
//!
//! ## Usage
//! ```rust
//! use clientdevices::domain::value_object::thing::Thing;
//!
//! let thing = Thing::new("abc-123:xy_Z").unwrap();
//! assert_eq!(thing.name(), "abc-123:xy_Z");
//! assert!(Thing::new("abc 123").is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Thing name validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThingError {
    #[error("Invalid ThingName: must not be empty")]
    Empty,

    #[error("Invalid ThingName: character {0:?} is not allowed")]
    InvalidCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Thing {
    name: String,
}

impl Thing {
    pub fn new(name: impl Into<String>) -> Result<Self, ThingError> {
        let name = name.into();
        validate_thing_name(&name)?;
        Ok(Self { name })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.name
    }
}

fn validate_thing_name(name: &str) -> Result<(), ThingError> {
    if name.is_empty() {
        return Err(ThingError::Empty);
    }
    match name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')))
    {
        Some(c) => Err(ThingError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

impl TryFrom<String> for Thing {
    type Error = ThingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Thing::new(value)
    }
}

impl From<Thing> for String {
    fn from(thing: Thing) -> Self {
        thing.name
    }
}

impl std::str::FromStr for Thing {
    type Err = ThingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Thing::new(s)
    }
}

impl AsRef<str> for Thing {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Thing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["abc-123:xy_Z", "a", "Thing_1", "arn:aws:iot:thing", "---"] {
            let thing = Thing::new(name).unwrap();
            assert_eq!(thing.name(), name);
        }
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(Thing::new(""), Err(ThingError::Empty));
        assert_eq!(Thing::new("abc 123"), Err(ThingError::InvalidCharacter(' ')));
        assert_eq!(Thing::new("abc/123"), Err(ThingError::InvalidCharacter('/')));
        assert_eq!(Thing::new("thing.1"), Err(ThingError::InvalidCharacter('.')));
        assert!(Thing::new("デバイス").is_err());
        assert!(Thing::new("abc\n").is_err());
    }

    #[test]
    fn test_serde() {
        let thing: Thing = serde_json::from_str("\"sensor-1\"").unwrap();
        assert_eq!(thing.name(), "sensor-1");
        assert_eq!(serde_json::to_string(&thing).unwrap(), "\"sensor-1\"");
        assert!(serde_json::from_str::<Thing>("\"bad name\"").is_err());
    }

    #[test]
    fn test_parse() {
        let thing: Thing = "abc".parse().unwrap();
        assert_eq!(thing.to_string(), "abc");
        assert_eq!(thing.into_inner(), "abc");
    }
}
