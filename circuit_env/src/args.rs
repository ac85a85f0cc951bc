//! Positional circuit arguments.

use crate::error::{CircuitError, CodecError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered list of arguments for a single circuit call.
///
/// Arguments are stored in their encoded form so the dispatcher never needs
/// to know the concrete shape of any transition. An encoding failure is
/// remembered and reported when the call is dispatched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
    error: Option<String>,
}

impl Args {
    /// Creates an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument list from already-encoded values.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values, error: None }
    }

    /// Appends an argument.
    pub fn with<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        if self.error.is_some() {
            return self;
        }
        match serde_json::to_value(value) {
            Ok(v) => self.values.push(v),
            Err(e) => self.error = Some(format!("argument {}: {}", self.values.len(), e)),
        }
        self
    }

    /// Reports the first encoding failure, if any.
    pub fn validate(&self) -> Result<(), CodecError> {
        match &self.error {
            Some(msg) => Err(CodecError::Encode(msg.clone())),
            None => Ok(()),
        }
    }

    /// Decodes the argument at `index`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, CircuitError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| CircuitError::invalid_argument(format!("missing argument {}", index)))?;
        T::deserialize(value)
            .map_err(|e| CircuitError::invalid_argument(format!("argument {}: {}", index, e)))
    }

    /// Returns the encoded values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Args {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Args {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Value>::deserialize(deserializer).map(Self::from_values)
    }
}

/// Builds [`Args`] from a list of serializable expressions.
///
/// ```ignore
/// let a = args![1u64, "hello", owner_key];
/// ```
#[macro_export]
macro_rules! args {
    () => {
        $crate::Args::new()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::Args::new()$(.with(&$arg))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_args_macro_positional_decode() {
        let a = crate::args![7u64, "msg", true];
        assert_eq!(a.len(), 3);
        assert_eq!(a.get::<u64>(0).unwrap(), 7);
        assert_eq!(a.get::<String>(1).unwrap(), "msg");
        assert!(a.get::<bool>(2).unwrap());
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_args_missing_and_mistyped() {
        let a = crate::args![1u64];
        assert!(matches!(a.get::<u64>(1), Err(CircuitError::InvalidArgument(_))));
        assert!(matches!(a.get::<String>(0), Err(CircuitError::InvalidArgument(_))));
        assert!(crate::args![].is_empty());
    }

    #[test]
    fn test_args_records_encoding_failure() {
        // Tuple keys cannot become JSON object keys
        let mut bad = HashMap::new();
        bad.insert((1u8, 2u8), 3u8);
        let a = Args::new().with(&1u64).with(&bad).with(&2u64);
        assert_eq!(a.len(), 1);
        assert!(matches!(a.validate(), Err(CodecError::Encode(_))));
    }
}
