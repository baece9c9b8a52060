//! Bridges to [`serde_json::Value`], gated behind the `dynamic` feature for
//! callers that want to inspect or build BEncode structures from JSON
//! tooling rather than constructing [`Value`] by hand.

use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::error::BencodeError;
use crate::value::Value;

impl TryFrom<Json> for Value {
    type Error = BencodeError;

    fn try_from(json: Json) -> Result<Self, Self::Error> {
        match json {
            Json::Null => Err(BencodeError::UnsupportedType("null")),
            Json::Bool(b) => Ok(Value::from(b)),
            Json::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .ok_or(BencodeError::UnsupportedType("non-integer number")),
            Json::String(s) => Ok(Value::Bytes(s.into_bytes())),
            Json::Array(items) => {
                let items = items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(items))
            }
            Json::Object(map) => {
                let mut entries = BTreeMap::new();
                for (key, value) in map {
                    entries.insert(key.into_bytes(), Value::try_from(value)?);
                }
                Ok(Value::Dict(entries))
            }
        }
    }
}
