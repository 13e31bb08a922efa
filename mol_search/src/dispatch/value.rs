//! Values exchanged with the query evaluator.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Iri,
}

impl ValueType {

    pub fn name(self) -> &'static str {

        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Iri => "iri",
        }
    }

    ///XSD datatype of literals of this type, `None` for IRIs
    pub fn datatype(self) -> Option<String> {

        let local = match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Float => "double",
            ValueType::Boolean => "boolean",
            ValueType::Iri => return None,
        };

        return Some(format!("{}{}", XSD, local));
    }
}

impl fmt::Display for ValueType {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Iri(String),
}

impl Value {

    pub fn value_type(&self) -> ValueType {

        match self {
            Value::Str(_) => ValueType::String,
            Value::Int(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Boolean,
            Value::Iri(_) => ValueType::Iri,
        }
    }

    /// Converts to `expected`, widening integers to floats. Anything else must already match.
    pub fn coerce(self, predicate: &str, expected: ValueType) -> Result<Value> {

        match (self, expected) {
            (Value::Int(i), ValueType::Float) => Ok(Value::Float(i as f64)),
            (v, t) if v.value_type() == t => Ok(v),
            (v, t) => Err(Error::TypeMismatch {
                predicate: predicate.to_string(),
                expected: t.name().to_string(),
                found: v.value_type().name().to_string(),
            }),
        }
    }

    /// Reads command-line text as a value of type `value_type`.
    pub fn parse_as(text: &str, value_type: ValueType) -> Result<Value> {

        let bad = || Error::InvalidArgument(format!("{:?} is not a valid {}", text, value_type));

        match value_type {
            ValueType::String => Ok(Value::Str(text.to_string())),
            ValueType::Iri => Ok(Value::Iri(text.trim_start_matches('<').trim_end_matches('>').to_string())),
            ValueType::Integer => text.parse().map(Value::Int).map_err(|_| bad()),
            ValueType::Float => text.parse().map(Value::Float).map_err(|_| bad()),
            ValueType::Boolean => match text {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(bad()),
            },
        }
    }

    /// Maps a JSON scalar onto a value. Strings written `<...>` become IRIs.
    pub fn from_json(predicate: &str, json: &serde_json::Value) -> Result<Value> {

        match json {
            serde_json::Value::String(s) if s.starts_with('<') && s.ends_with('>') && s.len() > 1 => {
                Ok(Value::Iri(s[1..s.len() - 1].to_string()))
            },
            serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n.as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| Error::InvalidArgument(format!("{}: number out of range", predicate))),
            },
            other => Err(Error::TypeMismatch {
                predicate: predicate.to_string(),
                expected: "scalar".to_string(),
                found: json_kind(other).to_string(),
            }),
        }
    }

    /// One term of a SPARQL JSON results binding.
    pub fn to_sparql_json(&self) -> serde_json::Value {

        match self {
            Value::Iri(iri) => serde_json::json!({"type": "uri", "value": iri}),
            literal => serde_json::json!({
                "type": "literal",
                "value": literal.to_string(),
                "datatype": literal.value_type().datatype(),
            }),
        }
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {

    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
        _ => "scalar",
    }
}

impl fmt::Display for Value {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {

        match self {
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Iri(iri) => write!(f, "<{}>", iri),
        }
    }
}
