use std::fmt;

use rusqlite::types::Value;

/// A single scalar decoded from a result set.
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Blob(Vec<u8>),
    String(String),
}

impl CellValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Null => "null",
            CellValue::Int(_) => "integer",
            CellValue::Float(_) => "real",
            CellValue::Blob(_) => "blob",
            CellValue::String(_) => "text",
        }
    }
}

// Floats compare by bit pattern: a CAST(... AS REAL) result must match its
// literal exactly, and Int(5) never equals Float(5.0).
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Int(l), CellValue::Int(r)) => l == r,
            (CellValue::Float(l), CellValue::Float(r)) => l.to_bits() == r.to_bits(),
            (CellValue::Blob(l), CellValue::Blob(r)) => l == r,
            (CellValue::String(l), CellValue::String(r)) => l == r,
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Int(v) => write!(f, "{v}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Blob(v) => write!(f, "<{} byte blob>", v.len()),
            CellValue::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Integer(i) => CellValue::Int(i),
            Value::Real(f) => CellValue::Float(f),
            Value::Text(s) => CellValue::String(s),
            Value::Blob(b) => CellValue::Blob(b),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value.into())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}
