pub mod primitives;
pub mod semantic;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use model2data_core::SchemaCatalog;
use serde::Serialize;

/// Generated value for a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GeneratedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Uuid(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
}

impl GeneratedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, GeneratedValue::Null)
    }

    /// CSV field text; nulls render as an empty field.
    pub fn to_csv(&self) -> String {
        match self {
            GeneratedValue::Null => String::new(),
            GeneratedValue::Bool(value) => value.to_string(),
            GeneratedValue::Int(value) => value.to_string(),
            GeneratedValue::Float(value) => value.to_string(),
            GeneratedValue::Text(value) | GeneratedValue::Uuid(value) => value.clone(),
            GeneratedValue::Date(value) => value.format("%Y-%m-%d").to_string(),
            GeneratedValue::Time(value) => value.format("%H:%M:%S").to_string(),
            GeneratedValue::Timestamp(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            GeneratedValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GeneratedValue::Text(value) | GeneratedValue::Uuid(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// Broad data-type family that drives value synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Decimal,
    Boolean,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
    Enum(Vec<String>),
    Text,
}

/// Declared column type reduced to its category plus any size parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    pub base: String,
    pub category: TypeCategory,
    /// `n` of `varchar(n)` / `char(n)`.
    pub max_length: Option<usize>,
    /// Second parameter of `decimal(p, s)`.
    pub scale: Option<u32>,
}

impl ColumnType {
    /// Classify a free-form type token, resolving enum names against `catalog`.
    pub fn resolve(data_type: &str, catalog: &SchemaCatalog) -> Self {
        let (base, params) = split_type(data_type);
        let category = match base.as_str() {
            "int" | "integer" | "bigint" | "smallint" | "tinyint" | "mediumint" | "serial"
            | "bigserial" | "smallserial" | "int2" | "int4" | "int8" | "long" => {
                TypeCategory::Integer
            }
            "decimal" | "numeric" | "float" | "float4" | "float8" | "double"
            | "double precision" | "real" | "money" | "number" => TypeCategory::Decimal,
            "bool" | "boolean" => TypeCategory::Boolean,
            "date" => TypeCategory::Date,
            "time" | "timetz" | "time with time zone" | "time without time zone" => {
                TypeCategory::Time
            }
            "timestamp" | "timestamptz" | "datetime" | "timestamp with time zone"
            | "timestamp without time zone" => TypeCategory::Timestamp,
            "uuid" => TypeCategory::Uuid,
            "json" | "jsonb" => TypeCategory::Json,
            _ => match catalog.enum_def(&base) {
                Some(enum_def) if !enum_def.labels.is_empty() => {
                    TypeCategory::Enum(enum_def.labels.clone())
                }
                _ => TypeCategory::Text,
            },
        };

        let max_length = match category {
            TypeCategory::Text => params.first().and_then(|value| value.parse().ok()),
            _ => None,
        };
        let scale = match category {
            TypeCategory::Decimal => params.get(1).and_then(|value| value.parse().ok()),
            _ => None,
        };

        Self {
            base,
            category,
            max_length,
            scale,
        }
    }

    /// How many distinct unique values this type can hold; `None` when
    /// the ordinal scheme never runs out.
    pub fn unique_capacity(&self) -> Option<u64> {
        match &self.category {
            TypeCategory::Boolean => Some(2),
            TypeCategory::Enum(labels) => Some(labels.len() as u64),
            TypeCategory::Time => Some(86_400),
            TypeCategory::Text => self
                .max_length
                .and_then(|max_length| u32::try_from(max_length).ok())
                .and_then(|max_length| 10_u64.checked_pow(max_length))
                .map(|limit| limit - 1),
            _ => None,
        }
    }
}

/// `Decimal(10, 2)` -> (`decimal`, [`10`, `2`]).
fn split_type(data_type: &str) -> (String, Vec<String>) {
    let lowered = data_type.trim().to_lowercase();
    let (base, params) = match lowered.split_once('(') {
        Some((base, rest)) => {
            let inner = rest.split(')').next().unwrap_or_default();
            let params = inner
                .split(',')
                .map(|param| param.trim().to_string())
                .filter(|param| !param.is_empty())
                .collect();
            (base, params)
        }
        None => (lowered.as_str(), Vec::new()),
    };
    let base = base.trim().trim_end_matches("[]").split_whitespace().collect::<Vec<_>>();
    (base.join(" "), params)
}
