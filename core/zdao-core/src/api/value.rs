//! 바인딩 값 — Value 타입과 변환 트레이트
//!
//! Statement 파라미터, Criteria 값, 결과 행의 컬럼 값은 모두 [`Value`]로 표현됩니다.
//! - `IntoValue`: 엔티티 필드 → Value
//! - `FromValue`: Value → 엔티티 필드

use crate::error::{DaoError, DaoResult};
use std::fmt;

/// 바인딩/결과 값
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    Boolean(bool),
    /// 다중 값 연산자(IN, NOT IN)의 컬렉션
    List(Vec<Value>),
}

/// Value의 종류 (엔티티 필드 타입 선언에도 사용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Int32,
    Int64,
    Float64,
    Utf8,
    Boolean,
    List,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Float64(_) => ValueKind::Float64,
            Value::Utf8(_) => ValueKind::Utf8,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::List(_) => ValueKind::List,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 다중 값 연산자용 컬렉션 접근
    pub fn as_list(&self) -> DaoResult<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(DaoError::type_mismatch("List", other.kind().to_string())),
        }
    }

    pub fn as_str(&self) -> DaoResult<&str> {
        match self {
            Value::Utf8(s) => Ok(s),
            other => Err(DaoError::type_mismatch("Utf8", other.kind().to_string())),
        }
    }

    /// SQL 리터럴 문자열로 변환 (디버그 로그의 placeholder 치환용)
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int32(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => format!("{v}"),
            Value::Utf8(v) => format!("'{}'", v.replace('\'', "''")),
            Value::Boolean(v) => {
                if *v {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_sql_literal).collect();
                format!("({})", parts.join(","))
            }
        }
    }

    /// 검색 엔진 문서용 JSON 변환
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int32(v) => serde_json::Value::from(*v),
            Value::Int64(v) => serde_json::Value::from(*v),
            Value::Float64(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Utf8(v) => serde_json::Value::String(v.clone()),
            Value::Boolean(v) => serde_json::Value::Bool(*v),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }

    /// JSON → Value. 객체는 JSON 문자열로 보존합니다.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Utf8(s.clone()),
            serde_json::Value::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(_) => Value::Utf8(json.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Utf8(s) => f.write_str(s),
            other => f.write_str(&other.to_sql_literal()),
        }
    }
}

/// 엔티티 필드 → Value 변환 트레이트
pub trait IntoValue {
    fn to_value(&self) -> Value;
}

/// Value → 엔티티 필드 변환 트레이트
pub trait FromValue: Sized {
    const KIND: ValueKind;
    const NULLABLE: bool = false;

    fn from_value(value: Value) -> DaoResult<Self>;
}

fn mismatch<T>(expected: ValueKind, value: &Value) -> DaoResult<T> {
    Err(DaoError::type_mismatch(
        expected.to_string(),
        value.kind().to_string(),
    ))
}

// 기본 타입 구현
impl IntoValue for i32 {
    fn to_value(&self) -> Value {
        Value::Int32(*self)
    }
}

impl FromValue for i32 {
    const KIND: ValueKind = ValueKind::Int32;

    fn from_value(value: Value) -> DaoResult<Self> {
        match value {
            Value::Int32(v) => Ok(v),
            Value::Int64(v) => i32::try_from(v).map_err(|_| {
                DaoError::type_mismatch("Int32", format!("Int64({v}) out of range"))
            }),
            other => mismatch(Self::KIND, &other),
        }
    }
}

impl IntoValue for i64 {
    fn to_value(&self) -> Value {
        Value::Int64(*self)
    }
}

impl FromValue for i64 {
    const KIND: ValueKind = ValueKind::Int64;

    fn from_value(value: Value) -> DaoResult<Self> {
        match value {
            Value::Int64(v) => Ok(v),
            Value::Int32(v) => Ok(v as i64),
            other => mismatch(Self::KIND, &other),
        }
    }
}

impl IntoValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float64(*self)
    }
}

impl FromValue for f64 {
    const KIND: ValueKind = ValueKind::Float64;

    fn from_value(value: Value) -> DaoResult<Self> {
        match value {
            Value::Float64(v) => Ok(v),
            Value::Int32(v) => Ok(v as f64),
            Value::Int64(v) => Ok(v as f64),
            other => mismatch(Self::KIND, &other),
        }
    }
}

impl IntoValue for String {
    fn to_value(&self) -> Value {
        Value::Utf8(self.clone())
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Utf8;

    fn from_value(value: Value) -> DaoResult<Self> {
        match value {
            Value::Utf8(v) => Ok(v),
            other => mismatch(Self::KIND, &other),
        }
    }
}

impl IntoValue for bool {
    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_value(value: Value) -> DaoResult<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            // TINYINT(1) 컬럼
            Value::Int32(0) | Value::Int64(0) => Ok(false),
            Value::Int32(1) | Value::Int64(1) => Ok(true),
            other => mismatch(Self::KIND, &other),
        }
    }
}

// Option<T> 구현
impl<T: IntoValue> IntoValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const KIND: ValueKind = T::KIND;
    const NULLABLE: bool = true;

    fn from_value(value: Value) -> DaoResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::from_value(value)?))
        }
    }
}

// Criteria/Update 작성용 From 구현
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
