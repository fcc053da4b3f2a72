//! 기본 키 값

use crate::api::value::Value;
use std::fmt;

/// 엔티티 기본 키
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    Long(i64),
    Int(i32),
    Str(String),
}

impl Id {
    /// 조회/삭제 인자로 유효한지: 음수가 아닌 정수 또는 공백이 아닌 문자열
    pub fn is_valid(&self) -> bool {
        match self {
            Id::Long(v) => *v >= 0,
            Id::Int(v) => *v >= 0,
            Id::Str(s) => !s.trim().is_empty(),
        }
    }

    /// 호출자가 키를 지정했는지: 양수 정수 또는 공백이 아닌 문자열
    pub fn is_set(&self) -> bool {
        match self {
            Id::Long(v) => *v > 0,
            Id::Int(v) => *v > 0,
            Id::Str(s) => !s.trim().is_empty(),
        }
    }

    /// 엔티티 PK 값에서 변환. Null이거나 키 타입이 아니면 `None`.
    pub fn from_value(value: &Value) -> Option<Id> {
        match value {
            Value::Int64(v) => Some(Id::Long(*v)),
            Value::Int32(v) => Some(Id::Int(*v)),
            Value::Utf8(s) => Some(Id::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Id::Long(v) => Value::Int64(*v),
            Id::Int(v) => Value::Int32(*v),
            Id::Str(s) => Value::Utf8(s.clone()),
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Long(v) => write!(f, "{v}"),
            Id::Int(v) => write!(f, "{v}"),
            Id::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Id {
    fn from(v: i64) -> Self {
        Id::Long(v)
    }
}

impl From<i32> for Id {
    fn from(v: i32) -> Self {
        Id::Int(v)
    }
}

impl From<&str> for Id {
    fn from(v: &str) -> Self {
        Id::Str(v.to_string())
    }
}

impl From<String> for Id {
    fn from(v: String) -> Self {
        Id::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_validity() {
        assert!(Id::Long(0).is_valid());
        assert!(!Id::Long(-1).is_valid());
        assert!(!Id::Str("  ".into()).is_valid());
        assert!(Id::from("abc").is_valid());
    }

    #[test]
    fn test_id_is_set() {
        assert!(!Id::Long(0).is_set());
        assert!(Id::Int(3).is_set());
        assert!(!Id::Str(String::new()).is_set());
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(Id::from_value(&Value::Int64(9)), Some(Id::Long(9)));
        assert_eq!(Id::from_value(&Value::Null), None);
        assert_eq!(Id::Str("k".into()).to_value(), Value::Utf8("k".into()));
        assert_eq!(Id::Long(42).to_string(), "42");
    }
}
