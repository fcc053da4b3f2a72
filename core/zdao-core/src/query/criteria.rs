//! Criteria — AND 체인 조건 모델
//!
//! 노드 순서가 곧 컴파일 순서입니다. OR/중첩은 지원하지 않습니다.

use crate::api::Value;
use std::fmt;

/// 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Match,
    MatchPhrase,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

/// 연산자가 요구하는 값의 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorShape {
    /// 바인딩 파라미터 없음
    NoValue,
    /// 파라미터 정확히 하나
    Single,
    /// 원소마다 파라미터 하나
    Multi,
}

impl Operator {
    /// SQL 연산자 텍스트
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::Match => "MATCH",
            Operator::MatchPhrase => "MATCH_PHRASE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    pub fn shape(&self) -> OperatorShape {
        match self {
            Operator::IsNull | Operator::IsNotNull => OperatorShape::NoValue,
            Operator::In | Operator::NotIn => OperatorShape::Multi,
            _ => OperatorShape::Single,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 조건 노드 하나
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub key: String,
    pub operator: Operator,
    pub value: Value,
}

/// 비어 있지 않은 AND 조건 체인
///
/// ```rust
/// use zdao_core::query::{Criteria, Operator};
///
/// let criteria = Criteria::where_op("age", Operator::Gte, 18)
///     .and("status", "active");
/// assert_eq!(criteria.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    nodes: Vec<Criterion>,
}

impl Criteria {
    /// `key = value` 노드로 시작
    pub fn where_eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::where_op(key, Operator::Eq, value)
    }

    pub fn where_op(key: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            nodes: vec![Criterion {
                key: key.into(),
                operator,
                value: value.into(),
            }],
        }
    }

    pub fn and(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and_op(key, Operator::Eq, value)
    }

    pub fn and_op(mut self, key: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.nodes.push(Criterion {
            key: key.into(),
            operator,
            value: value.into(),
        });
        self
    }

    pub fn nodes(&self) -> &[Criterion] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 생성 경로상 항상 false
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
