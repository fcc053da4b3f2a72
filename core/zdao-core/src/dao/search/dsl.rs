//! 검색 엔진 요청/응답 모델
//!
//! 클라이언트 구현은 이 타입들을 엔진 고유 호출로 옮깁니다. `to_json`은 엔진의
//! 쿼리 DSL 형태를 만들며 디버그 로그와 HTTP 기반 클라이언트에서 사용합니다.

use crate::api::Value;
use crate::query::Direction;
use serde_json::{Map, json};

/// 범위 비교
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeOp {
    fn key(&self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
        }
    }
}

/// 구조화된 검색 쿼리 트리
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    MatchAll,
    Term { field: String, value: Value },
    Terms { field: String, values: Vec<Value> },
    Range { field: String, op: RangeOp, value: Value },
    Prefix { field: String, prefix: String },
    Wildcard { field: String, pattern: String },
    Match { field: String, value: Value },
    MatchPhrase { field: String, value: Value },
    Exists { field: String },
    Bool {
        must: Vec<SearchQuery>,
        must_not: Vec<SearchQuery>,
    },
    /// 호출자가 준 JSON 쿼리 원문
    Wrapper { query: String },
}

impl SearchQuery {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SearchQuery::MatchAll => json!({ "match_all": {} }),
            SearchQuery::Term { field, value } => json!({ "term": { field: value.to_json() } }),
            SearchQuery::Terms { field, values } => {
                let values: Vec<serde_json::Value> = values.iter().map(Value::to_json).collect();
                json!({ "terms": { field: values } })
            }
            SearchQuery::Range { field, op, value } => {
                json!({ "range": { field: { op.key(): value.to_json() } } })
            }
            SearchQuery::Prefix { field, prefix } => json!({ "prefix": { field: prefix } }),
            SearchQuery::Wildcard { field, pattern } => json!({ "wildcard": { field: pattern } }),
            SearchQuery::Match { field, value } => json!({ "match": { field: value.to_json() } }),
            SearchQuery::MatchPhrase { field, value } => {
                json!({ "match_phrase": { field: value.to_json() } })
            }
            SearchQuery::Exists { field } => json!({ "exists": { "field": field } }),
            SearchQuery::Bool { must, must_not } => {
                let mut body = Map::new();
                if !must.is_empty() {
                    body.insert("must".into(), must.iter().map(SearchQuery::to_json).collect());
                }
                if !must_not.is_empty() {
                    body.insert(
                        "must_not".into(),
                        must_not.iter().map(SearchQuery::to_json).collect(),
                    );
                }
                json!({ "bool": body })
            }
            SearchQuery::Wrapper { query } => {
                json!({ "wrapper": { "query": query } })
            }
        }
    }
}

/// 단일 필드 terms 집계
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermsAggregation {
    pub name: String,
    pub field: String,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub index: String,
    pub doc_type: Option<String>,
    pub query: SearchQuery,
    pub from: i64,
    pub size: i64,
    /// `None`이면 `_source` 전체, `Some(vec![])`이면 `_source` 없음
    pub source: Option<Vec<String>>,
    pub sort: Vec<(String, Direction)>,
    pub aggregation: Option<TermsAggregation>,
    pub preference: Option<String>,
}

impl SearchRequest {
    pub fn new(index: impl Into<String>, query: SearchQuery) -> Self {
        Self {
            index: index.into(),
            doc_type: None,
            query,
            from: 0,
            size: 0,
            source: None,
            sort: Vec::new(),
            aggregation: None,
            preference: None,
        }
    }

    /// 문서 없이 총 건수만 세는 요청
    pub fn is_count(&self) -> bool {
        self.size == 0 && self.aggregation.is_none()
    }

    /// 요청 본문 JSON
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = Map::new();
        body.insert("from".into(), json!(self.from));
        body.insert("size".into(), json!(self.size));
        body.insert("query".into(), self.query.to_json());
        match &self.source {
            Some(fields) if fields.is_empty() => {
                body.insert("_source".into(), json!(false));
            }
            Some(fields) => {
                body.insert("_source".into(), json!({ "includes": fields }));
            }
            None => {}
        }
        if !self.sort.is_empty() {
            let sort: Vec<serde_json::Value> = self
                .sort
                .iter()
                .map(|(field, dir)| {
                    let order = match dir {
                        Direction::Asc => "asc",
                        Direction::Desc => "desc",
                    };
                    json!({ field: { "order": order } })
                })
                .collect();
            body.insert("sort".into(), json!(sort));
        }
        if let Some(agg) = &self.aggregation {
            body.insert(
                "aggs".into(),
                json!({ &agg.name: { "terms": { "field": agg.field, "size": agg.size } } }),
            );
        }
        serde_json::Value::Object(body)
    }
}

/// 검색 결과 문서 하나
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub version: Option<i64>,
    pub source: serde_json::Value,
}

/// terms 집계 버킷
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: Value,
    pub doc_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    pub total_hits: i64,
    pub hits: Vec<SearchHit>,
    pub buckets: Vec<Bucket>,
}

/// insert 시 문서 생성 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    /// 같은 id가 있으면 실패
    Create,
    Index,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexRequest {
    pub index: String,
    pub doc_type: Option<String>,
    /// `None`이면 엔진이 id 발급
    pub id: Option<String>,
    pub op_type: OpType,
    pub source: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexResponse {
    pub id: String,
    pub version: i64,
}

/// 낙관적 동시성 제어 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSpec {
    MatchAny,
    Pinned(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub index: String,
    pub doc_type: Option<String>,
    pub id: String,
    pub version: VersionSpec,
    /// 부분 문서
    pub doc: serde_json::Value,
}

/// 쓰기 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Created,
    Updated,
    Deleted,
    NotFound,
    /// 값 변화 없음, 버전 증가 없음
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResponse {
    pub result: WriteResult,
    pub version: i64,
}
