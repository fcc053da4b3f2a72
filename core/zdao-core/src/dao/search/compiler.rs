//! 검색 엔진 컴파일러
//!
//! Criteria는 bool 쿼리로, Query는 `SearchRequest`로 바뀝니다.
//! 필드 이름은 엔티티 매퍼의 컬럼 이름(기본은 프로퍼티 이름)을 씁니다.

use crate::api::{Entity, Value};
use crate::dao::search::dsl::{RangeOp, SearchQuery, SearchRequest, TermsAggregation};
use crate::error::{DaoError, DaoResult};
use crate::mapping::EntityMapper;
use crate::query::{Criteria, Operator, OperatorShape, Query, Update};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde_json::Map;

// ════════════════════════════════════════
// Index name
// ════════════════════════════════════════

/// 인덱스 이름, 선택적으로 날짜 접미사
///
/// 패턴 `date{%Y.%m.%d}`는 인덱스 이름 뒤에 현재 UTC 날짜를 붙입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexName {
    prefix: String,
    date_format: Option<String>,
}

impl IndexName {
    pub fn parse(index: &str, pattern: Option<&str>) -> DaoResult<Self> {
        if index.trim().is_empty() {
            return Err(DaoError::Configuration("search index name is blank".into()));
        }
        let date_format = match pattern.map(str::trim).filter(|p| !p.is_empty()) {
            None => None,
            Some(pattern) => {
                let format = pattern
                    .strip_prefix("date{")
                    .and_then(|rest| rest.strip_suffix('}'))
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| {
                        DaoError::Configuration(format!(
                            "index pattern '{pattern}' must look like date{{<format>}}"
                        ))
                    })?;
                if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                    return Err(DaoError::Configuration(format!(
                        "index pattern '{pattern}' has an invalid date format"
                    )));
                }
                Some(format.to_string())
            }
        };
        Ok(Self {
            prefix: index.to_string(),
            date_format,
        })
    }

    pub fn is_dynamic(&self) -> bool {
        self.date_format.is_some()
    }

    pub fn resolve_at(&self, now: DateTime<Utc>) -> String {
        match &self.date_format {
            Some(format) => format!("{}{}", self.prefix, now.format(format)),
            None => self.prefix.clone(),
        }
    }

    pub fn resolve(&self) -> String {
        self.resolve_at(Utc::now())
    }
}

// ════════════════════════════════════════
// Compiler
// ════════════════════════════════════════

pub struct SearchCompiler<'a> {
    mapper: &'a EntityMapper,
    max_result_window: i64,
}

impl<'a> SearchCompiler<'a> {
    pub fn new(mapper: &'a EntityMapper, max_result_window: i64) -> Self {
        Self {
            mapper,
            max_result_window,
        }
    }

    fn field(&self, property: &str, param: &'static str) -> DaoResult<&'a str> {
        self.mapper
            .column_of(property)
            .ok_or_else(|| DaoError::invalid_argument(param, format!("unknown property '{property}'")))
    }

    /// Criteria → bool 쿼리. 조건이 없으면 match_all.
    pub fn query(&self, criteria: Option<&Criteria>) -> DaoResult<SearchQuery> {
        let Some(criteria) = criteria.filter(|c| !c.is_empty()) else {
            return Ok(SearchQuery::MatchAll);
        };

        let mut must = Vec::new();
        let mut must_not = Vec::new();
        for node in criteria.nodes() {
            let field = self.field(&node.key, "criteria")?.to_string();
            let op = node.operator;
            match op.shape() {
                OperatorShape::Single if matches!(node.value, Value::List(_)) => {
                    return Err(DaoError::type_mismatch(
                        format!("scalar value for '{op}' on '{}'", node.key),
                        "List",
                    ));
                }
                OperatorShape::Multi => {
                    let items = node.value.as_list().map_err(|_| {
                        DaoError::type_mismatch(
                            format!("List for '{op}' on '{}'", node.key),
                            node.value.kind().to_string(),
                        )
                    })?;
                    if items.is_empty() {
                        return Err(DaoError::invalid_argument(
                            "criteria",
                            format!("'{op}' on '{}' needs at least one value", node.key),
                        ));
                    }
                }
                _ => {}
            }

            let value = node.value.clone();
            match op {
                Operator::Eq => must.push(SearchQuery::Term { field, value }),
                Operator::Ne => must_not.push(SearchQuery::Term { field, value }),
                Operator::Gt => must.push(range(field, RangeOp::Gt, value)),
                Operator::Gte => must.push(range(field, RangeOp::Gte, value)),
                Operator::Lt => must.push(range(field, RangeOp::Lt, value)),
                Operator::Lte => must.push(range(field, RangeOp::Lte, value)),
                Operator::In => must.push(SearchQuery::Terms {
                    field,
                    values: node.value.as_list()?.to_vec(),
                }),
                Operator::NotIn => must_not.push(SearchQuery::Terms {
                    field,
                    values: node.value.as_list()?.to_vec(),
                }),
                Operator::Like => must.push(like(field, value.as_str()?)),
                Operator::Match => must.push(SearchQuery::Match { field, value }),
                Operator::MatchPhrase => must.push(SearchQuery::MatchPhrase { field, value }),
                Operator::IsNull => must_not.push(SearchQuery::Exists { field }),
                Operator::IsNotNull => must.push(SearchQuery::Exists { field }),
            }
        }
        Ok(SearchQuery::Bool { must, must_not })
    }

    /// 목록 조회 요청
    ///
    /// limit이 없으면 size는 최대 윈도이며, 실행 전에 과부하 보호가 실제 건수로 줄입니다.
    /// group-by가 있으면 첫 키로 terms 집계만 하고 문서는 가져오지 않습니다.
    pub fn search(&self, query: &Query, index: &str) -> DaoResult<SearchRequest> {
        let mut request = SearchRequest::new(index, self.query(query.get_criteria())?);
        request.doc_type = self.mapper.doc_type().map(str::to_string);
        request.preference = query.get_hint().map(str::to_string);
        request.from = query.get_offset().unwrap_or(0).max(0);
        request.size = match query.get_limit() {
            Some(limit) if limit >= 1 => limit,
            _ => self.max_result_window,
        };

        if let Some(group) = query.get_group_bys().first() {
            let field = self.field(&group.key, "group_bys")?;
            request.aggregation = Some(TermsAggregation {
                name: field.to_string(),
                field: field.to_string(),
                size: request.size,
            });
            request.from = 0;
            request.size = 0;
            request.source = Some(Vec::new());
            return Ok(request);
        }

        if !query.get_fields().is_empty() {
            let fields = query
                .get_fields()
                .iter()
                .map(|f| self.field(f, "fields").map(str::to_string))
                .collect::<DaoResult<Vec<_>>>()?;
            request.source = Some(fields);
        }
        request.sort = query
            .get_order_bys()
            .iter()
            .map(|o| Ok((self.field(&o.key, "order_bys")?.to_string(), o.direction)))
            .collect::<DaoResult<Vec<_>>>()?;
        Ok(request)
    }

    /// 문서 없이 총 건수만 받는 요청
    pub fn count(&self, criteria: Option<&Criteria>, index: &str) -> DaoResult<SearchRequest> {
        Ok(self.count_of(self.query(criteria)?, index))
    }

    pub fn count_of(&self, query: SearchQuery, index: &str) -> SearchRequest {
        let mut request = SearchRequest::new(index, query);
        request.doc_type = self.mapper.doc_type().map(str::to_string);
        request.source = Some(Vec::new());
        request
    }

    /// 호출자의 JSON 쿼리를 그대로 감싼 요청
    pub fn wrapper(&self, raw: &str, index: &str, from: i64, size: Option<i64>) -> SearchRequest {
        let mut request = SearchRequest::new(
            index,
            SearchQuery::Wrapper {
                query: raw.to_string(),
            },
        );
        request.doc_type = self.mapper.doc_type().map(str::to_string);
        request.from = from.max(0);
        request.size = size.filter(|s| *s >= 1).unwrap_or(self.max_result_window);
        request
    }

    pub fn max_result_window(&self) -> i64 {
        self.max_result_window
    }

    /// insert용 `_source`. transient와 버전 프로퍼티, 값이 없는 프로퍼티는 뺍니다.
    pub fn document<T: Entity>(&self, entity: &T) -> serde_json::Value {
        let version = self.mapper.version_property();
        let mut source = Map::new();
        for p in self.mapper.persisted() {
            if Some(p.property) == version {
                continue;
            }
            match entity.get_value(p.property) {
                Some(value) if !value.is_null() => {
                    source.insert(p.column.clone(), value.to_json());
                }
                _ => {}
            }
        }
        serde_json::Value::Object(source)
    }

    /// 부분 업데이트 문서. 버전 키는 동시성 제어용이므로 문서에 넣지 않습니다.
    pub fn partial_document(&self, update: &Update) -> DaoResult<serde_json::Value> {
        let version = self.mapper.version_property();
        let mut doc = Map::new();
        for (key, value) in update.iter() {
            if Some(key) == version {
                continue;
            }
            let mapping = self
                .mapper
                .property(key)
                .ok_or_else(|| DaoError::invalid_argument("update", format!("unknown property '{key}'")))?;
            if mapping.transient {
                continue;
            }
            doc.insert(mapping.column.clone(), value.to_json());
        }
        if doc.is_empty() {
            return Err(DaoError::invalid_argument(
                "update",
                "update has no persistable properties",
            ));
        }
        Ok(serde_json::Value::Object(doc))
    }
}

fn range(field: String, op: RangeOp, value: Value) -> SearchQuery {
    SearchQuery::Range { field, op, value }
}

/// `abc%` → prefix, 그 외 `%` → `*` wildcard
fn like(field: String, pattern: &str) -> SearchQuery {
    if !pattern.starts_with('%') && pattern.ends_with('%') {
        let prefix = pattern.trim_end_matches('%');
        if !prefix.contains('%') {
            return SearchQuery::Prefix {
                field,
                prefix: prefix.to_string(),
            };
        }
    }
    SearchQuery::Wildcard {
        field,
        pattern: pattern.replace('%', "*"),
    }
}
