// 통합 테스트 공용 픽스처
//
// - SqliteExecutor: rusqlite 인메모리 DB 위의 SqlExecutor
// - FakeSearchClient: 인메모리 문서 저장소 + 호출 카운터
// - FakeSession: 실행된 CQL을 기록하는 와이드 컬럼 세션

#![allow(dead_code)]

use parking_lot::Mutex;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, ErrorCode, params_from_iter};
use serde_json::{Map, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use zdao_core::Entity;
use zdao_core::api::Value;
use zdao_core::dao::search::{
    Bucket, IndexRequest, IndexResponse, OpType, RangeOp, SearchClient, SearchHit, SearchQuery,
    SearchRequest, SearchResponse, UpdateRequest, VersionSpec, WriteResponse, WriteResult,
};
use zdao_core::dao::wide_column::{CqlStatement, WideColumnSession};
use zdao_core::dao::{SqlConnector, SqlExecutor};
use zdao_core::error::{BackendError, BackendErrorKind, BackendResult};
use zdao_core::mapping::Row;
use zdao_core::query::Direction;
use zdao_core::settings::SqlDialect;

// ─── Entities ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[zdao(table = "t_member")]
pub struct Member {
    #[zdao(pk, column)]
    pub id: i64,
    #[zdao(column)]
    pub user_name: String,
    #[zdao(column)]
    pub age: i32,
    #[zdao(column)]
    pub status: String,
    #[zdao(transient)]
    pub total: i64,
}

impl Member {
    pub fn new(user_name: &str, age: i32, status: &str) -> Self {
        Self {
            user_name: user_name.into(),
            age,
            status: status.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[zdao(index = "article", doc_type = "doc")]
pub struct Article {
    #[zdao(pk, column)]
    pub id: String,
    #[zdao(column)]
    pub title: String,
    #[zdao(column)]
    pub views: i64,
    #[zdao(column)]
    pub category: String,
    #[zdao(column, version)]
    pub version: i64,
    #[zdao(transient)]
    pub total: i64,
}

impl Article {
    pub fn new(id: &str, title: &str, views: i64, category: &str) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            views,
            category: category.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Entity)]
#[zdao(table = "event", keyspace = "audit")]
pub struct Event {
    #[zdao(pk)]
    pub id: String,
    pub kind: String,
    pub at: i64,
}

// ─── SQLite executor ────────────────────────────────────

pub const MEMBER_SCHEMA: &str = "CREATE TABLE t_member (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_name TEXT NOT NULL UNIQUE,
    age INTEGER,
    status TEXT
)";

pub struct SqliteExecutor {
    conn: Mutex<Connection>,
    pub statements: AtomicUsize,
}

impl SqliteExecutor {
    pub fn open(schema: &str) -> Arc<Self> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema).unwrap();
        Arc::new(Self {
            conn: Mutex::new(conn),
            statements: AtomicUsize::new(0),
        })
    }

    fn bind(params: &[Value]) -> BackendResult<Vec<SqlValue>> {
        params
            .iter()
            .map(|v| match v {
                Value::Null => Ok(SqlValue::Null),
                Value::Int32(n) => Ok(SqlValue::Integer(i64::from(*n))),
                Value::Int64(n) => Ok(SqlValue::Integer(*n)),
                Value::Float64(f) => Ok(SqlValue::Real(*f)),
                Value::Utf8(s) => Ok(SqlValue::Text(s.clone())),
                Value::Boolean(b) => Ok(SqlValue::Integer(i64::from(*b))),
                Value::List(_) => Err(BackendError::other("list parameters are not bindable")),
            })
            .collect()
    }

    fn backend_error(err: rusqlite::Error) -> BackendError {
        let kind = match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                BackendErrorKind::DuplicateKey
            }
            _ => BackendErrorKind::Other,
        };
        BackendError::new(kind, err.to_string()).with_source(err)
    }
}

impl SqlExecutor for SqliteExecutor {
    fn query_for_list(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Row>> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql).map_err(Self::backend_error)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let mut rows = stmt
            .query(params_from_iter(Self::bind(params)?))
            .map_err(Self::backend_error)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(Self::backend_error)? {
            let mut map = HashMap::new();
            for (i, name) in names.iter().enumerate() {
                let value = match row.get_ref(i).map_err(Self::backend_error)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(n) => Value::Int64(n),
                    ValueRef::Real(f) => Value::Float64(f),
                    ValueRef::Text(t) => Value::Utf8(String::from_utf8_lossy(t).into_owned()),
                    ValueRef::Blob(_) => continue,
                };
                map.insert(name.clone(), value);
            }
            out.push(map);
        }
        Ok(out)
    }

    fn query_for_long(&self, sql: &str, params: &[Value]) -> BackendResult<i64> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        let conn = self.conn.lock();
        conn.query_row(sql, params_from_iter(Self::bind(params)?), |row| row.get::<_, i64>(0))
            .map_err(Self::backend_error)
    }

    fn update(&self, sql: &str, params: &[Value]) -> BackendResult<i64> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        let conn = self.conn.lock();
        conn.execute(sql, params_from_iter(Self::bind(params)?))
            .map(|n| n as i64)
            .map_err(Self::backend_error)
    }

    fn update_returning_key(
        &self,
        sql: &str,
        params: &[Value],
        _key_column: &str,
    ) -> BackendResult<(i64, Option<Value>)> {
        self.statements.fetch_add(1, Ordering::SeqCst);
        let conn = self.conn.lock();
        let affected = conn
            .execute(sql, params_from_iter(Self::bind(params)?))
            .map_err(Self::backend_error)?;
        Ok((affected as i64, Some(Value::Int64(conn.last_insert_rowid()))))
    }
}

/// 모든 URL에 같은 실행기를 돌려주는 커넥터
pub struct SharedConnector {
    pub executor: Arc<SqliteExecutor>,
    pub connects: AtomicUsize,
}

impl SharedConnector {
    pub fn new(executor: Arc<SqliteExecutor>) -> Arc<Self> {
        Arc::new(Self {
            executor,
            connects: AtomicUsize::new(0),
        })
    }
}

impl SqlConnector for SharedConnector {
    fn connect(&self, _dialect: SqlDialect, _url: &str) -> BackendResult<Arc<dyn SqlExecutor>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.executor.clone())
    }
}

/// 실행한 SQL을 기록하는 실행기. 시퀀스 채번은 `next_value`부터 1씩 증가.
pub struct RecordingExecutor {
    pub calls: Mutex<Vec<(String, Vec<Value>)>>,
    pub next_value: AtomicI64,
}

impl RecordingExecutor {
    pub fn new(next_value: i64) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_value: AtomicI64::new(next_value),
        })
    }

    pub fn statements(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(sql, _)| sql.clone()).collect()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.calls.lock().push((sql.to_string(), params.to_vec()));
    }
}

impl SqlExecutor for RecordingExecutor {
    fn query_for_list(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Row>> {
        self.record(sql, params);
        Ok(Vec::new())
    }

    fn query_for_long(&self, sql: &str, params: &[Value]) -> BackendResult<i64> {
        self.record(sql, params);
        if sql.contains("NEXTVAL") {
            return Ok(self.next_value.fetch_add(1, Ordering::SeqCst));
        }
        Ok(0)
    }

    fn update(&self, sql: &str, params: &[Value]) -> BackendResult<i64> {
        self.record(sql, params);
        Ok(1)
    }

    fn update_returning_key(
        &self,
        sql: &str,
        params: &[Value],
        _key_column: &str,
    ) -> BackendResult<(i64, Option<Value>)> {
        self.record(sql, params);
        Ok((1, None))
    }
}

// ─── Fake search client ─────────────────────────────────

struct Document {
    version: i64,
    source: serde_json::Value,
}

#[derive(Default)]
pub struct FakeSearchClient {
    docs: Mutex<BTreeMap<String, Document>>,
    next_id: AtomicI64,
    /// 남은 횟수만큼 update가 버전 충돌로 실패
    pub forced_conflicts: AtomicUsize,
    /// 검색 결과에 더할 가짜 건수 (과부하 시나리오용)
    pub extra_hits: AtomicI64,
    pub search_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub indices: Mutex<Vec<String>>,
}

impl FakeSearchClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn version_of(&self, id: &str) -> Option<i64> {
        self.docs.lock().get(id).map(|d| d.version)
    }

    pub fn source_of(&self, id: &str) -> Option<serde_json::Value> {
        self.docs.lock().get(id).map(|d| d.source.clone())
    }

    fn field<'a>(source: &'a serde_json::Value, field: &str) -> Option<&'a serde_json::Value> {
        source.get(field).filter(|v| !v.is_null())
    }

    fn compare(a: &serde_json::Value, b: &serde_json::Value) -> Option<std::cmp::Ordering> {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => Some(a.as_str()?.cmp(b.as_str()?)),
        }
    }

    fn glob(pattern: &str, text: &str) -> bool {
        match pattern.split_once('*') {
            None => pattern == text,
            Some((head, rest)) => {
                let Some(tail) = text.strip_prefix(head) else {
                    return false;
                };
                (0..=tail.len())
                    .filter(|i| tail.is_char_boundary(*i))
                    .any(|i| Self::glob(rest, &tail[i..]))
            }
        }
    }

    fn matches(query: &SearchQuery, source: &serde_json::Value) -> bool {
        let text = |field: &str| Self::field(source, field).and_then(|v| v.as_str()).map(str::to_string);
        match query {
            SearchQuery::MatchAll => true,
            SearchQuery::Term { field, value } => Self::field(source, field) == Some(&value.to_json()),
            SearchQuery::Terms { field, values } => values
                .iter()
                .any(|v| Self::field(source, field) == Some(&v.to_json())),
            SearchQuery::Range { field, op, value } => {
                let Some(actual) = Self::field(source, field) else {
                    return false;
                };
                let Some(ord) = Self::compare(actual, &value.to_json()) else {
                    return false;
                };
                match op {
                    RangeOp::Gt => ord.is_gt(),
                    RangeOp::Gte => ord.is_ge(),
                    RangeOp::Lt => ord.is_lt(),
                    RangeOp::Lte => ord.is_le(),
                }
            }
            SearchQuery::Prefix { field, prefix } => text(field).is_some_and(|t| t.starts_with(prefix.as_str())),
            SearchQuery::Wildcard { field, pattern } => text(field).is_some_and(|t| Self::glob(pattern, &t)),
            SearchQuery::Match { field, value } | SearchQuery::MatchPhrase { field, value } => {
                match (text(field), value) {
                    (Some(t), Value::Utf8(needle)) => t.contains(needle.as_str()),
                    _ => false,
                }
            }
            SearchQuery::Exists { field } => Self::field(source, field).is_some(),
            SearchQuery::Bool { must, must_not } => {
                must.iter().all(|q| Self::matches(q, source))
                    && !must_not.iter().any(|q| Self::matches(q, source))
            }
            // {"term": {"field": value}} 만 해석, 나머지는 전체
            SearchQuery::Wrapper { query } => {
                let parsed: serde_json::Value = serde_json::from_str(query).unwrap_or(json!({}));
                match parsed.get("term").and_then(|t| t.as_object()) {
                    Some(term) => term
                        .iter()
                        .all(|(field, value)| Self::field(source, field) == Some(value)),
                    None => true,
                }
            }
        }
    }

    fn project(source: &serde_json::Value, includes: &Option<Vec<String>>) -> serde_json::Value {
        match includes {
            None => source.clone(),
            Some(fields) => {
                let mut out = Map::new();
                for f in fields {
                    if let Some(v) = source.get(f) {
                        out.insert(f.clone(), v.clone());
                    }
                }
                serde_json::Value::Object(out)
            }
        }
    }
}

impl SearchClient for FakeSearchClient {
    fn search(&self, request: &SearchRequest) -> BackendResult<SearchResponse> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.indices.lock().push(request.index.clone());
        let docs = self.docs.lock();
        let mut matched: Vec<(&String, &Document)> = docs
            .iter()
            .filter(|(_, d)| Self::matches(&request.query, &d.source))
            .collect();
        let total_hits = matched.len() as i64 + self.extra_hits.load(Ordering::SeqCst);

        let mut buckets = Vec::new();
        if let Some(agg) = &request.aggregation {
            let mut counts: BTreeMap<String, (serde_json::Value, i64)> = BTreeMap::new();
            for (_, d) in &matched {
                if let Some(key) = Self::field(&d.source, &agg.field) {
                    counts.entry(key.to_string()).or_insert((key.clone(), 0)).1 += 1;
                }
            }
            let mut list: Vec<(serde_json::Value, i64)> = counts.into_values().collect();
            list.sort_by(|a, b| b.1.cmp(&a.1));
            buckets = list
                .into_iter()
                .take(agg.size.max(0) as usize)
                .map(|(key, doc_count)| Bucket {
                    key: Value::from_json(&key),
                    doc_count,
                })
                .collect();
        }

        for (field, direction) in request.sort.iter().rev() {
            matched.sort_by(|(_, a), (_, b)| {
                let ord = match (a.source.get(field), b.source.get(field)) {
                    (Some(x), Some(y)) => Self::compare(x, y).unwrap_or(std::cmp::Ordering::Equal),
                    _ => std::cmp::Ordering::Equal,
                };
                match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                }
            });
        }

        let hits = matched
            .into_iter()
            .skip(request.from.max(0) as usize)
            .take(request.size.max(0) as usize)
            .map(|(id, d)| SearchHit {
                id: id.clone(),
                version: Some(d.version),
                source: Self::project(&d.source, &request.source),
            })
            .collect();

        Ok(SearchResponse {
            total_hits,
            hits,
            buckets,
        })
    }

    fn get(&self, _index: &str, _doc_type: Option<&str>, id: &str) -> BackendResult<Option<SearchHit>> {
        Ok(self.docs.lock().get(id).map(|d| SearchHit {
            id: id.to_string(),
            version: Some(d.version),
            source: d.source.clone(),
        }))
    }

    fn index(&self, request: &IndexRequest) -> BackendResult<IndexResponse> {
        self.indices.lock().push(request.index.clone());
        let mut docs = self.docs.lock();
        let id = match &request.id {
            Some(id) => id.clone(),
            None => format!("auto-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
        };
        if request.op_type == OpType::Create && docs.contains_key(&id) {
            return Err(BackendError::new(
                BackendErrorKind::DuplicateKey,
                format!("document [{id}] already exists"),
            ));
        }
        docs.insert(
            id.clone(),
            Document {
                version: 1,
                source: request.source.clone(),
            },
        );
        Ok(IndexResponse { id, version: 1 })
    }

    fn update(&self, request: &UpdateRequest) -> BackendResult<WriteResponse> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let forced = self
            .forced_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if forced {
            return Err(BackendError::new(BackendErrorKind::VersionConflict, "version conflict"));
        }

        let mut docs = self.docs.lock();
        let Some(doc) = docs.get_mut(&request.id) else {
            return Ok(WriteResponse {
                result: WriteResult::NotFound,
                version: 0,
            });
        };
        if let VersionSpec::Pinned(expected) = request.version
            && expected != doc.version
        {
            return Err(BackendError::new(
                BackendErrorKind::VersionConflict,
                format!("current version [{}] is different than the one provided [{expected}]", doc.version),
            ));
        }
        let mut merged = doc.source.clone();
        if let (Some(target), Some(patch)) = (merged.as_object_mut(), request.doc.as_object()) {
            for (k, v) in patch {
                target.insert(k.clone(), v.clone());
            }
        }
        if merged == doc.source {
            return Ok(WriteResponse {
                result: WriteResult::Noop,
                version: doc.version,
            });
        }
        doc.source = merged;
        doc.version += 1;
        Ok(WriteResponse {
            result: WriteResult::Updated,
            version: doc.version,
        })
    }

    fn delete(&self, _index: &str, _doc_type: Option<&str>, id: &str) -> BackendResult<WriteResponse> {
        let removed = self.docs.lock().remove(id);
        Ok(WriteResponse {
            result: if removed.is_some() {
                WriteResult::Deleted
            } else {
                WriteResult::NotFound
            },
            version: removed.map_or(0, |d| d.version + 1),
        })
    }

    fn refresh(&self, _index: &str) -> BackendResult<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ─── Fake wide-column session ───────────────────────────

#[derive(Default)]
pub struct FakeSession {
    pub executed: Mutex<Vec<(String, Vec<Value>)>>,
    pub batches: Mutex<Vec<Vec<CqlStatement>>>,
    /// select 문장이 돌려줄 행
    pub rows: Mutex<Vec<Row>>,
    pub fail_with: Mutex<Option<BackendErrorKind>>,
}

impl FakeSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl WideColumnSession for FakeSession {
    fn execute(&self, cql: &str, params: &[Value]) -> BackendResult<Vec<Row>> {
        if let Some(kind) = *self.fail_with.lock() {
            return Err(BackendError::new(kind, "session failure"));
        }
        self.executed.lock().push((cql.to_string(), params.to_vec()));
        if cql.starts_with("select count(*)") {
            let n = self.rows.lock().len() as i64;
            return Ok(vec![HashMap::from([("count".to_string(), Value::Int64(n))])]);
        }
        if cql.to_lowercase().starts_with("select") {
            return Ok(self.rows.lock().clone());
        }
        Ok(Vec::new())
    }

    fn execute_batch(&self, statements: &[CqlStatement]) -> BackendResult<()> {
        if let Some(kind) = *self.fail_with.lock() {
            return Err(BackendError::new(kind, "batch failure"));
        }
        self.batches.lock().push(statements.to_vec());
        Ok(())
    }
}
