//! 와이드 컬럼 DAO
//!
//! 단건/배치 insert, 전체 건수, `*_by_sql` 패스스루만 지원합니다.
//! 나머지 연산은 `DaoError::Unsupported`로 즉시 실패합니다.

pub mod client;
pub mod compiler;

pub use client::{CqlStatement, WideColumnConnector, WideColumnSession};
pub use compiler::CqlCompiler;

use crate::api::{Entity, Id, Value};
use crate::dao::BaseDao;
use crate::dao::helper::*;
use crate::error::{BackendError, CallKind, DaoError, DaoResult};
use crate::mapping::{EntityMapper, MappingPolicy, Row, rows_to_entities};
use crate::query::{Criteria, Query, Update};
use crate::translate::translate;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

const DAO: &str = "WideColumnDao";

pub struct WideColumnDao<T: Entity> {
    mapper: Arc<EntityMapper>,
    session: Arc<dyn WideColumnSession>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> WideColumnDao<T> {
    pub fn new(session: Arc<dyn WideColumnSession>) -> DaoResult<Self> {
        let mapper = EntityMapper::for_entity::<T>(MappingPolicy::WideColumn)?;
        Ok(Self {
            mapper,
            session,
            _entity: PhantomData,
        })
    }

    fn remote(&self, err: BackendError) -> DaoError {
        translate(err, CallKind::WideColumn)
    }

    fn execute(&self, cql: &str, params: &[Value]) -> DaoResult<Vec<Row>> {
        debug!(target: "zdao::wide_column", entity = self.mapper.type_name(), "{}", format_sql(cql, params));
        self.session.execute(cql, params).map_err(|e| self.remote(e))
    }

    /// 첫 행의 정수 값 (`count` 컬럼 우선)
    fn read_count(&self, cql: &str, params: &[Value]) -> DaoResult<i64> {
        let rows = self.execute(cql, params)?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(0);
        };
        let as_long = |v: &Value| match v {
            Value::Int64(n) => Some(*n),
            Value::Int32(n) => Some(i64::from(*n)),
            _ => None,
        };
        row.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("count"))
            .and_then(|(_, v)| as_long(v))
            .or_else(|| row.values().find_map(as_long))
            .ok_or_else(|| DaoError::type_mismatch("integer count column", "row without integer value"))
    }
}

impl<T: Entity> BaseDao<T> for WideColumnDao<T> {
    fn mapper(&self) -> &EntityMapper {
        &self.mapper
    }

    fn insert(&self, entity: &mut T) -> DaoResult<i64> {
        let stmt = CqlCompiler::new(&self.mapper).insert(entity);
        self.execute(&stmt.cql, &stmt.params)?;
        Ok(1)
    }

    /// 하나의 원자적 배치 문장으로 실행
    fn insert_batch(&self, entities: &mut [T]) -> DaoResult<i64> {
        check_entities(entities)?;
        let compiler = CqlCompiler::new(&self.mapper);
        let statements: Vec<CqlStatement> = entities.iter().map(|e| compiler.insert(e)).collect();
        debug!(
            target: "zdao::wide_column",
            entity = self.mapper.type_name(),
            statements = statements.len(),
            "batch {}",
            statements.first().map(|s| s.cql.as_str()).unwrap_or_default()
        );
        self.session
            .execute_batch(&statements)
            .map_err(|e| self.remote(e))?;
        Ok(entities.len() as i64)
    }

    fn update(&self, _entity: &T) -> DaoResult<i64> {
        Err(DaoError::unsupported(DAO, "update"))
    }

    fn update_properties(&self, _entity: &T, _properties: &[&str]) -> DaoResult<i64> {
        Err(DaoError::unsupported(DAO, "update_properties"))
    }

    fn update_by_id(&self, _id: &Id, _update: &Update) -> DaoResult<i64> {
        Err(DaoError::unsupported(DAO, "update_by_id"))
    }

    fn update_by_ids(&self, _ids: &[Id], _update: &Update) -> DaoResult<i64> {
        Err(DaoError::unsupported(DAO, "update_by_ids"))
    }

    fn update_by_criteria(&self, _update: &Update, _criteria: &Criteria) -> DaoResult<i64> {
        Err(DaoError::unsupported(DAO, "update_by_criteria"))
    }

    fn update_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        check_sql(sql)?;
        self.execute(sql, params)?;
        Ok(1)
    }

    fn delete_by_id(&self, _id: &Id) -> DaoResult<i64> {
        Err(DaoError::unsupported(DAO, "delete_by_id"))
    }

    fn delete_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        check_sql(sql)?;
        self.execute(sql, params)?;
        Ok(1)
    }

    fn exists_by_id(&self, _id: &Id) -> DaoResult<bool> {
        Err(DaoError::unsupported(DAO, "exists_by_id"))
    }

    fn exists(&self, _criteria: &Criteria) -> DaoResult<bool> {
        Err(DaoError::unsupported(DAO, "exists"))
    }

    fn count_by_criteria(&self, _criteria: &Criteria) -> DaoResult<i64> {
        Err(DaoError::unsupported(DAO, "count_by_criteria"))
    }

    fn count_all(&self) -> DaoResult<i64> {
        let cql = CqlCompiler::new(&self.mapper).count_all();
        self.read_count(&cql, &[])
    }

    fn count_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        check_sql(sql)?;
        self.read_count(sql, params)
    }

    fn find_one_by_id(&self, _id: &Id) -> DaoResult<Option<T>> {
        Err(DaoError::unsupported(DAO, "find_one_by_id"))
    }

    fn find_one_by_query(&self, _query: &Query) -> DaoResult<Option<T>> {
        Err(DaoError::unsupported(DAO, "find_one_by_query"))
    }

    fn find_one_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<Option<T>> {
        Ok(self.find_list_by_sql(sql, params)?.into_iter().next())
    }

    fn find_list_by_ids(&self, _ids: &[Id]) -> DaoResult<Vec<T>> {
        Err(DaoError::unsupported(DAO, "find_list_by_ids"))
    }

    fn find_list_by_query(&self, _query: &Query) -> DaoResult<Vec<T>> {
        Err(DaoError::unsupported(DAO, "find_list_by_query"))
    }

    fn find_list_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<Vec<T>> {
        check_sql(sql)?;
        let rows = self.execute(sql, params)?;
        Ok(rows_to_entities(rows, &self.mapper))
    }
}
