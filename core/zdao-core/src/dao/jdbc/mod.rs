//! 관계형 DAO — SQL 컴파일 후 라우터가 고른 실행기로 실행

pub mod client;
pub mod compiler;
pub mod router;

pub use client::{SqlConnector, SqlExecutor};
pub use compiler::{SqlCompiler, SqlStatement};
pub use router::DatabaseRouter;

use crate::api::{Entity, Id, Value, ValueKind};
use crate::dao::BaseDao;
use crate::dao::helper::*;
use crate::error::{BackendError, DaoError, DaoResult};
use crate::mapping::{EntityMapper, MappingPolicy, has_pk_value, rows_to_entities};
use crate::query::{Criteria, Operator, Query, Update};
use crate::settings::{JdbcSettings, SqlDialect};
use crate::translate::translate;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub struct JdbcDao<T: Entity> {
    mapper: Arc<EntityMapper>,
    dialect: SqlDialect,
    router: Arc<DatabaseRouter>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> JdbcDao<T> {
    /// 엔티티 메타데이터를 검증하고 DAO 생성
    pub fn new(settings: &JdbcSettings, router: Arc<DatabaseRouter>) -> DaoResult<Self> {
        let mapper = EntityMapper::for_entity::<T>(MappingPolicy::Relational)?;
        Ok(Self {
            mapper,
            dialect: settings.dialect,
            router,
            _entity: PhantomData,
        })
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    fn compiler(&self) -> SqlCompiler<'_> {
        SqlCompiler::new(&self.mapper, self.dialect)
    }

    fn remote(&self, err: BackendError) -> DaoError {
        translate(err, self.dialect.call_kind())
    }

    fn log(&self, sql: &str, params: &[Value]) {
        debug!(target: "zdao::sql", entity = self.mapper.type_name(), "{}", format_sql(sql, params));
    }

    fn read_list(&self, sql: &str, params: &[Value]) -> DaoResult<Vec<T>> {
        self.log(sql, params);
        let rows = self
            .router
            .read_route()
            .query_for_list(sql, params)
            .map_err(|e| self.remote(e))?;
        Ok(rows_to_entities(rows, &self.mapper))
    }

    fn read_long(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        self.log(sql, params);
        self.router
            .read_route()
            .query_for_long(sql, params)
            .map_err(|e| self.remote(e))
    }

    fn write(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        self.log(sql, params);
        self.router
            .write_route()
            .update(sql, params)
            .map_err(|e| self.remote(e))
    }

    fn pk_criteria(&self, id: &Id) -> Criteria {
        Criteria::where_eq(self.mapper.pk_property(), id.to_value())
    }

    fn pk_in_criteria(&self, ids: &[Id]) -> Criteria {
        let values: Vec<Value> = ids.iter().map(Id::to_value).collect();
        Criteria::where_op(self.mapper.pk_property(), Operator::In, values)
    }

    /// 채번/생성 키를 PK 프로퍼티 타입에 맞춤
    fn key_value(&self, key: Value) -> Value {
        match (self.mapper.pk().kind, key) {
            (ValueKind::Utf8, Value::Int64(v)) => Value::Utf8(v.to_string()),
            (ValueKind::Utf8, Value::Int32(v)) => Value::Utf8(v.to_string()),
            (_, key) => key,
        }
    }
}

impl<T: Entity> BaseDao<T> for JdbcDao<T> {
    fn mapper(&self) -> &EntityMapper {
        &self.mapper
    }

    fn insert(&self, entity: &mut T) -> DaoResult<i64> {
        let compiler = self.compiler();
        let pk = self.mapper.pk();
        let mut values: Vec<(&str, Value)> = Vec::new();
        let mut needs_generated_key = false;

        if has_pk_value(entity, &self.mapper) {
            values.push((pk.column.as_str(), entity.get_value(pk.property).unwrap_or(Value::Null)));
        } else if self.dialect == SqlDialect::Oracle {
            let sequence_sql = compiler.next_sequence_value()?;
            self.log(&sequence_sql, &[]);
            let next = self
                .router
                .write_route()
                .query_for_long(&sequence_sql, &[])
                .map_err(|e| self.remote(e))?;
            let id = self.key_value(Value::Int64(next));
            entity.set_value(pk.property, id.clone())?;
            values.push((pk.column.as_str(), id));
        } else {
            needs_generated_key = true;
        }

        for p in self.mapper.persisted().filter(|p| p.property != pk.property) {
            values.push((p.column.as_str(), entity.get_value(p.property).unwrap_or(Value::Null)));
        }

        let stmt = compiler.insert(values);
        if !needs_generated_key {
            return self.write(&stmt.sql, &stmt.params);
        }

        self.log(&stmt.sql, &stmt.params);
        let (affected, key) = self
            .router
            .write_route()
            .update_returning_key(&stmt.sql, &stmt.params, &pk.column)
            .map_err(|e| self.remote(e))?;
        if let Some(key) = key {
            entity.set_value(pk.property, self.key_value(key))?;
        }
        Ok(affected)
    }

    /// 개별 insert 반복, 실패 시 이전 건은 롤백하지 않습니다.
    fn insert_batch(&self, entities: &mut [T]) -> DaoResult<i64> {
        check_entities(entities)?;
        let mut affected = 0;
        for entity in entities.iter_mut() {
            affected += self.insert(entity)?;
        }
        Ok(affected)
    }

    fn update_by_id(&self, id: &Id, update: &Update) -> DaoResult<i64> {
        check_id(id)?;
        check_update(update)?;
        self.update_by_criteria(update, &self.pk_criteria(id))
    }

    fn update_by_ids(&self, ids: &[Id], update: &Update) -> DaoResult<i64> {
        check_ids(ids)?;
        check_update(update)?;
        self.update_by_criteria(update, &self.pk_in_criteria(ids))
    }

    fn update_by_criteria(&self, update: &Update, criteria: &Criteria) -> DaoResult<i64> {
        check_update(update)?;
        check_criteria(criteria)?;
        let stmt = self.compiler().update(update, criteria)?;
        self.write(&stmt.sql, &stmt.params)
    }

    fn update_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        check_sql(sql)?;
        self.write(sql, params)
    }

    fn delete_by_id(&self, id: &Id) -> DaoResult<i64> {
        check_id(id)?;
        let stmt = self.compiler().delete_by_id(id);
        self.write(&stmt.sql, &stmt.params)
    }

    fn delete_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        check_sql(sql)?;
        self.write(sql, params)
    }

    fn exists_by_id(&self, id: &Id) -> DaoResult<bool> {
        check_id(id)?;
        self.exists(&self.pk_criteria(id))
    }

    fn count_by_criteria(&self, criteria: &Criteria) -> DaoResult<i64> {
        check_criteria(criteria)?;
        let stmt = self.compiler().count(Some(criteria))?;
        self.read_long(&stmt.sql, &stmt.params)
    }

    fn count_all(&self) -> DaoResult<i64> {
        let stmt = self.compiler().count(None)?;
        self.read_long(&stmt.sql, &stmt.params)
    }

    fn count_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64> {
        check_sql(sql)?;
        self.read_long(sql, params)
    }

    fn find_one_by_id(&self, id: &Id) -> DaoResult<Option<T>> {
        check_id(id)?;
        self.find_one(&self.pk_criteria(id))
    }

    fn find_one_by_query(&self, query: &Query) -> DaoResult<Option<T>> {
        check_query(query)?;
        let query = query.clone().offset(0).limit(1);
        Ok(self.find_list_by_query(&query)?.into_iter().next())
    }

    fn find_one_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<Option<T>> {
        check_sql(sql)?;
        Ok(self.find_list_by_sql(sql, params)?.into_iter().next())
    }

    fn find_list_by_ids(&self, ids: &[Id]) -> DaoResult<Vec<T>> {
        check_ids(ids)?;
        self.find_list(&self.pk_in_criteria(ids))
    }

    fn find_list_by_query(&self, query: &Query) -> DaoResult<Vec<T>> {
        check_query(query)?;
        let stmt = self.compiler().select(query)?;
        self.read_list(&stmt.sql, &stmt.params)
    }

    fn find_list_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<Vec<T>> {
        check_sql(sql)?;
        self.read_list(sql, params)
    }
}
