//! 검색 엔진 DAO
//!
//! Criteria/Query를 bool 쿼리 요청으로 컴파일해 [`SearchClient`]로 실행합니다.
//! 제한 없는 조회는 먼저 건수를 세어 최대 결과 윈도를 넘으면 거부하고,
//! 버전을 지정하지 않은 update가 충돌하면 인덱스를 refresh 한 뒤 한 번만 재시도합니다.

pub mod client;
pub mod compiler;
pub mod dsl;

pub use client::{SearchClient, SearchConnector};
pub use compiler::{IndexName, SearchCompiler};
pub use dsl::{
    Bucket, IndexRequest, IndexResponse, OpType, RangeOp, SearchHit, SearchQuery, SearchRequest,
    SearchResponse, TermsAggregation, UpdateRequest, VersionSpec, WriteResponse, WriteResult,
};

use crate::api::{Entity, Id, Value, ValueKind};
use crate::dao::BaseDao;
use crate::dao::helper::*;
use crate::error::{BackendError, BackendErrorKind, CallKind, DaoError, DaoResult};
use crate::mapping::{EntityMapper, MappingPolicy, document_to_row, has_pk_value, row_to_entity};
use crate::query::{Criteria, Query, Update};
use crate::settings::{IdPolicy, SearchSettings};
use crate::translate::{translate, translate_for_id};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SearchDao<T: Entity> {
    mapper: Arc<EntityMapper>,
    client: Arc<dyn SearchClient>,
    index: IndexName,
    id_policy: IdPolicy,
    max_update_size: usize,
    max_result_window: i64,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> SearchDao<T> {
    pub fn new(settings: &SearchSettings, client: Arc<dyn SearchClient>) -> DaoResult<Self> {
        settings.validate()?;
        let mapper = EntityMapper::for_entity::<T>(MappingPolicy::Search)?;
        let index = IndexName::parse(mapper.index().unwrap_or_default(), mapper.index_pattern())?;
        if settings.id_policy == IdPolicy::EngineAssigned && mapper.pk().kind != ValueKind::Utf8 {
            return Err(DaoError::Configuration(format!(
                "entity[{}] engine-assigned ids need a string primary key",
                mapper.type_name()
            )));
        }
        Ok(Self {
            mapper,
            client,
            index,
            id_policy: settings.id_policy,
            max_update_size: settings.max_update_size,
            max_result_window: settings.max_result_window,
            _entity: PhantomData,
        })
    }

    /// 현재 시각 기준 인덱스 이름
    pub fn index_name(&self) -> String {
        self.index.resolve()
    }

    fn compiler(&self) -> SearchCompiler<'_> {
        SearchCompiler::new(&self.mapper, self.max_result_window)
    }

    fn doc_type(&self) -> Option<&str> {
        self.mapper.doc_type()
    }

    fn remote(&self, err: BackendError) -> DaoError {
        translate(err, CallKind::Search)
    }

    fn execute(&self, request: &SearchRequest) -> DaoResult<SearchResponse> {
        debug!(
            target: "zdao::search",
            entity = self.mapper.type_name(),
            index = %request.index,
            "{}",
            request.to_json()
        );
        self.client.search(request).map_err(|e| self.remote(e))
    }

    fn total_hits(&self, request: &SearchRequest) -> DaoResult<i64> {
        Ok(self.execute(request)?.total_hits)
    }

    fn refresh(&self, index: &str) -> DaoResult<()> {
        info!(target: "zdao::search", entity = self.mapper.type_name(), index, "refresh index");
        self.client.refresh(index).map_err(|e| self.remote(e))
    }

    /// 최대 윈도 크기 요청이면 실제 건수로 줄이고, 건수가 윈도 이상이면 거부
    fn protect_overload(&self, request: &mut SearchRequest) -> DaoResult<()> {
        if request.size < self.max_result_window {
            return Ok(());
        }
        let count_request = self.compiler().count_of(request.query.clone(), &request.index);
        let count = self.total_hits(&count_request)?;
        if count >= self.max_result_window {
            return Err(DaoError::Overload(format!(
                "entity[{}] query matches {count} documents, maximum result window is {}",
                self.mapper.type_name(),
                self.max_result_window
            )));
        }
        request.size = count;
        Ok(())
    }

    /// 엔진 문서 id → 기본 키 타입의 `Id`
    fn parse_id(&self, raw: &str) -> DaoResult<Id> {
        let mismatch = || DaoError::type_mismatch(self.mapper.pk().kind.to_string(), format!("document id '{raw}'"));
        match self.mapper.pk().kind {
            ValueKind::Int64 => raw.parse::<i64>().map(Id::Long).map_err(|_| mismatch()),
            ValueKind::Int32 => raw.parse::<i32>().map(Id::Int).map_err(|_| mismatch()),
            _ => Ok(Id::Str(raw.to_string())),
        }
    }

    fn hit_to_entity(&self, hit: SearchHit) -> Option<T> {
        let mut row = document_to_row(&hit.source);
        match self.parse_id(&hit.id) {
            Ok(id) => {
                row.insert(self.mapper.pk_column().to_string(), id.to_value());
            }
            Err(e) => {
                warn!(entity = self.mapper.type_name(), id = %hit.id, error = %e, "document skipped: bad id");
                return None;
            }
        }
        if let Some(property) = self.mapper.version_property()
            && let Some(version) = hit.version
            && let Some(column) = self.mapper.column_of(property)
        {
            row.insert(column.to_string(), Value::Int64(version));
        }
        row_to_entity(row, &self.mapper)
    }

    fn hits_to_entities(&self, response: SearchResponse) -> Vec<T> {
        response
            .hits
            .into_iter()
            .filter_map(|hit| self.hit_to_entity(hit))
            .collect()
    }

    /// terms 버킷 → 엔티티 (그룹 키 프로퍼티와 count alias만 채움)
    fn buckets_to_entities(&self, query: &Query, buckets: Vec<Bucket>) -> Vec<T> {
        let Some(group) = query.get_group_bys().first() else {
            return Vec::new();
        };
        let Some(property) = self.mapper.property(&group.key).map(|p| p.property) else {
            return Vec::new();
        };
        let alias = group.count_alias.as_deref().filter(|a| !a.trim().is_empty());
        buckets
            .into_iter()
            .filter_map(|bucket| match Self::bucket_to_entity(property, alias, &bucket) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    warn!(entity = self.mapper.type_name(), key = %bucket.key, error = %e, "bucket skipped");
                    None
                }
            })
            .collect()
    }

    fn bucket_to_entity(property: &str, alias: Option<&str>, bucket: &Bucket) -> DaoResult<T> {
        let mut entity = T::default();
        entity.set_value(property, bucket.key.clone())?;
        if let Some(alias) = alias {
            entity.set_value(alias, Value::Int64(bucket.doc_count))?;
        }
        Ok(entity)
    }

    /// Update의 버전 프로퍼티. 양수면 고정 버전, 없거나 0 이하면 match any.
    fn version_of(&self, update: &Update) -> DaoResult<VersionSpec> {
        let Some(value) = self.mapper.version_property().and_then(|p| update.get(p)) else {
            return Ok(VersionSpec::MatchAny);
        };
        let version = match value {
            Value::Null => return Ok(VersionSpec::MatchAny),
            Value::Int64(v) => *v,
            Value::Int32(v) => i64::from(*v),
            other => return Err(DaoError::type_mismatch("Int64 version", other.kind().to_string())),
        };
        Ok(if version > 0 {
            VersionSpec::Pinned(version)
        } else {
            VersionSpec::MatchAny
        })
    }

    fn update_document(&self, id: &Id, request: &UpdateRequest) -> DaoResult<WriteResponse> {
        debug!(
            target: "zdao::search",
            entity = self.mapper.type_name(),
            index = %request.index,
            id = %request.id,
            version = ?request.version,
            "update {}",
            request.doc
        );
        match self.client.update(request) {
            Ok(response) => Ok(response),
            Err(e)
                if e.kind == BackendErrorKind::VersionConflict
                    && request.version == VersionSpec::MatchAny =>
            {
                debug!(target: "zdao::search", id = %request.id, "version conflict, retry after refresh");
                self.refresh(&request.index)?;
                self.client
                    .update(request)
                    .map_err(|e| translate_for_id(e, CallKind::Search, id))
            }
            Err(e) => Err(translate_for_id(e, CallKind::Search, id)),
        }
    }

    fn wrapper_paging(params: &[Value]) -> DaoResult<(i64, Option<i64>)> {
        let int_at = |i: usize, name: &str| -> DaoResult<Option<i64>> {
            match params.get(i) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::Int64(v)) => Ok(Some(*v)),
                Some(Value::Int32(v)) => Ok(Some(i64::from(*v))),
                Some(other) => Err(DaoError::type_mismatch(
                    format!("integer '{name}' parameter"),
                    other.kind().to_string(),
                )),
            }
        };
        Ok((int_at(0, "from")?.unwrap_or(0), int_at(1, "size")?))
    }
}

impl<T: Entity> BaseDao<T> for SearchDao<T> {
    fn mapper(&self) -> &EntityMapper {
        &self.mapper
    }

    // ════════════════════════════════════════════
    // 쓰기
    // ════════════════════════════════════════════

    /// 문서 생성 후 엔진 버전을 반환합니다.
    fn insert(&self, entity: &mut T) -> DaoResult<i64> {
        let id = if has_pk_value(entity, &self.mapper) {
            entity_id(entity, &self.mapper).map(|id| Some(id.to_string()))?
        } else if self.id_policy == IdPolicy::EngineAssigned {
            None
        } else {
            return Err(DaoError::invalid_argument(
                "entity",
                format!("primary key '{}' is required", self.mapper.pk_property()),
            ));
        };

        let request = IndexRequest {
            index: self.index_name(),
            doc_type: self.doc_type().map(str::to_string),
            id,
            op_type: OpType::Create,
            source: self.compiler().document(entity),
        };
        debug!(
            target: "zdao::search",
            entity = self.mapper.type_name(),
            index = %request.index,
            id = ?request.id,
            "insert {}",
            request.source
        );
        let response = self.client.index(&request).map_err(|e| self.remote(e))?;

        if request.id.is_none() {
            let id = self.parse_id(&response.id)?;
            entity.set_value(self.mapper.pk_property(), id.to_value())?;
        }
        if let Some(property) = self.mapper.version_property() {
            entity.set_value(property, Value::Int64(response.version))?;
        }
        Ok(response.version)
    }

    /// 개별 insert 반복, 생성된 문서 수를 반환합니다.
    fn insert_batch(&self, entities: &mut [T]) -> DaoResult<i64> {
        check_entities(entities)?;
        let mut inserted = 0;
        for entity in entities.iter_mut() {
            self.insert(entity)?;
            inserted += 1;
        }
        Ok(inserted)
    }

    fn update_by_id(&self, id: &Id, update: &Update) -> DaoResult<i64> {
        check_id(id)?;
        check_update(update)?;
        let request = UpdateRequest {
            index: self.index_name(),
            doc_type: self.doc_type().map(str::to_string),
            id: id.to_string(),
            version: self.version_of(update)?,
            doc: self.compiler().partial_document(update)?,
        };
        let response = self.update_document(id, &request)?;
        Ok(match response.result {
            WriteResult::Noop | WriteResult::NotFound => 0,
            _ => 1,
        })
    }

    fn update_by_ids(&self, ids: &[Id], update: &Update) -> DaoResult<i64> {
        check_ids(ids)?;
        check_update(update)?;
        if ids.len() > self.max_update_size {
            return Err(DaoError::invalid_argument(
                "ids",
                format!("{} ids exceed the update limit of {}", ids.len(), self.max_update_size),
            ));
        }
        let mut updated = 0;
        for id in ids {
            updated += self.update_by_id(id, update)?;
        }
        Ok(updated)
    }

    fn update_by_criteria(&self, update: &Update, criteria: &Criteria) -> DaoResult<i64> {
        check_update(update)?;
        check_criteria(criteria)?;
        let count = self.count_by_criteria(criteria)?;
        if count == 0 {
            return Ok(0);
        }
        if count > self.max_update_size as i64 {
            return Err(DaoError::Overload(format!(
                "entity[{}] update matches {count} documents, limit is {}",
                self.mapper.type_name(),
                self.max_update_size
            )));
        }

        let compiler = self.compiler();
        let mut request = compiler.count(Some(criteria), &self.index_name())?;
        request.size = count;
        let ids = self
            .execute(&request)?
            .hits
            .iter()
            .map(|hit| self.parse_id(&hit.id))
            .collect::<DaoResult<Vec<_>>>()?;
        if ids.is_empty() {
            return Ok(0);
        }
        self.update_by_ids(&ids, update)
    }

    fn update_by_sql(&self, _sql: &str, _params: &[Value]) -> DaoResult<i64> {
        Err(DaoError::unsupported("SearchDao", "update_by_sql"))
    }

    fn delete_by_id(&self, id: &Id) -> DaoResult<i64> {
        check_id(id)?;
        let index = self.index_name();
        debug!(target: "zdao::search", entity = self.mapper.type_name(), index = %index, id = %id, "delete");
        let response = self
            .client
            .delete(&index, self.doc_type(), &id.to_string())
            .map_err(|e| self.remote(e))?;
        Ok(match response.result {
            WriteResult::NotFound => 0,
            _ => 1,
        })
    }

    fn delete_by_sql(&self, _sql: &str, _params: &[Value]) -> DaoResult<i64> {
        Err(DaoError::unsupported("SearchDao", "delete_by_sql"))
    }

    // ════════════════════════════════════════════
    // 조회
    // ════════════════════════════════════════════

    fn count_by_criteria(&self, criteria: &Criteria) -> DaoResult<i64> {
        check_criteria(criteria)?;
        let request = self.compiler().count(Some(criteria), &self.index_name())?;
        self.total_hits(&request)
    }

    fn count_all(&self) -> DaoResult<i64> {
        let request = self.compiler().count(None, &self.index_name())?;
        self.total_hits(&request)
    }

    fn count_by_sql(&self, sql: &str, _params: &[Value]) -> DaoResult<i64> {
        check_sql(sql)?;
        let compiler = self.compiler();
        let request = compiler.count_of(
            SearchQuery::Wrapper {
                query: sql.to_string(),
            },
            &self.index_name(),
        );
        self.total_hits(&request)
    }

    fn find_one_by_id(&self, id: &Id) -> DaoResult<Option<T>> {
        check_id(id)?;
        let index = self.index_name();
        debug!(target: "zdao::search", entity = self.mapper.type_name(), index = %index, id = %id, "get");
        let hit = self
            .client
            .get(&index, self.doc_type(), &id.to_string())
            .map_err(|e| self.remote(e))?;
        Ok(hit.and_then(|hit| self.hit_to_entity(hit)))
    }

    fn find_one_by_query(&self, query: &Query) -> DaoResult<Option<T>> {
        check_query(query)?;
        let query = query.clone().offset(0).limit(1);
        Ok(self.find_list_by_query(&query)?.into_iter().next())
    }

    fn find_one_by_sql(&self, sql: &str, _params: &[Value]) -> DaoResult<Option<T>> {
        check_sql(sql)?;
        let request = self.compiler().wrapper(sql, &self.index_name(), 0, Some(1));
        let response = self.execute(&request)?;
        Ok(self.hits_to_entities(response).into_iter().next())
    }

    /// 없는 문서는 건너뜁니다.
    fn find_list_by_ids(&self, ids: &[Id]) -> DaoResult<Vec<T>> {
        check_ids(ids)?;
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entity) = self.find_one_by_id(id)? {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    fn find_list_by_query(&self, query: &Query) -> DaoResult<Vec<T>> {
        check_query(query)?;
        let mut request = self.compiler().search(query, &self.index_name())?;
        if request.aggregation.is_some() {
            let response = self.execute(&request)?;
            return Ok(self.buckets_to_entities(query, response.buckets));
        }
        self.protect_overload(&mut request)?;
        if request.size == 0 {
            return Ok(Vec::new());
        }
        let response = self.execute(&request)?;
        Ok(self.hits_to_entities(response))
    }

    /// `params[0]`은 from, `params[1]`은 size (둘 다 선택)
    fn find_list_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<Vec<T>> {
        check_sql(sql)?;
        let (from, size) = Self::wrapper_paging(params)?;
        let mut request = self.compiler().wrapper(sql, &self.index_name(), from, size);
        self.protect_overload(&mut request)?;
        if request.size == 0 {
            return Ok(Vec::new());
        }
        let response = self.execute(&request)?;
        Ok(self.hits_to_entities(response))
    }
}
