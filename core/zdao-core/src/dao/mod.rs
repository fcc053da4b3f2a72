//! DAO 실행 코어
//!
//! [`BaseDao`] 하나가 전체 연산 집합을 정의하고, 백엔드별 구현
//! ([`JdbcDao`], [`SearchDao`], [`WideColumnDao`])이 생성 시점에 선택됩니다.
//!
//! # 예제
//!
//! ```rust,ignore
//! use zdao_core::prelude::*;
//!
//! let dao = builder.build_dao::<Member>(&DaoSettings::from_json(json)?)?;
//! let adults = dao.find_list(&Criteria::where_op("age", Operator::Gte, 18))?;
//! ```

pub mod helper;
pub mod jdbc;
pub mod search;
pub mod wide_column;

pub use jdbc::{DatabaseRouter, JdbcDao, SqlCompiler, SqlConnector, SqlExecutor, SqlStatement};
pub use search::{SearchClient, SearchConnector, SearchDao};
pub use wide_column::{WideColumnConnector, WideColumnDao, WideColumnSession};

use crate::api::{Entity, Id, Value};
use crate::error::{DaoError, DaoResult};
use crate::mapping::EntityMapper;
use crate::query::{Criteria, OrderBy, Pageable, Query, Update};
use crate::registry::ClientRegistry;
use crate::settings::{DaoSettings, JdbcSettings, SearchSettings, WideColumnSettings};
use helper::*;
use std::sync::Arc;

/// 백엔드 독립 DAO 연산 집합
///
/// 모든 입력은 백엔드 호출 전에 검증되며, 잘못된 입력은 파라미터 이름을 담은
/// `DaoError::InvalidArgument`로 거부됩니다. `find_one*`, `find_list*`,
/// `find_all_list*`, `exists*` 편의 메서드는 `Query`를 만들어
/// `find_one_by_query` / `find_list_by_query(_paged)`에 위임합니다.
pub trait BaseDao<T: Entity>: Send + Sync {
    /// 이 DAO가 사용하는 엔티티 매핑
    fn mapper(&self) -> &EntityMapper;

    // ════════════════════════════════════════════
    // 쓰기
    // ════════════════════════════════════════════

    /// 엔티티 저장. 생성된 기본 키(와 버전)는 엔티티에 기록됩니다.
    fn insert(&self, entity: &mut T) -> DaoResult<i64>;

    fn insert_batch(&self, entities: &mut [T]) -> DaoResult<i64>;

    /// 기본 키를 제외한 모든 영속 프로퍼티를 갱신
    fn update(&self, entity: &T) -> DaoResult<i64> {
        self.update_properties(entity, &[])
    }

    /// 나열된 프로퍼티만 갱신 (비어 있으면 전체)
    fn update_properties(&self, entity: &T, properties: &[&str]) -> DaoResult<i64> {
        let id = entity_id(entity, self.mapper())?;
        let update = entity_to_update(entity, self.mapper(), properties)?;
        self.update_by_id(&id, &update)
    }

    fn update_by_id(&self, id: &Id, update: &Update) -> DaoResult<i64>;

    fn update_by_ids(&self, ids: &[Id], update: &Update) -> DaoResult<i64>;

    fn update_by_criteria(&self, update: &Update, criteria: &Criteria) -> DaoResult<i64>;

    fn update_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64>;

    fn delete_by_id(&self, id: &Id) -> DaoResult<i64>;

    fn delete_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64>;

    // ════════════════════════════════════════════
    // 존재/개수
    // ════════════════════════════════════════════

    fn exists_by_id(&self, id: &Id) -> DaoResult<bool> {
        check_id(id)?;
        Ok(self.find_one_by_id(id)?.is_some())
    }

    fn exists(&self, criteria: &Criteria) -> DaoResult<bool> {
        check_criteria(criteria)?;
        let fields = vec![self.mapper().pk_property().to_string()];
        Ok(self.find_one_with_fields(&fields, criteria)?.is_some())
    }

    fn count_by_criteria(&self, criteria: &Criteria) -> DaoResult<i64>;

    fn count_all(&self) -> DaoResult<i64>;

    fn count_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<i64>;

    // ════════════════════════════════════════════
    // 조회
    // ════════════════════════════════════════════

    fn find_one_by_id(&self, id: &Id) -> DaoResult<Option<T>>;

    /// offset 0, limit 1로 조회한 첫 번째 엔티티
    fn find_one_by_query(&self, query: &Query) -> DaoResult<Option<T>>;

    fn find_one_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<Option<T>>;

    fn find_list_by_ids(&self, ids: &[Id]) -> DaoResult<Vec<T>>;

    fn find_list_by_query(&self, query: &Query) -> DaoResult<Vec<T>>;

    fn find_list_by_query_paged(&self, query: &Query, pageable: &Pageable) -> DaoResult<Vec<T>> {
        check_query(query)?;
        check_pageable(pageable)?;
        self.find_list_by_query(&query.clone().page(pageable))
    }

    fn find_list_by_sql(&self, sql: &str, params: &[Value]) -> DaoResult<Vec<T>>;

    // ════════════════════════════════════════════
    // 편의 오버로드
    // ════════════════════════════════════════════

    fn find_one(&self, criteria: &Criteria) -> DaoResult<Option<T>> {
        check_criteria(criteria)?;
        self.find_one_by_query(&Query::with_criteria(criteria.clone()))
    }

    fn find_one_with_fields(&self, fields: &[String], criteria: &Criteria) -> DaoResult<Option<T>> {
        check_fields(fields)?;
        check_criteria(criteria)?;
        self.find_one_by_query(&Query::with_criteria(criteria.clone()).fields(fields.iter().cloned()))
    }

    fn find_list(&self, criteria: &Criteria) -> DaoResult<Vec<T>> {
        check_criteria(criteria)?;
        self.find_list_by_query(&Query::with_criteria(criteria.clone()))
    }

    fn find_list_with_fields(&self, fields: &[String], criteria: &Criteria) -> DaoResult<Vec<T>> {
        check_fields(fields)?;
        check_criteria(criteria)?;
        self.find_list_by_query(&Query::with_criteria(criteria.clone()).fields(fields.iter().cloned()))
    }

    fn find_list_with_fields_ordered(
        &self,
        fields: &[String],
        criteria: &Criteria,
        order_bys: &[OrderBy],
    ) -> DaoResult<Vec<T>> {
        check_fields(fields)?;
        check_criteria(criteria)?;
        check_order_bys(order_bys)?;
        let query = Query::with_criteria(criteria.clone())
            .fields(fields.iter().cloned())
            .order_bys(order_bys.iter().cloned());
        self.find_list_by_query(&query)
    }

    fn find_list_with_fields_ordered_paged(
        &self,
        fields: &[String],
        criteria: &Criteria,
        order_bys: &[OrderBy],
        pageable: &Pageable,
    ) -> DaoResult<Vec<T>> {
        check_fields(fields)?;
        check_criteria(criteria)?;
        check_order_bys(order_bys)?;
        check_pageable(pageable)?;
        let query = Query::with_criteria(criteria.clone())
            .fields(fields.iter().cloned())
            .order_bys(order_bys.iter().cloned());
        self.find_list_by_query_paged(&query, pageable)
    }

    fn find_list_ordered(&self, criteria: &Criteria, order_bys: &[OrderBy]) -> DaoResult<Vec<T>> {
        check_criteria(criteria)?;
        check_order_bys(order_bys)?;
        self.find_list_by_query(&Query::with_criteria(criteria.clone()).order_bys(order_bys.iter().cloned()))
    }

    fn find_list_ordered_paged(
        &self,
        criteria: &Criteria,
        order_bys: &[OrderBy],
        pageable: &Pageable,
    ) -> DaoResult<Vec<T>> {
        check_criteria(criteria)?;
        check_order_bys(order_bys)?;
        check_pageable(pageable)?;
        let query = Query::with_criteria(criteria.clone()).order_bys(order_bys.iter().cloned());
        self.find_list_by_query_paged(&query, pageable)
    }

    fn find_all_list(&self) -> DaoResult<Vec<T>> {
        self.find_list_by_query(&Query::new())
    }

    fn find_all_list_with_fields(&self, fields: &[String]) -> DaoResult<Vec<T>> {
        check_fields(fields)?;
        self.find_list_by_query(&Query::new().fields(fields.iter().cloned()))
    }

    fn find_all_list_with_fields_ordered(&self, fields: &[String], order_bys: &[OrderBy]) -> DaoResult<Vec<T>> {
        check_fields(fields)?;
        check_order_bys(order_bys)?;
        let query = Query::new()
            .fields(fields.iter().cloned())
            .order_bys(order_bys.iter().cloned());
        self.find_list_by_query(&query)
    }

    fn find_all_list_with_fields_ordered_paged(
        &self,
        fields: &[String],
        order_bys: &[OrderBy],
        pageable: &Pageable,
    ) -> DaoResult<Vec<T>> {
        check_fields(fields)?;
        check_order_bys(order_bys)?;
        check_pageable(pageable)?;
        let query = Query::new()
            .fields(fields.iter().cloned())
            .order_bys(order_bys.iter().cloned());
        self.find_list_by_query_paged(&query, pageable)
    }

    fn find_all_list_ordered_paged(&self, order_bys: &[OrderBy], pageable: &Pageable) -> DaoResult<Vec<T>> {
        check_order_bys(order_bys)?;
        check_pageable(pageable)?;
        self.find_list_by_query_paged(&Query::new().order_bys(order_bys.iter().cloned()), pageable)
    }
}

/// 설정으로부터 DAO를 만드는 빌더
///
/// 백엔드 커넥터와 클라이언트 레지스트리를 소유합니다. 같은 설정 값으로 만든
/// DAO들은 클라이언트(라우터, 검색 클라이언트, 세션)를 공유합니다.
#[derive(Default)]
pub struct DaoBuilder {
    sql_connector: Option<Arc<dyn SqlConnector>>,
    search_connector: Option<Arc<dyn SearchConnector>>,
    wide_column_connector: Option<Arc<dyn WideColumnConnector>>,
    routers: ClientRegistry<JdbcSettings, Arc<DatabaseRouter>>,
    search_clients: ClientRegistry<SearchSettings, Arc<dyn SearchClient>>,
    sessions: ClientRegistry<WideColumnSettings, Arc<dyn WideColumnSession>>,
}

impl DaoBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sql_connector(mut self, connector: Arc<dyn SqlConnector>) -> Self {
        self.sql_connector = Some(connector);
        self
    }

    pub fn with_search_connector(mut self, connector: Arc<dyn SearchConnector>) -> Self {
        self.search_connector = Some(connector);
        self
    }

    pub fn with_wide_column_connector(mut self, connector: Arc<dyn WideColumnConnector>) -> Self {
        self.wide_column_connector = Some(connector);
        self
    }

    /// 설정이 선택한 백엔드의 DAO 생성
    pub fn build_dao<T: Entity>(&self, settings: &DaoSettings) -> DaoResult<Box<dyn BaseDao<T>>> {
        match settings {
            DaoSettings::Jdbc(s) => Ok(Box::new(self.jdbc_dao::<T>(s)?)),
            DaoSettings::Search(s) => Ok(Box::new(self.search_dao::<T>(s)?)),
            DaoSettings::WideColumn(s) => Ok(Box::new(self.wide_column_dao::<T>(s)?)),
        }
    }

    pub fn jdbc_dao<T: Entity>(&self, settings: &JdbcSettings) -> DaoResult<JdbcDao<T>> {
        let connector = self
            .sql_connector
            .as_ref()
            .ok_or_else(|| DaoError::Configuration("no sql connector registered".into()))?;
        let router = self.routers.get_or_create(settings, |s| {
            DatabaseRouter::connect(s, connector.as_ref()).map(Arc::new)
        })?;
        JdbcDao::new(settings, router)
    }

    pub fn search_dao<T: Entity>(&self, settings: &SearchSettings) -> DaoResult<SearchDao<T>> {
        let connector = self
            .search_connector
            .as_ref()
            .ok_or_else(|| DaoError::Configuration("no search connector registered".into()))?;
        let client = self.search_clients.get_or_create(settings, |s| {
            s.validate()?;
            connector
                .connect(s)
                .map_err(|e| DaoError::Configuration(format!("cannot create search client: {e}")))
        })?;
        SearchDao::new(settings, client)
    }

    pub fn wide_column_dao<T: Entity>(&self, settings: &WideColumnSettings) -> DaoResult<WideColumnDao<T>> {
        let connector = self
            .wide_column_connector
            .as_ref()
            .ok_or_else(|| DaoError::Configuration("no wide-column connector registered".into()))?;
        let session = self.sessions.get_or_create(settings, |s| {
            s.addresses()?;
            connector
                .connect(s)
                .map_err(|e| DaoError::Configuration(format!("cannot create wide-column session: {e}")))
        })?;
        WideColumnDao::new(session)
    }
}
