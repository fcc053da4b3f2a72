//! 검색 엔진 클라이언트 경계

use crate::dao::search::dsl::{
    IndexRequest, IndexResponse, SearchHit, SearchRequest, SearchResponse, UpdateRequest,
    WriteResponse,
};
use crate::error::BackendResult;
use crate::settings::SearchSettings;
use std::sync::Arc;

/// 클러스터 하나에 연결된 클라이언트
///
/// 버전 충돌은 `BackendErrorKind::VersionConflict`, 결과 윈도 초과는
/// `BackendErrorKind::ResultWindowTooLarge`, 같은 id 생성은
/// `BackendErrorKind::DuplicateKey`로 보고해야 합니다.
pub trait SearchClient: Send + Sync {
    fn search(&self, request: &SearchRequest) -> BackendResult<SearchResponse>;

    /// 문서가 없으면 `Ok(None)`
    fn get(&self, index: &str, doc_type: Option<&str>, id: &str) -> BackendResult<Option<SearchHit>>;

    fn index(&self, request: &IndexRequest) -> BackendResult<IndexResponse>;

    fn update(&self, request: &UpdateRequest) -> BackendResult<WriteResponse>;

    fn delete(&self, index: &str, doc_type: Option<&str>, id: &str) -> BackendResult<WriteResponse>;

    fn refresh(&self, index: &str) -> BackendResult<()>;
}

pub trait SearchConnector: Send + Sync {
    fn connect(&self, settings: &SearchSettings) -> BackendResult<Arc<dyn SearchClient>>;
}
