//! 관계형 클라이언트 경계 (JDBC 템플릿 형태의 실행기)

use crate::api::Value;
use crate::error::BackendResult;
use crate::mapping::Row;
use crate::settings::SqlDialect;
use std::sync::Arc;

/// 데이터 소스 하나에 바인딩된 SQL 실행기
pub trait SqlExecutor: Send + Sync {
    /// 행 목록 조회. 각 행은 컬럼 이름 → 값.
    fn query_for_list(&self, sql: &str, params: &[Value]) -> BackendResult<Vec<Row>>;

    /// 단일 정수 결과 조회 (COUNT, 시퀀스 채번)
    fn query_for_long(&self, sql: &str, params: &[Value]) -> BackendResult<i64>;

    /// DML 실행, 영향받은 행 수 반환
    fn update(&self, sql: &str, params: &[Value]) -> BackendResult<i64>;

    /// INSERT 실행 후 드라이버가 생성한 `key_column` 값을 함께 반환
    fn update_returning_key(
        &self,
        sql: &str,
        params: &[Value],
        key_column: &str,
    ) -> BackendResult<(i64, Option<Value>)>;
}

/// 데이터 소스 URL로 실행기를 만듭니다.
pub trait SqlConnector: Send + Sync {
    fn connect(&self, dialect: SqlDialect, url: &str) -> BackendResult<Arc<dyn SqlExecutor>>;
}
