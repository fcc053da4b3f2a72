//! 와이드 컬럼 세션 경계

use crate::api::Value;
use crate::error::BackendResult;
use crate::mapping::Row;
use crate::settings::WideColumnSettings;
use std::sync::Arc;

/// 파라미터가 바인딩된 CQL 문장 하나
#[derive(Debug, Clone, PartialEq)]
pub struct CqlStatement {
    pub cql: String,
    pub params: Vec<Value>,
}

impl CqlStatement {
    pub fn new(cql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            cql: cql.into(),
            params,
        }
    }
}

/// 클러스터 세션
pub trait WideColumnSession: Send + Sync {
    /// 문장 실행. 결과 행이 없는 문장은 빈 목록을 돌려줍니다.
    fn execute(&self, cql: &str, params: &[Value]) -> BackendResult<Vec<Row>>;

    /// 하나의 원자적 배치로 실행
    fn execute_batch(&self, statements: &[CqlStatement]) -> BackendResult<()>;
}

pub trait WideColumnConnector: Send + Sync {
    fn connect(&self, settings: &WideColumnSettings) -> BackendResult<Arc<dyn WideColumnSession>>;
}
