//! 테이블 스키마 → DAO/엔티티 코드 생성 진입점
//!
//! 코드 생성은 꺼져 있습니다. 호출하면 항상 `DaoError::Unsupported`를 돌려줍니다.

use crate::error::{DaoError, DaoResult};

/// 생성 대상 테이블과 출력 모듈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenRequest {
    pub module_path: String,
    pub module_name: String,
    pub table: String,
}

impl CodegenRequest {
    pub fn new(module_path: impl Into<String>, module_name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            module_path: module_path.into(),
            module_name: module_name.into(),
            table: table.into(),
        }
    }
}

pub fn generate(_request: &CodegenRequest) -> DaoResult<()> {
    Err(DaoError::unsupported("codegen", "code generation (disabled)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_disabled() {
        let request = CodegenRequest::new("src/dao", "member", "t_member");
        let err = generate(&request).unwrap_err();
        assert!(matches!(err, DaoError::Unsupported { dao: "codegen", .. }));
        assert_eq!(err.to_string(), "codegen does not support code generation (disabled)");
    }
}
