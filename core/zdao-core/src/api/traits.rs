//! API 트레이트 정의
//!
//! `#[derive(Entity)]`가 생성하는 엔티티 메타데이터와 프로퍼티 접근자

use crate::api::value::{Value, ValueKind};
use crate::error::DaoResult;

/// 필드의 컬럼 메타데이터
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSpec {
    /// 컬럼 어노테이션 없음
    Missing,
    /// 이름 없는 `#[zdao(column)]`: 프로퍼티 이름에서 파생
    Derived,
    /// `#[zdao(column = "name")]`
    Named(&'static str),
}

/// 프로퍼티 하나의 메타데이터
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    pub property: &'static str,
    pub column: ColumnSpec,
    pub primary_key: bool,
    pub transient: bool,
    pub version: bool,
    pub kind: ValueKind,
    pub nullable: bool,
}

impl FieldMeta {
    /// 기본값: 컬럼 메타데이터 없음, 영속 필드
    pub fn new(property: &'static str, kind: ValueKind) -> Self {
        Self {
            property,
            column: ColumnSpec::Missing,
            primary_key: false,
            transient: false,
            version: false,
            kind,
            nullable: false,
        }
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.column = column;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn version(mut self) -> Self {
        self.version = true;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }
}

/// 엔티티 타입 하나의 선언 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub type_name: &'static str,
    pub table: Option<&'static str>,
    pub sequence: Option<&'static str>,
    pub index: Option<&'static str>,
    pub index_pattern: Option<&'static str>,
    pub doc_type: Option<&'static str>,
    pub keyspace: Option<&'static str>,
    pub fields: Vec<FieldMeta>,
}

/// 영속 엔티티 트레이트
///
/// 보통 `#[derive(Entity)]`로 구현합니다. 결과 매핑은 `Default`로 만든
/// 인스턴스에 `set_value`로 프로퍼티를 채웁니다.
pub trait Entity: Default + Send + Sync + 'static {
    fn descriptor() -> EntityDescriptor;

    /// 프로퍼티 값 조회. 알 수 없는 프로퍼티는 `None`.
    fn get_value(&self, property: &str) -> Option<Value>;

    /// 프로퍼티 값 설정. 알 수 없는 프로퍼티는 무시합니다.
    fn set_value(&mut self, property: &str, value: Value) -> DaoResult<()>;
}
