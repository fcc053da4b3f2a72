//! # zdao — Backend-agnostic DAO layer
//!
//! zdao는 관계형 DB, 검색 엔진, 와이드 컬럼 스토어를 하나의 DAO 인터페이스로
//! 다룹니다. 애플리케이션 코드는 [`BaseDao`]만 보고, 저장소 교체는 DAO 구현을
//! 바꾸는 것으로 끝납니다.
//!
//! ## 주요 특징
//!
//! - **하나의 Query 모델**: Criteria, 필드 프로젝션, group by, order by, paging
//! - **세 개의 컴파일러**: SQL (MySQL/Oracle), 검색 엔진 bool 쿼리, CQL
//! - **결과 매핑**: `#[derive(Entity)]`가 만든 접근자 테이블로 행/문서 → 엔티티
//! - **장애 처리**: 예외 분류, 버전 충돌 1회 재시도, 결과 윈도 과부하 보호
//!
//! ## 빠른 시작
//!
//! ```rust,ignore
//! use zdao_core::prelude::*;
//!
//! #[derive(Debug, Default, Entity)]
//! #[zdao(table = "t_member")]
//! struct Member {
//!     #[zdao(pk, column)]
//!     id: i64,
//!     #[zdao(column)]
//!     user_name: String,
//!     #[zdao(column)]
//!     age: i32,
//! }
//!
//! let builder = DaoBuilder::new().with_sql_connector(connector);
//! let dao = builder.build_dao::<Member>(&DaoSettings::from_json(settings_json)?)?;
//!
//! let mut member = Member { user_name: "kim".into(), age: 31, ..Default::default() };
//! dao.insert(&mut member)?;              // 생성된 id가 member.id에 기록됨
//! let adults = dao.find_list(&Criteria::where_op("age", Operator::Gte, 18))?;
//! ```
//!
//! ## 실행 파이프라인
//!
//! ```text
//! Query/Criteria → Compiler → (SQL + params | SearchRequest | CQL)
//!          → Client handle → Exception Translator → Result Mapper → T
//! ```
//!
//! ## 모듈 구조
//!
//! - [`api`] — 값 모델, `Id`, `Entity` 트레이트
//! - [`query`] — Criteria, Query, Update, Pageable
//! - [`mapping`] — 엔티티 매퍼, 결과 매퍼
//! - [`dao`] — `BaseDao`와 백엔드별 구현, `DaoBuilder`
//! - [`translate`] — 백엔드 에러 분류
//! - [`registry`] — 설정별 클라이언트 캐시
//! - [`settings`] — 백엔드 설정

extern crate self as zdao_core;

pub mod api;
pub mod codegen;
pub mod dao;
pub mod error;
pub mod mapping;
pub mod query;
pub mod registry;
pub mod settings;
pub mod translate;

// Logging utilities
pub mod logging;

// Re-export commonly used types
pub use dao::{BaseDao, DaoBuilder};
pub use error::{DaoError, DaoResult};

// Re-export derive macros
pub use zdao_derive::Entity;

/// 자주 쓰는 타입 모음
pub mod prelude {
    pub use crate::api::{Entity, FromValue, Id, IntoValue, Value};
    pub use crate::dao::{BaseDao, DaoBuilder, JdbcDao, SearchDao, WideColumnDao};
    pub use crate::error::{DaoError, DaoResult};
    pub use crate::query::{Criteria, Direction, GroupBy, Operator, OrderBy, Pageable, Query, Update};
    pub use crate::settings::{DaoSettings, JdbcSettings, SearchSettings, SqlDialect, WideColumnSettings};
    pub use zdao_derive::Entity;
}
