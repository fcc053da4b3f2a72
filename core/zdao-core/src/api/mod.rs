//! API 모듈 — 값 모델과 엔티티 트레이트
//!
//! Value, IntoValue, FromValue, Entity 트레이트 제공

pub mod id;
pub mod traits;
pub mod value;

pub use id::Id;
pub use traits::{ColumnSpec, Entity, EntityDescriptor, FieldMeta};
pub use value::{FromValue, IntoValue, Value, ValueKind};
