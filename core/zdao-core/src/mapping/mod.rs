//! 엔티티 매핑 — 메타데이터 매퍼와 결과 매퍼

pub mod entity_mapper;
pub mod row;

pub use entity_mapper::{EntityMapper, MappingPolicy, PropertyMapping, to_snake_case};
pub use row::{Row, document_to_row, has_pk_value, pk_of, row_to_entity, rows_to_entities};
