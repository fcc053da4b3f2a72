//! 결과 매퍼 — 행/문서 → 엔티티

use crate::api::{Entity, Id, Value};
use crate::mapping::entity_mapper::EntityMapper;
use std::collections::HashMap;
use tracing::warn;

/// 컬럼 이름 → 값. 관계형 드라이버 행과 검색 문서 소스 모두 이 형태로 들어옵니다.
pub type Row = HashMap<String, Value>;

/// 행 하나를 엔티티로 변환
///
/// 모르는 컬럼은 버리고, 없는 프로퍼티와 NULL 값은 `Default` 값을 유지합니다.
/// 변환 실패 시 경고를 남기고 `None`을 돌려줍니다.
pub fn row_to_entity<T: Entity>(row: Row, mapper: &EntityMapper) -> Option<T> {
    let mut entity = T::default();
    for (column, value) in row {
        let Some(mapping) = mapper.property_of_column(&column) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        if let Err(e) = entity.set_value(mapping.property, value) {
            warn!(
                entity = mapper.type_name(),
                column = %column,
                error = %e,
                "row skipped: column conversion failed"
            );
            return None;
        }
    }
    Some(entity)
}

/// 변환에 실패한 행은 건너뜁니다.
pub fn rows_to_entities<T: Entity>(rows: Vec<Row>, mapper: &EntityMapper) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| row_to_entity(row, mapper))
        .collect()
}

/// JSON 객체 문서 → Row
pub fn document_to_row(source: &serde_json::Value) -> Row {
    match source {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), Value::from_json(v)))
            .collect(),
        _ => Row::new(),
    }
}

/// 엔티티의 기본 키 값. 설정되지 않았으면 `None`.
pub fn pk_of<T: Entity>(entity: &T, mapper: &EntityMapper) -> Option<Id> {
    entity
        .get_value(mapper.pk_property())
        .as_ref()
        .and_then(Id::from_value)
}

/// 기본 키가 호출자에 의해 지정되었는지 (양수 정수 또는 공백 아닌 문자열)
pub fn has_pk_value<T: Entity>(entity: &T, mapper: &EntityMapper) -> bool {
    pk_of(entity, mapper).is_some_and(|id| id.is_set())
}
