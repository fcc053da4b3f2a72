//! DAO 공통 헬퍼 — 인자 검증, 엔티티 → Update 변환, 디버그 SQL 포맷

use crate::api::{Entity, Id, Value};
use crate::error::{DaoError, DaoResult};
use crate::mapping::EntityMapper;
use crate::query::{Criteria, OrderBy, Pageable, Query, Update};

pub fn check_criteria(criteria: &Criteria) -> DaoResult<()> {
    if criteria.is_empty() {
        return Err(DaoError::invalid_argument("criteria", "must be non-empty"));
    }
    Ok(())
}

pub fn check_query(query: &Query) -> DaoResult<()> {
    if let Some(criteria) = query.get_criteria() {
        check_criteria(criteria)?;
    }
    if query.get_hint().is_some_and(|h| h.trim().is_empty()) {
        return Err(DaoError::invalid_argument("query", "hint must be non-blank when set"));
    }
    Ok(())
}

pub fn check_id(id: &Id) -> DaoResult<()> {
    match id {
        Id::Long(v) if *v < 0 => Err(DaoError::invalid_argument("id", "must be >= 0")),
        Id::Int(v) if *v < 0 => Err(DaoError::invalid_argument("id", "must be >= 0")),
        Id::Str(s) if s.trim().is_empty() => Err(DaoError::invalid_argument("id", "must be non-blank")),
        _ => Ok(()),
    }
}

pub fn check_ids(ids: &[Id]) -> DaoResult<()> {
    if ids.is_empty() {
        return Err(DaoError::invalid_argument("ids", "must be non-empty"));
    }
    for id in ids {
        check_id(id).map_err(|_| DaoError::invalid_argument("ids", format!("contains invalid id '{id}'")))?;
    }
    Ok(())
}

pub fn check_pageable(pageable: &Pageable) -> DaoResult<()> {
    if pageable.page() < 1 {
        return Err(DaoError::invalid_argument("pageable", "page number must be >= 1"));
    }
    if pageable.size() <= 0 {
        return Err(DaoError::invalid_argument("pageable", "page size must be > 0"));
    }
    if pageable.checked_offset().is_none() {
        return Err(DaoError::invalid_argument("pageable", "offset overflows"));
    }
    Ok(())
}

pub fn check_fields(fields: &[String]) -> DaoResult<()> {
    if fields.is_empty() {
        return Err(DaoError::invalid_argument("fields", "must be non-empty"));
    }
    Ok(())
}

pub fn check_order_bys(order_bys: &[OrderBy]) -> DaoResult<()> {
    if order_bys.is_empty() {
        return Err(DaoError::invalid_argument("order_bys", "must be non-empty"));
    }
    Ok(())
}

pub fn check_sql(sql: &str) -> DaoResult<()> {
    if sql.trim().is_empty() {
        return Err(DaoError::invalid_argument("sql", "must be non-blank"));
    }
    Ok(())
}

pub fn check_update(update: &Update) -> DaoResult<()> {
    if update.is_empty() {
        return Err(DaoError::invalid_argument("update", "must set at least one property"));
    }
    Ok(())
}

pub fn check_entities<T>(entities: &[T]) -> DaoResult<()> {
    if entities.is_empty() {
        return Err(DaoError::invalid_argument("entities", "must be non-empty"));
    }
    Ok(())
}

/// 수정 대상 엔티티의 기본 키
pub fn entity_id<T: Entity>(entity: &T, mapper: &EntityMapper) -> DaoResult<Id> {
    let id = crate::mapping::pk_of(entity, mapper).ok_or_else(|| {
        DaoError::invalid_argument("entity", format!("primary key '{}' is not set", mapper.pk_property()))
    })?;
    check_id(&id).map_err(|_| DaoError::invalid_argument("entity", format!("invalid primary key '{id}'")))?;
    Ok(id)
}

/// 엔티티 → Update
///
/// `properties`가 비어 있으면 기본 키를 제외한 모든 영속 프로퍼티, 아니면 나열된
/// 프로퍼티만 담습니다.
pub fn entity_to_update<T: Entity>(entity: &T, mapper: &EntityMapper, properties: &[&str]) -> DaoResult<Update> {
    let mut update = Update::new();
    if properties.is_empty() {
        for p in mapper.persisted().filter(|p| p.property != mapper.pk_property()) {
            update.insert(p.property, entity.get_value(p.property).unwrap_or(Value::Null));
        }
    } else {
        for &property in properties {
            if mapper.property(property).is_none() {
                return Err(DaoError::invalid_argument(
                    "properties",
                    format!("unknown property '{property}'"),
                ));
            }
            update.insert(property, entity.get_value(property).unwrap_or(Value::Null));
        }
    }
    check_update(&update)?;
    Ok(update)
}

/// `?` placeholder를 리터럴로 치환한 디버그용 SQL
///
/// 따옴표 안의 `?`는 치환하지 않습니다. 파라미터가 모자라면 남은 `?`는 그대로 둡니다.
pub fn format_sql(sql: &str, params: &[Value]) -> String {
    let mut result = String::with_capacity(sql.len() + params.len() * 8);
    let mut params = params.iter();
    let mut in_quote = false;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_quote = !in_quote;
                result.push(ch);
            }
            '?' if !in_quote => match params.next() {
                Some(value) => result.push_str(&value.to_sql_literal()),
                None => result.push('?'),
            },
            _ => result.push(ch),
        }
    }

    result
}
