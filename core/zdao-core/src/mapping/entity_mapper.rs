//! 엔티티 메타데이터 매퍼
//!
//! 엔티티 타입별 프로퍼티 ↔ 컬럼 매핑을 한 번만 만들고 프로세스 수명 동안 캐시합니다.

use crate::api::{ColumnSpec, Entity, EntityDescriptor, ValueKind};
use crate::error::{DaoError, DaoResult};
use dashmap::DashMap;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// 백엔드별 컬럼 이름 규칙
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingPolicy {
    /// snake_case 컬럼, 명시 이름은 소문자화. 테이블 이름 필수.
    Relational,
    /// 프로퍼티 이름 그대로 문서 필드. 인덱스 이름 필수.
    Search,
    /// 프로퍼티 이름 그대로 컬럼, 컬럼 메타데이터 불필요. 테이블 이름 필수.
    WideColumn,
}

/// 매핑된 프로퍼티 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMapping {
    pub property: &'static str,
    pub column: String,
    pub kind: ValueKind,
    pub nullable: bool,
    pub transient: bool,
}

static MAPPER_CACHE: LazyLock<DashMap<(TypeId, MappingPolicy), Arc<EntityMapper>>> =
    LazyLock::new(DashMap::new);

/// 엔티티 타입 하나의 불변 매핑
#[derive(Debug)]
pub struct EntityMapper {
    type_name: &'static str,
    policy: MappingPolicy,
    properties: Vec<PropertyMapping>,
    by_property: HashMap<&'static str, usize>,
    // 소문자 컬럼 이름 → 인덱스
    by_column: HashMap<String, usize>,
    pk: usize,
    version: Option<usize>,
    table: Option<String>,
    sequence: Option<String>,
    index: Option<String>,
    index_pattern: Option<String>,
    doc_type: Option<String>,
    keyspace: Option<String>,
}

impl EntityMapper {
    /// 캐시된 매퍼 조회, 없으면 생성
    pub fn for_entity<T: Entity>(policy: MappingPolicy) -> DaoResult<Arc<EntityMapper>> {
        let key = (TypeId::of::<T>(), policy);
        if let Some(mapper) = MAPPER_CACHE.get(&key) {
            return Ok(Arc::clone(mapper.value()));
        }

        let mapper = Arc::new(Self::build(T::descriptor(), policy)?);
        // 동시에 만든 경우 먼저 들어간 쪽을 유지
        let entry = MAPPER_CACHE.entry(key).or_insert(mapper);
        Ok(Arc::clone(entry.value()))
    }

    /// 디스크립터 검증 후 매퍼 생성
    pub fn build(descriptor: EntityDescriptor, policy: MappingPolicy) -> DaoResult<EntityMapper> {
        let type_name = descriptor.type_name;
        let config_err = |msg: String| DaoError::Configuration(format!("entity[{type_name}] {msg}"));

        if !descriptor.fields.iter().any(|f| !f.transient) {
            return Err(config_err("must have at least one persistable field".into()));
        }

        let pk_fields: Vec<usize> = descriptor
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.primary_key)
            .map(|(i, _)| i)
            .collect();
        if pk_fields.len() != 1 {
            return Err(config_err(format!(
                "must have exactly one primary key field, found {}",
                pk_fields.len()
            )));
        }
        let pk = pk_fields[0];
        let pk_meta = &descriptor.fields[pk];
        if pk_meta.transient {
            return Err(config_err(format!(
                "primary key field '{}' cannot be transient",
                pk_meta.property
            )));
        }
        if !matches!(
            pk_meta.kind,
            ValueKind::Int64 | ValueKind::Int32 | ValueKind::Utf8
        ) {
            return Err(config_err(format!(
                "primary key field '{}' must be i64, i32 or String, got {}",
                pk_meta.property, pk_meta.kind
            )));
        }

        let version_fields: Vec<usize> = descriptor
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.version)
            .map(|(i, _)| i)
            .collect();
        if version_fields.len() > 1 {
            return Err(config_err("must have at most one version field".into()));
        }
        let version = version_fields.first().copied();
        if let Some(v) = version
            && !matches!(descriptor.fields[v].kind, ValueKind::Int64 | ValueKind::Int32)
        {
            return Err(config_err(format!(
                "version field '{}' must be an integer",
                descriptor.fields[v].property
            )));
        }

        let mut properties = Vec::with_capacity(descriptor.fields.len());
        let mut by_property = HashMap::new();
        let mut by_column = HashMap::new();
        for (i, field) in descriptor.fields.iter().enumerate() {
            let spec = match field.column {
                ColumnSpec::Missing if field.primary_key || field.transient => ColumnSpec::Derived,
                other => other,
            };
            if spec == ColumnSpec::Missing && policy != MappingPolicy::WideColumn {
                return Err(config_err(format!(
                    "field '{}' must carry column metadata",
                    field.property
                )));
            }
            let column = column_name(field.property, spec, policy);
            if by_column.insert(column.to_lowercase(), i).is_some() {
                return Err(config_err(format!("duplicate column '{column}'")));
            }
            by_property.insert(field.property, i);
            properties.push(PropertyMapping {
                property: field.property,
                column,
                kind: field.kind,
                nullable: field.nullable,
                transient: field.transient,
            });
        }

        let owned = |s: Option<&'static str>| s.filter(|s| !s.trim().is_empty()).map(str::to_string);
        let mapper = EntityMapper {
            type_name,
            policy,
            properties,
            by_property,
            by_column,
            pk,
            version,
            table: owned(descriptor.table),
            sequence: owned(descriptor.sequence),
            index: owned(descriptor.index),
            index_pattern: owned(descriptor.index_pattern),
            doc_type: owned(descriptor.doc_type),
            keyspace: owned(descriptor.keyspace),
        };

        match policy {
            MappingPolicy::Relational | MappingPolicy::WideColumn if mapper.table.is_none() => {
                Err(config_err("must declare a table name".into()))
            }
            MappingPolicy::Search if mapper.index.is_none() => {
                Err(config_err("must declare an index name".into()))
            }
            _ => Ok(mapper),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn policy(&self) -> MappingPolicy {
        self.policy
    }

    /// 선언 순서의 모든 프로퍼티 (transient 포함)
    pub fn properties(&self) -> &[PropertyMapping] {
        &self.properties
    }

    /// 영속 대상 프로퍼티 (transient 제외)
    pub fn persisted(&self) -> impl Iterator<Item = &PropertyMapping> {
        self.properties.iter().filter(|p| !p.transient)
    }

    pub fn property(&self, property: &str) -> Option<&PropertyMapping> {
        self.by_property.get(property).map(|&i| &self.properties[i])
    }

    pub fn column_of(&self, property: &str) -> Option<&str> {
        self.property(property).map(|p| p.column.as_str())
    }

    /// 컬럼 이름으로 프로퍼티 조회 (대소문자 무시)
    pub fn property_of_column(&self, column: &str) -> Option<&PropertyMapping> {
        self.by_column
            .get(&column.to_lowercase())
            .map(|&i| &self.properties[i])
    }

    pub fn is_transient(&self, property: &str) -> bool {
        self.property(property).is_some_and(|p| p.transient)
    }

    pub fn pk(&self) -> &PropertyMapping {
        &self.properties[self.pk]
    }

    pub fn pk_property(&self) -> &'static str {
        self.properties[self.pk].property
    }

    pub fn pk_column(&self) -> &str {
        &self.properties[self.pk].column
    }

    pub fn version_property(&self) -> Option<&'static str> {
        self.version.map(|i| self.properties[i].property)
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn sequence(&self) -> Option<&str> {
        self.sequence.as_deref()
    }

    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }

    pub fn index_pattern(&self) -> Option<&str> {
        self.index_pattern.as_deref()
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref()
    }

    pub fn keyspace(&self) -> Option<&str> {
        self.keyspace.as_deref()
    }

    /// 빌드 시 검증되었으므로 관계형/와이드 컬럼 매퍼에서는 항상 존재
    pub(crate) fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(self.type_name)
    }
}

fn column_name(property: &str, spec: ColumnSpec, policy: MappingPolicy) -> String {
    match (policy, spec) {
        (MappingPolicy::Relational, ColumnSpec::Named(name)) => name.to_lowercase(),
        (MappingPolicy::Relational, _) => to_snake_case(property),
        (_, ColumnSpec::Named(name)) => name.to_string(),
        (_, _) => property.to_string(),
    }
}

/// camelCase → snake_case
pub fn to_snake_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for (i, ch) in property.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FieldMeta;

    fn descriptor(fields: Vec<FieldMeta>) -> EntityDescriptor {
        EntityDescriptor {
            type_name: "User",
            table: Some("t_user"),
            index: Some("user"),
            fields,
            ..Default::default()
        }
    }

    fn user_fields() -> Vec<FieldMeta> {
        vec![
            FieldMeta::new("id", ValueKind::Int64).primary_key(),
            FieldMeta::new("userName", ValueKind::Utf8).column(ColumnSpec::Derived),
            FieldMeta::new("email", ValueKind::Utf8).column(ColumnSpec::Named("EMAIL_ADDR")),
            FieldMeta::new("cached", ValueKind::Utf8).transient(),
        ]
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("userName"), "user_name");
        assert_eq!(to_snake_case("id"), "id");
        assert_eq!(to_snake_case("createdAtTime"), "created_at_time");
        assert_eq!(to_snake_case("Name"), "name");
    }

    #[test]
    fn test_relational_columns() {
        let m = EntityMapper::build(descriptor(user_fields()), MappingPolicy::Relational).unwrap();
        assert_eq!(m.column_of("userName"), Some("user_name"));
        assert_eq!(m.column_of("email"), Some("email_addr"));
        assert_eq!(m.pk_column(), "id");
        assert_eq!(m.property_of_column("USER_NAME").unwrap().property, "userName");
        assert!(m.is_transient("cached"));
        let persisted: Vec<&str> = m.persisted().map(|p| p.property).collect();
        assert_eq!(persisted, vec!["id", "userName", "email"]);
    }

    #[test]
    fn test_search_columns_keep_property_names() {
        let m = EntityMapper::build(descriptor(user_fields()), MappingPolicy::Search).unwrap();
        assert_eq!(m.column_of("userName"), Some("userName"));
        assert_eq!(m.column_of("email"), Some("EMAIL_ADDR"));
        assert_eq!(m.index(), Some("user"));
    }

    #[test]
    fn test_missing_column_metadata_rejected() {
        let mut fields = user_fields();
        fields.push(FieldMeta::new("age", ValueKind::Int32));
        let err = EntityMapper::build(descriptor(fields.clone()), MappingPolicy::Relational).unwrap_err();
        assert!(matches!(err, DaoError::Configuration(msg) if msg.contains("'age'")));
        // 와이드 컬럼은 메타데이터 없이 이름으로 매핑
        let m = EntityMapper::build(descriptor(fields), MappingPolicy::WideColumn).unwrap();
        assert_eq!(m.column_of("age"), Some("age"));
    }

    #[test]
    fn test_primary_key_rules() {
        let no_pk = vec![FieldMeta::new("name", ValueKind::Utf8).column(ColumnSpec::Derived)];
        assert!(EntityMapper::build(descriptor(no_pk), MappingPolicy::Relational).is_err());

        let two_pk = vec![
            FieldMeta::new("a", ValueKind::Int64).primary_key(),
            FieldMeta::new("b", ValueKind::Int64).primary_key(),
        ];
        assert!(EntityMapper::build(descriptor(two_pk), MappingPolicy::Relational).is_err());

        let float_pk = vec![FieldMeta::new("a", ValueKind::Float64).primary_key()];
        assert!(EntityMapper::build(descriptor(float_pk), MappingPolicy::Relational).is_err());
    }

    #[test]
    fn test_only_transient_fields_rejected() {
        let fields = vec![FieldMeta::new("a", ValueKind::Utf8).transient()];
        let err = EntityMapper::build(descriptor(fields), MappingPolicy::WideColumn).unwrap_err();
        assert!(err.to_string().contains("persistable"));
    }

    #[test]
    fn test_backend_name_required() {
        let mut d = descriptor(user_fields());
        d.table = None;
        assert!(EntityMapper::build(d.clone(), MappingPolicy::Relational).is_err());
        assert!(EntityMapper::build(d.clone(), MappingPolicy::Search).is_ok());
        d.index = Some("  ");
        assert!(EntityMapper::build(d, MappingPolicy::Search).is_err());
    }

    #[test]
    fn test_version_field() {
        let mut fields = user_fields();
        fields.push(FieldMeta::new("version", ValueKind::Int64).column(ColumnSpec::Derived).version());
        let m = EntityMapper::build(descriptor(fields), MappingPolicy::Search).unwrap();
        assert_eq!(m.version_property(), Some("version"));
    }
}
