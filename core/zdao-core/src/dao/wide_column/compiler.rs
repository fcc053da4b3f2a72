//! CQL 컴파일러. insert와 전체 건수만 생성합니다.

use crate::api::{Entity, Value};
use crate::dao::wide_column::client::CqlStatement;
use crate::mapping::EntityMapper;

pub struct CqlCompiler<'a> {
    mapper: &'a EntityMapper,
}

impl<'a> CqlCompiler<'a> {
    pub fn new(mapper: &'a EntityMapper) -> Self {
        Self { mapper }
    }

    /// `ks.table`, keyspace가 없으면 `table`
    pub fn qualified_table(&self) -> String {
        match self.mapper.keyspace() {
            Some(keyspace) => format!("{keyspace}.{}", self.mapper.table_name()),
            None => self.mapper.table_name().to_string(),
        }
    }

    /// 모든 영속 프로퍼티를 담은 insert
    pub fn insert<T: Entity>(&self, entity: &T) -> CqlStatement {
        let mut columns = Vec::new();
        let mut params = Vec::new();
        for p in self.mapper.persisted() {
            columns.push(p.column.as_str());
            params.push(entity.get_value(p.property).unwrap_or(Value::Null));
        }
        let placeholders = vec!["?"; columns.len()].join(",");
        CqlStatement::new(
            format!(
                "insert into {} ({}) values ({})",
                self.qualified_table(),
                columns.join(","),
                placeholders
            ),
            params,
        )
    }

    pub fn count_all(&self) -> String {
        format!("select count(*) from {}", self.qualified_table())
    }
}
