//! SQL 컴파일러
//!
//! Query/Criteria/Update를 `?` placeholder SQL과 순서 있는 파라미터 목록으로 변환합니다.
//! 각 절은 뒤에 공백 하나를 붙여 그대로 이어 붙일 수 있습니다.

use crate::api::{Id, Value};
use crate::error::{DaoError, DaoResult};
use crate::mapping::EntityMapper;
use crate::query::{Criteria, GroupBy, Operator, OperatorShape, OrderBy, Query, Update};
use crate::settings::SqlDialect;

/// 컴파일된 SQL과 바인딩 파라미터
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlStatement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

pub struct SqlCompiler<'a> {
    mapper: &'a EntityMapper,
    dialect: SqlDialect,
}

impl<'a> SqlCompiler<'a> {
    pub fn new(mapper: &'a EntityMapper, dialect: SqlDialect) -> Self {
        Self { mapper, dialect }
    }

    fn column(&self, property: &str, param: &'static str) -> DaoResult<&'a str> {
        self.mapper
            .column_of(property)
            .ok_or_else(|| DaoError::invalid_argument(param, format!("unknown property '{property}'")))
    }

    fn table(&self) -> &'a str {
        self.mapper.table_name()
    }

    /// `SELECT c1,c2 `
    pub fn select_clause(&self, query: &Query) -> DaoResult<String> {
        let mut columns: Vec<String> = Vec::new();
        if !query.get_group_bys().is_empty() {
            for GroupBy { key, count_alias } in query.get_group_bys() {
                columns.push(self.column(key, "group_bys")?.to_string());
                if let Some(alias) = count_alias.as_deref().filter(|a| !a.trim().is_empty()) {
                    columns.push(format!("COUNT(*) AS {}", self.column(alias, "group_bys")?));
                }
            }
        } else if !query.get_fields().is_empty() {
            for field in query.get_fields() {
                columns.push(self.column(field, "fields")?.to_string());
            }
        } else {
            columns.extend(self.mapper.persisted().map(|p| p.column.clone()));
        }
        Ok(format!("SELECT {} ", columns.join(",")))
    }

    /// `FROM t `
    pub fn from_clause(&self) -> String {
        format!("FROM {} ", self.table())
    }

    /// `WHERE a >= ? AND b = ? `. 조건이 없으면 빈 문자열.
    pub fn where_clause(&self, criteria: Option<&Criteria>, params: &mut Vec<Value>) -> DaoResult<String> {
        let Some(criteria) = criteria else {
            return Ok(String::new());
        };

        let mut predicates = Vec::with_capacity(criteria.len());
        for node in criteria.nodes() {
            let column = self.column(&node.key, "criteria")?;
            let op = node.operator;
            let predicate = match op.shape() {
                OperatorShape::NoValue => format!("{column} {op}"),
                OperatorShape::Single => {
                    if matches!(op, Operator::Match | Operator::MatchPhrase) {
                        return Err(DaoError::unsupported("JdbcDao", "full-text match criteria"));
                    }
                    if matches!(node.value, Value::List(_)) {
                        return Err(DaoError::type_mismatch(
                            format!("scalar value for '{op}' on '{}'", node.key),
                            "List",
                        ));
                    }
                    params.push(node.value.clone());
                    format!("{column} {op} ?")
                }
                OperatorShape::Multi => {
                    let items = node.value.as_list().map_err(|_| {
                        DaoError::type_mismatch(
                            format!("List for '{op}' on '{}'", node.key),
                            node.value.kind().to_string(),
                        )
                    })?;
                    if items.is_empty() {
                        return Err(DaoError::invalid_argument(
                            "criteria",
                            format!("'{op}' on '{}' needs at least one value", node.key),
                        ));
                    }
                    params.extend(items.iter().cloned());
                    let placeholders = vec!["?"; items.len()].join(",");
                    format!("{column} {op} ({placeholders})")
                }
            };
            predicates.push(predicate);
        }
        Ok(format!("WHERE {} ", predicates.join(" AND ")))
    }

    /// `GROUP BY a,b `
    pub fn group_by_clause(&self, group_bys: &[GroupBy]) -> DaoResult<String> {
        if group_bys.is_empty() {
            return Ok(String::new());
        }
        let columns = group_bys
            .iter()
            .map(|g| self.column(&g.key, "group_bys"))
            .collect::<DaoResult<Vec<_>>>()?;
        Ok(format!("GROUP BY {} ", columns.join(",")))
    }

    /// `ORDER BY a DESC,b ASC `
    pub fn order_by_clause(&self, order_bys: &[OrderBy]) -> DaoResult<String> {
        if order_bys.is_empty() {
            return Ok(String::new());
        }
        let items = order_bys
            .iter()
            .map(|o| -> DaoResult<String> {
                Ok(format!("{} {}", self.column(&o.key, "order_bys")?, o.direction.as_sql()))
            })
            .collect::<DaoResult<Vec<_>>>()?;
        Ok(format!("ORDER BY {} ", items.join(",")))
    }

    /// 방언별 페이지네이션. offset < 0 또는 limit ≤ 0 이면 그대로 반환.
    /// Oracle의 `offset + limit` 상한이 i64를 넘으면 인자 오류.
    pub fn paginate(&self, sql: String, offset: i64, limit: i64) -> DaoResult<String> {
        if offset < 0 || limit <= 0 {
            return Ok(sql);
        }
        Ok(match self.dialect {
            SqlDialect::Mysql => format!("{sql}LIMIT {offset},{limit}"),
            SqlDialect::Oracle => {
                let upper = offset
                    .checked_add(limit)
                    .ok_or_else(|| DaoError::invalid_argument("query", "offset overflows"))?;
                format!(
                    "SELECT * FROM (SELECT ROWNUM AS RN,table_alias.* FROM ({sql}) table_alias WHERE ROWNUM <= {upper}) WHERE RN > {offset}"
                )
            }
        })
    }

    pub fn select(&self, query: &Query) -> DaoResult<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = self.select_clause(query)?;
        sql.push_str(&self.from_clause());
        sql.push_str(&self.where_clause(query.get_criteria(), &mut params)?);
        sql.push_str(&self.group_by_clause(query.get_group_bys())?);
        sql.push_str(&self.order_by_clause(query.get_order_bys())?);
        if let Some((offset, limit)) = query.paging() {
            sql = self.paginate(sql, offset, limit)?;
        }
        Ok(SqlStatement::new(sql, params))
    }

    /// `SELECT COUNT(*) FROM t [WHERE ...]`
    pub fn count(&self, criteria: Option<&Criteria>) -> DaoResult<SqlStatement> {
        let mut params = Vec::new();
        let mut sql = String::from("SELECT COUNT(*) ");
        sql.push_str(&self.from_clause());
        sql.push_str(&self.where_clause(criteria, &mut params)?);
        Ok(SqlStatement::new(sql, params))
    }

    /// `UPDATE t SET c1=?,c2=? WHERE ...`. transient 프로퍼티는 건너뜁니다.
    pub fn update(&self, update: &Update, criteria: &Criteria) -> DaoResult<SqlStatement> {
        let mut params = Vec::new();
        let mut assignments = Vec::with_capacity(update.len());
        for (property, value) in update.iter() {
            let column = self.column(property, "update")?;
            if self.mapper.is_transient(property) {
                continue;
            }
            assignments.push(format!("{column}=?"));
            params.push(value.clone());
        }
        if assignments.is_empty() {
            return Err(DaoError::invalid_argument(
                "update",
                "must set at least one persisted property",
            ));
        }
        let mut sql = format!("UPDATE {} SET {} ", self.table(), assignments.join(","));
        sql.push_str(&self.where_clause(Some(criteria), &mut params)?);
        Ok(SqlStatement::new(sql, params))
    }

    /// `DELETE FROM t WHERE <pk> = ?`
    pub fn delete_by_id(&self, id: &Id) -> SqlStatement {
        SqlStatement::new(
            format!("DELETE FROM {} WHERE {} = ?", self.table(), self.mapper.pk_column()),
            vec![id.to_value()],
        )
    }

    /// `INSERT INTO t (c1,c2) VALUES (?,?)`
    pub fn insert(&self, values: Vec<(&str, Value)>) -> SqlStatement {
        let (columns, params): (Vec<&str>, Vec<Value>) = values.into_iter().unzip();
        let placeholders = vec!["?"; columns.len()].join(",");
        SqlStatement::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({placeholders})",
                self.table(),
                columns.join(",")
            ),
            params,
        )
    }

    /// Oracle 시퀀스 채번 SQL
    pub fn next_sequence_value(&self) -> DaoResult<String> {
        let sequence = self.mapper.sequence().ok_or_else(|| {
            DaoError::Configuration(format!(
                "entity[{}] must declare a sequence for oracle inserts",
                self.mapper.type_name()
            ))
        })?;
        Ok(format!("SELECT {sequence}.NEXTVAL AS ID FROM DUAL"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ColumnSpec, EntityDescriptor, FieldMeta, ValueKind};
    use crate::mapping::MappingPolicy;
    use crate::query::Pageable;

    fn mapper() -> EntityMapper {
        let descriptor = EntityDescriptor {
            type_name: "Member",
            table: Some("t_member"),
            sequence: Some("seq_member"),
            fields: vec![
                FieldMeta::new("id", ValueKind::Int64).primary_key(),
                FieldMeta::new("age", ValueKind::Int32).column(ColumnSpec::Derived),
                FieldMeta::new("status", ValueKind::Utf8).column(ColumnSpec::Derived),
                FieldMeta::new("createdAt", ValueKind::Int64).column(ColumnSpec::Named("CREATED")),
                FieldMeta::new("total", ValueKind::Int64).transient(),
            ],
            ..Default::default()
        };
        EntityMapper::build(descriptor, MappingPolicy::Relational).unwrap()
    }

    #[test]
    fn test_where_age_and_status() {
        let m = mapper();
        let c = SqlCompiler::new(&m, SqlDialect::Mysql);
        let criteria = Criteria::where_op("age", Operator::Gte, 18).and("status", "active");
        let mut params = Vec::new();
        let sql = c.where_clause(Some(&criteria), &mut params).unwrap();
        assert_eq!(sql, "WHERE age >= ? AND status = ? ");
        assert_eq!(params, vec![Value::Int32(18), Value::Utf8("active".into())]);
    }

    #[test]
    fn test_where_in_and_null() {
        let m = mapper();
        let c = SqlCompiler::new(&m, SqlDialect::Mysql);
        let criteria = Criteria::where_op("id", Operator::In, vec![1i64, 2, 3])
            .and_op("status", Operator::IsNull, Value::Null)
            .and_op("age", Operator::NotIn, vec![7]);
        let mut params = Vec::new();
        let sql = c.where_clause(Some(&criteria), &mut params).unwrap();
        assert_eq!(sql, "WHERE id IN (?,?,?) AND status IS NULL AND age NOT IN (?) ");
        assert_eq!(
            params,
            vec![Value::Int64(1), Value::Int64(2), Value::Int64(3), Value::Int32(7)]
        );
    }

    #[test]
    fn test_where_shape_mismatch() {
        let m = mapper();
        let c = SqlCompiler::new(&m, SqlDialect::Mysql);
        let mut params = Vec::new();
        let err = c
            .where_clause(Some(&Criteria::where_op("id", Operator::In, 5)), &mut params)
            .unwrap_err();
        assert!(matches!(err, DaoError::TypeMismatch { .. }));
        let err = c
            .where_clause(Some(&Criteria::where_eq("id", vec![1, 2])), &mut params)
            .unwrap_err();
        assert!(matches!(err, DaoError::TypeMismatch { .. }));
    }

    #[test]
    fn test_where_unknown_property() {
        let m = mapper();
        let c = SqlCompiler::new(&m, SqlDialect::Mysql);
        let err = c
            .where_clause(Some(&Criteria::where_eq("nope", 1)), &mut Vec::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid argument 'criteria': unknown property 'nope'");
    }

    #[test]
    fn test_match_unsupported_in_sql() {
        let m = mapper();
        let c = SqlCompiler::new(&m, SqlDialect::Mysql);
        let err = c
            .where_clause(Some(&Criteria::where_op("status", Operator::Match, "x")), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, DaoError::Unsupported { .. }));
    }

    #[test]
    fn test_select_all_columns_excludes_transient() {
        let m = mapper();
        let stmt = SqlCompiler::new(&m, SqlDialect::Mysql).select(&Query::new()).unwrap();
        assert_eq!(stmt.sql, "SELECT id,age,status,created FROM t_member ");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_select_fields_order_group() {
        let m = mapper();
        let query = Query::new()
            .fields(["status"])
            .group_by(GroupBy::with_count("status", "total"))
            .order_by(OrderBy::desc("createdAt"))
            .order_by(OrderBy::asc("id"));
        let stmt = SqlCompiler::new(&m, SqlDialect::Mysql).select(&query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT status,COUNT(*) AS total FROM t_member GROUP BY status ORDER BY created DESC,id ASC "
        );
    }

    #[test]
    fn test_mysql_limit() {
        let m = mapper();
        let query = Query::new().page(&Pageable::new(3, 10));
        let stmt = SqlCompiler::new(&m, SqlDialect::Mysql).select(&query).unwrap();
        assert!(stmt.sql.ends_with("LIMIT 20,10"));
    }

    #[test]
    fn test_oracle_rownum() {
        let m = mapper();
        let query = Query::with_criteria(Criteria::where_eq("status", "a"))
            .offset(20)
            .limit(10);
        let stmt = SqlCompiler::new(&m, SqlDialect::Oracle).select(&query).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM (SELECT ROWNUM AS RN,table_alias.* FROM (SELECT id,age,status,created FROM t_member WHERE status = ? ) table_alias WHERE ROWNUM <= 30) WHERE RN > 20"
        );
        assert_eq!(stmt.params, vec![Value::Utf8("a".into())]);
    }

    #[test]
    fn test_no_paging_without_limit() {
        let m = mapper();
        let sql = SqlCompiler::new(&m, SqlDialect::Mysql).paginate("SELECT 1 ".into(), 0, 0);
        assert_eq!(sql.unwrap(), "SELECT 1 ");
    }

    #[test]
    fn test_oracle_rownum_overflow() {
        let m = mapper();
        let query = Query::new().offset(i64::MAX - 1).limit(10);
        let err = SqlCompiler::new(&m, SqlDialect::Oracle).select(&query).unwrap_err();
        assert!(matches!(err, DaoError::InvalidArgument { ref param, .. } if param == "query"));

        // MySQL은 합을 계산하지 않음
        let stmt = SqlCompiler::new(&m, SqlDialect::Mysql).select(&query).unwrap();
        assert!(stmt.sql.ends_with(&format!("LIMIT {},10", i64::MAX - 1)));
    }

    #[test]
    fn test_count() {
        let m = mapper();
        let c = SqlCompiler::new(&m, SqlDialect::Mysql);
        assert_eq!(c.count(None).unwrap().sql, "SELECT COUNT(*) FROM t_member ");
        let stmt = c.count(Some(&Criteria::where_eq("age", 3))).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(*) FROM t_member WHERE age = ? ");
    }

    #[test]
    fn test_update_skips_transient() {
        let m = mapper();
        let update = Update::new().set("status", "x").set("total", 9).set("age", 1);
        let stmt = SqlCompiler::new(&m, SqlDialect::Mysql)
            .update(&update, &Criteria::where_eq("id", 5i64))
            .unwrap();
        assert_eq!(stmt.sql, "UPDATE t_member SET status=?,age=? WHERE id = ? ");
        assert_eq!(
            stmt.params,
            vec![Value::Utf8("x".into()), Value::Int32(1), Value::Int64(5)]
        );
    }

    #[test]
    fn test_update_only_transient_rejected() {
        let m = mapper();
        let err = SqlCompiler::new(&m, SqlDialect::Mysql)
            .update(&Update::new().set("total", 1), &Criteria::where_eq("id", 1i64))
            .unwrap_err();
        assert!(matches!(err, DaoError::InvalidArgument { .. }));
    }

    #[test]
    fn test_delete_and_insert() {
        let m = mapper();
        let c = SqlCompiler::new(&m, SqlDialect::Mysql);
        let stmt = c.delete_by_id(&Id::Long(4));
        assert_eq!(stmt.sql, "DELETE FROM t_member WHERE id = ?");
        assert_eq!(stmt.params, vec![Value::Int64(4)]);

        let stmt = c.insert(vec![("age", Value::Int32(1)), ("status", Value::Utf8("a".into()))]);
        assert_eq!(stmt.sql, "INSERT INTO t_member (age,status) VALUES (?,?)");
    }

    #[test]
    fn test_next_sequence_value() {
        let m = mapper();
        let sql = SqlCompiler::new(&m, SqlDialect::Oracle).next_sequence_value().unwrap();
        assert_eq!(sql, "SELECT seq_member.NEXTVAL AS ID FROM DUAL");
    }
}
