//! Query 빌더와 보조 타입 (OrderBy, GroupBy, Pageable, Update)

use crate::api::Value;
use crate::query::criteria::Criteria;

/// 정렬 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderBy {
    pub key: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: Direction::Desc,
        }
    }
}

/// 그룹 키. `count_alias`가 있으면 `COUNT(*) AS <alias 컬럼>`도 선택합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupBy {
    pub key: String,
    pub count_alias: Option<String>,
}

impl GroupBy {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count_alias: None,
        }
    }

    pub fn with_count(key: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            count_alias: Some(alias.into()),
        }
    }
}

/// 1부터 시작하는 페이지 번호와 페이지 크기
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pageable {
    page: i64,
    size: i64,
}

impl Pageable {
    pub fn new(page: i64, size: i64) -> Self {
        Self { page, size }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn is_valid(&self) -> bool {
        self.page >= 1 && self.size > 0
    }

    /// 시작 위치. 범위를 넘으면 `i64::MAX`로 포화됩니다.
    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX)
    }

    /// 시작 위치, i64 범위를 넘으면 `None`
    pub fn checked_offset(&self) -> Option<i64> {
        self.page.checked_sub(1)?.checked_mul(self.size)
    }

    pub fn limit(&self) -> i64 {
        self.size
    }
}

/// 순서가 유지되는 프로퍼티 → 새 값 매핑
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    entries: Vec<(String, Value)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// 같은 키를 다시 지정하면 기존 위치의 값을 덮어씁니다.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 백엔드 독립 쿼리
///
/// ```rust
/// use zdao_core::query::{Criteria, OrderBy, Query};
///
/// let query = Query::new()
///     .criteria(Criteria::where_eq("status", "active"))
///     .order_by(OrderBy::desc("createdAt"))
///     .offset(20)
///     .limit(10);
/// assert_eq!(query.get_limit(), Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    criteria: Option<Criteria>,
    fields: Vec<String>,
    group_bys: Vec<GroupBy>,
    order_bys: Vec<OrderBy>,
    offset: Option<i64>,
    limit: Option<i64>,
    hint: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criteria(criteria: Criteria) -> Self {
        Self::new().criteria(criteria)
    }

    pub fn criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_bys.push(group_by);
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_bys.push(order_by);
        self
    }

    pub fn order_bys(mut self, order_bys: impl IntoIterator<Item = OrderBy>) -> Self {
        self.order_bys.extend(order_bys);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page(self, pageable: &Pageable) -> Self {
        self.offset(pageable.offset()).limit(pageable.limit())
    }

    /// 백엔드별 힌트 (SQL 주석 힌트, 검색 preference 등)
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn set_offset(&mut self, offset: i64) {
        self.offset = Some(offset);
    }

    pub fn set_limit(&mut self, limit: i64) {
        self.limit = Some(limit);
    }

    pub fn get_criteria(&self) -> Option<&Criteria> {
        self.criteria.as_ref()
    }

    pub fn get_fields(&self) -> &[String] {
        &self.fields
    }

    pub fn get_group_bys(&self) -> &[GroupBy] {
        &self.group_bys
    }

    pub fn get_order_bys(&self) -> &[OrderBy] {
        &self.order_bys
    }

    pub fn get_offset(&self) -> Option<i64> {
        self.offset
    }

    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }

    pub fn get_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// offset ≥ 0, limit > 0 일 때만 페이징
    pub fn paging(&self) -> Option<(i64, i64)> {
        match (self.offset, self.limit) {
            (Some(offset), Some(limit)) if offset >= 0 && limit > 0 => Some((offset, limit)),
            _ => None,
        }
    }
}
