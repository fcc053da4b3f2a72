//! Query 모델 — Criteria, Query, OrderBy, GroupBy, Pageable, Update

pub mod criteria;
pub mod model;

pub use criteria::{Criteria, Criterion, Operator, OperatorShape};
pub use model::{Direction, GroupBy, OrderBy, Pageable, Query, Update};
