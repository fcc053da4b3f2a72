//! 읽기/쓰기 데이터 소스 라우터
//!
//! 쓰기는 writer 중 라운드로빈, 읽기는 reader 중 라운드로빈입니다.
//! reader가 없으면 writer로 읽습니다.

use crate::dao::jdbc::client::{SqlConnector, SqlExecutor};
use crate::error::{DaoError, DaoResult};
use crate::settings::{JdbcSettings, redact_url};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct DatabaseRouter {
    writers: Vec<Arc<dyn SqlExecutor>>,
    readers: Vec<Arc<dyn SqlExecutor>>,
    write_cursor: AtomicUsize,
    read_cursor: AtomicUsize,
}

impl DatabaseRouter {
    pub fn new(writers: Vec<Arc<dyn SqlExecutor>>, readers: Vec<Arc<dyn SqlExecutor>>) -> DaoResult<Self> {
        if writers.is_empty() {
            return Err(DaoError::Configuration(
                "database router needs at least one write data source".into(),
            ));
        }
        Ok(Self {
            writers,
            readers,
            write_cursor: AtomicUsize::new(0),
            read_cursor: AtomicUsize::new(0),
        })
    }

    /// 설정의 URL마다 실행기를 만들어 라우터 구성
    pub fn connect(settings: &JdbcSettings, connector: &dyn SqlConnector) -> DaoResult<Self> {
        settings.validate()?;
        let open = |urls: &[String]| -> DaoResult<Vec<Arc<dyn SqlExecutor>>> {
            urls.iter()
                .filter(|u| !u.trim().is_empty())
                .map(|url| {
                    connector.connect(settings.dialect, url).map_err(|e| {
                        DaoError::Configuration(format!("cannot open data source [{}]: {e}", redact_url(url)))
                    })
                })
                .collect()
        };
        Self::new(open(&settings.write_urls)?, open(&settings.read_urls)?)
    }

    pub fn write_route(&self) -> &Arc<dyn SqlExecutor> {
        let i = self.write_cursor.fetch_add(1, Ordering::Relaxed) % self.writers.len();
        &self.writers[i]
    }

    pub fn read_route(&self) -> &Arc<dyn SqlExecutor> {
        if self.readers.is_empty() {
            return self.write_route();
        }
        let i = self.read_cursor.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        &self.readers[i]
    }

    pub fn writer_count(&self) -> usize {
        self.writers.len()
    }

    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Value;
    use crate::error::{BackendError, BackendResult};
    use crate::mapping::Row;
    use crate::settings::SqlDialect;

    /// 실행기 이름을 COUNT 결과로 돌려주는 스텁
    struct Named(i64);

    impl SqlExecutor for Named {
        fn query_for_list(&self, _sql: &str, _params: &[Value]) -> BackendResult<Vec<Row>> {
            Ok(Vec::new())
        }
        fn query_for_long(&self, _sql: &str, _params: &[Value]) -> BackendResult<i64> {
            Ok(self.0)
        }
        fn update(&self, _sql: &str, _params: &[Value]) -> BackendResult<i64> {
            Ok(self.0)
        }
        fn update_returning_key(
            &self,
            _sql: &str,
            _params: &[Value],
            _key_column: &str,
        ) -> BackendResult<(i64, Option<Value>)> {
            Ok((1, None))
        }
    }

    fn executors(ids: &[i64]) -> Vec<Arc<dyn SqlExecutor>> {
        ids.iter().map(|&i| Arc::new(Named(i)) as Arc<dyn SqlExecutor>).collect()
    }

    #[test]
    fn test_round_robin_writes() {
        let router = DatabaseRouter::new(executors(&[1, 2]), Vec::new()).unwrap();
        let picks: Vec<i64> = (0..4)
            .map(|_| router.write_route().query_for_long("", &[]).unwrap())
            .collect();
        assert_eq!(picks, vec![1, 2, 1, 2]);
    }

    #[test]
    fn test_reads_fall_back_to_writers() {
        let router = DatabaseRouter::new(executors(&[1]), Vec::new()).unwrap();
        assert_eq!(router.read_route().query_for_long("", &[]).unwrap(), 1);
        assert_eq!(router.reader_count(), 0);
    }

    #[test]
    fn test_reads_use_readers() {
        let router = DatabaseRouter::new(executors(&[1]), executors(&[10, 11])).unwrap();
        let picks: Vec<i64> = (0..3)
            .map(|_| router.read_route().query_for_long("", &[]).unwrap())
            .collect();
        assert_eq!(picks, vec![10, 11, 10]);
    }

    #[test]
    fn test_requires_writer() {
        assert!(DatabaseRouter::new(Vec::new(), executors(&[1])).is_err());
    }

    struct FailingConnector;

    impl SqlConnector for FailingConnector {
        fn connect(&self, _dialect: SqlDialect, url: &str) -> BackendResult<Arc<dyn SqlExecutor>> {
            Err(BackendError::other(format!("unreachable {url}")))
        }
    }

    #[test]
    fn test_connect_failure_is_configuration_error() {
        let settings = JdbcSettings::new(SqlDialect::Mysql, vec!["mysql://db".into()]);
        let err = DatabaseRouter::connect(&settings, &FailingConnector).err().unwrap();
        assert!(matches!(err, DaoError::Configuration(msg) if msg.contains("mysql://db")));
    }

    struct RefusingConnector;

    impl SqlConnector for RefusingConnector {
        fn connect(&self, _dialect: SqlDialect, _url: &str) -> BackendResult<Arc<dyn SqlExecutor>> {
            Err(BackendError::other("connection refused"))
        }
    }

    #[test]
    fn test_connect_failure_masks_credentials() {
        let settings = JdbcSettings::new(SqlDialect::Mysql, vec!["mysql://app:pw123@db/main".into()]);
        let err = DatabaseRouter::connect(&settings, &RefusingConnector).err().unwrap();
        let msg = err.to_string();
        assert!(!msg.contains("pw123"), "{msg}");
        assert!(msg.contains("mysql://***@db/main"), "{msg}");
    }
}
