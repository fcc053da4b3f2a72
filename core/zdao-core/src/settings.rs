//! DAO 설정 — 백엔드별 클라이언트 설정 객체
//!
//! 설정 값은 `ClientRegistry`의 키로도 쓰이므로 `Hash + Eq`를 구현합니다.

use crate::error::{CallKind, DaoError, DaoResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 관계형 SQL 방언
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Mysql,
    Oracle,
}

impl SqlDialect {
    pub fn call_kind(&self) -> CallKind {
        match self {
            SqlDialect::Mysql => CallKind::Mysql,
            SqlDialect::Oracle => CallKind::Oracle,
        }
    }
}

/// `host:port` 서버 주소
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// `host:port[,host:port...]` 목록 파싱
pub fn parse_address_list(list: &str) -> DaoResult<Vec<ServerAddress>> {
    let mut addresses = Vec::new();
    for entry in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (host, port) = entry.rsplit_once(':').ok_or_else(|| {
            DaoError::Configuration(format!("server address '{entry}' must be host:port"))
        })?;
        let port = port.parse::<u16>().map_err(|_| {
            DaoError::Configuration(format!("server address '{entry}' has an invalid port"))
        })?;
        if host.is_empty() {
            return Err(DaoError::Configuration(format!(
                "server address '{entry}' has an empty host"
            )));
        }
        addresses.push(ServerAddress {
            host: host.to_string(),
            port,
        });
    }
    if addresses.is_empty() {
        return Err(DaoError::Configuration("server address list is empty".into()));
    }
    Ok(addresses)
}

/// 관계형 백엔드 설정
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JdbcSettings {
    pub dialect: SqlDialect,
    /// 쓰기 데이터 소스 URL (하나 이상)
    pub write_urls: Vec<String>,
    /// 읽기 데이터 소스 URL. 비어 있으면 쓰기 소스로 읽습니다.
    #[serde(default)]
    pub read_urls: Vec<String>,
}

impl JdbcSettings {
    pub fn new(dialect: SqlDialect, write_urls: Vec<String>) -> Self {
        Self {
            dialect,
            write_urls,
            read_urls: Vec::new(),
        }
    }

    pub fn with_read_urls(mut self, read_urls: Vec<String>) -> Self {
        self.read_urls = read_urls;
        self
    }

    pub fn from_json(json: &str) -> DaoResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> DaoResult<()> {
        if self.write_urls.iter().all(|u| u.trim().is_empty()) {
            return Err(DaoError::Configuration(
                "jdbc settings need at least one write data source".into(),
            ));
        }
        Ok(())
    }
}

/// 검색 엔진 insert 시 기본 키 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// 기본 키가 없으면 인자 오류
    #[default]
    Required,
    /// 엔진이 발급한 id를 엔티티에 기록
    EngineAssigned,
}

fn default_max_update_size() -> usize {
    1000
}

fn default_max_result_window() -> i64 {
    i32::MAX as i64
}

/// 검색 엔진 백엔드 설정
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchSettings {
    /// `host:port[,host:port...]`
    pub server_address_list: String,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub id_policy: IdPolicy,
    /// update_by_ids / update_by_criteria 한 번에 허용하는 최대 건수
    #[serde(default = "default_max_update_size")]
    pub max_update_size: usize,
    /// limit 없는 조회에 허용하는 최대 결과 윈도우
    #[serde(default = "default_max_result_window")]
    pub max_result_window: i64,
}

impl SearchSettings {
    pub fn new(server_address_list: impl Into<String>) -> Self {
        Self {
            server_address_list: server_address_list.into(),
            cluster_name: None,
            user_name: None,
            password: None,
            id_policy: IdPolicy::default(),
            max_update_size: default_max_update_size(),
            max_result_window: default_max_result_window(),
        }
    }

    pub fn with_id_policy(mut self, id_policy: IdPolicy) -> Self {
        self.id_policy = id_policy;
        self
    }

    pub fn with_max_update_size(mut self, max_update_size: usize) -> Self {
        self.max_update_size = max_update_size;
        self
    }

    pub fn with_max_result_window(mut self, max_result_window: i64) -> Self {
        self.max_result_window = max_result_window;
        self
    }

    pub fn from_json(json: &str) -> DaoResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn addresses(&self) -> DaoResult<Vec<ServerAddress>> {
        parse_address_list(&self.server_address_list)
    }

    pub fn validate(&self) -> DaoResult<()> {
        self.addresses()?;
        if self.max_update_size == 0 {
            return Err(DaoError::Configuration("max_update_size must be positive".into()));
        }
        if self.max_result_window <= 0 {
            return Err(DaoError::Configuration("max_result_window must be positive".into()));
        }
        Ok(())
    }
}

/// 와이드 컬럼 백엔드 설정
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WideColumnSettings {
    /// `host:port[,host:port...]`
    pub server_address_list: String,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl WideColumnSettings {
    pub fn new(server_address_list: impl Into<String>) -> Self {
        Self {
            server_address_list: server_address_list.into(),
            cluster_name: None,
            user_name: None,
            password: None,
        }
    }

    pub fn from_json(json: &str) -> DaoResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.addresses()?;
        Ok(settings)
    }

    pub fn addresses(&self) -> DaoResult<Vec<ServerAddress>> {
        parse_address_list(&self.server_address_list)
    }
}

const MASK: &str = "***";

/// URL의 `user:password@` 부분을 가림
pub(crate) fn redact_url(url: &str) -> String {
    let Some(at) = url.rfind('@') else {
        return url.to_string();
    };
    let start = match url.find("://") {
        Some(i) => i + 3,
        None => url[..at].rfind(':').map_or(0, |i| i + 1),
    };
    if start >= at {
        return url.to_string();
    }
    format!("{}{MASK}{}", &url[..start], &url[at..])
}

// Debug 출력은 로그에 남으므로 자격 증명을 가립니다.

impl fmt::Debug for JdbcSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |urls: &[String]| urls.iter().map(|u| redact_url(u)).collect::<Vec<_>>();
        f.debug_struct("JdbcSettings")
            .field("dialect", &self.dialect)
            .field("write_urls", &redact(&self.write_urls))
            .field("read_urls", &redact(&self.read_urls))
            .finish()
    }
}

impl fmt::Debug for SearchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSettings")
            .field("server_address_list", &self.server_address_list)
            .field("cluster_name", &self.cluster_name)
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| MASK))
            .field("id_policy", &self.id_policy)
            .field("max_update_size", &self.max_update_size)
            .field("max_result_window", &self.max_result_window)
            .finish()
    }
}

impl fmt::Debug for WideColumnSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WideColumnSettings")
            .field("server_address_list", &self.server_address_list)
            .field("cluster_name", &self.cluster_name)
            .field("user_name", &self.user_name)
            .field("password", &self.password.as_ref().map(|_| MASK))
            .finish()
    }
}

/// 백엔드 선택
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum DaoSettings {
    Jdbc(JdbcSettings),
    Search(SearchSettings),
    WideColumn(WideColumnSettings),
}

impl DaoSettings {
    pub fn from_json(json: &str) -> DaoResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        match &settings {
            DaoSettings::Jdbc(s) => s.validate()?,
            DaoSettings::Search(s) => s.validate()?,
            DaoSettings::WideColumn(s) => {
                s.addresses()?;
            }
        }
        Ok(settings)
    }
}
