//! Client registry
//!
//! 설정 값 하나당 클라이언트를 최대 한 번 생성합니다. 생성은 뮤텍스로 직렬화되고,
//! 이후 조회는 DashMap에서 락 없이 처리됩니다. 캐시된 클라이언트는 다시 만들거나
//! 해제하지 않습니다.

use crate::error::DaoResult;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::info;

pub struct ClientRegistry<K, C> {
    clients: DashMap<K, C>,
    create_lock: Mutex<()>,
}

impl<K, C> ClientRegistry<K, C>
where
    K: Eq + Hash + Clone + Debug,
    C: Clone,
{
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
            create_lock: Mutex::new(()),
        }
    }

    /// 캐시된 클라이언트 조회
    pub fn get_client(&self, key: &K) -> Option<C> {
        self.clients.get(key).map(|c| c.value().clone())
    }

    /// 클라이언트가 없을 때만 `create`로 생성해 등록합니다.
    pub fn set_client<F>(&self, key: &K, create: F) -> DaoResult<()>
    where
        F: FnOnce(&K) -> DaoResult<C>,
    {
        self.get_or_create(key, create).map(|_| ())
    }

    pub fn get_or_create<F>(&self, key: &K, create: F) -> DaoResult<C>
    where
        F: FnOnce(&K) -> DaoResult<C>,
    {
        if let Some(client) = self.get_client(key) {
            return Ok(client);
        }

        let _guard = self.create_lock.lock();
        // 락 대기 중 다른 스레드가 만들었을 수 있음
        if let Some(client) = self.get_client(key) {
            return Ok(client);
        }
        let client = create(key)?;
        info!(settings = ?key, "client created");
        self.clients.insert(key.clone(), client.clone());
        Ok(client)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl<K, C> Default for ClientRegistry<K, C>
where
    K: Eq + Hash + Clone + Debug,
    C: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
