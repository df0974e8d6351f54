//! 键值存储 - 基础设施层
//!
//! 文档注册表和建议存储都通过 `KeyValueStore` 注入，
//! 进程内实现为 `MemoryStore`，生命周期由持有者显式管理。

use dashmap::DashMap;

/// 按文档 ID 存取的键值存储
pub trait KeyValueStore<V>: Send + Sync {
    /// 写入（覆盖已有值）
    fn put(&self, key: &str, value: V);

    /// 读取副本
    fn get(&self, key: &str) -> Option<V>;

    /// 删除并返回旧值
    fn remove(&self, key: &str) -> Option<V>;

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// 进程内存储，不同的键之间互不阻塞
#[derive(Debug)]
pub struct MemoryStore<V> {
    entries: DashMap<String, V>,
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> KeyValueStore<V> for MemoryStore<V> {
    fn put(&self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value);
    }

    fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn remove(&self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|(_, value)| value)
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
