// ==========================================
// 工厂自适应排产系统 - 键控锁表
// ==========================================
// 用途:
// - 产线滚动效率是共享状态上的读-改-写,同产线的并发进度上报必须串行
// - 工厂策略权重同理,自适应引擎同工厂至多并发一次
// 粒度: 按 key (line_id / factory_id) 独立加锁,不同 key 全并行
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 键控互斥锁表
pub struct LockMap {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockMap {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 获取 key 对应的锁 (首次访问时创建)
    ///
    /// 调用方持有返回的 Arc 并自行 lock():
    /// ```no_run
    /// # use factory_aps::engine::lock_map::LockMap;
    /// let locks = LockMap::new();
    /// let entry = locks.entry("L001");
    /// let _guard = entry.lock().unwrap();
    /// // 临界区: 读-改-写
    /// ```
    pub fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for LockMap {
    fn default() -> Self {
        Self::new()
    }
}

/// 持锁辅助: 锁中毒时继续执行 (临界区内无跨调用不变量)
pub fn lock_ignore_poison(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|e| e.into_inner())
}
