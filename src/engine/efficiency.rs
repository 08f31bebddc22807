// ==========================================
// 工厂自适应排产系统 - 滚动效率计算器
// ==========================================
// 职责: 效率采样历史 -> 产线平滑效率因子 (EWMA)
// 红线: 采样按最旧 -> 最新折叠,顺序反转会改变结果
// 回落: 窗口内无采样时返回中性值 1.0
// ==========================================

use crate::config::ApsConfig;
use crate::engine::lock_map::{lock_ignore_poison, LockMap};
use crate::repository::{EfficiencyHistoryRepository, LineRepository, RepositoryResult};
use chrono::{Duration, NaiveDateTime, Utc};
use std::sync::Arc;

/// 中性效率因子 (无数据时的回落值)
pub const NEUTRAL_EFFICIENCY: f64 = 1.0;

// ==========================================
// RollingEfficiencyCalculator - 滚动效率计算器
// ==========================================
pub struct RollingEfficiencyCalculator {
    efficiency_repo: Arc<EfficiencyHistoryRepository>,
    line_repo: Arc<LineRepository>,
    config: ApsConfig,
    // 同产线的读-改-写串行化
    line_locks: LockMap,
}

impl RollingEfficiencyCalculator {
    pub fn new(
        efficiency_repo: Arc<EfficiencyHistoryRepository>,
        line_repo: Arc<LineRepository>,
        config: ApsConfig,
    ) -> Self {
        Self {
            efficiency_repo,
            line_repo,
            config,
            line_locks: LockMap::new(),
        }
    }

    /// 重算产线滚动效率并写回
    ///
    /// # 参数
    /// - line_id: 产线ID
    ///
    /// # 返回
    /// - Ok(f64): 新的滚动效率因子
    /// - Err(NotFound): 产线不存在
    pub fn refresh(&self, line_id: &str) -> RepositoryResult<f64> {
        self.refresh_at(line_id, Utc::now().naive_utc())
    }

    /// 指定"当前时刻"重算 (测试入口)
    pub fn refresh_at(&self, line_id: &str, now: NaiveDateTime) -> RepositoryResult<f64> {
        let entry = self.line_locks.entry(line_id);
        let _guard = lock_ignore_poison(&entry);

        let since = now - Duration::hours(self.config.efficiency_window_hours);
        let samples = self.efficiency_repo.list_since(line_id, since)?;

        let rolling = fold_ewma(
            samples.iter().map(|s| s.ratio),
            self.config.ewma_alpha,
        );

        self.line_repo.update_rolling_efficiency(line_id, rolling)?;
        tracing::debug!(line_id, rolling, sample_count = samples.len(), "滚动效率已刷新");
        Ok(rolling)
    }
}

/// EWMA 折叠: rolling = α·ratio + (1−α)·rolling, 种子 1.0
///
/// 迭代器须按最旧 -> 最新供给
pub fn fold_ewma(ratios: impl Iterator<Item = f64>, alpha: f64) -> f64 {
    let mut rolling = NEUTRAL_EFFICIENCY;
    let mut any = false;
    for ratio in ratios {
        rolling = alpha * ratio + (1.0 - alpha) * rolling;
        any = true;
    }
    if any {
        rolling
    } else {
        NEUTRAL_EFFICIENCY
    }
}
