// ==========================================
// 工厂自适应排产系统 - 调参配置
// ==========================================
// 职责: 汇集引擎可调策略常量
// 红线: 学习率/权重上下限不得硬编码在引擎内部
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ApsConfig - APS 引擎调参配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApsConfig {
    /// EWMA 平滑系数 α
    pub ewma_alpha: f64,
    /// 滚动效率采样窗口 (小时)
    pub efficiency_window_hours: i64,
    /// 权重自适应学习率
    pub learning_rate: f64,
    /// 单策略权重下限 (归一化前)
    pub min_weight: f64,
    /// 单策略权重上限 (归一化前)
    pub max_weight: f64,
    /// 重排模拟的朴素概率提升量
    pub simulate_probability_boost: f64,
    /// 关注阈值: 完工概率低于该值 => 需要关注/低概率触发器
    pub attention_threshold: f64,
}

impl Default for ApsConfig {
    fn default() -> Self {
        Self {
            ewma_alpha: 0.3,
            efficiency_window_hours: 24,
            learning_rate: 0.05,
            min_weight: 0.05,
            max_weight: 0.40,
            simulate_probability_boost: 0.10,
            attention_threshold: 0.5,
        }
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ApsConfig::default();
        assert!((config.ewma_alpha - 0.3).abs() < 1e-9);
        assert_eq!(config.efficiency_window_hours, 24);
        assert!((config.learning_rate - 0.05).abs() < 1e-9);
        assert!((config.min_weight - 0.05).abs() < 1e-9);
        assert!((config.max_weight - 0.40).abs() < 1e-9);
    }
}
