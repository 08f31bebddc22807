// ==========================================
// 工厂自适应排产系统 - 风险分级
// ==========================================
// 职责: 完工概率 -> 风险等级 / 驾驶舱分桶
// 红线: 风险标签阈值 (0.8/0.6/0.4) 与驾驶舱分桶阈值 (0.8/0.5)
//       是两套独立口径,不得合并
// ==========================================

use crate::domain::types::RiskLevel;
use serde::{Deserialize, Serialize};

// 风险标签阈值
pub const RISK_LOW_THRESHOLD: f64 = 0.8;
pub const RISK_MEDIUM_THRESHOLD: f64 = 0.6;
pub const RISK_HIGH_THRESHOLD: f64 = 0.4;

// 驾驶舱分桶阈值
pub const BUCKET_ON_TRACK_THRESHOLD: f64 = 0.8;
pub const BUCKET_AT_RISK_THRESHOLD: f64 = 0.5;

// ==========================================
// 驾驶舱任务分桶
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DashboardBucket {
    OnTrack, // 按期 (>=0.8)
    AtRisk,  // 有风险 [0.5, 0.8)
    Delayed, // 延期 (<0.5)
}

/// 完工概率 -> 风险等级
///
/// 映射: >=0.8 低 / >=0.6 中 / >=0.4 高 / 其余 危急
pub fn classify_risk(probability: f64) -> RiskLevel {
    if probability >= RISK_LOW_THRESHOLD {
        RiskLevel::Low
    } else if probability >= RISK_MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else if probability >= RISK_HIGH_THRESHOLD {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

/// 完工概率 -> 驾驶舱分桶
///
/// 注意分桶下界 (0.5) 与风险标签边界 (0.6/0.4) 不同
pub fn dashboard_bucket(probability: f64) -> DashboardBucket {
    if probability >= BUCKET_ON_TRACK_THRESHOLD {
        DashboardBucket::OnTrack
    } else if probability >= BUCKET_AT_RISK_THRESHOLD {
        DashboardBucket::AtRisk
    } else {
        DashboardBucket::Delayed
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_band_edges() {
        assert_eq!(classify_risk(1.0), RiskLevel::Low);
        assert_eq!(classify_risk(0.8), RiskLevel::Low);
        assert_eq!(classify_risk(0.79), RiskLevel::Medium);
        assert_eq!(classify_risk(0.6), RiskLevel::Medium);
        assert_eq!(classify_risk(0.59), RiskLevel::High);
        assert_eq!(classify_risk(0.4), RiskLevel::High);
        assert_eq!(classify_risk(0.39), RiskLevel::Critical);
        assert_eq!(classify_risk(0.0), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_monotone_in_probability() {
        // 概率越高风险等级不升
        let mut prev = classify_risk(0.0);
        let mut p = 0.0;
        while p <= 1.0 {
            let current = classify_risk(p);
            assert!(current <= prev);
            prev = current;
            p += 0.01;
        }
    }

    #[test]
    fn test_dashboard_bucket_differs_from_risk_bands() {
        // 0.55: 风险标签是 HIGH,驾驶舱却是 AT_RISK —— 两套口径独立
        assert_eq!(classify_risk(0.55), RiskLevel::High);
        assert_eq!(dashboard_bucket(0.55), DashboardBucket::AtRisk);

        assert_eq!(dashboard_bucket(0.8), DashboardBucket::OnTrack);
        assert_eq!(dashboard_bucket(0.5), DashboardBucket::AtRisk);
        assert_eq!(dashboard_bucket(0.49), DashboardBucket::Delayed);
    }
}
