// ==========================================
// 工厂自适应排产系统 - 产线领域模型
// ==========================================
// 变更来源: rolling_efficiency 只由滚动效率计算器写入,
//           status 由外部产线管理写入
// ==========================================

use crate::domain::types::LineStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionLine - 产线
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionLine {
    pub line_id: String,            // 产线ID
    pub factory_id: String,         // 工厂ID
    pub line_name: String,          // 产线名称
    pub status: LineStatus,         // 产线状态
    pub rolling_efficiency: f64,    // 滚动效率因子 (EWMA, 中性值 1.0)
    pub min_workers: i32,           // 最低人员配置
}

impl ProductionLine {
    /// 效率偏差 (滚动效率 - 1.0)
    pub fn efficiency_deviation(&self) -> f64 {
        self.rolling_efficiency - 1.0
    }

    /// 是否处于故障/检修状态
    pub fn is_faulted(&self) -> bool {
        self.status == LineStatus::Maintenance
    }
}
