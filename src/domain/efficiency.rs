// ==========================================
// 工厂自适应排产系统 - 效率采样领域模型
// ==========================================
// 约束: 效率历史为只追加日志,采样一经写入不再修改
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// EfficiencySample - 单次吞吐采样
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencySample {
    pub sample_id: String,            // 采样ID
    pub line_id: String,              // 产线ID
    pub task_id: String,              // 任务ID
    pub recorded_at: NaiveDateTime,   // 采样时间
    pub actual_output: f64,           // 实际产出
    pub expected_output: f64,         // 期望产出
    pub ratio: f64,                   // 吞吐比 = actual/expected (expected 为 0 时取 1.0)
    pub worker_count: Option<i32>,    // 在岗人数
}

impl EfficiencySample {
    /// 由实际/期望产出构造采样, ratio 按规则推导
    pub fn new(
        line_id: &str,
        task_id: &str,
        recorded_at: NaiveDateTime,
        actual_output: f64,
        expected_output: f64,
        worker_count: Option<i32>,
    ) -> Self {
        let ratio = if expected_output == 0.0 {
            1.0
        } else {
            actual_output / expected_output
        };
        Self {
            sample_id: Uuid::new_v4().to_string(),
            line_id: line_id.to_string(),
            task_id: task_id.to_string(),
            recorded_at,
            actual_output,
            expected_output,
            ratio,
            worker_count,
        }
    }

    /// 由上报的吞吐比直接构造采样
    ///
    /// 进度上报携带的 actual_efficiency 即吞吐比本身,
    /// expected_output 反推为 actual/ratio (ratio<=0 时与 actual 相同)
    pub fn from_reported_ratio(
        line_id: &str,
        task_id: &str,
        recorded_at: NaiveDateTime,
        actual_output: f64,
        ratio: f64,
        worker_count: Option<i32>,
    ) -> Self {
        let (expected_output, ratio) = if ratio > 0.0 {
            (actual_output / ratio, ratio)
        } else {
            (actual_output, 1.0)
        };
        Self {
            sample_id: Uuid::new_v4().to_string(),
            line_id: line_id.to_string(),
            task_id: task_id.to_string(),
            recorded_at,
            actual_output,
            expected_output,
            ratio,
            worker_count,
        }
    }
}
