// ==========================================
// 仓储层集成测试
// ==========================================
// 职责: 验证各仓储在真实 SQLite 上的读写往返与错误语义
// ==========================================

#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

use chrono::Duration;
use factory_aps::config::ConfigManager;
use factory_aps::domain::strategy::{StrategyKind, StrategyWeights};
use factory_aps::domain::types::{LineStatus, RiskLevel, TaskStatus};
use test_data_builder::{base_time, create_test_line, create_test_task, TEST_FACTORY};
use test_helpers::setup_env;

#[test]
fn test_task_save_and_find_round_trip() {
    let env = setup_env();
    let mut task = create_test_task("T001", "L001", TaskStatus::InProgress);
    task.actual_start = Some(base_time(8));
    task.completed_qty = 42.5;
    task.completion_probability = Some(0.72);
    task.risk_level = Some(RiskLevel::Medium);
    task.last_adjustment_reason = Some("产线故障重排".to_string());
    task.last_adjustment_at = Some(base_time(10));
    env.repos.task_repo.save(&task).unwrap();

    let loaded = env.repos.task_repo.find_by_id("T001").unwrap();
    assert_eq!(loaded.factory_id, TEST_FACTORY);
    assert_eq!(loaded.status, TaskStatus::InProgress);
    assert_eq!(loaded.actual_start, Some(base_time(8)));
    assert!((loaded.completed_qty - 42.5).abs() < 1e-9);
    assert_eq!(loaded.completion_probability, Some(0.72));
    assert_eq!(loaded.risk_level, Some(RiskLevel::Medium));
    assert_eq!(loaded.last_adjustment_reason.as_deref(), Some("产线故障重排"));
    assert_eq!(loaded.last_adjustment_at, Some(base_time(10)));
}

#[test]
fn test_task_find_missing_is_not_found() {
    let env = setup_env();
    let err = env.repos.task_repo.find_by_id("T404").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_task_list_by_factory_and_status() {
    let env = setup_env();
    env.repos
        .task_repo
        .save(&create_test_task("T001", "L001", TaskStatus::Pending))
        .unwrap();
    env.repos
        .task_repo
        .save(&create_test_task("T002", "L001", TaskStatus::InProgress))
        .unwrap();
    let mut other = create_test_task("T003", "L009", TaskStatus::Pending);
    other.factory_id = "F999".to_string();
    env.repos.task_repo.save(&other).unwrap();

    let pending = env
        .repos
        .task_repo
        .list_by_factory_and_status(TEST_FACTORY, TaskStatus::Pending)
        .unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task_id, "T001");

    let all = env.repos.task_repo.list_by_factory(TEST_FACTORY).unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn test_task_list_by_plan_id() {
    let env = setup_env();
    let mut a = create_test_task("T002", "L001", TaskStatus::Pending);
    a.plan_id = Some("P001".to_string());
    a.planned_start = base_time(10);
    env.repos.task_repo.save(&a).unwrap();
    let mut b = create_test_task("T001", "L001", TaskStatus::InProgress);
    b.plan_id = Some("P001".to_string());
    b.planned_start = base_time(8);
    env.repos.task_repo.save(&b).unwrap();
    let mut other_plan = create_test_task("T003", "L001", TaskStatus::Pending);
    other_plan.plan_id = Some("P002".to_string());
    env.repos.task_repo.save(&other_plan).unwrap();
    // 手工建任务无计划归属,不参与计划查询
    env.repos
        .task_repo
        .save(&create_test_task("T004", "L001", TaskStatus::Pending))
        .unwrap();

    let tasks = env.repos.task_repo.list_by_plan_id("P001").unwrap();
    assert_eq!(tasks.len(), 2);
    // planned_start 升序
    assert_eq!(tasks[0].task_id, "T001");
    assert_eq!(tasks[1].task_id, "T002");
    assert_eq!(tasks[0].plan_id.as_deref(), Some("P001"));

    assert!(env.repos.task_repo.list_by_plan_id("P404").unwrap().is_empty());
}

#[test]
fn test_line_update_rolling_efficiency() {
    let env = setup_env();
    env.repos
        .line_repo
        .save(&create_test_line("L001", LineStatus::Active))
        .unwrap();

    env.repos
        .line_repo
        .update_rolling_efficiency("L001", 0.93)
        .unwrap();
    let line = env.repos.line_repo.find_by_id("L001").unwrap();
    assert!((line.rolling_efficiency - 0.93).abs() < 1e-9);

    // 未知产线 -> NotFound
    let err = env
        .repos
        .line_repo
        .update_rolling_efficiency("L404", 1.0)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_strategy_config_lazy_default_and_round_trip() {
    let env = setup_env();
    assert!(env.repos.strategy_repo.find(TEST_FACTORY).unwrap().is_none());

    let config = env
        .repos
        .strategy_repo
        .get_or_create_default(TEST_FACTORY)
        .unwrap();
    assert!((config.weights.sum() - 1.0).abs() < 1e-9);
    assert_eq!(config.adaptation_count, 0);

    // 二次读取返回同一配置
    let again = env
        .repos
        .strategy_repo
        .get_or_create_default(TEST_FACTORY)
        .unwrap();
    for kind in StrategyKind::ALL {
        assert!((again.weights.get(kind) - config.weights.get(kind)).abs() < 1e-12);
    }
}

#[test]
fn test_feature_weight_upsert_and_load() {
    let env = setup_env();
    let empty = env
        .repos
        .feature_weight_repo
        .load_for_factory(TEST_FACTORY)
        .unwrap();
    assert!(empty.is_empty());

    env.repos
        .feature_weight_repo
        .upsert(TEST_FACTORY, "progress", 2.5)
        .unwrap();
    env.repos
        .feature_weight_repo
        .upsert(TEST_FACTORY, "progress", 2.8)
        .unwrap();

    let weights = env
        .repos
        .feature_weight_repo
        .load_for_factory(TEST_FACTORY)
        .unwrap();
    assert_eq!(weights.len(), 1);
    assert!((weights["progress"] - 2.8).abs() < 1e-9);
}

#[test]
fn test_weight_adjustment_append_and_list() {
    let env = setup_env();
    use factory_aps::domain::strategy::WeightAdjustmentRecord;

    let record = WeightAdjustmentRecord {
        record_id: "R001".to_string(),
        factory_id: TEST_FACTORY.to_string(),
        adjusted_at: base_time(12),
        weights_before: StrategyWeights::default_split(),
        weights_after: StrategyWeights::default_split(),
        scores: None,
        reason: "人工调权".to_string(),
    };
    env.repos.adjustment_repo.append(&record).unwrap();

    let listed = env
        .repos
        .adjustment_repo
        .list_since(TEST_FACTORY, base_time(12) - Duration::hours(1))
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].record_id, "R001");
    assert!(listed[0].scores.is_none());

    // since 在记录之后 -> 空
    let after = env
        .repos
        .adjustment_repo
        .list_since(TEST_FACTORY, base_time(13))
        .unwrap();
    assert!(after.is_empty());
}

#[test]
fn test_inventory_low_stock_count() {
    let env = setup_env();
    env.repos
        .inventory_repo
        .upsert_material("M001", TEST_FACTORY, "冷轧基板", 5.0, 20.0)
        .unwrap();
    env.repos
        .inventory_repo
        .upsert_material("M002", TEST_FACTORY, "锌锭", 50.0, 20.0)
        .unwrap();

    let count = env.repos.inventory_repo.count_low_stock(TEST_FACTORY).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn test_config_manager_round_trip_on_shared_connection() {
    let env = setup_env();
    let manager = ConfigManager::from_connection(env.conn.clone());

    manager.set_config_value("aps/ewma_alpha", "0.5").unwrap();
    let config = manager.load_aps_config().unwrap();
    assert!((config.ewma_alpha - 0.5).abs() < 1e-9);
    // 未覆写项回落默认
    assert_eq!(config.efficiency_window_hours, 24);
}
