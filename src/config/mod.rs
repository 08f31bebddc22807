// ==========================================
// 工厂自适应排产系统 - 配置层
// ==========================================
// 职责: 引擎调参常量与 config_kv 覆写
// ==========================================

pub mod aps_config;
pub mod config_manager;

pub use aps_config::ApsConfig;
pub use config_manager::ConfigManager;
