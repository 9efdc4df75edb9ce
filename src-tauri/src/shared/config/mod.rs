/// 環境変数・設定管理
pub mod environment;

pub use environment::{
    initialize_logging_system, load_environment_variables, AppwriteSettings, EnvironmentConfig,
    SchedulerConfig,
};
