/// 起動オプションとログイン時の自動起動
pub mod autostart;
pub mod launch;

pub use autostart::ensure_run_on_startup;
pub use launch::LaunchOptions;
