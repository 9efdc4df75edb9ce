/// トレイアイコンと通知表示
///
/// - 期限通知の表示（`Notifier`）
/// - トレイアイコンのクリック・メニューによるメインウィンドウの復元
/// - 終了時のトレイアイコン解放
pub mod notifier;
pub mod shell;

pub use notifier::{Notifier, TauriNotifier};
pub use shell::{
    build_tray, handle_window_event, hide_main_window, restore_main_window, MAIN_WINDOW_LABEL,
};
