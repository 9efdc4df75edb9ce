use crate::features::expiry::message::NOTIFICATION_TITLE;
use log::{info, warn};
use tauri::menu::{Menu, MenuItem};
use tauri::tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent};
use tauri::{AppHandle, Manager, Runtime, Window, WindowEvent};

/// メインウィンドウのラベル（tauri.conf.json と一致させる）
pub const MAIN_WINDOW_LABEL: &str = "main";

/// トレイアイコンのID
pub const TRAY_ID: &str = "main-tray";

const MENU_OPEN: &str = "open";
const MENU_QUIT: &str = "quit";

/// トレイアイコンとメニューを作成する
///
/// 左クリック・ダブルクリック・「開啟」でメインウィンドウを復元し、
/// 「離開」でトレイアイコンを外してから終了する。
pub fn build_tray<R: Runtime>(app: &AppHandle<R>) -> tauri::Result<()> {
    let open_item = MenuItem::with_id(app, MENU_OPEN, "開啟", true, None::<&str>)?;
    let quit_item = MenuItem::with_id(app, MENU_QUIT, "離開", true, None::<&str>)?;
    let menu = Menu::with_items(app, &[&open_item, &quit_item])?;

    let mut tray_builder = TrayIconBuilder::with_id(TRAY_ID)
        .tooltip(NOTIFICATION_TITLE)
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray, event| match event {
            TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            }
            | TrayIconEvent::DoubleClick {
                button: MouseButton::Left,
                ..
            } => restore_main_window(tray.app_handle()),
            _ => {}
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            MENU_OPEN => restore_main_window(app),
            MENU_QUIT => quit(app),
            _ => {}
        });

    if let Some(icon) = app.default_window_icon().cloned() {
        tray_builder = tray_builder.icon(icon);
    }
    tray_builder.build(app)?;

    info!("トレイアイコンを作成しました");
    Ok(())
}

/// 非表示のメインウィンドウを表示してフォーカスする
pub fn restore_main_window<R: Runtime>(app: &AppHandle<R>) {
    let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) else {
        warn!("メインウィンドウが見つかりません");
        return;
    };

    if let Err(e) = window.show() {
        warn!("ウィンドウの表示に失敗しました: {e}");
    }
    if let Err(e) = window.unminimize() {
        warn!("ウィンドウの最小化解除に失敗しました: {e}");
    }
    if let Err(e) = window.set_skip_taskbar(false) {
        warn!("タスクバー表示の設定に失敗しました: {e}");
    }
    if let Err(e) = window.set_focus() {
        warn!("ウィンドウのフォーカスに失敗しました: {e}");
    }
}

/// メインウィンドウを非表示にする（バックグラウンド起動時）
pub fn hide_main_window<R: Runtime>(app: &AppHandle<R>) {
    let Some(window) = app.get_webview_window(MAIN_WINDOW_LABEL) else {
        return;
    };

    if let Err(e) = window.set_skip_taskbar(true) {
        warn!("タスクバー非表示の設定に失敗しました: {e}");
    }
    if let Err(e) = window.hide() {
        warn!("ウィンドウの非表示に失敗しました: {e}");
    }
}

/// メインウィンドウを閉じた場合は終了せずトレイに格納する
pub fn handle_window_event<R: Runtime>(window: &Window<R>, event: &WindowEvent) {
    if let WindowEvent::CloseRequested { api, .. } = event {
        if window.label() == MAIN_WINDOW_LABEL {
            api.prevent_close();
            hide_main_window(window.app_handle());
        }
    }
}

/// トレイアイコンを外してアプリケーションを終了する
///
/// 実行中のスキャンは待たない。
fn quit<R: Runtime>(app: &AppHandle<R>) {
    info!("アプリケーションを終了します");
    if let Some(tray) = app.remove_tray_by_id(TRAY_ID) {
        if let Err(e) = tray.set_visible(false) {
            warn!("トレイアイコンの非表示に失敗しました: {e}");
        }
    }
    app.exit(0);
}
