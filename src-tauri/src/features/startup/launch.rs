/// バックグラウンド起動を指定する引数
pub const BACKGROUND_FLAG: &str = "/background";

const BACKGROUND_FLAGS: &[&str] = &[BACKGROUND_FLAG, "-background"];

/// 起動オプション
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// ウィンドウを表示せずトレイのみで起動する
    pub run_hidden: bool,
}

impl LaunchOptions {
    /// コマンドライン引数から起動オプションを解析する
    ///
    /// `/background` または `-background`（大文字小文字を区別しない）があれば非表示起動。
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let run_hidden = args.into_iter().any(|arg| {
            BACKGROUND_FLAGS
                .iter()
                .any(|flag| arg.as_ref().eq_ignore_ascii_case(flag))
        });

        Self { run_hidden }
    }

    /// 現在のプロセスの引数から解析する
    pub fn from_env() -> Self {
        Self::from_args(std::env::args().skip(1))
    }
}
