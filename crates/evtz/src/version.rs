use const_format::formatcp;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_SHA: &str = env!("VERGEN_GIT_SHA");
pub const BUILD_DATE: &str = env!("VERGEN_BUILD_DATE");
pub const TARGET_TRIPLE: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");

/// `-V` 用のバージョン文字列。
pub fn short_version() -> &'static str {
    formatcp!("{VERSION} ({GIT_SHA} {BUILD_DATE})")
}

/// `--version` 用。ビルドターゲットも含める。
pub fn long_version() -> &'static str {
    formatcp!("{VERSION} ({GIT_SHA} {BUILD_DATE} {TARGET_TRIPLE})")
}
