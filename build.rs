//! # JIFFY - Cargo 构建脚本
//!
//! 启用 `desktop` feature 时调用 `tauri_build::build()`，根据 `tauri.conf.json`
//! 生成 Tauri 运行时所需的上下文和平台资源；无界面构建不做任何事。

fn main() {
  #[cfg(feature = "desktop")]
  tauri_build::build();
}
