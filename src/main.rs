//! # JIFFY - 桌面应用入口点
//!
//! 仅负责启动应用，窗口、插件和 commands 的注册都在 `app_lib::run()` 中完成。

// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
  app_lib::run();
}
