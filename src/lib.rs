//! # JIFFY - 聊天客户端核心
//!
//! 本 crate 分为两层：
//! - 会话引擎（`error`、`models`、`services`、`utils`）：纯库代码，不依赖任何窗口框架，
//!   默认构建即可在无界面环境下编译和测试
//! - 桌面宿主（`desktop` feature）：Tauri 窗口、IPC commands 和 webview 回调面
//!
//! ## 模块结构
//! - `commands/` - Tauri command 处理函数（IPC 接口层，仅 `desktop`）
//! - `models/` - 数据模型（帧、身份、配置、设置、窗口状态）
//! - `services/` - 会话引擎和外围服务
//! - `utils/` - 通用工具函数

#[cfg(feature = "desktop")]
mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(feature = "desktop")]
pub use desktop::run;

#[cfg(feature = "desktop")]
mod desktop {
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use tauri::Manager;

    use crate::commands;
    use crate::commands::webview::WebviewSurface;
    use crate::models::window::WindowState;
    use crate::services::client::ChatClient;
    use crate::services::config::read_connection_config;
    use crate::services::settings_store::SettingsStore;
    use crate::utils::path;

    // 移动端入口点标记；桌面端由 `main.rs` 直接调用 `run()`
    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    /// Tauri 应用启动函数
    ///
    /// 1. 在 `setup` 钩子中按需注册日志插件（仅调试构建）
    /// 2. 读取连接配置和用户设置，创建 `ChatClient` 并注册为 managed state
    /// 3. 注册窗口最大化状态
    /// 4. 注册所有自定义 Tauri commands
    ///
    /// # Panics
    /// Tauri 事件循环启动失败（例如窗口创建失败）时 panic。
    pub fn run() {
        tauri::Builder::default()
            // === 应用全局状态初始化 ===
            // 无边框窗口的最大化状态，只由 `win_toggle_max` 修改。
            // `ChatClient` 依赖 AppHandle 构造回调面，在下方 `setup` 中注册。
            .manage(Mutex::new(WindowState::default()))
            // === 自定义 Tauri Commands 注册 ===
            // 前端通过 `window.__TAURI__.core.invoke()` 调用，参数名使用 camelCase
            .invoke_handler(tauri::generate_handler![
                // 会话 commands
                commands::session::auth_login,
                commands::session::auth_register,
                commands::session::start,
                commands::session::send_message,
                commands::session::disconnect,
                commands::session::connection_info,
                commands::session::get_client_config,
                // 设置 commands
                commands::settings::get_theme,
                commands::settings::toggle_theme,
                commands::settings::get_saved_credentials,
                commands::settings::save_credentials,
                // 无边框窗口控制
                commands::window::win_close,
                commands::window::win_minimize,
                commands::window::win_toggle_max,
            ])
            // `setup` 闭包：在主窗口创建之前执行的初始化钩子
            .setup(|app| {
                // 仅在开发调试模式下启用日志插件，把 `log` 宏输出转发到终端和 WebView 控制台
                if cfg!(debug_assertions) {
                    app.handle().plugin(
                        tauri_plugin_log::Builder::default()
                            .level(log::LevelFilter::Info)
                            .build(),
                    )?;
                }

                // 连接配置只在启动时读取一次；文件缺失或损坏时使用内置默认服务器
                let config = match path::get_connection_config_path() {
                    Ok(config_path) => read_connection_config(&config_path),
                    Err(e) => {
                        log::warn!("无法定位连接配置，使用默认配置: {}", e);
                        Default::default()
                    }
                };
                // 设置目录不可用时退回到工作目录，保存失败也不影响聊天
                let settings_path = path::get_settings_path().unwrap_or_else(|e| {
                    log::warn!("无法定位设置目录，设置保存到工作目录: {}", e);
                    PathBuf::from("settings.json")
                });
                log::info!("连接目标 {}，协议 {:?}", config.describe(), config.protocol);

                // 会话引擎通过注入的回调面更新主窗口，不持有任何全局窗口句柄
                let surface = Arc::new(WebviewSurface::new(app.handle().clone()));
                app.manage(ChatClient::new(
                    config,
                    surface,
                    SettingsStore::load(settings_path),
                ));
                Ok(())
            })
            // 编译时读取 `tauri.conf.json`（窗口尺寸、无边框、前端目录 `web/`）生成上下文
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
