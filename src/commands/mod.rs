//! # Tauri Command 处理模块
//!
//! 本模块包含所有注册到 Tauri 的 command 处理函数，以及会话引擎的 WebView 回调面：
//! - `session` - 登录/注册/匿名进入、发送消息、断开和状态查询
//! - `settings` - 主题和已保存凭据
//! - `window` - 无边框窗口的关闭、最小化和最大化切换
//! - `webview` - 把界面更新转换为主窗口中的 JS 调用

pub mod session;
pub mod settings;
pub mod webview;
pub mod window;
