//! # 设置 Tauri Commands
//!
//! 主题和"记住设备"凭据的读写。设置保存在 `<config_dir>/jiffy/settings.json`，
//! 写入失败只记录日志，前端总是得到修改后的值。

use tauri::State;

use crate::models::settings::{SavedCredentials, Theme};
use crate::services::client::ChatClient;

/// 获取当前主题
///
/// 前端启动时调用，在首帧渲染前应用 `light` 样式类。
#[tauri::command]
pub async fn get_theme(client: State<'_, ChatClient>) -> Result<Theme, String> {
    Ok(client.get_theme())
}

/// 在深色和浅色之间切换主题
///
/// # 返回值
/// 切换后的主题
#[tauri::command]
pub async fn toggle_theme(client: State<'_, ChatClient>) -> Result<Theme, String> {
    Ok(client.toggle_theme().await)
}

/// 读取已保存的凭据
///
/// 未勾选"记住设备"时返回空的用户名和密码。
#[tauri::command]
pub async fn get_saved_credentials(
    client: State<'_, ChatClient>,
) -> Result<SavedCredentials, String> {
    Ok(client.get_saved_credentials())
}

/// 保存凭据和"记住设备"选项
///
/// # 参数
/// - `username` - 用户名（去除首尾空白，最多 64 个字符）
/// - `password` - 密码（最多 128 个字符）
/// - `remember` - 是否记住设备
#[tauri::command]
pub async fn save_credentials(
    username: String,
    password: String,
    remember: bool,
    client: State<'_, ChatClient>,
) -> Result<(), String> {
    client.save_credentials(&username, &password, remember).await;
    Ok(())
}
