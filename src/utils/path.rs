//! # 路径工具函数
//!
//! 提供应用配置文件的路径：
//! - 应用配置目录（`<config_dir>/jiffy/`）
//! - 用户设置文件（`settings.json`）
//! - 连接配置文件（`connection.json`）

use std::path::PathBuf;

/// 应用配置目录名
const APP_DIR_NAME: &str = "jiffy";

/// 获取应用配置目录的绝对路径
///
/// 优先使用系统配置目录（`dirs::config_dir()`），取不到时退回到主目录下的 `.jiffy`。
///
/// # 错误
/// 如果既无法确定配置目录也无法确定主目录，返回错误信息。
///
/// # 示例
/// - Windows: `C:\Users\username\AppData\Roaming\jiffy`
/// - Linux: `/home/username/.config/jiffy`
/// - macOS: `/Users/username/Library/Application Support/jiffy`
pub fn get_app_config_path() -> Result<PathBuf, String> {
    if let Some(config) = dirs::config_dir() {
        return Ok(config.join(APP_DIR_NAME));
    }
    let home = dirs::home_dir().ok_or_else(|| "无法获取用户主目录".to_string())?;
    Ok(home.join(format!(".{}", APP_DIR_NAME)))
}

/// 用户设置文件路径
pub fn get_settings_path() -> Result<PathBuf, String> {
    Ok(get_app_config_path()?.join("settings.json"))
}

/// 连接配置文件路径
pub fn get_connection_config_path() -> Result<PathBuf, String> {
    Ok(get_app_config_path()?.join("connection.json"))
}
