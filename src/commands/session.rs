//! # 会话 Tauri Commands
//!
//! 前端进入聊天、发送消息和查询连接状态的入口：
//! - `auth_login` / `auth_register` - 凭据变体握手
//! - `start` - 匿名变体握手
//! - `send_message` - 发送一条聊天消息
//! - `disconnect` - 断开当前会话
//! - `connection_info` / `get_client_config` - 状态和配置查询
//!
//! 连接进度和诊断通过 WebView 回调面推送，这里只返回最终结果。

use tauri::State;

use crate::models::identity::Identity;
use crate::services::client::{ChatClient, ClientConfigInfo, ConnectionInfo};

/// 用已有账号登录
///
/// # 参数
/// - `username` - 用户名（可带前导 `@`，大小写不敏感）
/// - `password` - 密码
///
/// # 返回值
/// 服务器确认的身份
///
/// # 错误
/// 凭据为空、连接失败或服务器拒绝时返回错误描述
#[tauri::command]
pub async fn auth_login(
    username: String,
    password: String,
    client: State<'_, ChatClient>,
) -> Result<Identity, String> {
    client
        .auth_login(&username, &password)
        .await
        .map_err(|e| e.to_string())
}

/// 注册新账号并进入聊天
///
/// 与 `auth_login` 相同，连接前先保存凭据；服务端拒绝（如用户名已存在）时
/// 返回服务端给出的原因。
///
/// # 参数
/// - `bio` - 个人简介，前端未填写时为空
#[tauri::command]
pub async fn auth_register(
    username: String,
    password: String,
    bio: Option<String>,
    client: State<'_, ChatClient>,
) -> Result<Identity, String> {
    client
        .auth_register(&username, &password, bio.as_deref().unwrap_or_default())
        .await
        .map_err(|e| e.to_string())
}

/// 匿名进入聊天（名称为空时使用 `User`）
///
/// 只在配置为匿名协议时可用；`hello` 帧没有应答，写出即视为已连接。
#[tauri::command]
pub async fn start(name: String, client: State<'_, ChatClient>) -> Result<Identity, String> {
    client.start(&name).await.map_err(|e| e.to_string())
}

/// 发送一条聊天消息
///
/// # 参数
/// - `text` - 消息正文，去除首尾空白后为空时不发送
/// - `client_msg_id` - 前端乐观渲染使用的关联 ID
#[tauri::command]
pub async fn send_message(
    text: String,
    client_msg_id: Option<String>,
    client: State<'_, ChatClient>,
) -> Result<(), String> {
    client
        .send_message(&text, client_msg_id.as_deref())
        .await
        .map_err(|e| e.to_string())
}

/// 断开当前会话
///
/// 幂等：未连接或已断开时直接返回成功。"Disconnected." 诊断和
/// "Not connected" 状态由会话经回调面推送。
#[tauri::command]
pub async fn disconnect(client: State<'_, ChatClient>) -> Result<(), String> {
    client.disconnect().await;
    Ok(())
}

/// 查询当前会话状态和身份
///
/// 前端重新加载页面后据此决定是否跳过登录界面。
#[tauri::command]
pub async fn connection_info(client: State<'_, ChatClient>) -> Result<ConnectionInfo, String> {
    Ok(client.connection_info().await)
}

/// 获取连接配置摘要，前端据此决定显示登录表单还是匿名表单
#[tauri::command]
pub async fn get_client_config(client: State<'_, ChatClient>) -> Result<ClientConfigInfo, String> {
    Ok(client.client_config())
}
