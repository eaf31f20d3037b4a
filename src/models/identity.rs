//! # 会话身份数据模型
//!
//! 握手成功后确定的用户身份，会话生命周期内不可变。

use serde::Serialize;
use serde_json::Value;

/// 会话身份
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface Identity {
///   user_id: number | null;
///   username: string;
///   display_name: string;
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// 服务端分配的数字 ID（匿名变体或服务端未提供时为 None）
    pub user_id: Option<i64>,

    /// 规范化后的用户名
    pub username: String,

    /// 显示名称，缺省为 `@username`
    pub display_name: String,
}

impl Identity {
    /// 从 `auth_ok` 应答中的 `user` 对象解析身份
    ///
    /// `user_id` 兼容数字和数字字符串，无法解析时为 None；
    /// `username` 缺失时使用登录时提交的用户名。
    pub fn from_auth_user(user: Option<&Value>, fallback_username: &str) -> Self {
        let field = |key: &str| {
            user.and_then(|u| u.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let username = field("username").unwrap_or_else(|| fallback_username.to_string());
        let display_name = field("display_name").unwrap_or_else(|| format!("@{}", username));
        let user_id = user.and_then(|u| u.get("user_id")).and_then(|id| match id {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        });

        Self {
            user_id,
            username,
            display_name,
        }
    }

    /// `hello` 变体的身份：没有数字 ID，用户名即显示名
    pub fn anonymous(name: &str) -> Self {
        Self {
            user_id: None,
            username: name.to_string(),
            display_name: name.to_string(),
        }
    }
}
