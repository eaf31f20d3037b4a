//! # 用户设置数据模型
//!
//! 定义了持久化到 `<config_dir>/jiffy/settings.json` 的用户设置（Settings）
//! 和界面主题（Theme）。
//!
//! 对应前端 TypeScript 中的 `Settings` 接口。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 用户名保存时的最大长度（字符数）
pub const MAX_SAVED_USERNAME_CHARS: usize = 64;

/// 密码保存时的最大长度（字符数）
pub const MAX_SAVED_PASSWORD_CHARS: usize = 128;

/// 界面主题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// 切换到另一种主题
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// 宽松解析：大小写不敏感，除 `light` 以外一律视为 `dark`
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("light") {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}

/// 用户设置数据结构
///
/// 对应前端 TypeScript 接口：
/// ```typescript
/// interface Settings {
///   theme: "dark" | "light";
///   remember_device: boolean;
///   username: string;
///   password: string;
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// 界面主题
    pub theme: Theme,

    /// 是否在本机记住登录凭据
    pub remember_device: bool,

    /// 保存的用户名（未记住时为空）
    pub username: String,

    /// 保存的密码（未记住时为空）
    pub password: String,
}

impl Settings {
    /// 从任意 JSON 值宽松地构造设置
    ///
    /// 设计决策：
    /// - 不直接 `serde_json::from_value`，因为旧版本写出的文件可能字段类型不一致
    ///   （如 `"theme": "LIGHT"`、`"username": null`），逐字段容错比整体失败更友好
    /// - 非对象值得到默认设置
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            theme: value
                .get("theme")
                .and_then(Value::as_str)
                .map(Theme::parse_lenient)
                .unwrap_or_default(),
            remember_device: value
                .get("remember_device")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            username: text("username"),
            password: text("password"),
        }
    }

    /// 保存凭据：用户名去除首尾空白并截断到 64 字符，密码截断到 128 字符
    pub fn store_credentials(&mut self, username: &str, password: &str, remember: bool) {
        self.username = truncate_chars(username.trim(), MAX_SAVED_USERNAME_CHARS);
        self.password = truncate_chars(password, MAX_SAVED_PASSWORD_CHARS);
        self.remember_device = remember;
    }
}

/// 按字符（而非字节）截断，避免切断多字节 UTF-8 字符
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// 返回给前端的已保存凭据
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedCredentials {
    pub remember: bool,
    pub username: String,
    pub password: String,
}

impl From<&Settings> for SavedCredentials {
    /// 未勾选"记住设备"时不下发任何凭据
    fn from(settings: &Settings) -> Self {
        if !settings.remember_device {
            return Self {
                remember: false,
                username: String::new(),
                password: String::new(),
            };
        }
        Self {
            remember: true,
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_load() {
        let settings = Settings::from_value(&json!({
            "theme": "LIGHT",
            "remember_device": "yes",
            "username": null,
            "password": "pw"
        }));
        assert_eq!(settings.theme, Theme::Light);
        assert!(!settings.remember_device);
        assert_eq!(settings.username, "");
        assert_eq!(settings.password, "pw");
    }

    #[test]
    fn test_unknown_theme_is_dark() {
        let settings = Settings::from_value(&json!({"theme": "solarized"}));
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(Settings::from_value(&json!(3)), Settings::default());
    }

    #[test]
    fn test_store_credentials_truncates() {
        let mut settings = Settings::default();
        let long_name = format!("  {}  ", "ü".repeat(80));
        settings.store_credentials(&long_name, &"p".repeat(200), true);
        assert_eq!(settings.username.chars().count(), MAX_SAVED_USERNAME_CHARS);
        assert_eq!(settings.password.len(), MAX_SAVED_PASSWORD_CHARS);
        assert!(settings.remember_device);
    }

    #[test]
    fn test_saved_credentials_hidden_without_remember() {
        let settings = Settings {
            remember_device: false,
            username: "alice".into(),
            password: "pw".into(),
            ..Settings::default()
        };
        let saved = SavedCredentials::from(&settings);
        assert!(!saved.remember);
        assert!(saved.username.is_empty());
        assert!(saved.password.is_empty());
    }

    #[test]
    fn test_theme_serialises_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Light).unwrap(), r#""light""#);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }
}
