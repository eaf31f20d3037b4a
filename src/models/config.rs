//! # 连接配置数据模型
//!
//! 对应 `<config_dir>/jiffy/connection.json`。所有字段都有默认值，
//! 文件缺失、损坏或只写了部分字段时都能得到完整配置。

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 默认服务器地址
pub const DEFAULT_HOST: &str = "wispy-breeze-6674.fly.dev";

/// 默认端口
pub const DEFAULT_PORT: u16 = 443;

/// 默认启用 TLS
pub const DEFAULT_TLS: bool = true;

/// TCP 连接 + TLS 握手的默认超时（秒）
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// 等待握手应答的默认超时（秒）
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// 服务端协议变体
///
/// - `Credentialed`：`auth_login` / `auth_register`，等待一条 `auth_ok` 应答
/// - `Anonymous`：只发送 `hello`，不等待应答
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    #[default]
    Credentialed,
    Anonymous,
}

/// 连接配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// 服务器主机名，同时用于 TLS 证书校验
    pub host: String,

    pub port: u16,

    /// 是否在 TCP 之上建立 TLS
    pub use_tls: bool,

    pub connect_timeout_secs: u64,

    pub handshake_timeout_secs: u64,

    pub protocol: ProtocolVariant,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            use_tls: DEFAULT_TLS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            protocol: ProtocolVariant::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    /// 状态栏中显示的目标描述，如 `example.org:443 (TLS=ON)`
    pub fn describe(&self) -> String {
        format!(
            "{}:{} (TLS={})",
            self.host,
            self.port,
            if self.use_tls { "ON" } else { "OFF" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"host":"127.0.0.1","use_tls":false}"#).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert!(!config.use_tls);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.protocol, ProtocolVariant::Credentialed);
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_describe() {
        let config = ConnectionConfig::default();
        assert_eq!(config.describe(), "wispy-breeze-6674.fly.dev:443 (TLS=ON)");
    }

    #[test]
    fn test_protocol_variant_names() {
        let variant: ProtocolVariant = serde_json::from_str(r#""anonymous""#).unwrap();
        assert_eq!(variant, ProtocolVariant::Anonymous);
    }
}
