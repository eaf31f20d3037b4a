//! # 连接配置加载
//!
//! 启动时从 `connection.json` 读取一次连接配置。
//! 读取失败时静默返回默认配置（正式服务器、443、TLS 开启、凭据协议）。

use std::path::Path;

use crate::models::config::ConnectionConfig;

/// 读取连接配置，任何失败都返回默认配置
pub fn read_connection_config(path: &Path) -> ConnectionConfig {
    if !path.exists() {
        return ConnectionConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("连接配置 {} 解析失败，使用默认配置: {}", path.display(), e);
            ConnectionConfig::default()
        }),
        Err(e) => {
            log::warn!("读取连接配置 {} 失败: {}", path.display(), e);
            ConnectionConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::ProtocolVariant;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_connection_config(&dir.path().join("connection.json"));
        assert_eq!(config, ConnectionConfig::default());
    }

    #[test]
    fn test_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connection.json");
        std::fs::write(
            &path,
            r#"{"host":"chat.local","port":7000,"use_tls":false,"protocol":"anonymous"}"#,
        )
        .unwrap();

        let config = read_connection_config(&path);
        assert_eq!(config.host, "chat.local");
        assert_eq!(config.port, 7000);
        assert!(!config.use_tls);
        assert_eq!(config.protocol, ProtocolVariant::Anonymous);
        assert_eq!(config.handshake_timeout_secs, 10);
    }

    #[test]
    fn test_corrupt_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("connection.json");
        std::fs::write(&path, r#"{"port":"not a number"}"#).unwrap();
        assert_eq!(read_connection_config(&path), ConnectionConfig::default());
    }
}
