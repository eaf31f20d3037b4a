//! # 聊天客户端（UI 接口层）
//!
//! 宿主界面调用的唯一对象，与窗口框架解耦，可在无界面环境下测试。
//! 负责：
//! - 登录/注册/匿名进入前的参数规范化和凭据保存
//! - 持有当前会话（同一时刻至多一个），新登录前关闭旧会话
//! - 发送消息前的文本整理和关联 ID 截断
//! - 主题和已保存凭据的读写
//!
//! 设置只在这里被修改，会话和接收循环不触碰设置。

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{ClientError, SessionError};
use crate::models::config::{ConnectionConfig, ProtocolVariant};
use crate::models::frame::OutboundFrame;
use crate::models::identity::Identity;
use crate::models::settings::{SavedCredentials, Theme, truncate_chars};
use crate::services::session::{Handshake, Session, SessionState};
use crate::services::settings_store::SettingsStore;
use crate::services::surface::ChatSurface;

/// 关联 ID 的最大长度（字符数）
pub const MAX_CLIENT_MSG_ID_CHARS: usize = 128;

/// 匿名变体未填写名称时使用的默认名
const DEFAULT_DISPLAY_NAME: &str = "User";

/// 当前连接状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub state: SessionState,
    pub identity: Option<Identity>,
}

/// 前端需要的连接配置摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfigInfo {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub protocol: ProtocolVariant,
}

/// 聊天客户端
pub struct ChatClient {
    config: ConnectionConfig,
    surface: Arc<dyn ChatSurface>,
    settings: SettingsStore,
    /// 当前会话槽位
    session: Mutex<Option<Arc<Session>>>,
}

impl ChatClient {
    pub fn new(
        config: ConnectionConfig,
        surface: Arc<dyn ChatSurface>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            config,
            surface,
            settings,
            session: Mutex::new(None),
        }
    }

    pub fn client_config(&self) -> ClientConfigInfo {
        ClientConfigInfo {
            host: self.config.host.clone(),
            port: self.config.port,
            use_tls: self.config.use_tls,
            protocol: self.config.protocol,
        }
    }

    // ======== 握手入口 ========

    /// 用已有账号登录
    ///
    /// 先保存凭据（勾选记住设备），再规范化用户名并连接。
    pub async fn auth_login(&self, username: &str, password: &str) -> Result<Identity, ClientError> {
        self.require_protocol(ProtocolVariant::Credentialed)?;
        self.save_credentials(username, password, true).await;

        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::MissingCredentials);
        }

        self.connect(Handshake::Login {
            username,
            password: password.to_string(),
        })
        .await
    }

    /// 注册新账号
    pub async fn auth_register(
        &self,
        username: &str,
        password: &str,
        bio: &str,
    ) -> Result<Identity, ClientError> {
        self.require_protocol(ProtocolVariant::Credentialed)?;
        self.save_credentials(username, password, true).await;

        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::MissingCredentials);
        }

        self.connect(Handshake::Register {
            username,
            password: password.to_string(),
            bio: bio.to_string(),
        })
        .await
    }

    /// 匿名进入（`hello` 变体）
    pub async fn start(&self, name: &str) -> Result<Identity, ClientError> {
        self.require_protocol(ProtocolVariant::Anonymous)?;

        let name = match name.trim() {
            "" => DEFAULT_DISPLAY_NAME,
            trimmed => trimmed,
        };
        self.connect(Handshake::Hello {
            name: name.to_string(),
        })
        .await
    }

    fn require_protocol(&self, expected: ProtocolVariant) -> Result<(), ClientError> {
        if self.config.protocol != expected {
            return Err(ClientError::ProtocolMismatch {
                configured: self.config.protocol,
            });
        }
        Ok(())
    }

    /// 用新会话替换当前会话并连接
    ///
    /// 槽位锁只在替换期间持有，连接过程中其他调用（如断开）仍可访问新会话。
    async fn connect(&self, handshake: Handshake) -> Result<Identity, ClientError> {
        let session = Session::new(self.config.clone(), Arc::clone(&self.surface));
        let previous = self.session.lock().await.replace(Arc::clone(&session));

        if let Some(previous) = previous {
            previous.close().await;
        }

        Ok(session.connect(handshake).await?)
    }

    // ======== 会话操作 ========

    /// 发送一条聊天消息
    ///
    /// 文本去除首尾空白后为空时直接返回成功；关联 ID 截断到 128 字符。
    pub async fn send_message(
        &self,
        text: &str,
        client_msg_id: Option<&str>,
    ) -> Result<(), ClientError> {
        let Some(session) = self.current_session().await else {
            return Err(SessionError::NotConnected.into());
        };
        if session.state() != SessionState::Connected {
            return Err(SessionError::NotConnected.into());
        }

        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let frame = OutboundFrame::Msg {
            text: text.to_string(),
            client_msg_id: client_msg_id
                .filter(|id| !id.is_empty())
                .map(|id| truncate_chars(id, MAX_CLIENT_MSG_ID_CHARS)),
        };
        Ok(session.send(&frame).await?)
    }

    /// 断开当前会话（幂等）
    pub async fn disconnect(&self) {
        if let Some(session) = self.current_session().await {
            session.close().await;
        }
    }

    pub async fn connection_info(&self) -> ConnectionInfo {
        match self.current_session().await {
            Some(session) => ConnectionInfo {
                state: session.state(),
                identity: session.identity().cloned(),
            },
            None => ConnectionInfo {
                state: SessionState::Disconnected,
                identity: None,
            },
        }
    }

    async fn current_session(&self) -> Option<Arc<Session>> {
        self.session.lock().await.clone()
    }

    // ======== 设置 ========

    pub fn get_theme(&self) -> Theme {
        self.settings.snapshot().theme
    }

    /// 在深色/浅色主题间切换并保存
    pub async fn toggle_theme(&self) -> Theme {
        self.settings
            .update(|s| s.theme = s.theme.toggled())
            .await
            .theme
    }

    pub fn get_saved_credentials(&self) -> SavedCredentials {
        SavedCredentials::from(&self.settings.snapshot())
    }

    pub async fn save_credentials(&self, username: &str, password: &str, remember: bool) {
        self.settings
            .update(|s| s.store_credentials(username, password, remember))
            .await;
    }
}

/// 规范化用户名：去除首尾空白、去掉一个前导 `@`、再去空白、转小写
pub fn normalize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_at = trimmed.strip_prefix('@').unwrap_or(trimmed);
    without_at.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::channel::FrameReader;
    use crate::services::surface::testing::{NullSurface, RecordingSurface};
    use serde_json::{Value, json};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    struct Harness {
        client: ChatClient,
        surface: Arc<RecordingSurface>,
        _dir: tempfile::TempDir,
    }

    fn harness(config: ConnectionConfig) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let surface = Arc::new(RecordingSurface::default());
        let settings = SettingsStore::load(dir.path().join("settings.json"));
        Harness {
            client: ChatClient::new(config, surface.clone(), settings),
            surface,
            _dir: dir,
        }
    }

    fn local_config(port: u16) -> ConnectionConfig {
        ConnectionConfig {
            host: "127.0.0.1".into(),
            port,
            use_tls: false,
            handshake_timeout_secs: 2,
            ..ConnectionConfig::default()
        }
    }

    /// 接受一个连接，读取握手帧，按需应答，然后把收到的后续帧转发出来
    async fn spawn_server(
        reply: Option<&'static str>,
    ) -> (u16, JoinHandle<Vec<Value>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let task = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let (read_half, mut write_half) = tokio::io::split(socket);
            let mut reader = FrameReader::new(read_half);
            let mut frames = vec![reader.read_frame().await.unwrap()];
            if let Some(reply) = reply {
                write_half.write_all(reply.as_bytes()).await.unwrap();
            }
            while let Ok(frame) = reader.read_frame().await {
                frames.push(frame);
            }
            frames
        });
        (port, task)
    }

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("  @Alice "), "alice");
        assert_eq!(normalize_username("@ Bob"), "bob");
        assert_eq!(normalize_username("@@x"), "@x");
        assert_eq!(normalize_username("   "), "");
    }

    #[tokio::test]
    async fn test_missing_credentials_never_connects() {
        let h = harness(local_config(1));
        let err = h.client.auth_login("@", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingCredentials));

        let err = h.client.auth_login("alice", "").await.unwrap_err();
        assert!(matches!(err, ClientError::MissingCredentials));
        assert!(h.surface.events().is_empty());
        assert_eq!(h.client.connection_info().await.state, SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_login_saves_credentials_first() {
        let h = harness(local_config(1));
        let _ = h.client.auth_login("  Alice ", "pw").await;

        let saved = h.client.get_saved_credentials();
        assert!(saved.remember);
        assert_eq!(saved.username, "Alice");
        assert_eq!(saved.password, "pw");
    }

    #[tokio::test]
    async fn test_protocol_mismatch() {
        let h = harness(local_config(1));
        let err = h.client.start("Bob").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::ProtocolMismatch {
                configured: ProtocolVariant::Credentialed
            }
        ));

        let h = harness(ConnectionConfig {
            protocol: ProtocolVariant::Anonymous,
            ..local_config(1)
        });
        let err = h.client.auth_login("alice", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::ProtocolMismatch { .. }));
    }

    #[tokio::test]
    async fn test_login_send_disconnect() {
        let (port, server) =
            spawn_server(Some("{\"type\":\"auth_ok\",\"user\":{\"user_id\":3,\"username\":\"alice\"}}\n"))
                .await;
        let h = harness(local_config(port));

        let identity = h.client.auth_login("@Alice", "pw").await.unwrap();
        assert_eq!(identity.username, "alice");

        let info = h.client.connection_info().await;
        assert_eq!(info.state, SessionState::Connected);
        assert_eq!(info.identity, Some(identity));

        // 空白消息不发送
        h.client.send_message("   ", None).await.unwrap();
        let long_id = "i".repeat(300);
        h.client.send_message("  hi  ", Some(&long_id)).await.unwrap();

        h.client.disconnect().await;
        h.client.disconnect().await;
        assert_eq!(h.client.connection_info().await.state, SessionState::Closed);

        let frames = server.await.unwrap();
        assert_eq!(
            frames[0],
            json!({"type":"auth_login","username":"alice","password":"pw"})
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1]["text"], "hi");
        assert_eq!(
            frames[1]["client_msg_id"].as_str().unwrap().len(),
            MAX_CLIENT_MSG_ID_CHARS
        );

        let err = h.client.send_message("after", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Session(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_anonymous_start() {
        let (port, server) = spawn_server(None).await;
        let h = harness(ConnectionConfig {
            protocol: ProtocolVariant::Anonymous,
            ..local_config(port)
        });

        let identity = h.client.start("   ").await.unwrap();
        assert_eq!(identity.display_name, DEFAULT_DISPLAY_NAME);

        h.client.disconnect().await;
        let frames = server.await.unwrap();
        assert_eq!(frames[0], json!({"type":"hello","name":"User"}));
    }

    #[tokio::test]
    async fn test_register_rejected() {
        let (port, _server) =
            spawn_server(Some("{\"type\":\"error\",\"text\":\"username taken\"}\n")).await;
        let h = harness(local_config(port));

        let err = h.client.auth_register("bob", "pw", "hi there").await.unwrap_err();
        assert_eq!(err.to_string(), "username taken");
        assert_eq!(h.client.connection_info().await.state, SessionState::Disconnected);
        assert!(h.surface.systems().contains(&"Auth failed: username taken".to_string()));
    }

    #[tokio::test]
    async fn test_send_without_session() {
        let h = harness(local_config(1));
        let err = h.client.send_message("hi", None).await.unwrap_err();
        assert!(matches!(err, ClientError::Session(SessionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_settings_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let client = ChatClient::new(
            local_config(1),
            Arc::new(NullSurface),
            SettingsStore::load(&path),
        );
        assert_eq!(client.get_theme(), Theme::Dark);
        assert_eq!(client.toggle_theme().await, Theme::Light);
        client.save_credentials("carol", "pw", false).await;

        let restarted = ChatClient::new(
            local_config(1),
            Arc::new(NullSurface),
            SettingsStore::load(&path),
        );
        assert_eq!(restarted.get_theme(), Theme::Light);
        let saved = restarted.get_saved_credentials();
        assert!(!saved.remember);
        assert!(saved.username.is_empty());
        assert_eq!(restarted.toggle_theme().await, Theme::Dark);
    }
}
