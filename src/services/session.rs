//! # 会话状态机
//!
//! 一个 `Session` 对应一次连接尝试及其后的整个生命周期：
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──open ok──▶ Authenticating ──handshake ok──▶ Connected
//!      ▲                        │                          │                             │
//!      └──────open failed───────┘                          │                             │
//!      └──────────────handshake failed─────────────────────┘                             ▼
//!                                                   任意状态 ──close / EOF / I/O 失败──▶ Closed
//! ```
//!
//! ## 不变式
//! - 身份在状态变为 `Connected` 之前写入，之后不可变（关闭后仍保留用于显示）
//! - 接收循环只在 `Authenticating → Connected` 处启动，每个会话至多一个
//! - 所有出站写入经过写锁，一次持锁完整写入一帧
//! - 关闭只生效一次：第二次关闭是空操作，传输只释放一次
//! - `Closed` 是终态，重新连接需要新建会话
//!
//! ## 取消
//! 显式关闭会触发取消令牌，阻塞中的连接、握手读取、发送和接收循环都会随之返回。

use std::sync::{Arc, Mutex as StdMutex, OnceLock, PoisonError};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{FrameError, HandshakeError, SessionError};
use crate::models::config::ConnectionConfig;
use crate::models::frame::OutboundFrame;
use crate::models::identity::Identity;
use crate::services::channel::{FrameReader, FrameWriter};
use crate::services::receiver;
use crate::services::surface::ChatSurface;
use crate::services::transport::{self, Connection};

/// 未连接时状态栏显示的文本
pub const STATUS_NOT_CONNECTED: &str = "Not connected";

/// 关闭时等待写方向优雅关闭的最长时间
const WRITER_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

type SessionWriter = FrameWriter<WriteHalf<Connection>>;

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Disconnected,
    Connecting,
    Authenticating,
    Connected,
    Closed,
}

/// 握手方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// 用已有账号登录，等待 `auth_ok`
    Login { username: String, password: String },
    /// 注册新账号，等待 `auth_ok`
    Register {
        username: String,
        password: String,
        bio: String,
    },
    /// 匿名变体：只报上显示名，不等待应答
    Hello { name: String },
}

impl Handshake {
    fn frame(&self) -> OutboundFrame {
        match self {
            Handshake::Login { username, password } => OutboundFrame::AuthLogin {
                username: username.clone(),
                password: password.clone(),
            },
            Handshake::Register {
                username,
                password,
                bio,
            } => OutboundFrame::AuthRegister {
                username: username.clone(),
                password: password.clone(),
                bio: bio.clone(),
            },
            Handshake::Hello { name } => OutboundFrame::Hello { name: name.clone() },
        }
    }

    fn username(&self) -> &str {
        match self {
            Handshake::Login { username, .. } | Handshake::Register { username, .. } => username,
            Handshake::Hello { name } => name,
        }
    }
}

/// 会话关闭的触发原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CloseReason {
    /// 用户显式断开
    Requested,
    /// 接收循环读到流结束
    ServerClosed,
    /// 接收循环读取失败
    ReceiveFailed(String),
    /// 发送失败
    SendFailed(String),
}

impl CloseReason {
    /// 对应的诊断行
    fn diagnostic(&self) -> String {
        match self {
            CloseReason::Requested => "Disconnected.".to_string(),
            CloseReason::ServerClosed => "Connection closed by server.".to_string(),
            CloseReason::ReceiveFailed(e) => format!("Receiver error: {}", e),
            CloseReason::SendFailed(e) => format!("Send failed: {}", e),
        }
    }
}

/// 客户端会话
pub struct Session {
    config: ConnectionConfig,
    surface: Arc<dyn ChatSurface>,
    state: watch::Sender<SessionState>,
    identity: OnceLock<Identity>,
    /// 写锁：持有写端，每次发送持锁写完一帧；关闭后为 None
    writer: Mutex<Option<SessionWriter>>,
    receiver: StdMutex<Option<JoinHandle<()>>>,
    shutdown: CancellationToken,
}

impl Session {
    /// 创建处于 `Disconnected` 状态的新会话
    pub fn new(config: ConnectionConfig, surface: Arc<dyn ChatSurface>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Arc::new(Self {
            config,
            surface,
            state,
            identity: OnceLock::new(),
            writer: Mutex::new(None),
            receiver: StdMutex::new(None),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// 订阅状态变化
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// 握手确定的身份；握手成功前为 None
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.get()
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub(crate) fn surface(&self) -> &Arc<dyn ChatSurface> {
        &self.surface
    }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// 仅当当前状态属于 `from` 时迁移到 `to`
    fn transition(&self, from: &[SessionState], to: SessionState) -> bool {
        self.state.send_if_modified(|state| {
            if from.contains(state) {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// 打开传输并完成握手
    ///
    /// 成功后状态为 `Connected`，后台接收循环已启动。
    ///
    /// # 错误
    /// - `InvalidState` - 会话不处于 `Disconnected`
    /// - `Connect` - 传输建立失败，状态回到 `Disconnected`
    /// - `Handshake` / `Io` - 握手失败，传输已关闭，状态回到 `Disconnected`
    pub async fn connect(self: &Arc<Self>, handshake: Handshake) -> Result<Identity, SessionError> {
        if !self.transition(&[SessionState::Disconnected], SessionState::Connecting) {
            return Err(SessionError::InvalidState(self.state()));
        }

        let target = self.config.describe();
        log::info!("正在连接 {}", target);
        self.surface.set_status(&format!("Connecting to {}...", target));

        let opened = tokio::select! {
            result = transport::open(
                &self.config.host,
                self.config.port,
                self.config.use_tls,
                self.config.connect_timeout(),
            ) => result,
            _ = self.shutdown.cancelled() => return Err(session_aborted().into()),
        };

        let connection = match opened {
            Ok(connection) => connection,
            Err(e) => {
                log::warn!("连接 {} 失败: {}", target, e);
                if self.transition(&[SessionState::Connecting], SessionState::Disconnected) {
                    self.surface.set_status(STATUS_NOT_CONNECTED);
                    self.surface.append_system(&format!("Connect failed: {}", e));
                }
                return Err(e.into());
            }
        };

        self.establish(connection, handshake).await
    }

    /// 在已打开的流上完成握手
    ///
    /// 允许从 `Disconnected`（调用方自行打开了流）或 `Connecting` 进入。
    pub async fn establish(
        self: &Arc<Self>,
        connection: Connection,
        handshake: Handshake,
    ) -> Result<Identity, SessionError> {
        if !self.transition(
            &[SessionState::Disconnected, SessionState::Connecting],
            SessionState::Authenticating,
        ) {
            return Err(SessionError::InvalidState(self.state()));
        }

        let (read_half, write_half) = tokio::io::split(connection);
        let mut reader = FrameReader::new(read_half);
        let mut writer = FrameWriter::new(write_half);

        let identity = match self.exchange_handshake(&mut reader, &mut writer, &handshake).await {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("握手失败: {}", e);
                shutdown_writer(&mut writer).await;
                if self.transition(&[SessionState::Authenticating], SessionState::Disconnected) {
                    self.surface.set_status(STATUS_NOT_CONNECTED);
                    let line = match &e {
                        SessionError::Io(io) => format!("Auth error: {}", io),
                        other => format!("Auth failed: {}", other),
                    };
                    self.surface.append_system(&line);
                }
                return Err(e);
            }
        };

        // 写端先就位，再写入身份，最后公开 Connected 状态
        *self.writer.lock().await = Some(writer);
        let identity = self.identity.get_or_init(|| identity).clone();

        if !self.transition(&[SessionState::Authenticating], SessionState::Connected) {
            // 握手期间被显式关闭
            self.release_writer().await;
            return Err(session_aborted().into());
        }

        log::info!("已连接 {}，身份 {}", self.config.describe(), identity.display_name);
        self.surface
            .set_status(&format!("Connected to {}", self.config.describe()));
        match handshake {
            Handshake::Hello { .. } => self
                .surface
                .append_system(&format!("Logged in as {}", identity.display_name)),
            _ => self.surface.append_system("Auth OK. Connected."),
        }

        self.spawn_receiver(reader);
        Ok(identity)
    }

    /// 发送握手帧并（凭据变体下）同步读取唯一一条应答
    async fn exchange_handshake<R, W>(
        &self,
        reader: &mut FrameReader<R>,
        writer: &mut FrameWriter<W>,
        handshake: &Handshake,
    ) -> Result<Identity, SessionError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let frame = handshake.frame();
        tokio::select! {
            result = writer.write_frame(&frame) => result?,
            _ = self.shutdown.cancelled() => return Err(session_aborted().into()),
        }

        if let Handshake::Hello { name } = handshake {
            return Ok(Identity::anonymous(name));
        }

        let read = tokio::select! {
            result = tokio::time::timeout(self.config.handshake_timeout(), reader.read_frame()) => {
                result.map_err(|_| HandshakeError::Timeout(self.config.handshake_timeout_secs))?
            }
            _ = self.shutdown.cancelled() => return Err(session_aborted().into()),
        };

        let reply = match read {
            Ok(reply) => reply,
            Err(FrameError::EndOfStream) => return Err(HandshakeError::NoReply.into()),
            Err(FrameError::Decode(_)) => return Err(HandshakeError::MalformedReply.into()),
            Err(FrameError::Io(e)) => return Err(e.into()),
        };

        Ok(parse_auth_reply(&reply, handshake.username())?)
    }

    /// 启动后台接收循环；已存在时不重复启动
    fn spawn_receiver(self: &Arc<Self>, reader: FrameReader<ReadHalf<Connection>>) {
        let mut slot = self.receiver.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            log::warn!("接收循环已在运行，忽略重复启动");
            return;
        }
        *slot = Some(tokio::spawn(receiver::run(Arc::clone(self), reader)));
    }

    /// 接收循环是否已启动
    pub fn has_receiver(&self) -> bool {
        self.receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// 发送一帧
    ///
    /// # 错误
    /// - `NotConnected` - 状态不是 `Connected`，不触碰传输
    /// - `Io` - 写入失败，会话随之关闭
    pub async fn send(&self, frame: &OutboundFrame) -> Result<(), SessionError> {
        if self.state() != SessionState::Connected {
            return Err(SessionError::NotConnected);
        }

        let result = {
            let mut guard = self.writer.lock().await;
            let Some(writer) = guard.as_mut() else {
                return Err(SessionError::NotConnected);
            };
            tokio::select! {
                result = writer.write_frame(frame) => result,
                _ = self.shutdown.cancelled() => Err(session_aborted()),
            }
        };

        if let Err(e) = result {
            log::warn!("发送失败: {}", e);
            self.close_with(CloseReason::SendFailed(e.to_string())).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// 显式关闭会话
    ///
    /// 返回本次调用是否真正执行了关闭；重复关闭返回 false。
    pub async fn close(&self) -> bool {
        self.close_with(CloseReason::Requested).await
    }

    /// 关闭的唯一实现，所有路径（显式关闭、接收循环、发送失败）在此汇合
    pub(crate) async fn close_with(&self, reason: CloseReason) -> bool {
        let won = self.state.send_if_modified(|state| {
            if *state == SessionState::Closed {
                false
            } else {
                *state = SessionState::Closed;
                true
            }
        });
        if !won {
            return false;
        }

        self.shutdown.cancel();
        self.release_writer().await;

        log::info!("会话已关闭: {:?}", reason);
        self.surface.append_system(&reason.diagnostic());
        self.surface.set_status(STATUS_NOT_CONNECTED);
        true
    }

    async fn release_writer(&self) {
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            shutdown_writer(&mut writer).await;
        }
    }
}

/// 解析凭据变体的握手应答
///
/// `type == "auth_ok"` 时从 `user` 字段解析身份；否则取 `text` 或 `error`
/// 作为拒绝原因，都没有时使用通用的 `Auth failed`。
pub fn parse_auth_reply(reply: &Value, fallback_username: &str) -> Result<Identity, HandshakeError> {
    if reply.get("type").and_then(Value::as_str) == Some("auth_ok") {
        return Ok(Identity::from_auth_user(reply.get("user"), fallback_username));
    }

    let reason = ["text", "error"]
        .iter()
        .find_map(|key| reply.get(*key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or("Auth failed");
    Err(HandshakeError::Rejected(reason.to_string()))
}

/// 会话被显式关闭时，阻塞操作返回的错误
fn session_aborted() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::ConnectionAborted, "session closed")
}

async fn shutdown_writer<W: AsyncWrite + Unpin>(writer: &mut FrameWriter<W>) {
    match tokio::time::timeout(WRITER_SHUTDOWN_GRACE, writer.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::debug!("关闭写端失败: {}", e),
        Err(_) => log::debug!("关闭写端超时"),
    }
}
