//! # 错误分类
//!
//! 会话引擎的所有失败都归入以下封闭枚举，任何平台层异常在向上报告前
//! 都必须映射为其中一个变体：
//! - `ConnectError` - 传输层建立失败（DNS、拒绝、超时、TLS、其他）
//! - `HandshakeError` - 握手阶段服务端应答缺失、无法解析或被拒绝
//! - `FrameError` - 单帧读取结果（流结束、I/O 失败、解码失败）
//! - `SessionError` - 会话状态机对外暴露的错误
//! - `ClientError` - UI 接口层的参数校验错误
//!
//! `Display` 文本即 UI 诊断行中显示的简短描述。

use std::io;

use thiserror::Error;

use crate::models::config::ProtocolVariant;
use crate::services::session::SessionState;

/// 传输层连接失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// 主机名无法解析
    #[error("Host not found (DNS).")]
    DnsFailure,

    /// 对端拒绝连接
    #[error("Connection refused.")]
    ConnectionRefused,

    /// 在连接超时时间内未完成 TCP 连接或 TLS 握手
    #[error("Connection timeout.")]
    Timeout,

    /// TLS 握手或证书校验失败
    #[error("TLS error: {0}")]
    TlsFailure(String),

    /// 其余无法归类的平台错误
    #[error("Error: {0}")]
    Other(String),
}

impl ConnectError {
    /// 将 TCP 连接阶段的 `io::Error` 映射为确定的分类
    pub fn from_io(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ConnectError::ConnectionRefused,
            io::ErrorKind::TimedOut => ConnectError::Timeout,
            _ => ConnectError::Other(err.to_string()),
        }
    }
}

/// 握手失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandshakeError {
    /// 服务端在应答前关闭了连接
    #[error("No auth response from server")]
    NoReply,

    /// 应答行不是合法 JSON
    #[error("Bad auth response (not JSON)")]
    MalformedReply,

    /// 服务端返回了非 `auth_ok` 的应答，携带服务端给出的原因
    #[error("{0}")]
    Rejected(String),

    /// 在握手超时时间内没有收到应答
    #[error("No auth response within {0} seconds")]
    Timeout(u64),
}

/// 单帧读取失败
///
/// 只有 `Decode` 是可恢复的：接收循环报告一条诊断后继续读取下一行。
#[derive(Debug, Error)]
pub enum FrameError {
    /// 对端关闭了流（包括末尾没有换行符的残缺行）
    #[error("Connection closed by server.")]
    EndOfStream,

    /// 底层读写失败
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    /// 该行不是合法的 JSON
    #[error("Bad data (not JSON).")]
    Decode(#[source] serde_json::Error),
}

impl FrameError {
    /// 是否应当终止会话
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FrameError::Decode(_))
    }
}

/// 会话状态机错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// 会话中途的读写失败
    #[error("{0}")]
    Io(#[from] io::Error),

    /// 在非 `Connected` 状态下尝试发送
    #[error("Not connected")]
    NotConnected,

    /// 在不允许的状态下发起连接
    #[error("Session cannot connect while {0:?}")]
    InvalidState(SessionState),
}

/// UI 接口层错误
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Missing username/password")]
    MissingCredentials,

    /// 调用的握手入口与配置的协议变体不一致
    #[error("Server protocol is {configured:?}, this login method is not available")]
    ProtocolMismatch { configured: ProtocolVariant },

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_from_io_kind() {
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(ConnectError::from_io(&refused), ConnectError::ConnectionRefused);

        let timed_out = io::Error::from(io::ErrorKind::TimedOut);
        assert_eq!(ConnectError::from_io(&timed_out), ConnectError::Timeout);

        let other = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(ConnectError::from_io(&other), ConnectError::Other(_)));
    }

    #[test]
    fn test_only_decode_failure_is_recoverable() {
        let decode = serde_json::from_str::<serde_json::Value>("not-json").unwrap_err();
        assert!(!FrameError::Decode(decode).is_fatal());
        assert!(FrameError::EndOfStream.is_fatal());
        assert!(FrameError::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_fatal());
    }

    #[test]
    fn test_rejected_reason_is_shown_verbatim() {
        let err = SessionError::from(HandshakeError::Rejected("bad password".into()));
        assert_eq!(err.to_string(), "bad password");
    }
}
