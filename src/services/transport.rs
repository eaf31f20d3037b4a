//! # 传输层服务
//!
//! 建立到聊天服务器的 TCP 连接，按需在其上完成 TLS 握手，
//! 返回统一的双向字节流 `Connection`。
//!
//! ## 失败分类
//! 所有平台错误在此处映射为 `ConnectError` 的某个变体，上层永远看不到原始异常：
//! - 域名解析失败或解析结果为空 → `DnsFailure`
//! - 所有地址均被拒绝 → `ConnectionRefused`
//! - 超过连接超时（TCP + TLS 整体计时）→ `Timeout`
//! - TLS 配置、服务器名或握手失败 → `TlsFailure`
//! - 其余 → `Other`
//!
//! ## TLS
//! 使用 rustls（ring 后端）+ Mozilla 根证书，按配置的主机名校验服务端证书。

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{self, ClientConfig, RootCertStore};

use crate::error::ConnectError;

/// 可读可写、可在任务间移动的字节流
pub trait ByteStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> ByteStream for T {}

/// 已打开的连接（明文 TCP 或 TLS）
///
/// 由会话独占持有；测试中也可以是 `tokio::io::duplex` 的一端。
pub type Connection = Box<dyn ByteStream>;

/// 打开到 `host:port` 的连接
///
/// # 参数
/// - `host` - 服务器主机名（同时作为 TLS SNI 和证书校验名）
/// - `port` - 端口
/// - `use_tls` - 是否建立 TLS
/// - `timeout` - DNS 解析、TCP 连接与 TLS 握手的总时限
///
/// # 错误
/// 返回映射后的 `ConnectError`；失败路径上已打开的套接字随作用域释放
pub async fn open(
    host: &str,
    port: u16,
    use_tls: bool,
    timeout: Duration,
) -> Result<Connection, ConnectError> {
    match tokio::time::timeout(timeout, open_inner(host, port, use_tls)).await {
        Ok(result) => result,
        Err(_) => Err(ConnectError::Timeout),
    }
}

async fn open_inner(host: &str, port: u16, use_tls: bool) -> Result<Connection, ConnectError> {
    let tcp = connect_tcp(host, port).await?;

    if !use_tls {
        return Ok(Box::new(tcp));
    }

    let connector = tls_connector()?;
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| ConnectError::TlsFailure(format!("invalid server name '{}': {}", host, e)))?;

    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| ConnectError::TlsFailure(e.to_string()))?;

    Ok(Box::new(stream))
}

/// 解析主机名并依次尝试每个地址，返回第一个成功的 TCP 连接
async fn connect_tcp(host: &str, port: u16) -> Result<TcpStream, ConnectError> {
    let addrs: Vec<_> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| {
            log::debug!("DNS 解析 {} 失败: {}", host, e);
            ConnectError::DnsFailure
        })?
        .collect();

    if addrs.is_empty() {
        return Err(ConnectError::DnsFailure);
    }

    let mut last_error = ConnectError::DnsFailure;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                // 聊天帧很小，关闭 Nagle 以降低交互延迟
                if let Err(e) = stream.set_nodelay(true) {
                    log::debug!("设置 TCP_NODELAY 失败: {}", e);
                }
                return Ok(stream);
            }
            Err(e) => {
                log::debug!("连接 {} 失败: {}", addr, e);
                last_error = ConnectError::from_io(&e);
            }
        }
    }

    Err(last_error)
}

/// 构造使用 Mozilla 根证书的 TLS 连接器
fn tls_connector() -> Result<TlsConnector, ConnectError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .map_err(|e| ConnectError::TlsFailure(e.to_string()))?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(TlsConnector::from(Arc::new(config)))
}
