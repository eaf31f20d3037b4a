//! # 分帧通道服务
//!
//! 在双向字节流上收发以换行分隔的 UTF-8 JSON 帧（与 JSONL 文件同一格式）。
//!
//! ## 帧格式
//! - 每帧一个 JSON 对象，紧凑序列化，末尾追加 `\n`
//! - JSON 字符串中的换行由转义保证（`\n` 被编码为 `\\n`），帧内不可能出现裸换行
//! - 行尾的 `\r` 被容忍并去除
//!
//! ## 读写分离
//! 读端 `FrameReader` 归接收循环独占，无需加锁；
//! 写端 `FrameWriter` 放在会话的写锁里，一次 `write_frame` 完整写入一帧。

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::FrameError;

/// 将一个值编码为一帧（含结尾换行符）
pub fn encode_frame<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec(value)?;
    debug_assert!(!bytes.contains(&b'\n'), "紧凑 JSON 不应包含裸换行");
    bytes.push(b'\n');
    Ok(bytes)
}

/// 解码一行（可带或不带结尾换行符）
///
/// # 错误
/// 不是合法 UTF-8 或合法 JSON 时返回 `FrameError::Decode`
pub fn decode_line(line: &[u8]) -> Result<Value, FrameError> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    serde_json::from_slice(line).map_err(FrameError::Decode)
}

/// 帧读取端
pub struct FrameReader<R> {
    inner: BufReader<R>,
    /// 复用的行缓冲区，避免每帧重新分配
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            line: Vec::with_capacity(1024),
        }
    }

    /// 读取下一帧
    ///
    /// 阻塞直到读到完整的 `\n` 结尾的一行、对端关闭流或读取失败。
    /// 流结束时残留的不完整行（没有结尾换行符）不作为帧返回，而是视为 `EndOfStream`。
    pub async fn read_frame(&mut self) -> Result<Value, FrameError> {
        self.line.clear();
        let n = self.inner.read_until(b'\n', &mut self.line).await?;

        if n == 0 || self.line.last() != Some(&b'\n') {
            if n > 0 {
                log::debug!("丢弃流末尾不完整的行（{} 字节）", n);
            }
            return Err(FrameError::EndOfStream);
        }

        decode_line(&self.line)
    }
}

/// 帧写入端
pub struct FrameWriter<W> {
    inner: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// 编码并完整写入一帧
    ///
    /// 先把整帧编码到内存再一次性 `write_all`，调用方持有写锁时，
    /// 一帧的所有字节在线路上连续出现。
    pub async fn write_frame<T: Serialize + ?Sized>(&mut self, value: &T) -> std::io::Result<()> {
        let bytes = encode_frame(value)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await
    }

    /// 关闭写方向，通知对端不再发送数据
    pub async fn shutdown(&mut self) -> std::io::Result<()> {
        self.inner.shutdown().await
    }
}
