//! # 接收循环
//!
//! 每个已连接会话一个后台任务，持续读取入站帧并按 `type` 分发到 UI 回调面。
//!
//! - 流结束或读取失败：关闭会话并退出，这是会话自行结束的唯一途径
//! - 单行解码失败：报告一条诊断后继续读下一行
//! - 会话被显式关闭：取消令牌触发后静默退出
//!
//! 帧按读取顺序逐个分发（单读者，FIFO）。

use std::sync::Arc;

use serde_json::Value;
use tokio::io::AsyncRead;

use crate::error::FrameError;
use crate::models::frame::{InboundFrame, correlation_id, timestamp_secs};
use crate::services::channel::FrameReader;
use crate::services::session::{CloseReason, Session};
use crate::services::surface::ChatSurface;
use crate::utils::time::{format_now, format_timestamp};

/// 接收循环主体
pub(crate) async fn run<R: AsyncRead + Unpin>(session: Arc<Session>, mut reader: FrameReader<R>) {
    let surface = Arc::clone(session.surface());
    let shutdown = session.shutdown_token().clone();

    let reason = loop {
        let next = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break None,
            result = reader.read_frame() => result,
        };

        match next {
            Ok(value) => dispatch(surface.as_ref(), value),
            Err(e) if !e.is_fatal() => {
                log::warn!("入站帧解码失败: {:?}", e);
                surface.append_system(&e.to_string());
            }
            Err(FrameError::Io(e)) => break Some(CloseReason::ReceiveFailed(e.to_string())),
            Err(_) => break Some(CloseReason::ServerClosed),
        }
    };

    match reason {
        Some(reason) => {
            log::info!("接收循环结束: {:?}", reason);
            session.close_with(reason).await;
        }
        None => log::debug!("接收循环随会话关闭退出"),
    }
}

/// 将一帧分发到 UI 回调面
///
/// 未知 `type` 静默丢弃；已知类型但字段形状错误时报告一条诊断。
pub fn dispatch(surface: &dyn ChatSurface, value: Value) {
    let frame = match InboundFrame::from_value(value) {
        Ok(frame) => frame,
        Err(e) => {
            log::warn!("入站帧结构不符: {}", e);
            surface.append_system(&format!("Bad data: {}", e));
            return;
        }
    };

    match frame {
        InboundFrame::Msg {
            ts,
            from,
            text,
            client_msg_id,
        } => {
            let time = timestamp_secs(ts.as_ref()).map_or_else(format_now, format_timestamp);
            let client_msg_id = correlation_id(client_msg_id.as_ref());
            surface.append_message(
                &time,
                from.as_deref().unwrap_or("?"),
                text.as_deref().unwrap_or_default(),
                client_msg_id.as_deref(),
            );
        }
        InboundFrame::System { text } => surface.append_system(text.as_deref().unwrap_or_default()),
        InboundFrame::Error { text } => {
            surface.append_system(&format!("SERVER ERROR: {}", text.unwrap_or_default()))
        }
        InboundFrame::Pong => log::trace!("pong"),
        InboundFrame::Unknown => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::surface::testing::{RecordingSurface, SurfaceEvent};
    use serde_json::json;

    #[test]
    fn test_dispatch_msg() {
        let surface = RecordingSurface::default();
        dispatch(
            &surface,
            json!({"type":"msg","ts":1700000000,"from":"@bob","text":"hi","client_msg_id":"c-1"}),
        );
        assert_eq!(
            surface.events(),
            vec![SurfaceEvent::Message {
                time: format_timestamp(1_700_000_000),
                sender: "@bob".into(),
                text: "hi".into(),
                client_msg_id: Some("c-1".into()),
            }]
        );
    }

    #[test]
    fn test_dispatch_msg_with_string_timestamp() {
        let surface = RecordingSurface::default();
        dispatch(&surface, json!({"type":"msg","ts":"1700000000","from":"@bob","text":"hi"}));
        assert!(surface.systems().is_empty());
        match &surface.messages()[0] {
            SurfaceEvent::Message { time, .. } => assert_eq!(time, &format_timestamp(1_700_000_000)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_msg_defaults() {
        let surface = RecordingSurface::default();
        dispatch(&surface, json!({"type":"msg","client_msg_id":99}));
        match &surface.events()[0] {
            SurfaceEvent::Message {
                time,
                sender,
                text,
                client_msg_id,
            } => {
                assert_eq!(time.len(), 8);
                assert_eq!(sender, "?");
                assert_eq!(text, "");
                assert_eq!(client_msg_id.as_deref(), Some("99"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_system_and_error() {
        let surface = RecordingSurface::default();
        dispatch(&surface, json!({"type":"system","text":"welcome"}));
        dispatch(&surface, json!({"type":"error","text":"rate limited"}));
        assert_eq!(
            surface.systems(),
            vec!["welcome".to_string(), "SERVER ERROR: rate limited".to_string()]
        );
    }

    #[test]
    fn test_unknown_and_pong_have_no_effect() {
        let surface = RecordingSurface::default();
        dispatch(&surface, json!({"type":"pong"}));
        dispatch(&surface, json!({"type":"presence","online":3}));
        dispatch(&surface, json!({"no_type":true}));
        assert!(surface.events().is_empty());
    }

    #[test]
    fn test_wrong_shape_reports_bad_data() {
        let surface = RecordingSurface::default();
        dispatch(&surface, json!({"type":"msg","text":["not","a","string"]}));
        let systems = surface.systems();
        assert_eq!(systems.len(), 1);
        assert!(systems[0].starts_with("Bad data: "));
    }
}
