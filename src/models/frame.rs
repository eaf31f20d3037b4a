//! # 线路帧数据模型
//!
//! 每一帧是一行 UTF-8 JSON 对象，以 `\n` 结尾，按 `type` 字段区分种类。
//!
//! 出站帧：
//! - `auth_login` / `auth_register` / `hello` - 仅在握手阶段发送
//! - `msg` - 稳态聊天消息，可携带客户端生成的关联 ID
//!
//! 入站帧：`msg`、`system`、`error`、`pong`，其余 `type` 一律静默忽略。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 出站帧
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    AuthLogin {
        username: String,
        password: String,
    },
    AuthRegister {
        username: String,
        password: String,
        bio: String,
    },
    Hello {
        name: String,
    },
    Msg {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        client_msg_id: Option<String>,
    },
}

/// 入站帧
///
/// 字段全部为 `Option`：服务端省略字段时由分发逻辑填充默认值，
/// 而不是把整帧当作坏数据。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Msg {
        /// Unix 秒，可能是数字也可能是数字字符串，见 `timestamp_secs`
        #[serde(default)]
        ts: Option<Value>,
        #[serde(default)]
        from: Option<String>,
        #[serde(default)]
        text: Option<String>,
        /// 关联 ID 可能是字符串也可能是数字，统一在分发时转成字符串
        #[serde(default)]
        client_msg_id: Option<Value>,
    },
    System {
        #[serde(default)]
        text: Option<String>,
    },
    Error {
        #[serde(default)]
        text: Option<String>,
    },
    Pong,
    #[serde(other)]
    Unknown,
}

impl InboundFrame {
    /// 从已解码的 JSON 值构造入站帧
    ///
    /// 没有字符串 `type` 字段的对象视为未知类型；已知类型但字段形状错误时返回错误。
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value.get("type") {
            Some(Value::String(_)) => serde_json::from_value(value),
            _ => Ok(InboundFrame::Unknown),
        }
    }
}

/// 将 `ts` 字段解析为 Unix 秒
///
/// 兼容数字（含小数）和数字字符串；`null` 或无法解析时返回 None，由调用方使用当前时间。
pub fn timestamp_secs(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// 将关联 ID 规范为字符串；`null` 视为缺省
pub fn correlation_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
