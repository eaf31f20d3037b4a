//! # WebView 回调面
//!
//! 把会话引擎的界面更新转换为主窗口中的 JS 调用：
//! `setStatus(text)`、`addSystem(text)`、`addMessage(time, sender, text, clientMsgId)`。
//! 参数一律经 JSON 编码后拼入脚本，避免引号和换行破坏语句。
//!
//! 调用发出即忘：窗口不存在或脚本执行失败只记录日志。

use serde::Serialize;
use tauri::{AppHandle, Manager};

use crate::services::surface::ChatSurface;

/// 主窗口标签（与 `tauri.conf.json` 一致）
const MAIN_WINDOW: &str = "main";

pub struct WebviewSurface {
    app: AppHandle,
}

impl WebviewSurface {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn call(&self, script: String) {
        let Some(window) = self.app.get_webview_window(MAIN_WINDOW) else {
            log::warn!("主窗口不存在，丢弃界面更新");
            return;
        };
        if let Err(e) = window.eval(&script) {
            log::warn!("执行界面脚本失败: {}", e);
        }
    }
}

impl ChatSurface for WebviewSurface {
    fn set_status(&self, text: &str) {
        self.call(js_call("setStatus", &[text]));
    }

    fn append_system(&self, text: &str) {
        self.call(js_call("addSystem", &[text]));
    }

    fn append_message(&self, time: &str, sender: &str, text: &str, client_msg_id: Option<&str>) {
        let args = [
            encode_arg(&time),
            encode_arg(&sender),
            encode_arg(&text),
            encode_arg(&client_msg_id),
        ];
        self.call(format!("addMessage({});", args.join(",")));
    }
}

/// 生成 `name(arg1,arg2,...);` 形式的脚本
fn js_call(name: &str, args: &[&str]) -> String {
    let args: Vec<String> = args.iter().map(encode_arg).collect();
    format!("{}({});", name, args.join(","))
}

fn encode_arg<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}
