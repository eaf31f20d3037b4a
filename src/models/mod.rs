//! # 数据模型模块
//!
//! 定义了线路帧、会话身份、配置和设置等数据结构。
//! 需要跨 IPC 传输或读写文件的结构体均派生 `Serialize` / `Deserialize`。
//! - `frame` - 出站/入站 JSON 帧
//! - `identity` - 握手后确定的会话身份
//! - `config` - 连接配置（主机、端口、TLS、超时、协议变体）
//! - `settings` - 用户设置（主题、记住设备、保存的凭据）
//! - `window` - 无边框窗口的最大化状态

pub mod config;
pub mod frame;
pub mod identity;
pub mod settings;
pub mod window;
