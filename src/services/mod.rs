//! # 业务逻辑服务模块
//!
//! 会话引擎及其外围服务，与 Tauri command 层解耦，可在无界面环境下运行和测试：
//! - `transport` - 建立 TCP/TLS 字节流
//! - `channel` - 按行分帧的 JSON 读写
//! - `session` - 会话状态机：连接、握手、发送、关闭
//! - `receiver` - 后台接收循环和入站帧分发
//! - `surface` - 向宿主界面推送更新的回调接口
//! - `client` - 宿主界面调用的 API 层
//! - `config` - 连接配置加载
//! - `settings_store` - 用户设置的内存副本与持久化

pub mod channel;
pub mod client;
pub mod config;
pub mod receiver;
pub mod session;
pub mod settings_store;
pub mod surface;
pub mod transport;
