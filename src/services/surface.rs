//! # UI 回调面
//!
//! 会话引擎向宿主界面推送更新的唯一出口。实现通过依赖注入交给会话和接收循环，
//! 不存在进程级的全局窗口句柄。
//!
//! ## 调用约定
//! 所有方法都是"发出即忘"：实现必须廉价、不阻塞、不 panic；
//! 推送失败时自行记录日志并忽略，绝不把错误抛回会话引擎。

/// 宿主界面回调
pub trait ChatSurface: Send + Sync {
    /// 更新状态栏文本
    fn set_status(&self, text: &str);

    /// 追加一条系统/诊断消息
    fn append_system(&self, text: &str);

    /// 追加一条聊天消息
    ///
    /// # 参数
    /// - `time` - 已格式化的本地时间（`HH:MM:SS`）
    /// - `sender` - 发送者标签
    /// - `text` - 消息正文
    /// - `client_msg_id` - 客户端关联 ID（用于和乐观渲染的本地消息对账）
    fn append_message(&self, time: &str, sender: &str, text: &str, client_msg_id: Option<&str>);
}
