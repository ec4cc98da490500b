//! 进度通知通道
//!
//! 流水线各阶段通过 [`UpdateSender`] 写入状态消息，广播循环通过 [`UpdateReceiver`]
//! 逐条取出并推送给所有已连接的 websocket 客户端。队列无界、严格 FIFO。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;

pub mod server;

pub use server::{BroadcastServer, ConnectionSet, ServerHandle};

/// 阶段名称常量
pub struct StageKeys;

impl StageKeys {
    pub const SYSTEM: &'static str = "system";
    pub const RESEARCH: &'static str = "research";
    pub const CONTENT: &'static str = "content";
    pub const SAVE: &'static str = "save";
}

/// 状态消息的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Completed,
    Failed,
    Connected,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::Completed => write!(f, "completed"),
            Status::Failed => write!(f, "failed"),
            Status::Connected => write!(f, "connected"),
        }
    }
}

/// 描述流水线进度的状态消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub stage: String,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: Status,
}

impl StatusMessage {
    pub fn new(stage: impl Into<String>, message: impl Into<String>, status: Status) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
            timestamp: Some(Utc::now()),
            status,
        }
    }

    /// 新客户端连接时发送的通知
    pub fn connected() -> Self {
        Self::new(
            StageKeys::SYSTEM,
            "Connected to EduFlow WebSocket Server",
            Status::Connected,
        )
    }

    pub fn to_json(&self) -> Result<String, NotifyError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 通知通道错误
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to bind websocket server on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid websocket config")]
    InvalidConfig(#[source] anyhow::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("no pong received within {0:?}")]
    KeepaliveTimeout(Duration),

    #[error("failed to encode status message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 创建更新队列，返回生产端与消费端
pub fn update_queue() -> (UpdateSender, UpdateReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (UpdateSender { tx }, UpdateReceiver { rx })
}

/// 更新队列的生产端，可在任意线程中克隆使用
#[derive(Debug, Clone)]
pub struct UpdateSender {
    tx: mpsc::UnboundedSender<StatusMessage>,
}

impl UpdateSender {
    /// 追加到队尾，不阻塞。消费端已退出时消息被丢弃。
    pub fn enqueue(&self, message: StatusMessage) {
        tracing::debug!(stage = %message.stage, status = %message.status, text = %message.message, "📨 状态消息入队");
        if self.tx.send(message).is_err() {
            tracing::trace!("更新队列已关闭，丢弃消息");
        }
    }

    pub fn send_update(&self, stage: &str, message: impl Into<String>) {
        self.enqueue(StatusMessage::new(stage, message, Status::Active));
    }

    pub fn send_completed(&self, stage: &str, message: impl Into<String>) {
        self.enqueue(StatusMessage::new(stage, message, Status::Completed));
    }

    pub fn send_failed(&self, stage: &str, message: impl Into<String>) {
        self.enqueue(StatusMessage::new(stage, message, Status::Failed));
    }
}

/// 更新队列的消费端，由广播循环独占
#[derive(Debug)]
pub struct UpdateReceiver {
    rx: mpsc::UnboundedReceiver<StatusMessage>,
}

impl UpdateReceiver {
    /// 取出队首消息；队列为空时返回 None
    pub fn drain_one(&mut self) -> Option<StatusMessage> {
        self.rx.try_recv().ok()
    }

    /// 取出当前队列中的全部消息
    #[cfg(test)]
    pub fn drain_all(&mut self) -> Vec<StatusMessage> {
        std::iter::from_fn(|| self.drain_one()).collect()
    }
}
