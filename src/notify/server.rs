//! websocket 广播服务

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::config::WebSocketConfig;
use crate::notify::{NotifyError, StatusMessage, UpdateReceiver};

/// 客户端标识
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    pub fn new() -> Self {
        Self(format!("client_{}", Uuid::new_v4()))
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 当前打开的客户端通道集合
#[derive(Clone, Default)]
pub struct ConnectionSet {
    members: Arc<Mutex<HashMap<ClientId, mpsc::UnboundedSender<String>>>>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: ClientId, tx: mpsc::UnboundedSender<String>) {
        self.members.lock().await.insert(id, tx);
    }

    pub async fn remove(&self, id: &ClientId) -> bool {
        self.members.lock().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.members.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 将一帧文本发送给所有成员，返回送达的客户端数量。
    /// 通道已关闭的成员会被移出集合，不影响其他成员。
    pub async fn broadcast(&self, text: &str) -> usize {
        let mut members = self.members.lock().await;
        members.retain(|id, tx| match tx.send(text.to_string()) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(client_id = %id, "客户端通道已关闭，移出连接集合");
                false
            }
        });
        members.len()
    }
}

/// 广播服务器：接收客户端连接，并把更新队列中的消息推送给所有客户端
pub struct BroadcastServer {
    listener: TcpListener,
    receiver: UpdateReceiver,
    connections: ConnectionSet,
    config: WebSocketConfig,
}

impl BroadcastServer {
    /// 绑定监听地址。端口占用、权限不足等错误直接返回，由调用方终止进程。
    pub async fn bind(config: &WebSocketConfig, receiver: UpdateReceiver) -> Result<Self, NotifyError> {
        config.validate().map_err(NotifyError::InvalidConfig)?;

        let addr = config.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| NotifyError::Bind { addr, source })?;

        Ok(Self {
            listener,
            receiver,
            connections: ConnectionSet::new(),
            config: config.clone(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NotifyError> {
        Ok(self.listener.local_addr()?)
    }

    /// 启动接入循环与广播循环，两者在进程生命周期内持续运行
    pub fn spawn(self) -> Result<ServerHandle, NotifyError> {
        let addr = self.local_addr()?;
        let keepalive = Keepalive {
            interval: self.config.ping_interval(),
            timeout: self.config.ping_timeout(),
        };

        let accept = tokio::spawn(run_accept_loop(
            self.listener,
            self.connections.clone(),
            keepalive,
        ));
        let broadcast = tokio::spawn(run_broadcast_loop(
            self.receiver,
            self.connections.clone(),
            self.config.poll_interval(),
        ));

        tracing::info!(%addr, "🌐 WebSocket服务已启动: ws://{}", addr);

        Ok(ServerHandle {
            addr,
            connections: self.connections,
            _accept: accept,
            _broadcast: broadcast,
        })
    }
}

/// `spawn` 返回的句柄。丢弃句柄不会停止后台任务。
pub struct ServerHandle {
    addr: SocketAddr,
    connections: ConnectionSet,
    _accept: JoinHandle<()>,
    _broadcast: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.len().await
    }
}

#[derive(Debug, Clone, Copy)]
struct Keepalive {
    interval: Duration,
    timeout: Duration,
}

async fn run_accept_loop(listener: TcpListener, connections: ConnectionSet, keepalive: Keepalive) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                tokio::spawn(handle_connection(stream, peer, connections.clone(), keepalive));
            }
            Err(e) => {
                tracing::warn!(error = %e, "接受连接失败");
            }
        }
    }
}

async fn run_broadcast_loop(
    mut receiver: UpdateReceiver,
    connections: ConnectionSet,
    poll_interval: Duration,
) {
    loop {
        let Some(message) = receiver.drain_one() else {
            tokio::time::sleep(poll_interval).await;
            continue;
        };

        match message.to_json() {
            Ok(text) => {
                let delivered = connections.broadcast(&text).await;
                tracing::debug!(stage = %message.stage, delivered, "📤 已广播状态消息");
            }
            Err(e) => {
                tracing::error!(error = %e, stage = %message.stage, "状态消息序列化失败");
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    connections: ConnectionSet,
    keepalive: Keepalive,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(%peer, error = %e, "WebSocket握手失败");
            return;
        }
    };

    let client_id = ClientId::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // 连接通知先进入客户端私有通道，再加入集合，保证其先于任何广播消息
    match StatusMessage::connected().to_json() {
        Ok(notice) => {
            let _ = tx.send(notice);
        }
        Err(e) => tracing::error!(error = %e, "连接通知序列化失败"),
    }
    connections.insert(client_id.clone(), tx).await;
    tracing::info!(%client_id, %peer, "🔌 新客户端已连接");

    match pump(ws, &mut rx, keepalive).await {
        Ok(()) => tracing::info!(%client_id, "客户端已断开"),
        Err(e) => tracing::info!(%client_id, error = %e, "客户端连接异常关闭"),
    }

    connections.remove(&client_id).await;
}

/// 转发出站消息、发送心跳并处理入站控制帧，直到连接结束
async fn pump(
    ws: WebSocketStream<TcpStream>,
    rx: &mut mpsc::UnboundedReceiver<String>,
    keepalive: Keepalive,
) -> Result<(), NotifyError> {
    let (mut sink, mut stream) = ws.split();
    let mut ping = tokio::time::interval_at(Instant::now() + keepalive.interval, keepalive.interval);
    let mut pong_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            outbound = rx.recv() => match outbound {
                Some(text) => sink.send(Message::Text(text.into())).await?,
                None => break,
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Pong(_))) => pong_deadline = None,
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "收到关闭帧");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = ping.tick() => {
                if pong_deadline.is_none() {
                    sink.send(Message::Ping(Default::default())).await?;
                    pong_deadline = Some(Instant::now() + keepalive.timeout);
                }
            }
            _ = tokio::time::sleep_until(pong_deadline.unwrap_or_else(Instant::now)), if pong_deadline.is_some() => {
                return Err(NotifyError::KeepaliveTimeout(keepalive.timeout));
            }
        }
    }

    let _ = sink.close().await;
    Ok(())
}
