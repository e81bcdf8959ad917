use crate::core::{PlayerStatus, StopReason};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

/// 对外通知事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// 状态变更（用户命令或后台任务都可能触发）
    StatusChanged(PlayerStatus),
    /// 播放任务退出；None 表示干净停止或播完
    Stopped(Option<StopReason>),
    /// 跳转完成；失败时携带 -1
    SeekCompleted(i64),
    /// 缓冲周期被异常终止时显式补发的完成通知
    BufferingCompleted(Option<StopReason>),
    /// OSD 提示文本
    Osd(String),
    /// 任务边界捕获到的未知错误（不会向命令调用方抛出）
    UnknownError(String),
}

/// 事件通道：控制核心持有发送端，UI 层通过 subscribe() 拿接收端
pub struct EventHub {
    tx: Sender<PlayerEvent>,
    rx: Receiver<PlayerEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// 发送事件；没有订阅者时静默丢弃
    pub fn emit(&self, event: PlayerEvent) {
        debug!("📣 事件: {:?}", event);
        let _ = self.tx.send(event);
    }

    /// 获取接收端。通道是消费型的：每条事件只会被一个接收者取走
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.rx.clone()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
