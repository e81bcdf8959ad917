use crate::core::{PlaybackClock, PlaybackMode, PlayerStatus};
use crate::player::events::{EventHub, PlayerEvent};
use crate::player::pipeline::{MediaPipeline, ScreamerLoop, SystemHooks};
use crate::player::seek::SeekSlot;
use crate::player::state::SharedState;
use crate::player::subtitle::SubtitleBridge;
use std::sync::Arc;

/// 控制核心内部共享的全部可变状态与协作方句柄
///
/// manager、播放任务、Seek 任务各持有一个 Arc 引用
pub(crate) struct PlayerShared {
    pub state: SharedState,
    pub slot: SeekSlot,
    pub clock: PlaybackClock,
    pub subtitles: SubtitleBridge,
    pub events: EventHub,
    pub pipeline: Arc<dyn MediaPipeline>,
    pub screamer: Arc<dyn ScreamerLoop>,
    pub hooks: Arc<dyn SystemHooks>,
}

impl PlayerShared {
    /// 修改状态并向外发布变更事件
    pub fn set_status_notify(&self, status: PlayerStatus) -> bool {
        if self.state.set_status(status) {
            self.events.emit(PlayerEvent::StatusChanged(status));
            true
        } else {
            false
        }
    }

    /// 按当前模式开关选定实时循环的运行模式
    pub fn current_mode(&self) -> PlaybackMode {
        if !self.pipeline.has_video() {
            return PlaybackMode::AudioOnly;
        }
        let inner = self.state.lock();
        if inner.zero_latency {
            PlaybackMode::ZeroLatency
        } else if inner.reverse {
            PlaybackMode::Reverse
        } else {
            PlaybackMode::Forward
        }
    }
}
