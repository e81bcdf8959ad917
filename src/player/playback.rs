use crate::core::{PlaybackClock, PlayerStatus, SeekRequest, StopReason};
use crate::player::classifier::{classify, StopClassification, StopContext};
use crate::player::events::PlayerEvent;
use crate::player::pipeline::SystemHooks;
use crate::player::shared::PlayerShared;
use crate::player::state::TaskFlagGuard;
use log::{error, info};
use std::process;
use std::sync::Arc;
use std::thread;

fn log_ctx() -> String {
    format!("[pid:{}-tid:{:?}]", process::id(), thread::current().id())
}

/// 实时循环在运行期间可见的控制面切面
///
/// 循环据此判断是否继续跑、自行消化排队的跳转请求、推进播放时钟
pub struct LoopContext<'a> {
    pub(crate) shared: &'a PlayerShared,
}

impl LoopContext<'_> {
    /// 循环应当在此返回 false 时尽快退出
    pub fn should_run(&self) -> bool {
        self.shared.state.status() == PlayerStatus::Playing
    }

    /// 取走排队中的跳转请求（播放中由循环按自己的节奏消化）
    pub fn take_seek(&self) -> Option<SeekRequest> {
        self.shared.slot.take()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.shared.clock
    }

    pub fn duration_ms(&self) -> i64 {
        self.shared.state.lock().duration_ms
    }
}

/// 实时化开关的 RAII 守卫：定时器精度与保持唤醒在退出路径上必然还原
struct RealtimeGuard {
    hooks: Arc<dyn SystemHooks>,
}

impl RealtimeGuard {
    fn begin(hooks: Arc<dyn SystemHooks>) -> Self {
        hooks.begin_realtime();
        Self { hooks }
    }
}

impl Drop for RealtimeGuard {
    fn drop(&mut self) {
        self.hooks.end_realtime();
    }
}

/// 启动播放任务
///
/// 前置条件不满足（未打开媒体、状态不是 Stopped/Paused）时静默返回 false，
/// 调用方通过读状态判断是否生效。状态先置 Playing 再等待两个后台任务退场：
/// 正在排空的 Seek 任务观察到 Playing 会立即让位。
pub(crate) fn start(shared: &Arc<PlayerShared>) -> bool {
    {
        let mut inner = shared.state.lock();
        if !inner.media_open {
            return false;
        }
        if !matches!(inner.status, PlayerStatus::Stopped | PlayerStatus::Paused) {
            return false;
        }
        inner.status = PlayerStatus::Playing;
        shared.state.notify_all();
    }
    shared.events.emit(PlayerEvent::StatusChanged(PlayerStatus::Playing));

    // 阻塞调用方直到没有任务在飞行中，并在同一临界区占下运行标志
    shared.state.wait_idle_and_claim_playback();
    shared.clock.play();

    let shared = shared.clone();
    thread::spawn(move || run(shared));
    true
}

/// 播放任务主体：跑完实时循环后分类退出条件并通知
fn run(shared: Arc<PlayerShared>) {
    info!("{} 🎬 播放任务启动", log_ctx());
    let _flag = TaskFlagGuard::playback(&shared.state);

    shared.state.set_last_error(None);
    let _realtime = RealtimeGuard::begin(shared.hooks.clone());
    shared.pipeline.reset_buffering();

    let mode = shared.current_mode();
    info!("{} 🎬 实时循环模式: {:?}", log_ctx(), mode);

    let ctx = LoopContext { shared: &shared };
    let result = shared.screamer.run(mode, &ctx);

    // 不归渲染器所有的帧资源在这里释放
    shared.pipeline.release_frames();

    if let Err(e) = result {
        // Play() 早已返回，这里只能走未知错误升级通道
        error!("{} ❌ 实时循环异常退出: {}", log_ctx(), e);
        shared.events.emit(PlayerEvent::UnknownError(e.to_string()));
    }

    let reason = finalize(&shared);
    info!("{} 🛑 播放任务结束，停止原因: {:?}", log_ctx(), reason);
    shared.events.emit(PlayerEvent::Stopped(reason));
}

/// 退出分类与状态落位
///
/// 状态已经不是 Playing 说明退出源于暂停/停止命令，按干净停止处理；
/// 仍是 Playing 说明循环自己停了，交给分类器定性。
fn finalize(shared: &PlayerShared) -> Option<StopReason> {
    shared.clock.pause();

    if shared.state.status() != PlayerStatus::Playing {
        return None;
    }

    let ctx = {
        let inner = shared.state.lock();
        StopContext {
            end_of_stream: shared.pipeline.end_of_stream(),
            timed_out: shared.pipeline.timed_out(),
            buffering_started: shared.pipeline.buffering_started(),
            buffering_completed: shared.pipeline.buffering_completed(),
            reverse: inner.reverse,
            live: inner.live,
            position_ms: shared.clock.now(),
            duration_ms: inner.duration_ms,
        }
    };

    match classify(&ctx) {
        StopClassification::Ended => {
            shared.set_status_notify(PlayerStatus::Ended);
            None
        }
        StopClassification::CleanPause => {
            shared.set_status_notify(PlayerStatus::Paused);
            None
        }
        StopClassification::Error {
            reason,
            buffering_aborted,
        } => {
            shared.set_status_notify(PlayerStatus::Paused);
            shared.state.set_last_error(Some(reason));
            if buffering_aborted {
                // 缓冲周期被异常终止：显式补发完成通知，别让 UI 卡在缓冲转圈
                shared
                    .events
                    .emit(PlayerEvent::BufferingCompleted(Some(reason)));
            }
            Some(reason)
        }
    }
}
