use crate::core::{
    PlayerStatus, SeekRequest, StreamKind, ACCURATE_SEEK_MARGIN_MS, NEXT_FRAME_SENTINEL,
    SEEK_DRAIN_SLEEP_MS, SEEK_FAILED_SENTINEL,
};
use crate::player::events::PlayerEvent;
use crate::player::shared::PlayerShared;
use crate::player::state::TaskFlagGuard;
use log::{info, warn};
use parking_lot::Mutex;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn log_ctx() -> String {
    format!("[pid:{}-tid:{:?}]", process::id(), thread::current().id())
}

/// 跳转请求槽：原子替换的单槽值
///
/// "最新的请求获胜"是结构性保证：槽里最多存在一个待处理请求，
/// 每次 push 都原子地顶掉旧请求，被顶掉的请求永远不会被执行。
pub struct SeekSlot {
    slot: Mutex<Option<SeekRequest>>,
}

impl SeekSlot {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// 放入新请求，返回被顶掉的旧请求（若有）
    pub fn push(&self, request: SeekRequest) -> Option<SeekRequest> {
        self.slot.lock().replace(request)
    }

    /// 取走当前请求
    pub fn take(&self) -> Option<SeekRequest> {
        self.slot.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl Default for SeekSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// 由微秒级时间值计算精确跳转的目标毫秒
///
/// 有亚毫秒余量时向上取整 1ms，避免命中意图字幕条目前面的那一条；
/// 再叠加该轨的延迟偏移，使目标落在字幕实际上屏的流时间上。
pub fn accurate_target_ms(ts_us: i64, delay_ms: i64) -> i64 {
    let mut ms = ts_us / 1000;
    if ts_us % 1000 != 0 {
        ms += 1;
    }
    ms + delay_ms
}

/// 确保有一个 Seek 任务在跑；已有任务在跑时只依赖它的排空循环
///
/// 检查与置位在状态锁内完成，与任务退出路径上的清标志互斥
pub(crate) fn ensure_task(shared: &Arc<PlayerShared>) {
    {
        let mut inner = shared.state.lock();
        if inner.seek_task_active {
            return;
        }
        inner.seek_task_active = true;
    }

    let shared = shared.clone();
    thread::spawn(move || {
        info!("{} 🧵 Seek 任务启动", log_ctx());
        let restart = {
            let mut flag = TaskFlagGuard::seek(&shared.state);
            drain(&shared, &mut flag)
        };
        info!("{} 🧵 Seek 任务退出 (restart={})", log_ctx(), restart);
        if restart {
            crate::player::playback::start(&shared);
        }
    });
}

/// 排空循环（暂停态路径）
///
/// 退出条件：槽空了，或者播放器转入 Playing（正在跑的实时循环会自己
/// 消化槽里的请求，本任务立即让位）。返回是否需要自动重启播放。
fn drain(shared: &Arc<PlayerShared>, flag: &mut TaskFlagGuard<'_>) -> bool {
    let mut un_ended = false;

    // 起步前小睡一个节流间隔：给密集连点一个合并窗口
    thread::sleep(Duration::from_millis(SEEK_DRAIN_SLEEP_MS));

    loop {
        match shared.state.status() {
            PlayerStatus::Playing => {
                info!("{} ⏯️ 播放器转入 Playing，Seek 任务让位", log_ctx());
                break;
            }
            PlayerStatus::Stopped => {
                // Stop 不会同步杀掉本任务，靠这里观察到状态后丢弃剩余请求；
                // 停止后也绝不自动重播
                info!("{} ⏹️ 播放器已停止，丢弃剩余跳转请求", log_ctx());
                shared.slot.take();
                return false;
            }
            _ => {}
        }

        match shared.slot.take() {
            Some(request) => {
                // 已播完的播放器先拉回 Paused，保证跳转期间状态一致
                if shared.state.status() == PlayerStatus::Ended {
                    shared.set_status_notify(PlayerStatus::Paused);
                    un_ended = true;
                }

                process_request(shared, &request);

                // 处理完小睡再查队列，让密集跳转合并而不是逐个执行
                thread::sleep(Duration::from_millis(SEEK_DRAIN_SLEEP_MS));
            }
            None => {
                // 退出决策与 ensure_task 的置位在同一把锁下互斥：
                // 锁内复查槽，空了才清标志退出，避免丢请求。
                // 标志在这里清过就解除守卫，后继任务置上的标志不归本任务管
                let mut inner = shared.state.lock();
                if !shared.slot.is_empty()
                    && !matches!(inner.status, PlayerStatus::Playing | PlayerStatus::Stopped)
                {
                    continue;
                }
                inner.seek_task_active = false;
                flag.disarm();
                shared.state.notify_all();
                break;
            }
        }
    }

    let (auto_replay, last_error) = {
        let inner = shared.state.lock();
        (inner.auto_replay, inner.last_error)
    };
    (un_ended && auto_replay) || last_error.is_some()
}

/// 处理单个跳转请求：重定位管线、暂停态下渲染一帧、刷新字幕
fn process_request(shared: &Arc<PlayerShared>, request: &SeekRequest) {
    let target_ms = request.target_ms;
    info!(
        "{} 🎯 处理跳转: {}ms (forward={}, accurate={})",
        log_ctx(),
        target_ms,
        request.forward,
        request.accurate
    );

    // 先按新位置刷新各轨字幕：命中缓存重显，否则清空
    shared.subtitles.refresh_after_seek(target_ms);

    let pipeline = &shared.pipeline;

    // 纯音频：直接重定位音频管线并重启它的 demuxer
    if !pipeline.has_video() {
        let rc = pipeline.seek_audio(target_ms, request.forward);
        if rc < 0 {
            warn!("{} ⚠️ 音频跳转失败，返回码 {}", log_ctx(), rc);
            shared
                .events
                .emit(PlayerEvent::SeekCompleted(SEEK_FAILED_SENTINEL));
            return;
        }
        pipeline.start_demuxer(StreamKind::Audio);
        shared.clock.set_time(target_ms);
        shared.events.emit(PlayerEvent::SeekCompleted(target_ms));
        return;
    }

    // 有视频：暂停解码器 -> 重定位 -> 解一帧 -> 上屏 -> 重启 demuxer
    pipeline.pause_decoders();

    // 精确跳转把目标提前一个安全量，补偿解码层向后跳的不精确；
    // 只有不精确跳转才允许落在关键帧上
    let search_ms = if request.accurate {
        (target_ms - ACCURATE_SEEK_MARGIN_MS).max(0)
    } else {
        target_ms
    };
    let rc = pipeline.seek(search_ms, request.forward, !request.accurate);
    if rc < 0 {
        warn!("{} ⚠️ 跳转失败，返回码 {}", log_ctx(), rc);
        shared
            .events
            .emit(PlayerEvent::SeekCompleted(SEEK_FAILED_SENTINEL));
    } else {
        // 精确跳转要走到确切时间戳；不精确跳转取落点后的下一可用帧
        let frame_pos = if request.accurate {
            target_ms
        } else {
            NEXT_FRAME_SENTINEL
        };
        pipeline.get_video_frame(frame_pos);
        pipeline.reset_frame_stats();
        pipeline.present_frame();
        shared.clock.set_time(target_ms);
        shared.events.emit(PlayerEvent::SeekCompleted(target_ms));
    }

    // 重启各路 demuxer，允许解码器继续填充缓冲
    pipeline.start_demuxer(StreamKind::Video);
    pipeline.start_demuxer(StreamKind::Audio);
    pipeline.start_demuxer(StreamKind::Data);
    pipeline.pause_on_queue_full();
}
