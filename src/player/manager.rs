use crate::core::{
    MediaDesc, PlaybackClock, PlayerConfig, PlayerSnapshot, PlayerStatus, SeekRequest, StopReason,
};
use crate::player::events::{EventHub, PlayerEvent};
use crate::player::pipeline::{MediaPipeline, NullHooks, ScreamerLoop, SystemHooks};
use crate::player::playback;
use crate::player::seek::{self, SeekSlot};
use crate::player::shared::PlayerShared;
use crate::player::state::SharedState;
use crate::player::subtitle::SubtitleBridge;
use crossbeam_channel::Receiver;
use log::{debug, info};
use parking_lot::Mutex;
use std::process;
use std::sync::Arc;
use std::thread;

fn log_ctx() -> String {
    format!("[pid:{}-tid:{:?}]", process::id(), thread::current().id())
}

/// 播放管理器 - 传输命令的总入口
///
/// 四个传输命令（Play/Pause/TogglePlayPause/Stop）在一把动作锁下全序执行；
/// 跳转命令不走动作锁（立即返回），通过单槽请求与两个运行标志和后台任务
/// 协调。后台任务可能不经动作锁改状态（Playing→Paused/Ended、Ended→Paused），
/// 调用方应重读状态而不是假设只有命令会改它。
pub struct PlaybackManager {
    shared: Arc<PlayerShared>,
    /// 动作锁：只保护四个传输入口
    actions: Mutex<()>,
}

impl PlaybackManager {
    pub fn new(pipeline: Arc<dyn MediaPipeline>, screamer: Arc<dyn ScreamerLoop>) -> Self {
        Self::with_hooks(pipeline, screamer, Arc::new(NullHooks))
    }

    pub fn with_hooks(
        pipeline: Arc<dyn MediaPipeline>,
        screamer: Arc<dyn ScreamerLoop>,
        hooks: Arc<dyn SystemHooks>,
    ) -> Self {
        info!("{} 🎮 创建播放管理器", log_ctx());
        Self {
            shared: Arc::new(PlayerShared {
                state: SharedState::new(),
                slot: SeekSlot::new(),
                clock: PlaybackClock::new(),
                subtitles: SubtitleBridge::new(),
                events: EventHub::new(),
                pipeline,
                screamer,
                hooks,
            }),
            actions: Mutex::new(()),
        }
    }

    /// 套用配置（跳转精度默认值、自动重播、字幕轨延迟）
    pub fn apply_config(&self, config: &PlayerConfig) {
        {
            let mut inner = self.shared.state.lock();
            inner.accurate_seek = config.accurate_seek;
            inner.auto_replay = config.auto_replay;
        }
        for (track, delay) in config.subtitle_delays_ms.iter().enumerate() {
            self.shared.subtitles.set_delay(track, *delay);
        }
    }

    /// 媒体打开成功后灌入描述信息，播放器进入 Paused 待命
    pub fn open(&self, desc: MediaDesc) {
        let _guard = self.actions.lock();
        info!("{} 📂 打开媒体: {:?}", log_ctx(), desc);

        // 先停掉当前播放，等两个后台任务都退场
        self.shared.set_status_notify(PlayerStatus::Stopped);
        self.shared.state.wait_all_idle();

        self.shared.pipeline.initialize();
        self.shared.slot.take();
        self.shared.subtitles.clear_all();
        self.shared.clock.pause();
        self.shared.clock.set_time(0);

        {
            let mut inner = self.shared.state.lock();
            inner.media_open = true;
            inner.duration_ms = desc.duration_ms;
            inner.live = desc.live;
            inner.zero_latency = desc.zero_latency;
            inner.last_error = None;
        }
        self.shared.set_status_notify(PlayerStatus::Paused);
    }

    /// 播放
    ///
    /// 仅在 Stopped/Paused 且媒体已打开时生效，否则静默忽略；
    /// 阻塞调用方直到没有播放/Seek 任务在飞行中，然后生成新的播放任务
    pub fn play(&self) {
        let _guard = self.actions.lock();
        if playback::start(&self.shared) {
            info!("{} 🎬 播放", log_ctx());
        } else {
            debug!("{} 前置条件不满足，Play 忽略", log_ctx());
        }
    }

    /// 暂停
    ///
    /// 状态立即落为 Paused（UI 即时反映意图），随后阻塞调用线程直到
    /// 播放任务完全收尾，保证返回后没有解码/渲染活动与后续命令竞争
    pub fn pause(&self) {
        let _guard = self.actions.lock();
        {
            let inner = self.shared.state.lock();
            if !inner.media_open || inner.status == PlayerStatus::Ended {
                return;
            }
        }
        info!("{} ⏸️ 暂停", log_ctx());
        self.shared.set_status_notify(PlayerStatus::Paused);
        self.shared.clock.pause();
        self.shared.state.wait_playback_idle();
    }

    /// 按当前状态分派到 Play 或 Pause
    pub fn toggle_play_pause(&self) {
        if self.shared.state.status() == PlayerStatus::Playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// 停止：把播放状态完全复位（等价于重建管线），清掉渲染表面
    ///
    /// 不同步杀掉飞行中的 Seek 任务；它在下一轮循环观察到 Stopped 后退出
    pub fn stop(&self) {
        let _guard = self.actions.lock();
        info!("{} ⏹️ 停止播放", log_ctx());
        self.shared.set_status_notify(PlayerStatus::Stopped);
        self.shared.slot.take();
        // 帧缓冲与渲染表面在播放任务运行期间归它所有，
        // 等它完全收尾再动管线
        self.shared.state.wait_playback_idle();
        self.shared.pipeline.flush();
        self.shared.pipeline.initialize();
        self.shared.pipeline.clear_surface();
        self.shared.subtitles.clear_all();
        self.shared.clock.pause();
        self.shared.clock.set_time(0);
        self.shared.state.set_last_error(None);
    }

    /// 清空解码缓冲（不动状态机）
    pub fn flush(&self) {
        self.shared.pipeline.flush();
    }

    /// 近似跳转：落到 target_ms 附近的关键帧，forward 是方向提示
    ///
    /// 开了精确跳转默认值（ToggleSeekAccurate）时按精确跳转处理
    pub fn seek(&self, target_ms: i64, forward: bool) {
        let accurate = self.shared.state.lock().accurate_seek;
        self.enqueue(SeekRequest::new(target_ms, forward, accurate));
    }

    /// 精确跳转到毫秒值；track >= 0 时叠加该字幕轨的延迟偏移
    pub fn seek_accurate_ms(&self, target_ms: i64, track: i32) {
        let target = if track >= 0 {
            target_ms + self.shared.subtitles.delay(track as usize)
        } else {
            target_ms
        };
        self.enqueue(SeekRequest::new(target, false, true));
    }

    /// 按微秒级时间值精确跳转
    ///
    /// 给定字幕轨时，亚毫秒余量向上取整 1ms，避免命中意图条目前面那条字幕
    pub fn seek_accurate_ts(&self, ts_us: i64, track: i32) {
        let target = if track >= 0 {
            seek::accurate_target_ms(ts_us, self.shared.subtitles.delay(track as usize))
        } else {
            ts_us / 1000
        };
        self.enqueue(SeekRequest::new(target, false, true));
    }

    /// 跳转入队：抢先更新时间估计，按需生成 Seek 任务后立即返回
    fn enqueue(&self, request: SeekRequest) {
        {
            let inner = self.shared.state.lock();
            if !inner.media_open {
                debug!("{} 未打开媒体，跳转忽略", log_ctx());
                return;
            }
            // 停止态的请求反正会被排空循环丢弃，这里直接拒收，
            // 时间估计也保持在复位后的 0
            if inner.status == PlayerStatus::Stopped {
                debug!("{} 播放器已停止，跳转忽略", log_ctx());
                return;
            }
        }
        info!(
            "{} ⏩ 跳转入队: {}ms (accurate={})",
            log_ctx(),
            request.target_ms,
            request.accurate
        );

        // 抢先更新对外时间估计，跳转完成前 UI 就有即时反馈
        self.shared.clock.set_time(request.target_ms);
        self.shared.slot.push(request);

        // 播放中：正在跑的实时循环按自己的节奏取走请求，不生成任务
        if self.shared.state.status() == PlayerStatus::Playing {
            return;
        }
        seek::ensure_task(&self.shared);
    }

    pub fn toggle_reverse_playback(&self) {
        let enabled = {
            let mut inner = self.shared.state.lock();
            inner.reverse = !inner.reverse;
            inner.reverse
        };
        self.publish_osd(if enabled { "倒放: 开" } else { "倒放: 关" });
    }

    pub fn toggle_loop_playback(&self) {
        let enabled = {
            let mut inner = self.shared.state.lock();
            inner.loop_playback = !inner.loop_playback;
            inner.loop_playback
        };
        self.publish_osd(if enabled {
            "循环播放: 开"
        } else {
            "循环播放: 关"
        });
    }

    pub fn toggle_seek_accurate(&self) {
        let enabled = {
            let mut inner = self.shared.state.lock();
            inner.accurate_seek = !inner.accurate_seek;
            inner.accurate_seek
        };
        self.publish_osd(if enabled {
            "精确跳转: 开"
        } else {
            "精确跳转: 关"
        });
    }

    /// 清空所有字幕轨
    pub fn subtitle_clear(&self) {
        self.shared.subtitles.clear_all();
    }

    /// 清空单条字幕轨
    pub fn subtitle_clear_track(&self, track: usize) {
        self.shared.subtitles.clear_track(track);
    }

    pub fn set_subtitle_delay(&self, track: usize, delay_ms: i64) {
        self.shared.subtitles.set_delay(track, delay_ms);
    }

    /// 字幕显示桥（UI 数据绑定读取各轨显示状态）
    pub fn subtitles(&self) -> &SubtitleBridge {
        &self.shared.subtitles
    }

    // ---------- 可观测值 ----------

    pub fn status(&self) -> PlayerStatus {
        self.shared.state.status()
    }

    pub fn position_ms(&self) -> i64 {
        self.shared.clock.now()
    }

    pub fn duration_ms(&self) -> i64 {
        self.shared.state.lock().duration_ms
    }

    pub fn remaining_ms(&self) -> i64 {
        let duration = self.duration_ms();
        self.shared.clock.remaining(duration)
    }

    pub fn last_error(&self) -> Option<StopReason> {
        self.shared.state.last_error()
    }

    pub fn osd(&self) -> String {
        self.shared.state.lock().osd.clone()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let inner = self.shared.state.lock();
        let position = self.shared.clock.now();
        PlayerSnapshot {
            status: inner.status,
            position_ms: position,
            duration_ms: inner.duration_ms,
            remaining_ms: (inner.duration_ms - position).max(0),
            osd: inner.osd.clone(),
            last_error: inner.last_error,
        }
    }

    /// 订阅对外通知（停止原因、跳转完成、状态变更等）
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.shared.events.subscribe()
    }

    fn publish_osd(&self, text: &str) {
        self.shared.state.set_osd(text.to_string());
        self.shared.events.emit(PlayerEvent::Osd(text.to_string()));
    }
}

impl Drop for PlaybackManager {
    fn drop(&mut self) {
        // 让两个后台任务观察到 Stopped 后自行退出
        self.shared.set_status_notify(PlayerStatus::Stopped);
        self.shared.slot.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PlaybackMode, Result, StreamKind};
    use crate::player::playback::LoopContext;
    use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU64, Ordering};
    use std::time::{Duration, Instant};

    /// 可编程的管线桩：记录调用、回放预设的状态位
    struct MockPipeline {
        seeks: Mutex<Vec<i64>>,
        audio_seeks: Mutex<Vec<i64>>,
        calls: Mutex<Vec<&'static str>>,
        has_video: AtomicBool,
        end_of_stream: AtomicBool,
        timed_out: AtomicBool,
        buffering_started: AtomicU32,
        buffering_completed: AtomicU32,
        seek_rc: AtomicI32,
        seek_delay_ms: AtomicU64,
        /// 实时循环运行期间为 true（由 IdleLoop 维护）
        loop_running: AtomicBool,
        /// Seek 任务在循环运行期间触碰了解码状态
        overlap: AtomicBool,
    }

    impl MockPipeline {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seeks: Mutex::new(Vec::new()),
                audio_seeks: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
                has_video: AtomicBool::new(true),
                end_of_stream: AtomicBool::new(false),
                timed_out: AtomicBool::new(false),
                buffering_started: AtomicU32::new(0),
                buffering_completed: AtomicU32::new(0),
                seek_rc: AtomicI32::new(0),
                seek_delay_ms: AtomicU64::new(0),
                loop_running: AtomicBool::new(false),
                overlap: AtomicBool::new(false),
            })
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().push(call);
        }
    }

    impl MediaPipeline for MockPipeline {
        fn seek(&self, target_ms: i64, _forward: bool, _keyframe_only: bool) -> i32 {
            if self.loop_running.load(Ordering::SeqCst) {
                self.overlap.store(true, Ordering::SeqCst);
            }
            let delay = self.seek_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                thread::sleep(Duration::from_millis(delay));
            }
            self.seeks.lock().push(target_ms);
            self.seek_rc.load(Ordering::SeqCst)
        }

        fn seek_audio(&self, target_ms: i64, _forward: bool) -> i32 {
            self.audio_seeks.lock().push(target_ms);
            self.seek_rc.load(Ordering::SeqCst)
        }

        fn get_video_frame(&self, _position_ms: i64) {
            self.record("get_video_frame");
        }
        fn pause_decoders(&self) {
            self.record("pause_decoders");
        }
        fn pause_on_queue_full(&self) {
            self.record("pause_on_queue_full");
        }
        fn flush(&self) {
            if self.loop_running.load(Ordering::SeqCst) {
                self.overlap.store(true, Ordering::SeqCst);
            }
            self.record("flush");
        }
        fn initialize(&self) {
            if self.loop_running.load(Ordering::SeqCst) {
                self.overlap.store(true, Ordering::SeqCst);
            }
            self.record("initialize");
        }
        fn release_frames(&self) {
            self.record("release_frames");
        }
        fn start_demuxer(&self, _stream: StreamKind) {
            self.record("start_demuxer");
        }
        fn has_video(&self) -> bool {
            self.has_video.load(Ordering::SeqCst)
        }
        fn end_of_stream(&self) -> bool {
            self.end_of_stream.load(Ordering::SeqCst)
        }
        fn timed_out(&self) -> bool {
            self.timed_out.load(Ordering::SeqCst)
        }
        fn buffering_started(&self) -> u32 {
            self.buffering_started.load(Ordering::SeqCst)
        }
        fn buffering_completed(&self) -> u32 {
            self.buffering_completed.load(Ordering::SeqCst)
        }
        fn reset_buffering(&self) {
            self.record("reset_buffering");
        }
        fn reset_frame_stats(&self) {
            self.record("reset_frame_stats");
        }
        fn present_frame(&self) {
            self.record("present_frame");
        }
        fn clear_surface(&self) {
            if self.loop_running.load(Ordering::SeqCst) {
                self.overlap.store(true, Ordering::SeqCst);
            }
            self.record("clear_surface");
        }
    }

    /// 跑到被暂停为止的循环桩：消化排队跳转（只动时钟，不碰管线）
    struct IdleLoop {
        pipeline: Arc<MockPipeline>,
        /// 循环启动瞬间 Seek 任务仍在飞行中（互斥被破坏）
        seek_active_at_start: AtomicBool,
    }

    impl IdleLoop {
        fn new(pipeline: Arc<MockPipeline>) -> Arc<Self> {
            Arc::new(Self {
                pipeline,
                seek_active_at_start: AtomicBool::new(false),
            })
        }
    }

    impl ScreamerLoop for IdleLoop {
        fn run(&self, _mode: PlaybackMode, ctx: &LoopContext<'_>) -> Result<()> {
            if ctx.shared.state.lock().seek_task_active {
                self.seek_active_at_start.store(true, Ordering::SeqCst);
            }
            self.pipeline.loop_running.store(true, Ordering::SeqCst);
            while ctx.should_run() {
                if let Some(request) = ctx.take_seek() {
                    ctx.clock().set_time(request.target_ms);
                }
                thread::sleep(Duration::from_millis(1));
            }
            self.pipeline.loop_running.store(false, Ordering::SeqCst);
            Ok(())
        }
    }

    /// 记录每次启动时被指派运行模式的循环桩
    struct RecordingLoop {
        modes: Mutex<Vec<PlaybackMode>>,
    }

    impl RecordingLoop {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                modes: Mutex::new(Vec::new()),
            })
        }
    }

    impl ScreamerLoop for RecordingLoop {
        fn run(&self, mode: PlaybackMode, ctx: &LoopContext<'_>) -> Result<()> {
            self.modes.lock().push(mode);
            while ctx.should_run() {
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        }
    }

    /// 立即退出的循环桩：模拟实时循环自己停下（分类器路径）
    struct EndingLoop {
        stop_position_ms: i64,
    }

    impl ScreamerLoop for EndingLoop {
        fn run(&self, _mode: PlaybackMode, ctx: &LoopContext<'_>) -> Result<()> {
            ctx.clock().set_time(self.stop_position_ms);
            Ok(())
        }
    }

    fn wait_until<F: Fn() -> bool>(cond: F, timeout_ms: u64) -> bool {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    fn desc_60s() -> MediaDesc {
        MediaDesc {
            duration_ms: 60_000,
            live: false,
            zero_latency: false,
        }
    }

    #[test]
    fn test_play_without_open_is_noop() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline));
        manager.play();
        assert_eq!(manager.status(), PlayerStatus::Stopped);
    }

    #[test]
    fn test_pause_is_idempotent_and_does_not_block() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline));
        manager.open(desc_60s());

        let begin = Instant::now();
        manager.pause();
        manager.pause();
        manager.pause();
        assert_eq!(manager.status(), PlayerStatus::Paused);
        // 没有播放任务在飞行中，重复 Pause 不得阻塞
        assert!(begin.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_rapid_seeks_coalesce_to_most_recent() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline.clone()));
        let events = manager.subscribe();
        manager.open(desc_60s());

        manager.seek(1000, false);
        manager.seek(2000, false);
        manager.seek(3000, false);

        assert!(wait_until(
            || !manager.shared.state.lock().seek_task_active && manager.shared.slot.is_empty(),
            2000
        ));

        // 管线只见过 3000，1000/2000 被合并丢弃
        assert_eq!(*pipeline.seeks.lock(), vec![3000]);

        let completions: Vec<_> = events
            .try_iter()
            .filter(|e| matches!(e, PlayerEvent::SeekCompleted(_)))
            .collect();
        assert_eq!(completions, vec![PlayerEvent::SeekCompleted(3000)]);
    }

    #[test]
    fn test_seek_failure_reports_sentinel() {
        let pipeline = MockPipeline::new();
        pipeline.seek_rc.store(-1, Ordering::SeqCst);
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline.clone()));
        let events = manager.subscribe();
        manager.open(desc_60s());

        manager.seek(5000, false);
        assert!(wait_until(
            || !manager.shared.state.lock().seek_task_active,
            2000
        ));

        let completions: Vec<_> = events
            .try_iter()
            .filter(|e| matches!(e, PlayerEvent::SeekCompleted(_)))
            .collect();
        assert_eq!(completions, vec![PlayerEvent::SeekCompleted(-1)]);
        // 跳转失败不改变播放状态
        assert_eq!(manager.status(), PlayerStatus::Paused);
    }

    #[test]
    fn test_audio_only_seek_path() {
        let pipeline = MockPipeline::new();
        pipeline.has_video.store(false, Ordering::SeqCst);
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline.clone()));
        manager.open(desc_60s());

        manager.seek(8000, false);
        assert!(wait_until(
            || !manager.shared.state.lock().seek_task_active,
            2000
        ));

        assert_eq!(*pipeline.audio_seeks.lock(), vec![8000]);
        assert!(pipeline.seeks.lock().is_empty());
    }

    #[test]
    fn test_seek_while_playing_leaves_request_to_loop() {
        let pipeline = MockPipeline::new();
        let screamer = IdleLoop::new(pipeline.clone());
        let manager = PlaybackManager::new(pipeline.clone(), screamer.clone());
        manager.open(desc_60s());
        manager.play();
        assert_eq!(manager.status(), PlayerStatus::Playing);

        manager.seek(5000, false);
        // 播放中不生成 Seek 任务
        assert!(!manager.shared.state.lock().seek_task_active);
        // 循环自己消化请求
        assert!(wait_until(|| manager.position_ms() == 5000, 2000));
        assert!(pipeline.seeks.lock().is_empty());

        manager.pause();
        assert_eq!(manager.status(), PlayerStatus::Paused);
    }

    #[test]
    fn test_play_never_spawns_loop_while_seek_task_active() {
        let pipeline = MockPipeline::new();
        pipeline.seek_delay_ms.store(30, Ordering::SeqCst);
        let screamer = IdleLoop::new(pipeline.clone());
        let manager = PlaybackManager::new(pipeline.clone(), screamer.clone());
        manager.open(desc_60s());

        manager.seek(1000, false);
        manager.play();

        assert!(wait_until(
            || pipeline.loop_running.load(Ordering::SeqCst),
            2000
        ));
        assert!(!pipeline.overlap.load(Ordering::SeqCst));
        assert!(!screamer.seek_active_at_start.load(Ordering::SeqCst));

        manager.pause();
        assert!(!manager.shared.state.lock().playback_task_active);
    }

    #[test]
    fn test_end_of_stream_classifies_as_ended() {
        let pipeline = MockPipeline::new();
        pipeline.end_of_stream.store(true, Ordering::SeqCst);
        let manager = PlaybackManager::new(
            pipeline.clone(),
            Arc::new(EndingLoop {
                stop_position_ms: 60_000,
            }),
        );
        let events = manager.subscribe();
        manager.open(desc_60s());
        manager.play();

        assert!(wait_until(|| manager.status() == PlayerStatus::Ended, 2000));
        assert!(manager.last_error().is_none());
        assert!(events
            .try_iter()
            .any(|e| e == PlayerEvent::Stopped(None)));
    }

    #[test]
    fn test_timeout_classification() {
        let pipeline = MockPipeline::new();
        pipeline.timed_out.store(true, Ordering::SeqCst);
        let manager = PlaybackManager::new(
            pipeline.clone(),
            Arc::new(EndingLoop {
                stop_position_ms: 10_000,
            }),
        );
        let events = manager.subscribe();
        manager.open(desc_60s());
        manager.play();

        assert!(wait_until(
            || manager.status() == PlayerStatus::Paused,
            2000
        ));
        assert_eq!(manager.last_error(), Some(StopReason::Timeout));
        assert!(events
            .try_iter()
            .any(|e| e == PlayerEvent::Stopped(Some(StopReason::Timeout))));
    }

    #[test]
    fn test_buffering_starvation_classification() {
        let pipeline = MockPipeline::new();
        pipeline.buffering_started.store(2, Ordering::SeqCst);
        pipeline.buffering_completed.store(1, Ordering::SeqCst);
        let manager = PlaybackManager::new(
            pipeline.clone(),
            Arc::new(EndingLoop {
                stop_position_ms: 10_000,
            }),
        );
        let events = manager.subscribe();
        manager.open(desc_60s());
        manager.play();

        assert!(wait_until(
            || manager.status() == PlayerStatus::Paused,
            2000
        ));
        assert_eq!(manager.last_error(), Some(StopReason::UnexpectedStop));

        let received: Vec<_> = events.try_iter().collect();
        assert!(received
            .iter()
            .any(|e| *e == PlayerEvent::BufferingCompleted(Some(StopReason::UnexpectedStop))));
        assert!(received
            .iter()
            .any(|e| *e == PlayerEvent::Stopped(Some(StopReason::UnexpectedStop))));
    }

    #[test]
    fn test_stop_within_tolerance_is_clean_pause() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(
            pipeline.clone(),
            Arc::new(EndingLoop {
                stop_position_ms: 59_800,
            }),
        );
        let events = manager.subscribe();
        manager.open(desc_60s());
        manager.play();

        assert!(wait_until(
            || manager.status() == PlayerStatus::Paused,
            2000
        ));
        assert!(manager.last_error().is_none());
        assert!(events.try_iter().any(|e| e == PlayerEvent::Stopped(None)));
    }

    #[test]
    fn test_seek_after_ended_returns_to_paused_and_auto_replays() {
        let pipeline = MockPipeline::new();
        pipeline.end_of_stream.store(true, Ordering::SeqCst);
        let manager = PlaybackManager::new(
            pipeline.clone(),
            Arc::new(EndingLoop {
                stop_position_ms: 60_000,
            }),
        );
        manager.apply_config(&PlayerConfig {
            auto_replay: true,
            ..Default::default()
        });
        manager.open(desc_60s());
        manager.play();
        assert!(wait_until(|| manager.status() == PlayerStatus::Ended, 2000));

        // 跳转把 Ended 拉回 Paused，排空结束后自动重播
        pipeline.end_of_stream.store(false, Ordering::SeqCst);
        manager.seek(1000, false);
        assert!(wait_until(
            || manager.status() != PlayerStatus::Ended,
            2000
        ));
        assert!(wait_until(
            || !manager.shared.state.lock().seek_task_active,
            2000
        ));
        assert_eq!(*pipeline.seeks.lock(), vec![1000]);
    }

    #[test]
    fn test_stop_resets_and_discards_pending_seeks() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline.clone()));
        manager.open(desc_60s());

        manager.seek(9000, false);
        manager.stop();

        assert_eq!(manager.status(), PlayerStatus::Stopped);
        assert_eq!(manager.position_ms(), 0);
        assert!(wait_until(
            || !manager.shared.state.lock().seek_task_active,
            2000
        ));
        // flush + initialize + clear_surface 都走到了
        let calls = pipeline.calls.lock();
        assert!(calls.contains(&"flush"));
        assert!(calls.contains(&"clear_surface"));
    }

    #[test]
    fn test_stop_waits_for_loop_before_touching_pipeline() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline.clone()));
        manager.open(desc_60s());
        manager.play();
        assert!(wait_until(
            || pipeline.loop_running.load(Ordering::SeqCst),
            2000
        ));

        manager.stop();

        assert_eq!(manager.status(), PlayerStatus::Stopped);
        assert!(!manager.shared.state.lock().playback_task_active);
        // flush/initialize/clear_surface 都发生在循环退出之后
        assert!(!pipeline.overlap.load(Ordering::SeqCst));
        let calls = pipeline.calls.lock();
        assert!(calls.contains(&"flush"));
        assert!(calls.contains(&"clear_surface"));
    }

    #[test]
    fn test_seek_while_stopped_is_refused_and_keeps_position_zero() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline.clone()));
        manager.open(desc_60s());
        manager.stop();

        manager.seek(5000, false);

        // 拒收：时间估计留在复位后的 0，不生成任务也不进槽
        assert_eq!(manager.position_ms(), 0);
        assert!(manager.shared.slot.is_empty());
        assert!(!manager.shared.state.lock().seek_task_active);
        assert!(pipeline.seeks.lock().is_empty());
    }

    #[test]
    fn test_mode_dispatch_follows_toggles() {
        let pipeline = MockPipeline::new();
        let screamer = RecordingLoop::new();
        let manager = PlaybackManager::new(pipeline.clone(), screamer.clone());
        manager.open(desc_60s());

        manager.play();
        manager.pause();

        manager.toggle_reverse_playback();
        manager.play();
        manager.pause();

        // 无视频轨时优先纯音频模式
        pipeline.has_video.store(false, Ordering::SeqCst);
        manager.play();
        manager.pause();

        // 零延迟流压过倒放开关
        pipeline.has_video.store(true, Ordering::SeqCst);
        manager.open(MediaDesc {
            duration_ms: 60_000,
            live: true,
            zero_latency: true,
        });
        manager.play();
        manager.pause();

        assert_eq!(
            *screamer.modes.lock(),
            vec![
                PlaybackMode::Forward,
                PlaybackMode::Reverse,
                PlaybackMode::AudioOnly,
                PlaybackMode::ZeroLatency,
            ]
        );
    }

    #[test]
    fn test_toggles_publish_osd() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline));
        let events = manager.subscribe();

        manager.toggle_seek_accurate();
        assert_eq!(manager.osd(), "精确跳转: 开");
        manager.toggle_seek_accurate();
        assert_eq!(manager.osd(), "精确跳转: 关");
        manager.toggle_reverse_playback();
        manager.toggle_loop_playback();

        let osd_count = events
            .try_iter()
            .filter(|e| matches!(e, PlayerEvent::Osd(_)))
            .count();
        assert_eq!(osd_count, 4);
    }

    #[test]
    fn test_accurate_default_makes_plain_seek_accurate() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline.clone()));
        manager.open(desc_60s());
        manager.toggle_seek_accurate();

        manager.seek(10_000, true);
        assert!(wait_until(
            || !manager.shared.state.lock().seek_task_active,
            2000
        ));

        // 精确跳转：搜索目标提前一个安全量
        assert_eq!(
            *pipeline.seeks.lock(),
            vec![10_000 - crate::core::ACCURATE_SEEK_MARGIN_MS]
        );
    }

    #[test]
    fn test_snapshot_reflects_clock_and_duration() {
        let pipeline = MockPipeline::new();
        let manager = PlaybackManager::new(pipeline.clone(), IdleLoop::new(pipeline));
        manager.open(desc_60s());
        manager.seek(15_000, false);

        // 入队即抢先更新时间估计
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.position_ms, 15_000);
        assert_eq!(snapshot.remaining_ms, 45_000);
        assert_eq!(snapshot.duration_ms, 60_000);
    }
}
