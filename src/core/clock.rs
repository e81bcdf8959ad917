use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// 播放时钟 - 对外可观测的"当前时间"估计
///
/// 跳转时会被抢先设置到目标位置，让 UI 在跳转真正完成前就得到即时反馈；
/// 实际播放时由实时循环推进/校正。
#[derive(Clone)]
pub struct PlaybackClock {
    inner: Arc<Mutex<ClockInner>>,
}

struct ClockInner {
    base_ms: i64,          // 基准位置（毫秒）
    base_instant: Instant, // 基准时刻
    paused: bool,
    paused_at: i64, // 暂停时的位置
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockInner {
                base_ms: 0,
                base_instant: Instant::now(),
                paused: true,
                paused_at: 0,
            })),
        }
    }

    /// 获取当前播放时间（毫秒）
    pub fn now(&self) -> i64 {
        let inner = self.inner.lock();
        Self::now_unlocked(&inner)
    }

    /// 距离给定总时长的剩余时间（毫秒），不为负
    pub fn remaining(&self, duration_ms: i64) -> i64 {
        (duration_ms - self.now()).max(0)
    }

    /// 设置播放位置（跳转时的抢先更新）
    pub fn set_time(&self, position_ms: i64) {
        let mut inner = self.inner.lock();
        inner.base_ms = position_ms;
        inner.base_instant = Instant::now();
        inner.paused_at = position_ms;
    }

    /// 开始推进
    pub fn play(&self) {
        let mut inner = self.inner.lock();
        if inner.paused {
            inner.base_ms = inner.paused_at;
            inner.base_instant = Instant::now();
            inner.paused = false;
        }
    }

    /// 暂停推进
    pub fn pause(&self) {
        let mut inner = self.inner.lock();
        if !inner.paused {
            inner.paused_at = Self::now_unlocked(&inner);
            inner.paused = true;
        }
    }

    /// 是否暂停
    pub fn is_paused(&self) -> bool {
        self.inner.lock().paused
    }

    fn now_unlocked(inner: &ClockInner) -> i64 {
        if inner.paused {
            inner.paused_at
        } else {
            inner.base_ms + inner.base_instant.elapsed().as_millis() as i64
        }
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}
