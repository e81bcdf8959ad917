use crate::core::{PlayerStatus, StopReason};
use parking_lot::{Condvar, Mutex, MutexGuard};

/// 受单一互斥量保护的状态机内核
///
/// 状态值与两个后台任务的运行标志放在同一把锁下，取代散落的原子标志 +
/// 临时锁组合。用户命令（在动作锁下）与后台任务（在各自收尾路径上）都
/// 通过这里修改状态；调用方要容忍后台任务发起的状态跃迁，重读状态而不是
/// 假设只有命令会改它。
pub struct StateInner {
    pub status: PlayerStatus,
    /// 播放任务存活期间为 true，收尾时无条件清除
    pub playback_task_active: bool,
    /// Seek 任务存活期间为 true，收尾时无条件清除
    pub seek_task_active: bool,
    /// 最近一次播放任务的错误分类（干净停止后清空）
    pub last_error: Option<StopReason>,
    /// 打开媒体成功后才允许 Play/Pause/Seek
    pub media_open: bool,
    pub duration_ms: i64,
    pub live: bool,
    pub osd: String,
    // 模式开关
    pub reverse: bool,
    pub loop_playback: bool,
    pub accurate_seek: bool,
    pub zero_latency: bool,
    pub auto_replay: bool,
}

pub struct SharedState {
    inner: Mutex<StateInner>,
    cond: Condvar,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StateInner {
                status: PlayerStatus::Stopped,
                playback_task_active: false,
                seek_task_active: false,
                last_error: None,
                media_open: false,
                duration_ms: 0,
                live: false,
                osd: String::new(),
                reverse: false,
                loop_playback: false,
                accurate_seek: false,
                zero_latency: false,
                auto_replay: false,
            }),
            cond: Condvar::new(),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock()
    }

    pub fn status(&self) -> PlayerStatus {
        self.inner.lock().status
    }

    /// 修改状态并唤醒等待者；返回是否真的发生了变更
    pub fn set_status(&self, status: PlayerStatus) -> bool {
        let mut inner = self.inner.lock();
        if inner.status == status {
            return false;
        }
        inner.status = status;
        self.cond.notify_all();
        true
    }

    pub fn set_playback_active(&self, active: bool) {
        let mut inner = self.inner.lock();
        inner.playback_task_active = active;
        self.cond.notify_all();
    }

    pub fn set_seek_active(&self, active: bool) {
        let mut inner = self.inner.lock();
        inner.seek_task_active = active;
        self.cond.notify_all();
    }

    /// 阻塞直到播放任务完全收尾（Pause 的等待路径）
    pub fn wait_playback_idle(&self) {
        let mut inner = self.inner.lock();
        while inner.playback_task_active {
            self.cond.wait(&mut inner);
        }
    }

    /// 阻塞直到两个后台任务都不在飞行中（Play 生成新任务前的等待路径）
    pub fn wait_all_idle(&self) {
        let mut inner = self.inner.lock();
        while inner.playback_task_active || inner.seek_task_active {
            self.cond.wait(&mut inner);
        }
    }

    /// 等到完全空闲后在同一临界区内占下播放任务标志，
    /// 杜绝两个 Play 路径同时生成播放任务
    pub fn wait_idle_and_claim_playback(&self) {
        let mut inner = self.inner.lock();
        while inner.playback_task_active || inner.seek_task_active {
            self.cond.wait(&mut inner);
        }
        inner.playback_task_active = true;
        self.cond.notify_all();
    }

    pub fn last_error(&self) -> Option<StopReason> {
        self.inner.lock().last_error
    }

    pub fn set_last_error(&self, error: Option<StopReason>) {
        self.inner.lock().last_error = error;
    }

    pub fn set_osd(&self, text: String) {
        self.inner.lock().osd = text;
    }

    /// 唤醒所有等待者；供在 lock() 临界区内直接改标志的调用方使用
    pub fn notify_all(&self) {
        self.cond.notify_all();
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

/// 任务运行标志的 RAII 守卫：不管任务怎么退出，标志都会被清除
///
/// 标志只允许被清除一次：任务若在锁内自行清了标志（排空循环的空槽
/// 退出路径），必须同时 disarm 本守卫，否则守卫析构会把后继任务刚
/// 置上的标志再踩回去
pub struct TaskFlagGuard<'a> {
    state: &'a SharedState,
    playback: bool,
    armed: bool,
}

impl<'a> TaskFlagGuard<'a> {
    /// 前置条件：对应标志已在生成任务前置为 true
    pub fn playback(state: &'a SharedState) -> Self {
        Self {
            state,
            playback: true,
            armed: true,
        }
    }

    pub fn seek(state: &'a SharedState) -> Self {
        Self {
            state,
            playback: false,
            armed: true,
        }
    }

    /// 解除守卫：标志已由任务在临界区内清除，析构不再动它
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TaskFlagGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.playback {
            self.state.set_playback_active(false);
        } else {
            self.state.set_seek_active(false);
        }
    }
}
