use serde::{Deserialize, Serialize};
use std::fmt;

/// 正向播放停靠点容差（毫秒）：停在距离自然终点 300ms 以内视为干净停止
pub const STOP_TOLERANCE_MS: i64 = 300;

/// 精确跳转的安全提前量（毫秒）：补偿解码层向后跳转的不精确
pub const ACCURATE_SEEK_MARGIN_MS: i64 = 200;

/// Seek 任务排空循环的节流间隔（毫秒），用于合并密集的跳转请求
pub const SEEK_DRAIN_SLEEP_MS: u64 = 50;

/// 取帧哨兵值：表示"下一可用帧"而不是某个具体时间戳
pub const NEXT_FRAME_SENTINEL: i64 = -1;

/// 跳转失败时 seek-completed 通知携带的哨兵值
pub const SEEK_FAILED_SENTINEL: i64 = -1;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Stopped,
    Paused,
    Playing,
    /// 终态：播放到自然结尾。新的 Play 或跳转会把它拉回 Paused/Playing
    Ended,
}

/// 实时循环的运行模式，由播放任务在入口处选定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackMode {
    /// 无视频轨，仅驱动音频管线
    AudioOnly,
    /// 零延迟流（直播监控类），不做缓冲等待
    ZeroLatency,
    /// 倒放
    Reverse,
    /// 标准正向播放（音视频同步）
    Forward,
}

/// 媒体流类别（启动 demuxer 用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Data,
}

/// 一次跳转请求
///
/// accurate 与 forward 互斥：精确跳转总是走到确切时间戳，方向提示无意义
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekRequest {
    pub target_ms: i64,
    pub forward: bool,
    pub accurate: bool,
}

impl SeekRequest {
    pub fn new(target_ms: i64, forward: bool, accurate: bool) -> Self {
        Self {
            target_ms,
            forward: if accurate { false } else { forward },
            accurate,
        }
    }
}

/// 播放任务退出后的停止原因分类
///
/// None（干净停止/播完）不在此枚举内：通知携带 Option<StopReason>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Timeout,
    UnexpectedStop,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Timeout => "Timeout",
            StopReason::UnexpectedStop => "Playback stopped unexpectedly",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 打开媒体后由上层灌入的描述信息
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MediaDesc {
    /// 总时长（毫秒）；直播流可为 0
    pub duration_ms: i64,
    /// 是否为直播流（无自然终点）
    pub live: bool,
    /// 是否按零延迟模式驱动实时循环
    pub zero_latency: bool,
}

impl Default for MediaDesc {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            live: false,
            zero_latency: false,
        }
    }
}

/// 控制核心的可配置项
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// 播完（Ended）后若被跳转拉回，排空结束时自动重新播放
    pub auto_replay: bool,
    /// 普通 Seek 默认按精确跳转处理（ToggleSeekAccurate 翻转此值）
    pub accurate_seek: bool,
    /// 各字幕轨的延迟偏移（毫秒）
    pub subtitle_delays_ms: Vec<i64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            auto_replay: false,
            accurate_seek: false,
            subtitle_delays_ms: Vec::new(),
        }
    }
}

/// 对外可观测的一次性状态快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub status: PlayerStatus,
    pub position_ms: i64,
    pub duration_ms: i64,
    pub remaining_ms: i64,
    pub osd: String,
    pub last_error: Option<StopReason>,
}
