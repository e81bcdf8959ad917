//! 播放器控制核心
//!
//! 这个 crate 只拥有播放器的生命周期状态机与两个后台任务（播放任务、
//! Seek 任务）的调度；解码/解封装、渲染表面和 UI 都是通过窄接口消费的
//! 外部协作方（见 [`player::pipeline`]）。
//!
//! 并发模型：
//! - 四个传输命令在一把动作锁下全序执行；
//! - 播放任务与 Seek 任务各自单例，由状态机里的两个运行标志互斥；
//! - 跳转请求用单槽值合并，"最新的请求获胜"。

pub mod core;
pub mod player;

pub use crate::core::{
    MediaDesc, PlaybackClock, PlaybackMode, PlayerConfig, PlayerError, PlayerSnapshot,
    PlayerStatus, Result, SeekRequest, StopReason, StreamKind,
};
pub use crate::player::{
    BitmapSubtitle, LoopContext, MediaPipeline, NullHooks, PlaybackManager, PlayerEvent,
    ScreamerLoop, SubtitleBridge, SubtitleRect, SystemHooks,
};
