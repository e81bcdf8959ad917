use crate::core::{PlaybackMode, Result, StreamKind};

/// 解码/解封装管线契约
///
/// 控制核心只负责调度：什么时候 seek、什么时候暂停解码器、什么时候重启
/// demuxer；具体的容器解析与解码由外部实现（FFmpeg 封装等）提供。
/// 所有方法都要求可跨线程调用：播放任务与 Seek 任务各自运行在独立线程，
/// 但二者绝不会同时处于触碰解码状态的阶段（见 manager 的互斥约定）。
pub trait MediaPipeline: Send + Sync {
    /// 重定位到 target_ms 附近。
    /// keyframe_only 为 true 时允许落在最近的关键帧上（不精确跳转）；
    /// 返回负值表示失败。
    fn seek(&self, target_ms: i64, forward: bool, keyframe_only: bool) -> i32;

    /// 纯音频管线的重定位，返回负值表示失败
    fn seek_audio(&self, target_ms: i64, forward: bool) -> i32;

    /// 解码 position_ms 处（或其后）的一帧视频；
    /// 传入 NEXT_FRAME_SENTINEL 表示"下一可用帧"
    fn get_video_frame(&self, position_ms: i64);

    /// 暂停所有解码器
    fn pause_decoders(&self);

    /// 允许解码器继续填充缓冲，填满即暂停
    fn pause_on_queue_full(&self);

    /// 清空解码缓冲与包队列
    fn flush(&self);

    /// 重建管线到刚打开的状态
    fn initialize(&self);

    /// 释放不归渲染器所有的帧资源（实时循环退出后的清理）
    fn release_frames(&self);

    /// 启动某一路流的 demuxer
    fn start_demuxer(&self, stream: StreamKind);

    /// 当前是否打开了视频轨
    fn has_video(&self) -> bool;

    /// 解码器是否已给出流结束信号
    fn end_of_stream(&self) -> bool;

    /// demuxer 的中断器是否报告了超时
    fn timed_out(&self) -> bool;

    /// 缓冲周期开始计数
    fn buffering_started(&self) -> u32;

    /// 缓冲周期完成计数
    fn buffering_completed(&self) -> u32;

    /// 重置缓冲计数（播放任务入口处调用）
    fn reset_buffering(&self);

    /// 重置帧率统计（跳转后单帧渲染前调用）
    fn reset_frame_stats(&self);

    /// 把最近解码的一帧送上渲染表面
    fn present_frame(&self);

    /// 清空渲染表面（Stop 时调用）
    fn clear_surface(&self);
}

/// 实时循环（screamer loop）契约
///
/// 拉取已解码的帧并按同步时钟定节奏呈现。内部的调度算法不属于控制核心；
/// 控制核心只选择跑哪个模式、拥有它的生命周期。实现方应当：
/// - 仅在 ctx.should_run() 为 true 期间继续循环；
/// - 播放中通过 ctx.take_seek() 自行消化排队的跳转请求；
/// - 以 Err 返回内部意外失败，清理与分类由调用方兜底。
pub trait ScreamerLoop: Send + Sync {
    fn run(&self, mode: PlaybackMode, ctx: &crate::player::playback::LoopContext<'_>) -> Result<()>;
}

/// 操作系统侧的实时化开关：提高定时器精度、保持设备唤醒
pub trait SystemHooks: Send + Sync {
    fn begin_realtime(&self);
    fn end_realtime(&self);
}

/// 默认空实现（无平台集成时使用）
pub struct NullHooks;

impl SystemHooks for NullHooks {
    fn begin_realtime(&self) {}
    fn end_realtime(&self) {}
}
