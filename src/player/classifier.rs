use crate::core::{StopReason, STOP_TOLERANCE_MS};
use log::{info, warn};

/// 播放任务退出时采集的管线/状态切面
#[derive(Debug, Clone, Copy)]
pub struct StopContext {
    pub end_of_stream: bool,
    pub timed_out: bool,
    pub buffering_started: u32,
    pub buffering_completed: u32,
    pub reverse: bool,
    pub live: bool,
    pub position_ms: i64,
    pub duration_ms: i64,
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopClassification {
    /// 解码器给出流结束信号：状态置 Ended，无错误
    Ended,
    /// 停在自然停靠点容差内：视为干净暂停
    CleanPause,
    /// 异常停止；buffering_aborted 为 true 时需补发缓冲完成通知
    Error {
        reason: StopReason,
        buffering_aborted: bool,
    },
}

/// 实时循环退出后的事后分类
///
/// 仅在退出时状态仍为 Playing（即不是暂停/停止命令导致的退出）时调用。
/// 判定顺序：流结束 > 中断器超时 > 未完成的缓冲周期 > 停靠位置检查。
pub fn classify(ctx: &StopContext) -> StopClassification {
    if ctx.end_of_stream {
        info!("🏁 解码器报告流结束，按播完处理");
        return StopClassification::Ended;
    }

    if ctx.timed_out {
        warn!("⏱️ demuxer 中断器报告超时");
        return StopClassification::Error {
            reason: StopReason::Timeout,
            buffering_aborted: false,
        };
    }

    // 开始了一个缓冲周期却从未完成：饥饿导致的意外停止
    if ctx.buffering_started == ctx.buffering_completed + 1 {
        warn!(
            "📉 缓冲周期未完成 (开始 {} / 完成 {})，判定为意外停止",
            ctx.buffering_started, ctx.buffering_completed
        );
        return StopClassification::Error {
            reason: StopReason::UnexpectedStop,
            buffering_aborted: true,
        };
    }

    if ctx.reverse {
        // 倒放的自然停靠点是片头
        if ctx.position_ms > STOP_TOLERANCE_MS {
            warn!(
                "⏪ 倒放停在 {}ms，距片头超过 {}ms，判定为意外停止",
                ctx.position_ms, STOP_TOLERANCE_MS
            );
            return StopClassification::Error {
                reason: StopReason::UnexpectedStop,
                buffering_aborted: false,
            };
        }
        return StopClassification::CleanPause;
    }

    // 正向播放：直播流没有自然终点，停下来必然是异常
    if ctx.live || (ctx.duration_ms - ctx.position_ms).abs() > STOP_TOLERANCE_MS {
        warn!(
            "⏹️ 停止位置 {}ms 偏离终点 {}ms 超出容差 (live={})，判定为意外停止",
            ctx.position_ms, ctx.duration_ms, ctx.live
        );
        return StopClassification::Error {
            reason: StopReason::UnexpectedStop,
            buffering_aborted: false,
        };
    }

    StopClassification::CleanPause
}
