// 核心类型与基础设施

pub mod clock;
pub mod error;
pub mod types;

pub use clock::PlaybackClock;
pub use error::{PlayerError, Result};
pub use types::{
    MediaDesc, PlaybackMode, PlayerConfig, PlayerSnapshot, PlayerStatus, SeekRequest, StopReason,
    StreamKind, ACCURATE_SEEK_MARGIN_MS, NEXT_FRAME_SENTINEL, SEEK_DRAIN_SLEEP_MS,
    SEEK_FAILED_SENTINEL, STOP_TOLERANCE_MS,
};
