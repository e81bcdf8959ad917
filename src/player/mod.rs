// 播放控制核心模块

pub mod classifier;
pub mod events;
pub mod manager;
pub mod pipeline;
pub mod playback;
pub mod seek;
pub(crate) mod shared;
pub mod state;
pub mod subtitle;

pub use classifier::{classify, StopClassification, StopContext};
pub use events::{EventHub, PlayerEvent};
pub use manager::PlaybackManager;
pub use pipeline::{MediaPipeline, NullHooks, ScreamerLoop, SystemHooks};
pub use playback::LoopContext;
pub use seek::SeekSlot;
pub use state::SharedState;
pub use subtitle::{
    BitmapSubtitle, SubtitleBridge, SubtitleMeta, SubtitleRect, SubtitleTrackState, TextSubtitle,
    SUBTITLE_TRACKS,
};
