use log::debug;
use parking_lot::Mutex;

/// 支持的字幕轨数量上限
pub const SUBTITLE_TRACKS: usize = 8;

/// 位图字幕的一个子矩形区域（RGBA 像素 + 左上角偏移）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// 位图字幕载荷；零个子矩形等于"没有内容"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapSubtitle {
    pub rects: Vec<SubtitleRect>,
}

/// 文本字幕（含翻译标志与解析出的语言）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSubtitle {
    pub text: String,
    pub language: String,
    pub translated: bool,
}

/// 最近一次上屏内容的元信息缓存
///
/// 暂停中跳转时据此决定：位置仍被覆盖就原样重显，否则清空该轨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtitleMeta {
    /// 已按轨道延迟偏移修正过的开始时间戳
    pub pts_ms: i64,
    pub duration_ms: i64,
    pub translated: bool,
}

impl SubtitleMeta {
    fn covers(&self, position_ms: i64) -> bool {
        position_ms >= self.pts_ms && position_ms < self.pts_ms + self.duration_ms
    }
}

/// 单轨显示状态：文本与位图互斥，二者最多一个非空
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleTrackState {
    pub text: Option<TextSubtitle>,
    pub bitmap: Option<BitmapSubtitle>,
    pub last_meta: Option<SubtitleMeta>,
}

impl SubtitleTrackState {
    pub fn is_blank(&self) -> bool {
        self.text.is_none() && self.bitmap.is_none()
    }
}

/// 字幕显示桥：把解码结果落到各轨的显示状态上
pub struct SubtitleBridge {
    tracks: Mutex<Vec<SubtitleTrackState>>,
    delays_ms: Mutex<[i64; SUBTITLE_TRACKS]>,
}

impl SubtitleBridge {
    pub fn new() -> Self {
        Self {
            tracks: Mutex::new(vec![SubtitleTrackState::default(); SUBTITLE_TRACKS]),
            delays_ms: Mutex::new([0; SUBTITLE_TRACKS]),
        }
    }

    pub fn set_delay(&self, track: usize, delay_ms: i64) {
        if track < SUBTITLE_TRACKS {
            self.delays_ms.lock()[track] = delay_ms;
        }
    }

    pub fn delay(&self, track: usize) -> i64 {
        if track < SUBTITLE_TRACKS {
            self.delays_ms.lock()[track]
        } else {
            0
        }
    }

    /// 上屏一条文本字幕，清掉同轨位图
    pub fn show_text(
        &self,
        track: usize,
        text: String,
        language: String,
        translated: bool,
        pts_ms: i64,
        duration_ms: i64,
    ) {
        if track >= SUBTITLE_TRACKS {
            return;
        }
        let delay = self.delay(track);
        let mut tracks = self.tracks.lock();
        let state = &mut tracks[track];
        state.bitmap = None;
        state.text = Some(TextSubtitle {
            text,
            language,
            translated,
        });
        state.last_meta = Some(SubtitleMeta {
            pts_ms: pts_ms + delay,
            duration_ms,
            translated,
        });
    }

    /// 上屏一条位图字幕，清掉同轨文本；空载荷（零个子矩形）不做任何事
    pub fn show_bitmap(&self, track: usize, bitmap: BitmapSubtitle, pts_ms: i64, duration_ms: i64) {
        if track >= SUBTITLE_TRACKS {
            return;
        }
        if bitmap.rects.is_empty() {
            debug!("📺 轨道 {} 的位图字幕为空载荷，忽略", track);
            return;
        }
        let delay = self.delay(track);
        let mut tracks = self.tracks.lock();
        let state = &mut tracks[track];
        state.text = None;
        state.bitmap = Some(bitmap);
        state.last_meta = Some(SubtitleMeta {
            pts_ms: pts_ms + delay,
            duration_ms,
            translated: false,
        });
    }

    /// 暂停中跳转后的刷新：缓存仍覆盖新位置则保持原显示，否则清空该轨
    pub fn refresh_after_seek(&self, position_ms: i64) {
        let mut tracks = self.tracks.lock();
        for (index, state) in tracks.iter_mut().enumerate() {
            match state.last_meta {
                Some(meta) if meta.covers(position_ms) => {
                    // 内容未动：原样重显，不等新的解码结果
                    debug!("📺 轨道 {} 命中缓存，位置 {}ms 重显", index, position_ms);
                }
                _ => {
                    if !state.is_blank() {
                        debug!("📺 轨道 {} 在 {}ms 无覆盖字幕，清空显示", index, position_ms);
                    }
                    state.text = None;
                    state.bitmap = None;
                    state.last_meta = None;
                }
            }
        }
    }

    /// 清空一条轨的显示与缓存
    pub fn clear_track(&self, track: usize) {
        if track >= SUBTITLE_TRACKS {
            return;
        }
        let mut tracks = self.tracks.lock();
        tracks[track] = SubtitleTrackState::default();
    }

    /// 清空所有轨
    pub fn clear_all(&self) {
        let mut tracks = self.tracks.lock();
        for state in tracks.iter_mut() {
            *state = SubtitleTrackState::default();
        }
    }

    /// 读取一条轨的当前显示状态（UI 数据绑定用）
    pub fn track(&self, track: usize) -> Option<SubtitleTrackState> {
        if track >= SUBTITLE_TRACKS {
            return None;
        }
        Some(self.tracks.lock()[track].clone())
    }
}

impl Default for SubtitleBridge {
    fn default() -> Self {
        Self::new()
    }
}
