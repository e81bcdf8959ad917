use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    #[error("没有打开的媒体，无法执行命令")]
    NotOpen,

    #[error("管线错误: {0}")]
    PipelineError(String),

    #[error("跳转失败，返回码: {0}")]
    SeekFailed(i32),

    #[error("字幕轨索引越界: {0}")]
    InvalidSubtitleTrack(usize),

    #[error("实时循环错误: {0}")]
    LoopError(String),

    #[error("其他错误: {0}")]
    Other(String),

    #[error("Anyhow 错误: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
