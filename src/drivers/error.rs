use thiserror::Error;
use crate::signal::FilterError;
use crate::types::ChannelId;
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("invalid scope configuration: {0}")]
    InvalidConfig(String),
    #[error("unknown channel {channel}: ingest holds {channel_count} channels")]
    UnknownChannel {
        channel: ChannelId,
        channel_count: usize,
    },
    #[error("rejected filter configuration: {0}")]
    InvalidFilter(#[from] FilterError),
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
    #[error("engine channel disconnected")]
    Disconnected,
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for ScopeError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        ScopeError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for ScopeError {
    fn from(value: image::ImageError) -> Self {
        ScopeError::Plot(value.to_string())
    }
}
