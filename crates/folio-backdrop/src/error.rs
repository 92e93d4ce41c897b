use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackdropError {
    #[error("invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("intensity must be within 0..=1, got {0}")]
    InvalidIntensity(f32),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BackdropError>;
