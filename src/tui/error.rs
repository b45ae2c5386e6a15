use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("IO/Terminal error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key binding in config: {0}")]
    KeyBinding(String),

    #[error(
        "Terminal size too small. Current: {width}x{height}, Minimum required: {min_width}x{min_height}. Please resize your terminal window."
    )]
    TerminalTooSmall {
        width: u16,
        height: u16,
        min_width: u16,
        min_height: u16,
    },
}
