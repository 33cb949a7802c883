pub mod app;
pub mod cli;
pub mod config;
pub mod epd;
pub mod metrics;
pub mod refresh;
pub mod render;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    InvalidArgs(String),
    Io(std::io::Error),
    Panel(String),
    BusyTimeout(u64),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidArgs(msg) => write!(f, "invalid arguments: {msg}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Panel(msg) => write!(f, "panel error: {msg}"),
            Error::BusyTimeout(ms) => write!(f, "panel busy for more than {ms}ms"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value)
    }
}
