use std::fmt::Display;

pub trait LogError {
    fn log_error(&self) -> &Self;
    fn log_error_msg(&self, msg: &str) -> &Self;
}

impl<T, E> LogError for Result<T, E>
where
    E: Display,
{
    fn log_error(&self) -> &Self {
        if let Err(e) = self {
            log::error!("{e}")
        }
        self
    }
    fn log_error_msg(&self, msg: &str) -> &Self {
        if let Err(e) = self {
            log::error!("{msg}: {e}")
        }
        self
    }
}
