use thiserror::Error;

#[derive(Error, Debug)]
pub enum PiError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid rank: {0}")]
    InvalidRank(usize),
    #[error("Communication error: {0}")]
    Communication(String),
    #[error("Initialization error: {0}")]
    Init(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Shared memory error: {0}")]
    SharedMemory(String),
    #[error("Process error: {0}")]
    Process(String),
}

pub type Result<T> = std::result::Result<T, PiError>;

impl PiError {
    /// Process exit code for command line programs: 2 for bad arguments, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            PiError::InvalidArgument(_) => 2,
            _ => 1,
        }
    }
}

impl From<bincode::Error> for PiError {
    fn from(e: bincode::Error) -> Self {
        PiError::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_errors_exit_with_two() {
        assert_eq!(PiError::InvalidArgument("n".into()).exit_code(), 2);
        assert_eq!(PiError::InvalidRank(3).exit_code(), 1);
        assert_eq!(PiError::Process("gone".into()).exit_code(), 1);
    }
}
