use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("failed to spawn driver worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("driver already started")]
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, DriverError>;
