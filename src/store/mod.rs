pub mod redis;

#[cfg(test)]
pub mod memory;

/// Failures of the backing store itself, as opposed to missing records.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("corrupt record under {key}: {detail}")]
    Corrupt { key: String, detail: String },
}
