/// Errors produced while building, loading or querying dictionaries.
#[derive(thiserror::Error, Debug)]
pub enum DictError {
    #[error("unknown dictionary {0:?}")]
    UnknownDictionary(String),
    #[error("dictionary {dictionary:?} has no id {id}")]
    UnknownId { dictionary: String, id: u32 },
    #[error("dictionary {0:?} has no codes")]
    EmptyDictionary(String),
    #[error("mark size {0} is unsupported (interior must be 1..=8 cells per side)")]
    UnsupportedMarkSize(usize),
    #[error("malformed bit string {0:?}")]
    MalformedBits(String),
    #[error("bit grid side {got} does not match expected side {expected}")]
    SideMismatch { expected: usize, got: usize },
    #[error("module matrix of side {size} needs {expected} modules, got {got}")]
    ModuleCount {
        size: usize,
        expected: usize,
        got: usize,
    },
    #[error("no text encoder is registered")]
    NoTextEncoder,
    #[error("text encoding failed: {0}")]
    TextEncoding(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
