use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid yaml document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid json document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("encoded jobspec is not utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("malformed signed envelope: {0}")]
    Envelope(String),
    #[error("priority {0} out of range [{min}:{max}]", min = crate::Priority::MIN, max = crate::Priority::MAX)]
    PriorityRange(i32),
}
