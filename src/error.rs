#[derive(Debug, thiserror::Error)]
pub enum VisitError {
    #[error("{0} must be set")]
    MissingConfig(&'static str),

    #[error("request is missing the `user` field")]
    MissingUser,

    #[error("DynamoDB service error: {0}")]
    Store(String),

    #[error("stored count for {user} is not a non-negative integer: {value}")]
    InvalidCount { user: String, value: String },

    #[error("malformed visit record: {0}")]
    InvalidRecord(String),

    #[error("visit count for {0} overflowed")]
    CountOverflow(String),
}
