#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid range token: {0}")]
    RangeParse(String),

    #[error("invalid constraint expression: {0}")]
    ConstraintParse(String),

    #[error("invalid regex in constraint: {0}")]
    Regex(#[from] regex::Error),

    #[error("server id {0} already exists in cluster")]
    DuplicateServerId(String),

    #[error("server id must not contain '-': {0}")]
    InvalidServerId(String),
}
