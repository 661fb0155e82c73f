#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid user input: {0}")]
    UserInput(String),

    #[error(transparent)]
    Types(#[from] exhibitor_types::Error),
}
