#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Refusing to use {0:?} as a column name")]
    InvalidColumn(String),
}
