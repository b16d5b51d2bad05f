pub mod config;
pub mod embedding;
pub mod matcher;
pub mod storage;
pub mod timesheet;

// Re-export the recognition surface for convenience
pub use embedding::{cosine_similarity, Embedding, EmbeddingError};
pub use matcher::{find_best_match, MatchError, MatchResult};
pub use storage::{EnrollmentRecord, Store, TimeEntry};
