mod embedding_error;
mod engram_error;
mod extraction_error;
mod storage_error;
mod vector_error;

pub use embedding_error::EmbeddingError;
pub use engram_error::{EngramError, EngramResult};
pub use extraction_error::ExtractionError;
pub use storage_error::StorageError;
pub use vector_error::VectorError;
