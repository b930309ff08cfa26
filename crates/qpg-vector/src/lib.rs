//! Vector Index: deterministic local embeddings plus dense similarity
//! search over stored JSON-equivalent vector blobs, ranked in-process by
//! cosine similarity. See `DESIGN.md` for why this is a single-backend
//! implementation rather than the native-extension-or-fallback dual path
//! sketched in spec §4.8/§9.

mod error;
mod model;
mod store;

pub use error::{Result, VectorError};
pub use model::{model_dir, EmbeddingModel, EMBEDDING_DIM, MODEL_ID};
pub use store::{cosine_similarity, nearest, store as store_vector, stored_text_hash, VectorHit};
