/// Engram system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum length of a node name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a tenant identifier at the tool surface.
pub const MAX_TENANT_LEN: usize = 100;

/// Maximum length of ingested memory text at the tool surface.
pub const MAX_TEXT_LEN: usize = 50_000;

/// Maximum length of a search query at the tool surface.
pub const MAX_QUERY_LEN: usize = 1_000;

/// Maximum page size for `read_graph`.
pub const MAX_READ_LIMIT: i64 = 500;

/// Maximum traversal depth accepted by `hybrid_search`.
pub const MAX_HYBRID_DEPTH: i64 = 3;

/// Cap on keyword-scan results.
pub const KEYWORD_SCAN_CAP: i64 = 50;

/// Default k for vector nearest-neighbor search.
pub const DEFAULT_SEARCH_K: usize = 5;

/// Node type assigned to entities with no better classification.
pub const DEFAULT_NODE_TYPE: &str = "concept";

/// Edge type assigned to relationships with no better classification.
pub const DEFAULT_EDGE_TYPE: &str = "related_to";

/// Edge type linking a memory anchor to an extracted entity.
pub const MENTIONS_EDGE_TYPE: &str = "mentions";

/// Max concurrently processing background memories.
pub const MAX_BACKGROUND_TASKS: usize = 32;

/// Embedding dimensions produced by the local model.
pub const LOCAL_EMBEDDING_DIM: usize = 384;

/// Embedding dimensions produced by the remote HTTP provider.
pub const REMOTE_EMBEDDING_DIM: usize = 1536;
