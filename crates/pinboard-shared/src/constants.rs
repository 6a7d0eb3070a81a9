/// Path of the notes resource on the HTTP API.
pub const NOTES_PATH: &str = "/api/notes";

/// Maximum note content length, counted in characters after trimming.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Maximum encoded image payload length in characters.
pub const MAX_IMAGE_CHARS: usize = 350_000;

/// Required prefix of an inline image payload.
pub const IMAGE_DATA_URL_PREFIX: &str = "data:image/";

/// Maximum number of ids kept in the recency index.
pub const MAX_INDEX_LEN: usize = 500;

/// Number of notes returned by a list request.
pub const LIST_PAGE_SIZE: usize = 50;

/// Store key prefix for note records.
pub const NOTE_KEY_PREFIX: &str = "note:";

/// Store key of the recency index.
pub const INDEX_KEY: &str = "notes:index";

/// Longest id the server will look up; longer ids cannot exist.
pub const MAX_NOTE_ID_LEN: usize = 64;

/// Edit token entropy in bytes (hex-encoded on the wire).
pub const EDIT_TOKEN_BYTES: usize = 32;

/// Id prefix of notes synthesised by a client while offline.
pub const LOCAL_NOTE_PREFIX: &str = "local-";

/// Default client request timeout in seconds.
pub const CLIENT_TIMEOUT_SECS: u64 = 12;

/// Default interval between background list refreshes in seconds.
pub const REFRESH_INTERVAL_SECS: u64 = 15;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 8080;
