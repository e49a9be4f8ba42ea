
pub const DEFAULT_PORT: u16 = 9731;

/// Largest code payload accepted per detection (bytes).
pub const DEFAULT_MAX_INPUT_BYTES: usize = 1024 * 1024;

/// Largest number of items accepted in one batch request.
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 256;

/// Request body cap enforced by the router before JSON decoding.
pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: String,
    pub max_input_bytes: usize,
    pub max_batch_items: usize,
    pub max_body_bytes: usize,
    /// Bearer token required on protected routes. `None` disables auth.
    pub auth_token: Option<String>,
    /// Optional catalog overlay (JSON) applied on top of the built-in tables.
    pub catalog_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            max_input_bytes: DEFAULT_MAX_INPUT_BYTES,
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            auth_token: None,
            catalog_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("CODELANG_PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            listen_addr: format!("127.0.0.1:{}", port),
            max_input_bytes: lookup("CODELANG_MAX_INPUT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_INPUT_BYTES),
            max_batch_items: lookup("CODELANG_MAX_BATCH")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BATCH_ITEMS),
            max_body_bytes: lookup("CODELANG_MAX_BODY_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            auth_token: lookup("CODELANG_AUTH_TOKEN").filter(|t| !t.is_empty()),
            catalog_path: lookup("CODELANG_CATALOG").filter(|p| !p.is_empty()),
        }
    }
}
