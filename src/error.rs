use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("No API endpoint provided. Please pass the 'api' parameter.")]
    MissingSource,

    #[error("HTTP Request Error: {0}")]
    Transport(String),

    #[error("Failed to fetch data. Status Code: {status}")]
    HttpStatus { status: u16 },

    #[error("Data Parsing Error: {0}")]
    Decode(String),

    #[error("API Error: {message}")]
    Api { message: String },

    #[error("No readings found in the API response.")]
    EmptyData,

    #[error("No '{label}' readings found; skipping analysis.")]
    EmptyFilterResult { label: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// Stable name used in logs, metric labels and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::MissingSource => "missing_source",
            IngestError::Transport(_) => "transport",
            IngestError::HttpStatus { .. } => "http_status",
            IngestError::Decode(_) => "decode",
            IngestError::Api { .. } => "api",
            IngestError::EmptyData => "empty_data",
            IngestError::EmptyFilterResult { .. } => "empty_filter_result",
            IngestError::Config(_) => "config",
            IngestError::Toml(_) => "toml",
            IngestError::Io(_) => "io",
        }
    }

    /// The one-line message shown to whoever is looking at the dashboard.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Advisory errors describe an empty view, not a failed fetch cycle.
    pub fn is_advisory(&self) -> bool {
        matches!(self, IngestError::EmptyFilterResult { .. })
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Transport(short_reason(&err))
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Decode(err.to_string())
    }
}

/// reqwest errors carry the full URL and a source chain; keep only the
/// innermost cause so messages stay short.
fn short_reason(err: &reqwest::Error) -> String {
    let mut source: &dyn std::error::Error = err;
    while let Some(next) = source.source() {
        source = next;
    }
    if err.is_timeout() {
        format!("request timed out ({source})")
    } else if err.is_connect() {
        format!("connection failed ({source})")
    } else {
        source.to_string()
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
