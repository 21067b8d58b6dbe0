//! Envelope and label constants shared by the pipeline, the views and the surfaces.

// Envelope status the source API uses for a good response
pub const STATUS_SUCCESS: &str = "success";

// Fallback when a failed envelope carries no message
pub const DEFAULT_API_ERROR_MESSAGE: &str = "Unknown error occurred";

// Labels the specialised analyses partition on
pub const BUMP_LABEL: &str = "bump";
pub const POTHOLE_LABEL: &str = "pothole";

// Well-known reading columns, in display order
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const X_COLUMN: &str = "x";
pub const Y_COLUMN: &str = "y";
pub const Z_COLUMN: &str = "z";
pub const LABEL_COLUMN: &str = "label";

/// Numeric columns covered by the data summary
pub const NUMERIC_COLUMNS: [&str; 3] = [X_COLUMN, Y_COLUMN, Z_COLUMN];

pub const SUCCESS_NOTICE: &str = "Analysis completed successfully!";
