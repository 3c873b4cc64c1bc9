use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunnError {
    #[error("Config error: {0}")]
    Config(String),

    /// Template asset unreachable. Fatal for an export.
    #[error("Could not load form template: {0}")]
    TemplateLoad(String),

    /// Template bytes are not a readable PDF. Fatal for an export.
    #[error("Form template is not a valid PDF: {0}")]
    TemplateParse(String),

    #[error("PDF generation error: {0}")]
    PdfGeneration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("An export is already running")]
    ExportInProgress,

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] funnskjema_common::Error),
}

pub type Result<T> = std::result::Result<T, FunnError>;
