use serde::Serialize;

/// A successful result never carries an error message, a failed one never carries content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    content: String,
    filename: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
}

impl ConversionResult {
    pub fn success(content: String, filename: String) -> Self {
        debug_assert!(!filename.is_empty());
        Self {
            content,
            filename,
            success: true,
            error_message: None,
        }
    }

    /// `filename` is the name the output would have had; it is kept for logging.
    pub fn failure(filename: String, message: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            filename,
            success: false,
            error_message: Some(message.into()),
        }
    }

    pub fn with_filename(self, filename: String) -> Self {
        Self { filename, ..self }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn into_outcome(self) -> Result<(String, String), String> {
        if self.success {
            Ok((self.content, self.filename))
        } else {
            Err(self.error_message.unwrap_or_default())
        }
    }
}
