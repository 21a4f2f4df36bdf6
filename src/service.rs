use std::{io::Write, path::PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::{
    converter::{Converter, file_extension, markdown_filename},
    error::ConversionError,
    result::ConversionResult,
    youtube,
};

pub struct ConversionService {
    converter: Converter,
    upload_dir: Option<PathBuf>,
}

impl ConversionService {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter,
            upload_dir: None,
        }
    }

    pub fn with_upload_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.upload_dir = dir;
        self
    }

    pub fn engine_name(&self) -> &'static str {
        self.converter.engine_name()
    }

    pub async fn convert_upload(&self, bytes: &[u8], original_filename: &str) -> ConversionResult {
        let target = markdown_filename(original_filename);
        let extension = file_extension(original_filename);

        let staged = match self.stage(bytes, &extension) {
            Ok(file) => file,
            Err(err) => {
                warn!(filename = original_filename, error = %err, "failed to stage upload");
                return ConversionResult::failure(target, err.to_string());
            }
        };

        let path = staged.path().to_string_lossy().into_owned();
        debug!(filename = original_filename, path = %path, size = bytes.len(), "staged upload");

        // The guard also removes the file if the conversion future is dropped.
        let result = self.converter.convert(&path).await;

        if let Err(err) = staged.close() {
            let err = ConversionError::TempFile(err);
            warn!(path = %path, error = %err, "failed to remove staged upload");
            return ConversionResult::failure(target, err.to_string());
        }

        if result.is_success() {
            info!(filename = original_filename, output = %target, "converted upload");
        }
        result.with_filename(target)
    }

    pub async fn convert_youtube(&self, url: &str) -> ConversionResult {
        let target = youtube::markdown_filename(url);
        let result = self.converter.convert(url).await;
        if result.is_success() {
            info!(url, output = %target, "converted youtube url");
        }
        result.with_filename(target)
    }

    fn stage(&self, bytes: &[u8], extension: &str) -> Result<NamedTempFile, ConversionError> {
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix("upload-").suffix(&suffix);
        let mut file = match &self.upload_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        file.write_all(bytes)?;
        file.flush()?;
        Ok(file)
    }
}
