use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt;
use tracing::warn;

use crate::{engine::ConversionEngine, result::ConversionResult};

#[derive(Clone)]
pub struct Converter {
    engine: Arc<dyn ConversionEngine>,
}

impl Converter {
    pub fn new(engine: Arc<dyn ConversionEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub async fn convert(&self, source: &str) -> ConversionResult {
        let filename = markdown_filename(source);
        let outcome = AssertUnwindSafe(self.engine.convert(source))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(content)) => ConversionResult::success(content, filename),
            Ok(Err(err)) => {
                warn!(engine = self.engine.name(), source, error = %err, "conversion failed");
                ConversionResult::failure(filename, err.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(engine = self.engine.name(), source, %message, "converter panicked");
                ConversionResult::failure(filename, message)
            }
        }
    }
}

/// Last path component with its final extension replaced by `.md`.
pub fn markdown_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let stem = match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => base,
    };
    format!("{stem}.md")
}

pub fn file_extension(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    base.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "converter panicked".to_string()
    }
}
