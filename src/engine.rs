use std::{process::Stdio, time::Duration};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{config::EngineConfig, error::ConversionError};

/// The external conversion capability: turns a file path or URL into Markdown text.
#[async_trait]
pub trait ConversionEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    async fn convert(&self, source: &str) -> Result<String, ConversionError>;
}

/// Runs the `markitdown` command-line tool, one child process per conversion.
#[derive(Debug, Clone)]
pub struct MarkItDownCli {
    program: String,
    use_plugins: bool,
    timeout: Option<Duration>,
}

impl MarkItDownCli {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            program: config.program.clone(),
            use_plugins: config.use_plugins,
            timeout: config.timeout,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build_args(&self, source: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(2);
        if self.use_plugins {
            args.push("--use-plugins".to_string());
        }
        args.push(source.to_string());
        args
    }

    async fn run(&self, args: Vec<String>) -> Result<std::process::Output, ConversionError> {
        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| ConversionError::Timeout(limit))?,
            None => child.await,
        };

        output.map_err(|source| ConversionError::Spawn {
            program: self.program.clone(),
            source,
        })
    }

    /// Asks the tool for its version; used at startup to report a missing binary early.
    pub async fn probe(&self) -> Result<String, ConversionError> {
        let output = self.run(vec!["--version".to_string()]).await?;
        if !output.status.success() {
            return Err(ConversionError::Engine(failure_message(
                &output.stderr,
                output.status.code(),
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl ConversionEngine for MarkItDownCli {
    fn name(&self) -> &'static str {
        "markitdown"
    }

    async fn convert(&self, source: &str) -> Result<String, ConversionError> {
        debug!(program = %self.program, source, "running converter");
        let output = self.run(self.build_args(source)).await?;

        if !output.status.success() {
            return Err(ConversionError::Engine(failure_message(
                &output.stderr,
                output.status.code(),
            )));
        }

        let mut text =
            String::from_utf8(output.stdout).map_err(|_| ConversionError::InvalidOutput)?;
        // The tool prints the document followed by a single newline of its own.
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

// A failing run ends with a traceback whose last line is `module.Class: message`.
fn failure_message(stderr: &[u8], code: Option<i32>) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    match stderr.lines().rev().map(str::trim).find(|line| !line.is_empty()) {
        Some(line) => strip_exception_class(line).to_string(),
        None => match code {
            Some(code) => format!("converter exited with status {code}"),
            None => "converter terminated by signal".to_string(),
        },
    }
}

fn strip_exception_class(line: &str) -> &str {
    match line.split_once(": ") {
        Some((class, message))
            if !class.is_empty()
                && class
                    .chars()
                    .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '.') =>
        {
            message
        }
        _ => line,
    }
}
