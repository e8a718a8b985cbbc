use data_integrity_bip340::canonicalize::inline_contexts;
use data_integrity_bip340::error::{Error, Result};
use data_integrity_bip340::{ContextLoader, RdfNormalizer};
use std::io::{ErrorKind, Write as _};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Runs an external RDF canonicalizer.
///
/// The document, with its contexts inlined, is written to the command's stdin as JSON;
/// canonical N-Quads are read from its stdout.
#[derive(Debug, Clone)]
pub struct CommandNormalizer {
    program: String,
    args: Vec<String>,
}

impl CommandNormalizer {
    /// Split a shell-style command line on whitespace.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;

        Some(Self {
            program,
            args: words.collect(),
        })
    }
}

impl RdfNormalizer for CommandNormalizer {
    fn normalize(&self, document: &serde_json::Value, loader: &dyn ContextLoader) -> Result<String> {
        let input = serde_json::to_vec(&inline_contexts(document, loader)?)?;

        debug!(program = %self.program, bytes = input.len(), "running normalizer");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Stdin is written while stdout is drained; commands may stream output before EOF
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || match stdin.write_all(&input) {
                // A command that exits early is reported through its status below
                Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                result => result,
            })
        });

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            writer
                .join()
                .map_err(|_| Error::Canonicalization("stdin writer panicked".into()))??;
        }
        if !output.status.success() {
            return Err(Error::Canonicalization(format!(
                "`{}` exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| Error::Canonicalization(format!("normalizer output is not UTF-8: {e}")))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use data_integrity_bip340::StaticContextLoader;
    use serde_json::json;

    #[test]
    fn test_command_line_parsing() {
        let normalizer = CommandNormalizer::from_command_line("node rdfc.js --quiet").unwrap();

        assert_eq!(normalizer.program, "node");
        assert_eq!(normalizer.args, ["rdfc.js", "--quiet"]);
        assert!(CommandNormalizer::from_command_line("   ").is_none());
    }

    #[test]
    fn test_pipes_inlined_document() {
        let loader = StaticContextLoader::new()
            .with_context("https://a.example/", json!({"@context": {"a": "urn:a"}}));
        let normalizer = CommandNormalizer::from_command_line("cat").unwrap();

        let output = normalizer
            .normalize(&json!({"@context": "https://a.example/", "a": 1}), &loader)
            .unwrap();
        let echoed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(echoed["@context"], json!({"a": "urn:a"}));
    }

    #[test]
    fn test_large_document_does_not_block() {
        let big = "x".repeat(512 * 1024);
        let normalizer = CommandNormalizer::from_command_line("cat").unwrap();

        let output = normalizer
            .normalize(&json!({"@context": {}, "big": big}), &StaticContextLoader::new())
            .unwrap();
        let echoed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(echoed["big"].as_str().map(str::len), Some(512 * 1024));
    }

    #[test]
    fn test_failing_command() {
        let normalizer = CommandNormalizer::from_command_line("false").unwrap();

        assert!(matches!(
            normalizer.normalize(&json!({"@context": {}}), &StaticContextLoader::new()),
            Err(Error::Canonicalization(_))
        ));
    }
}
