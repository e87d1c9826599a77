//! In-place conflict resolution through a text-generation service.
//!
//! [`ConflictResolver::resolve`] reads a file, sends it with the fixed policy
//! prompt, and overwrites the file with the first text block of the reply
//! plus a trailing newline. A reply without usable text leaves the file
//! untouched and is not an error.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::config::LlmConfig;
use crate::errors::ResolveError;
use crate::llm::{Message, MessageRequest, MessageResponse, TextGenerator};
use crate::prompt::build_user_message;

/// Per-request generation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
}

impl From<&LlmConfig> for RequestSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.effective_model().to_string(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            system: config.system_prompt.clone(),
        }
    }
}

/// Why a response did not produce a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The response had no content blocks.
    EmptyResponse,
    /// The first content block carried no text.
    NonTextBlock,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyResponse => write!(f, "empty response"),
            Self::NonTextBlock => write!(f, "first content block has no text"),
        }
    }
}

/// Result of a successful [`ConflictResolver::resolve`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The file was overwritten with `bytes` bytes.
    Rewritten { path: PathBuf, bytes: usize },
    /// The file was left as it was.
    Unchanged { path: PathBuf, reason: SkipReason },
}

/// Resolves one file per call using a [`TextGenerator`].
pub struct ConflictResolver<G> {
    generator: G,
    settings: RequestSettings,
}

impl<G: TextGenerator> ConflictResolver<G> {
    pub fn new(generator: G, settings: RequestSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Build the generation request for `file_name` and its raw content.
    pub fn build_request(&self, file_name: &str, content: &[u8]) -> MessageRequest {
        MessageRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: self.settings.system.clone(),
            messages: vec![Message::user_text(build_user_message(file_name, content))],
        }
    }

    /// Resolve `path` in place.
    ///
    /// The file is read before any service call, so an unreadable file never
    /// reaches the network. Service errors propagate unchanged and leave the
    /// file as it was.
    pub async fn resolve<P: AsRef<Path>>(&self, path: P) -> Result<ResolveOutcome, ResolveError> {
        let path = path.as_ref();
        let content = read_target(path).await?;
        self.resolve_content(path, &content).await
    }

    /// Resolve `path` given content already read with [`read_target`].
    #[instrument(skip(self, path, content), fields(path = %path.display()))]
    pub async fn resolve_content(
        &self,
        path: &Path,
        content: &[u8],
    ) -> Result<ResolveOutcome, ResolveError> {
        let request = self.build_request(&path.to_string_lossy(), content);
        info!(model = %request.model, "requesting resolution");
        let response = self.generator.generate(&request).await?;

        let text = match resolved_text(&response) {
            Ok(text) => text,
            Err(reason) => {
                info!(%reason, "no usable text in response, leaving file unchanged");
                return Ok(ResolveOutcome::Unchanged {
                    path: path.to_path_buf(),
                    reason,
                });
            }
        };

        let mut output = String::with_capacity(text.len() + 1);
        output.push_str(text);
        output.push('\n');
        tokio::fs::write(path, output.as_bytes())
            .await
            .map_err(|source| ResolveError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        info!(bytes = output.len(), "file rewritten");
        Ok(ResolveOutcome::Rewritten {
            path: path.to_path_buf(),
            bytes: output.len(),
        })
    }
}

/// Read the whole target file.
pub async fn read_target(path: &Path) -> Result<Vec<u8>, ResolveError> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|source| ResolveError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), bytes = content.len(), "read target file");
    Ok(content)
}

fn resolved_text(response: &MessageResponse) -> Result<&str, SkipReason> {
    if response.content.is_empty() {
        return Err(SkipReason::EmptyResponse);
    }
    response.first_text().ok_or(SkipReason::NonTextBlock)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::errors::LlmError;
    use crate::llm::ResponseBlock;
    use crate::prompt::{POLICY_PROMPT, SYSTEM_PROMPT};

    const CONFLICTED: &str = "<<<<<<< HEAD\nfoo\n=======\nbar\n>>>>>>> branch\n";

    /// Replays canned replies and records every request it receives.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<Result<MessageResponse, LlmError>>>,
        requests: Mutex<Vec<MessageRequest>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(reply: Result<MessageResponse, LlmError>) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([reply])),
                requests: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for &ScriptedGenerator {
        async fn generate(&self, request: &MessageRequest) -> Result<MessageResponse, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra request")
        }
    }

    fn text_reply(text: &str) -> Result<MessageResponse, LlmError> {
        Ok(MessageResponse {
            content: vec![ResponseBlock::text(text)],
            ..MessageResponse::default()
        })
    }

    fn settings() -> RequestSettings {
        RequestSettings::from(&LlmConfig::default())
    }

    fn write_conflicted(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("main.rs");
        std::fs::write(&path, CONFLICTED).unwrap();
        path
    }

    #[tokio::test]
    async fn test_rewrites_with_appended_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conflicted(&dir);
        let generator = ScriptedGenerator::new(text_reply("foo\n"));
        let resolver = ConflictResolver::new(&generator, settings());

        let outcome = resolver.resolve(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "foo\n\n");
        assert_eq!(
            outcome,
            ResolveOutcome::Rewritten {
                path: path.clone(),
                bytes: 5
            }
        );
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_appends_newline_regardless_of_original_ending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_newline.txt");
        std::fs::write(&path, "<<<<<<< HEAD\na\n=======\nb\n>>>>>>> x").unwrap();
        let generator = ScriptedGenerator::new(text_reply("a"));
        let resolver = ConflictResolver::new(&generator, settings());

        resolver.resolve(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n");
    }

    #[tokio::test]
    async fn test_empty_content_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conflicted(&dir);
        let generator = ScriptedGenerator::new(Ok(MessageResponse::default()));
        let resolver = ConflictResolver::new(&generator, settings());

        let outcome = resolver.resolve(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFLICTED);
        assert_eq!(
            outcome,
            ResolveOutcome::Unchanged {
                path,
                reason: SkipReason::EmptyResponse
            }
        );
    }

    #[tokio::test]
    async fn test_non_text_first_block_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conflicted(&dir);
        let generator = ScriptedGenerator::new(Ok(MessageResponse {
            content: vec![
                ResponseBlock {
                    kind: Some("tool_use".into()),
                    text: None,
                },
                ResponseBlock::text("ignored"),
            ],
            ..MessageResponse::default()
        }));
        let resolver = ConflictResolver::new(&generator, settings());

        let outcome = resolver.resolve(&path).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFLICTED);
        assert!(matches!(
            outcome,
            ResolveOutcome::Unchanged {
                reason: SkipReason::NonTextBlock,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_file_fails_before_service_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.rs");
        let generator = ScriptedGenerator::new(text_reply("never used"));
        let resolver = ConflictResolver::new(&generator, settings());

        let result = resolver.resolve(&path).await;

        assert!(matches!(result, Err(ResolveError::Read { .. })));
        assert_eq!(generator.calls(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_read_target_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.json");

        match read_target(&path).await {
            Err(ResolveError::Read { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected Read error, got {:?}", other),
        }

        std::fs::write(&path, CONFLICTED).unwrap();
        assert_eq!(read_target(&path).await.unwrap(), CONFLICTED.as_bytes());
    }

    #[tokio::test]
    async fn test_service_error_propagates_and_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conflicted(&dir);
        let generator = ScriptedGenerator::new(Err(LlmError::ApiError {
            status: 503,
            body: "connection reset".into(),
        }));
        let resolver = ConflictResolver::new(&generator, settings());

        let result = resolver.resolve(&path).await;

        assert!(matches!(
            result,
            Err(ResolveError::Service(LlmError::ApiError { status: 503, .. }))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), CONFLICTED);
    }

    #[tokio::test]
    async fn test_request_carries_settings_and_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_conflicted(&dir);
        let generator = ScriptedGenerator::new(text_reply("foo"));
        let resolver = ConflictResolver::new(&generator, settings());

        resolver.resolve(&path).await.unwrap();

        let requests = generator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "claude-3-7-sonnet-20250219");
        assert_eq!(req.max_tokens, 8192);
        assert_eq!(req.temperature, 0.0);
        assert_eq!(req.system, SYSTEM_PROMPT);
        assert_eq!(req.messages.len(), 1);

        let user = req.user_text();
        assert!(user.starts_with(POLICY_PROMPT));
        assert!(user.contains(&format!("File name: {}.", path.display())));
        assert!(user.ends_with(CONFLICTED));
    }
}
