use crate::{
    backend::TextBackend,
    error::Result,
    prompt::{PromptEngine, PromptInput},
};
use tracing::debug;

/// Produces the Markdown notes for one file by prompting the backend.
pub struct NoteGenerator {
    backend: Box<dyn TextBackend>,
    prompts: PromptEngine,
}

impl NoteGenerator {
    /// Creates a generator from a backend and a prompt engine.
    #[must_use]
    pub fn new(backend: Box<dyn TextBackend>, prompts: PromptEngine) -> Self {
        Self { backend, prompts }
    }

    /// Name of the backend in use.
    #[must_use]
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generates notes for one file.
    ///
    /// The response is returned exactly as the backend produced it; heading
    /// cleanup happens later during assembly.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be rendered or the backend
    /// fails. Backend errors are passed through unchanged.
    pub fn generate(
        &self,
        main_title: &str,
        previous_topics: &str,
        topic_name: &str,
        suggestion: &str,
        content: &str,
    ) -> Result<String> {
        let prompt = self.prompts.render(&PromptInput {
            main_title,
            previous_topics,
            topic_name,
            suggestion,
            content,
        })?;

        debug!(
            "Prompt for '{}' is {} bytes ({} bytes of content)",
            topic_name,
            prompt.len(),
            content.len()
        );

        let notes = self.backend.invoke(&prompt)?;

        debug!("Received {} bytes of notes for '{}'", notes.len(), topic_name);
        Ok(notes)
    }
}

impl std::fmt::Debug for NoteGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteGenerator")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}
