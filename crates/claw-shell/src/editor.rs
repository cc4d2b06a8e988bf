//! Line sources for the dispatch loop.

use std::collections::VecDeque;
use std::path::PathBuf;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use crate::error::ShellError;

/// Reads input lines and keeps the history.
pub trait LineEditor {
    /// Read one line. `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError>;

    /// Remember a line for recall.
    fn add_history(&mut self, line: &str);

    /// Persist history, if the editor keeps it anywhere.
    fn save_history(&mut self) -> Result<(), ShellError> {
        Ok(())
    }
}

/// Interactive terminal editor backed by rustyline.
pub struct RustylineEditor {
    editor: DefaultEditor,
    history_file: Option<PathBuf>,
}

impl std::fmt::Debug for RustylineEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustylineEditor")
            .field("history_file", &self.history_file)
            .finish_non_exhaustive()
    }
}

impl RustylineEditor {
    /// Create an editor, loading history from `history_file` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialized.
    pub fn new(history_file: Option<PathBuf>) -> Result<Self, ShellError> {
        let mut editor = DefaultEditor::new()
            .map_err(|e| ShellError::Io(std::io::Error::other(e.to_string())))?;
        if let Some(path) = &history_file {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    warn!(path = %path.display(), error = %e, "failed to load history");
                }
            }
        }
        Ok(Self {
            editor,
            history_file,
        })
    }
}

impl LineEditor for RustylineEditor {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, ShellError> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => return Ok(Some(line)),
                Err(ReadlineError::Interrupted) => {}
                Err(ReadlineError::Eof) => return Ok(None),
                Err(e) => return Err(ShellError::Io(std::io::Error::other(e.to_string()))),
            }
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            warn!(error = %e, "failed to record history");
        }
    }

    fn save_history(&mut self) -> Result<(), ShellError> {
        if let Some(path) = &self.history_file {
            self.editor
                .save_history(path)
                .map_err(|e| ShellError::Io(std::io::Error::other(e.to_string())))?;
        }
        Ok(())
    }
}

/// Non-interactive editor fed from a fixed list of lines.
#[derive(Debug, Default, Clone)]
pub struct ScriptedEditor {
    lines: VecDeque<String>,
    history: Vec<String>,
}

impl ScriptedEditor {
    /// Feed these lines in order.
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            history: Vec::new(),
        }
    }

    /// Lines recorded as history so far.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>, ShellError> {
        Ok(self.lines.pop_front())
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_editor_feeds_lines_then_eof() {
        let mut editor = ScriptedEditor::new(["echo a", "quit"]);
        assert_eq!(editor.read_line("$ ").expect("read").as_deref(), Some("echo a"));
        assert_eq!(editor.read_line("$ ").expect("read").as_deref(), Some("quit"));
        assert_eq!(editor.read_line("$ ").expect("read"), None);
    }

    #[test]
    fn scripted_editor_records_history() {
        let mut editor = ScriptedEditor::new(Vec::<String>::new());
        editor.add_history("list-nodes");
        assert_eq!(editor.history(), ["list-nodes".to_string()]);
        assert!(editor.save_history().is_ok());
    }
}
