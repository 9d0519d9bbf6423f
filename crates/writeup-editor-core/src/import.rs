//! Markdown import.

use std::path::{Path, PathBuf};

use pulldown_cmark::{Options, Parser, html};

/// Result of converting a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownImport {
    pub html: String,
    /// Text of the first level-one heading line, if any.
    pub title_guess: Option<String>,
}

#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum ImportError {
    #[error("failed to read {}", path.display())]
    #[diagnostic(code(writeup::import::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8", path.display())]
    #[diagnostic(
        code(writeup::import::decode),
        help("save the file as UTF-8 and try again")
    )]
    Decode {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Convert markdown to the markup the editor loads.
pub fn import_markdown(text: &str) -> MarkdownImport {
    let parser = Parser::new_ext(text, markdown_options());
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    MarkdownImport {
        html: out,
        title_guess: guess_title(text),
    }
}

/// First `# ` line outside fenced code.
fn guess_title(text: &str) -> Option<String> {
    let mut fence: Option<&str> = None;
    for line in text.lines() {
        let trimmed = line.trim_start();
        match fence {
            Some(open) => {
                if trimmed.starts_with(open) {
                    fence = None;
                }
            }
            None if trimmed.starts_with("```") => fence = Some("```"),
            None if trimmed.starts_with("~~~") => fence = Some("~~~"),
            None => {
                if let Some(title) = line.strip_prefix("# ") {
                    let title = title.trim();
                    if !title.is_empty() {
                        return Some(title.to_owned());
                    }
                }
            }
        }
    }
    None
}

/// Read a markdown file and convert it.
pub async fn import_markdown_file(path: impl AsRef<Path>) -> Result<MarkdownImport, ImportError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ImportError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let import = import_markdown(&text);
    tracing::debug!(
        path = %path.display(),
        title = ?import.title_guess,
        "imported markdown"
    );
    Ok(import)
}
