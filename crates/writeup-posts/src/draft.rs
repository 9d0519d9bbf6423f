//! Post drafts: the write/edit form state and the payload it submits.

use std::fmt;

use serde::{Deserialize, Serialize};
use writeup_editor_core::MarkdownImport;
use writeup_renderer::Sanitizer;

/// Writeup category. The six CTF categories, or any study topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Web,
    Pwnable,
    Reversing,
    Crypto,
    Forensics,
    Misc,
    Other(String),
}

impl Category {
    /// Categories offered by the write form.
    pub const CTF: [Category; 6] = [
        Category::Web,
        Category::Pwnable,
        Category::Reversing,
        Category::Crypto,
        Category::Forensics,
        Category::Misc,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Web => "Web",
            Self::Pwnable => "Pwnable",
            Self::Reversing => "Reversing",
            Self::Crypto => "Crypto",
            Self::Forensics => "Forensics",
            Self::Misc => "Misc",
            Self::Other(name) => name,
        }
    }

    pub fn is_ctf(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Category {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Web" => Self::Web,
            "Pwnable" => Self::Pwnable,
            "Reversing" => Self::Reversing,
            "Crypto" => Self::Crypto,
            "Forensics" => Self::Forensics,
            "Misc" => Self::Misc,
            _ => Self::Other(name),
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, miette::Diagnostic, PartialEq, Eq)]
pub enum DraftError {
    #[error("a writeup needs a title")]
    #[diagnostic(code(writeup::draft::title))]
    MissingTitle,

    #[error("attachment URL {url:?} is not an http(s) URL")]
    #[diagnostic(
        code(writeup::draft::file_url),
        help("link the challenge files with a full https:// URL")
    )]
    InvalidFileUrl { url: String },
}

/// A stored post as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub ctf_name: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
    pub author_id: String,
    pub file_url: Option<String>,
}

/// Form state of the write and edit pages.
///
/// Tags are kept as the comma-separated text the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostDraft {
    pub title: String,
    pub ctf_name: String,
    pub category: Option<Category>,
    pub content: String,
    pub is_public: bool,
    pub tags: String,
    pub file_url: String,
}

impl Default for PostDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            ctf_name: String::new(),
            category: None,
            content: String::new(),
            is_public: true,
            tags: String::new(),
            file_url: String::new(),
        }
    }
}

/// Insert/update payload for the posts table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSubmission {
    pub title: String,
    pub ctf_name: Option<String>,
    pub category: Option<Category>,
    pub content: String,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub author_id: String,
    pub file_url: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

impl PostDraft {
    /// Edit form prefilled from a stored post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            ctf_name: post.ctf_name.clone().unwrap_or_default(),
            category: post.category.clone(),
            content: post.content.clone(),
            is_public: post.is_public,
            tags: post.tags.as_deref().unwrap_or_default().join(", "),
            file_url: post.file_url.clone().unwrap_or_default(),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::MissingTitle);
        }
        let url = self.file_url.trim();
        if !url.is_empty() && !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(DraftError::InvalidFileUrl {
                url: url.to_owned(),
            });
        }
        Ok(())
    }

    /// Take over imported markdown. The title is only filled in when the
    /// draft has none yet.
    pub fn apply_import(&mut self, import: MarkdownImport) {
        let MarkdownImport { html, title_guess } = import;
        self.content = html;
        if self.title.is_empty() {
            if let Some(title) = title_guess {
                self.title = title;
            }
        }
        tracing::debug!(title = %self.title, "applied markdown import to draft");
    }

    /// Validated payload with sanitized content.
    pub fn to_submission(
        &self,
        author_id: &str,
        sanitizer: &Sanitizer,
    ) -> Result<PostSubmission, DraftError> {
        self.validate()?;
        Ok(PostSubmission {
            title: self.title.trim().to_owned(),
            ctf_name: non_empty(&self.ctf_name),
            category: self.category.clone(),
            content: sanitizer.sanitize(&self.content),
            is_public: self.is_public,
            tags: self.tags(),
            author_id: author_id.to_owned(),
            file_url: non_empty(&self.file_url),
        })
    }
}
