//! Image attachment flow: upload the file, then insert its public URL.
//!
//! The flow only keeps a weak handle to the editor while the upload is in
//! flight. A failed upload notifies the user once and leaves the document
//! untouched.

use std::future::Future;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use mime_sniffer::MimeTypeSniffer;
use tokio::sync::Mutex;
use writeup_common::error::StorageError;
use writeup_common::storage::{ObjectStorage, UploadResult, upload_with_unique_name};

use crate::actions::EditorCommand;
use crate::document::ImageAttrs;
use crate::editor::Editor;
use crate::platform::{Notifier, PositionResolver};

/// Shared editor handle, as held by the host view.
pub type EditorHandle = Arc<Mutex<Editor>>;

/// Message shown when an upload fails.
pub const UPLOAD_FAILED_MESSAGE: &str = "Failed to upload image";

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// A file picked, pasted or dropped by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub data: Bytes,
    pub mime_type: String,
}

impl ImageFile {
    /// The declared type wins; otherwise it is sniffed from the bytes.
    pub fn new(name: impl Into<String>, data: Bytes, declared: Option<&str>) -> Self {
        let mime_type = declared
            .filter(|mime| !mime.is_empty())
            .or_else(|| data.sniff_mime_type())
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_owned();
        Self {
            name: name.into(),
            data,
            mime_type,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Where a finished upload goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InsertTarget {
    /// Replace the current selection (paste, toolbar button).
    Selection,
    /// Drop point in viewport coordinates.
    Coordinates { x: f64, y: f64 },
}

#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum ImageInsertError {
    #[error("image upload failed")]
    #[diagnostic(code(writeup::editor::upload))]
    Upload(#[from] StorageError),

    #[error("the editor is read-only")]
    #[diagnostic(code(writeup::editor::read_only))]
    ReadOnly,
}

/// What happened to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(UploadResult),
    /// The editor was gone by the time the upload finished.
    Detached(UploadResult),
    /// The drop point did not resolve, or the editor refused the insert.
    Unplaced(UploadResult),
}

impl InsertOutcome {
    pub fn upload(&self) -> &UploadResult {
        match self {
            Self::Inserted(upload) | Self::Detached(upload) | Self::Unplaced(upload) => upload,
        }
    }

    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Uploads images and inserts them into an editor.
pub struct ImageUploader<S, N, P> {
    storage: Arc<S>,
    notifier: Arc<N>,
    resolver: Arc<P>,
}

impl<S, N, P> Clone for ImageUploader<S, N, P> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            notifier: Arc::clone(&self.notifier),
            resolver: Arc::clone(&self.resolver),
        }
    }
}

impl<S, N, P> ImageUploader<S, N, P>
where
    S: ObjectStorage + Send + Sync + 'static,
    N: Notifier + 'static,
    P: PositionResolver + 'static,
{
    pub fn new(storage: Arc<S>, notifier: Arc<N>, resolver: Arc<P>) -> Self {
        Self {
            storage,
            notifier,
            resolver,
        }
    }

    /// Upload under a unique name. Failures are reported to the user here,
    /// exactly once.
    pub async fn upload(&self, file: &ImageFile) -> Result<UploadResult, ImageInsertError> {
        match upload_with_unique_name(
            self.storage.as_ref(),
            &file.name,
            file.data.clone(),
            &file.mime_type,
        )
        .await
        {
            Ok(uploaded) => {
                tracing::info!(upload_path = %uploaded.path, "image uploaded");
                Ok(uploaded)
            }
            Err(err) => {
                tracing::warn!(error = %err, file = %file.name, "image upload failed");
                self.notifier.notify(UPLOAD_FAILED_MESSAGE);
                Err(err.into())
            }
        }
    }

    /// Image chosen with the toolbar file picker.
    pub fn insert_from_picker(
        &self,
        editor: &EditorHandle,
        file: ImageFile,
    ) -> impl Future<Output = Result<InsertOutcome, ImageInsertError>> + Send + use<S, N, P> {
        self.start(editor, file, InsertTarget::Selection)
    }

    /// Clipboard paste. Handles the first image item only; `None` leaves the
    /// paste to the default handler.
    pub fn handle_paste(
        &self,
        editor: &EditorHandle,
        items: &[ImageFile],
    ) -> Option<impl Future<Output = Result<InsertOutcome, ImageInsertError>> + Send + use<S, N, P>>
    {
        let file = items.iter().find(|item| item.is_image())?;
        Some(self.start(editor, file.clone(), InsertTarget::Selection))
    }

    /// File drop. Moves inside the editor and non-image files are not handled.
    pub fn handle_drop(
        &self,
        editor: &EditorHandle,
        files: &[ImageFile],
        moved: bool,
        x: f64,
        y: f64,
    ) -> Option<impl Future<Output = Result<InsertOutcome, ImageInsertError>> + Send + use<S, N, P>>
    {
        if moved {
            return None;
        }
        let file = files.first().filter(|file| file.is_image())?;
        Some(self.start(editor, file.clone(), InsertTarget::Coordinates { x, y }))
    }

    fn start(
        &self,
        editor: &EditorHandle,
        file: ImageFile,
        target: InsertTarget,
    ) -> impl Future<Output = Result<InsertOutcome, ImageInsertError>> + Send + use<S, N, P> {
        let uploader = self.clone();
        let editor = Arc::downgrade(editor);
        async move { uploader.upload_and_insert(editor, file, target).await }
    }

    async fn upload_and_insert(
        self,
        editor: Weak<Mutex<Editor>>,
        file: ImageFile,
        target: InsertTarget,
    ) -> Result<InsertOutcome, ImageInsertError> {
        if let Some(editor) = editor.upgrade() {
            if !editor.lock().await.is_editable() {
                tracing::debug!(file = %file.name, "editor is read-only, upload skipped");
                return Err(ImageInsertError::ReadOnly);
            }
        }
        let uploaded = self.upload(&file).await?;

        let Some(editor) = editor.upgrade() else {
            tracing::debug!(upload_path = %uploaded.path, "editor closed before upload finished");
            return Ok(InsertOutcome::Detached(uploaded));
        };

        let image = ImageAttrs::new(uploaded.public_url.clone());
        let command = match target {
            InsertTarget::Selection => EditorCommand::InsertImage(image),
            InsertTarget::Coordinates { x, y } => match self.resolver.resolve(x, y) {
                Some(position) => EditorCommand::InsertImageAt { position, image },
                None => {
                    tracing::warn!(x, y, "drop point outside the document");
                    return Ok(InsertOutcome::Unplaced(uploaded));
                }
            },
        };

        let mut editor = editor.lock().await;
        if editor.execute(&command) {
            Ok(InsertOutcome::Inserted(uploaded))
        } else {
            Ok(InsertOutcome::Unplaced(uploaded))
        }
    }
}

#[cfg(test)]
mod tests {
    use writeup_common::config::{EditorConfig, StorageConfig};
    use writeup_common::storage::MemoryStorage;

    use super::*;
    use crate::platform::{CollectingNotifier, FixedPosition};
    use crate::types::Position;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    struct FailingStorage;

    impl ObjectStorage for FailingStorage {
        async fn upload(
            &self,
            _path: &str,
            _data: Bytes,
            _content_type: &str,
        ) -> Result<(), StorageError> {
            Err(StorageError::Transport("connection reset".to_owned()))
        }

        fn public_url(&self, path: &str) -> String {
            format!("https://unused.test/{path}")
        }
    }

    fn handle(html: &str) -> EditorHandle {
        Arc::new(Mutex::new(Editor::with_content(
            html,
            EditorConfig::default(),
        )))
    }

    fn png(name: &str) -> ImageFile {
        ImageFile::new(name, Bytes::from_static(PNG), None)
    }

    fn memory_uploader(
        resolver: FixedPosition,
    ) -> (
        ImageUploader<MemoryStorage, CollectingNotifier, FixedPosition>,
        Arc<MemoryStorage>,
        Arc<CollectingNotifier>,
    ) {
        let storage = Arc::new(MemoryStorage::new(StorageConfig {
            bucket: "images".to_owned(),
            public_base_url: "https://cdn.test".to_owned(),
        }));
        let notifier = Arc::new(CollectingNotifier::new());
        let uploader = ImageUploader::new(
            Arc::clone(&storage),
            Arc::clone(&notifier),
            Arc::new(resolver),
        );
        (uploader, storage, notifier)
    }

    #[test]
    fn mime_type_is_sniffed_when_not_declared() {
        assert_eq!(png("shot.png").mime_type, "image/png");
        let declared = ImageFile::new("shot", Bytes::from_static(PNG), Some("image/webp"));
        assert_eq!(declared.mime_type, "image/webp");
        let text = ImageFile::new("notes.txt", Bytes::from_static(b"\0\x01\x02"), None);
        assert!(!text.is_image());
    }

    #[tokio::test]
    async fn picker_upload_replaces_selection() {
        let (uploader, storage, notifier) = memory_uploader(FixedPosition(None));
        let editor = handle("<p>before</p>");

        let outcome = uploader
            .insert_from_picker(&editor, png("flag.png"))
            .await
            .unwrap();

        assert!(outcome.is_inserted());
        assert!(outcome.upload().path.ends_with(".png"));
        assert_eq!(storage.len(), 1);
        assert!(notifier.messages().is_empty());
        let html = editor.lock().await.to_html();
        assert!(html.contains(&format!(r#"src="{}""#, outcome.upload().public_url)));
    }

    #[tokio::test]
    async fn failed_upload_leaves_document_untouched() {
        let notifier = Arc::new(CollectingNotifier::new());
        let uploader = ImageUploader::new(
            Arc::new(FailingStorage),
            Arc::clone(&notifier),
            Arc::new(FixedPosition(Some(Position::new(0, 0)))),
        );
        let editor = handle("<p>keep <strong>this</strong></p>");
        let before = editor.lock().await.to_html();

        let err = uploader
            .handle_paste(&editor, &[png("a.png")])
            .unwrap()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImageInsertError::Upload(StorageError::Transport(_))
        ));
        assert_eq!(editor.lock().await.to_html(), before);
        assert_eq!(notifier.messages(), vec![UPLOAD_FAILED_MESSAGE.to_owned()]);
    }

    #[tokio::test]
    async fn paste_without_images_is_not_handled() {
        let (uploader, _, _) = memory_uploader(FixedPosition(None));
        let editor = handle("<p>x</p>");
        let text = ImageFile::new("clip.txt", Bytes::from_static(b"plain"), Some("text/plain"));
        assert!(uploader.handle_paste(&editor, &[text]).is_none());
        assert!(uploader.handle_paste(&editor, &[]).is_none());
    }

    #[tokio::test]
    async fn moved_drop_is_not_handled() {
        let (uploader, _, _) = memory_uploader(FixedPosition(Some(Position::new(0, 0))));
        let editor = handle("<p>x</p>");
        assert!(
            uploader
                .handle_drop(&editor, &[png("a.png")], true, 10.0, 10.0)
                .is_none()
        );
    }

    #[tokio::test]
    async fn drop_inserts_at_resolved_position() {
        let (uploader, _, _) = memory_uploader(FixedPosition(Some(Position::new(1, 0))));
        let editor = handle("<p>first</p><p>second</p>");

        let outcome = uploader
            .handle_drop(&editor, &[png("drop.png")], false, 40.0, 80.0)
            .unwrap()
            .await
            .unwrap();

        assert!(outcome.is_inserted());
        let html = editor.lock().await.to_html();
        let image = html.find("<img").unwrap();
        assert!(html.find("first").unwrap() < image);
        assert!(image < html.find("second").unwrap());
    }

    #[tokio::test]
    async fn unresolved_drop_point_inserts_nothing() {
        let (uploader, storage, _) = memory_uploader(FixedPosition(None));
        let editor = handle("<p>x</p>");
        let before = editor.lock().await.to_html();

        let outcome = uploader
            .handle_drop(&editor, &[png("drop.png")], false, -1.0, -1.0)
            .unwrap()
            .await
            .unwrap();

        assert!(matches!(outcome, InsertOutcome::Unplaced(_)));
        assert_eq!(storage.len(), 1);
        assert_eq!(editor.lock().await.to_html(), before);
    }

    #[tokio::test]
    async fn read_only_editor_uploads_nothing() {
        let (uploader, storage, notifier) = memory_uploader(FixedPosition(None));
        let editor = handle("<p>x</p>");
        editor.lock().await.set_editable(false);

        let err = uploader
            .insert_from_picker(&editor, png("flag.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, ImageInsertError::ReadOnly));
        assert!(storage.is_empty());
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn closed_editor_is_not_kept_alive() {
        let (uploader, _, _) = memory_uploader(FixedPosition(None));
        let editor = handle("<p>x</p>");
        let pending = uploader.insert_from_picker(&editor, png("late.png"));
        drop(editor);

        let outcome = pending.await.unwrap();
        assert!(matches!(outcome, InsertOutcome::Detached(_)));
    }
}
