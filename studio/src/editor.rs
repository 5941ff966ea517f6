use std::path::Path;

use bytes::Bytes;
use panel_layers::{EditorSession, PanelImage, PanelMetadata, PanelProject, ProjectError};

use crate::{
    colorize::{ColorizeRequest, Colorizer},
    notify::Notifier,
    store::{PanelStore, StoreError, StoredId},
};

#[derive(thiserror::Error, Debug)]
pub enum EditorError {
    #[error("Upload a panel before colorizing")]
    NoPanel,
    #[error("Colorization failed: {0}")]
    Colorize(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Bad image: {0}")]
    Image(#[from] ProjectError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which base image sits under the layers.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseView {
    #[default]
    Colorized,
    Original,
}

/// The panel editor page: one project, its editing session and the id it
/// was last saved under.
pub struct PanelEditor {
    project: PanelProject,
    session: EditorSession,
    reference: Option<PanelImage>,
    stored_id: Option<StoredId>,
    view: BaseView,
    awaiting_feedback: bool,
}

impl PanelEditor {
    pub fn new(metadata: PanelMetadata) -> Self {
        Self::from_project(PanelProject::new(metadata), None)
    }

    pub fn from_project(mut project: PanelProject, stored_id: Option<StoredId>) -> Self {
        let stack = std::mem::take(&mut project.stack);
        Self {
            project,
            session: EditorSession::new(stack),
            reference: None,
            stored_id,
            view: BaseView::default(),
            awaiting_feedback: false,
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn metadata(&self) -> &PanelMetadata {
        &self.project.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut PanelMetadata {
        &mut self.project.metadata
    }

    pub fn stored_id(&self) -> Option<&StoredId> {
        self.stored_id.as_ref()
    }

    /// Replaces the panel being edited. A new upload starts from a blank
    /// stack until it is colorized, and is saved under a new id.
    pub fn upload(&mut self, original: PanelImage) {
        tracing::info!("Uploaded {}x{} panel", original.width, original.height);
        self.project.original = Some(original);
        self.project.colorized = None;
        self.session.replace_stack(Default::default());
        self.stored_id = None;
        self.awaiting_feedback = false;
    }

    pub fn upload_file(&mut self, path: impl AsRef<Path>) -> Result<(), EditorError> {
        self.upload(PanelImage::open(path)?);
        Ok(())
    }

    /// An already colored panel of the character, sent along with the next
    /// colorize call. `None` clears it.
    pub fn set_reference(&mut self, reference: Option<PanelImage>, notifier: &Notifier) {
        if reference.is_some() {
            notifier.success("Reference image uploaded! This will improve colorization accuracy.");
        }
        self.reference = reference;
    }

    pub fn reference(&self) -> Option<&PanelImage> {
        self.reference.as_ref()
    }

    /// Whether the last colorize result still waits for an authenticity answer.
    pub fn awaiting_feedback(&self) -> bool {
        self.awaiting_feedback
    }

    /// Records the user's answer to "are these colors authentic?". Returns
    /// false when no colorize result is waiting for one.
    pub fn answer_authenticity(&mut self, authentic: bool, notifier: &Notifier) -> bool {
        if !std::mem::take(&mut self.awaiting_feedback) {
            return false;
        }
        if authentic {
            notifier.success("Colors marked as authentic! Added to character database.");
        } else {
            notifier.success("Thanks for your feedback! We'll improve our colorization.");
        }
        true
    }

    pub fn view(&self) -> BaseView {
        self.view
    }

    pub fn toggle_view(&mut self) -> BaseView {
        self.view = match self.view {
            BaseView::Colorized => BaseView::Original,
            BaseView::Original => BaseView::Colorized,
        };
        self.view
    }

    /// The image to draw under the layers for the current view.
    pub fn base_image(&self) -> Option<&PanelImage> {
        match self.view {
            BaseView::Original => self.project.original.as_ref(),
            BaseView::Colorized => self.project.colorized.as_ref(),
        }
    }

    /// Runs the colorizer and starts the layer stack over from its output.
    /// Failures are reported to `notifier` and returned; nothing is retried.
    pub async fn colorize<C: Colorizer>(
        &mut self,
        colorizer: &C,
        notifier: &Notifier,
    ) -> Result<(), EditorError> {
        let result = self.run_colorizer(colorizer).await;
        match &result {
            Ok(()) => notifier.success("Panel colorized successfully!"),
            Err(err) => notifier.error(err.to_string()),
        }
        result
    }

    async fn run_colorizer<C: Colorizer>(&mut self, colorizer: &C) -> Result<(), EditorError> {
        let original = self.project.original.as_ref().ok_or(EditorError::NoPanel)?;
        let metadata = &self.project.metadata;
        let request = ColorizeRequest {
            original: Bytes::from(original.bytes.clone()),
            reference: self.reference.as_ref().map(|r| Bytes::from(r.bytes.clone())),
            character_name: metadata.character_name.clone(),
            palette: metadata.palette.clone(),
            style: metadata.style,
            post_process: metadata.post_process,
        };
        let colorized = colorizer
            .colorize(request)
            .await
            .map_err(|err| EditorError::Colorize(Box::new(err)))?;

        self.project.colorized = Some(PanelImage::from_bytes(colorized.image.to_vec())?);
        self.session.replace_stack(colorized.layers);
        self.view = BaseView::Colorized;
        self.awaiting_feedback = true;
        Ok(())
    }

    /// The project as it would be saved right now.
    pub fn snapshot(&self) -> PanelProject {
        PanelProject {
            stack: self.session.stack().clone(),
            ..self.project.clone()
        }
    }

    /// Saves under the previous id, or a new one on first save.
    pub fn save(
        &mut self,
        store: &PanelStore,
        notifier: &Notifier,
    ) -> Result<StoredId, EditorError> {
        let project = self.snapshot();
        let result = match &self.stored_id {
            Some(id) => store.save_as(id, &project).map(|()| id.clone()),
            None => store.save(&project),
        };
        match result {
            Ok(id) => {
                notifier.success("Panel saved successfully!");
                self.stored_id = Some(id.clone());
                Ok(id)
            }
            Err(err) => {
                notifier.error(format!("Failed to save panel: {err}"));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Cursor,
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use panel_layers::{LayerId, TransformDelta};

    use super::*;
    use crate::colorize::{Colorized, MockColorizer};
    use crate::notify::NoticeLevel;

    fn png() -> PanelImage {
        png_sized(4, 3)
    }

    fn png_sized(width: u32, height: u32) -> PanelImage {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        PanelImage::from_bytes(bytes.into_inner()).unwrap()
    }

    struct FailingColorizer;

    #[derive(thiserror::Error, Debug)]
    #[error("service unavailable")]
    struct Unavailable;

    #[async_trait]
    impl Colorizer for FailingColorizer {
        type Error = Unavailable;

        async fn colorize(&self, _request: ColorizeRequest) -> Result<Colorized, Self::Error> {
            Err(Unavailable)
        }
    }

    /// Remembers the reference image of every request.
    #[derive(Default)]
    struct RecordingColorizer {
        references: Arc<Mutex<Vec<Option<Bytes>>>>,
    }

    #[async_trait]
    impl Colorizer for RecordingColorizer {
        type Error = Unavailable;

        async fn colorize(&self, request: ColorizeRequest) -> Result<Colorized, Self::Error> {
            self.references.lock().unwrap().push(request.reference.clone());
            Ok(Colorized {
                image: request.original,
                layers: panel_layers::LayerStack::seeded(&request.palette),
            })
        }
    }

    #[tokio::test]
    async fn reference_reaches_the_colorizer() {
        let notifier = Notifier::new(8);
        let mut notices = notifier.subscribe();
        let colorizer = RecordingColorizer::default();
        let mut editor = PanelEditor::new(PanelMetadata::default());
        editor.upload(png());

        editor.colorize(&colorizer, &notifier).await.unwrap();
        let reference = png_sized(2, 2);
        editor.set_reference(Some(reference.clone()), &notifier);
        editor.colorize(&colorizer, &notifier).await.unwrap();

        let references = colorizer.references.lock().unwrap().clone();
        assert_eq!(references, [None, Some(Bytes::from(reference.bytes))]);

        notices.recv().await.unwrap();
        let notice = notices.recv().await.unwrap();
        assert!(notice.message.starts_with("Reference image uploaded!"));
    }

    #[tokio::test]
    async fn authenticity_is_asked_once_per_colorize() {
        let notifier = Notifier::new(8);
        let mut notices = notifier.subscribe();
        let mut editor = PanelEditor::new(PanelMetadata::default());
        editor.upload(png());
        assert!(!editor.answer_authenticity(true, &notifier));

        editor
            .colorize(&MockColorizer::new(Duration::ZERO), &notifier)
            .await
            .unwrap();
        assert!(editor.awaiting_feedback());
        assert!(editor.answer_authenticity(true, &notifier));
        assert!(!editor.answer_authenticity(false, &notifier));

        notices.recv().await.unwrap();
        assert_eq!(
            notices.recv().await.unwrap().message,
            "Colors marked as authentic! Added to character database."
        );
    }

    #[tokio::test]
    async fn new_upload_is_saved_under_a_new_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = PanelStore::open(dir.path()).unwrap();
        let notifier = Notifier::new(8);
        let mut editor = PanelEditor::new(PanelMetadata::default());
        editor.upload(png());
        editor
            .colorize(&MockColorizer::new(Duration::ZERO), &notifier)
            .await
            .unwrap();
        let first = editor.save(&store, &notifier).unwrap();

        let project = store.load(&first).unwrap();
        let mut editor = PanelEditor::from_project(project, Some(first.clone()));
        editor.upload(png_sized(9, 9));
        assert_eq!(editor.stored_id(), None);
        let second = editor.save(&store, &notifier).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.list().unwrap().len(), 2);

        let kept = store.load(&first).unwrap();
        assert_eq!(kept.original.unwrap().width, 4);
        assert_eq!(kept.stack.len(), 2);
    }

    #[tokio::test]
    async fn colorize_seeds_layers_and_notifies() {
        let notifier = Notifier::new(8);
        let mut notices = notifier.subscribe();
        let mut editor = PanelEditor::new(PanelMetadata::default());
        editor.upload(png());

        editor
            .colorize(&MockColorizer::new(Duration::ZERO), &notifier)
            .await
            .unwrap();

        assert_eq!(editor.session().stack().len(), 2);
        assert!(editor.base_image().is_some());
        assert_eq!(notices.recv().await.unwrap().level, NoticeLevel::Success);
    }

    #[tokio::test]
    async fn colorize_without_upload_fails() {
        let notifier = Notifier::new(8);
        let mut editor = PanelEditor::new(PanelMetadata::default());
        let result = editor.colorize(&MockColorizer::new(Duration::ZERO), &notifier).await;
        assert!(matches!(result, Err(EditorError::NoPanel)));
    }

    #[tokio::test]
    async fn failed_colorize_is_reported_and_keeps_layers() {
        let notifier = Notifier::new(8);
        let mut notices = notifier.subscribe();
        let mut editor = PanelEditor::new(PanelMetadata::default());
        editor.upload(png());
        editor.colorize(&MockColorizer::new(Duration::ZERO), &notifier).await.unwrap();
        notices.recv().await.unwrap();

        let result = editor.colorize(&FailingColorizer, &notifier).await;
        assert!(matches!(result, Err(EditorError::Colorize(_))));
        assert_eq!(editor.session().stack().len(), 2);

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("service unavailable"));
    }

    #[tokio::test]
    async fn save_reuses_the_stored_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = PanelStore::open(dir.path()).unwrap();
        let notifier = Notifier::new(8);
        let mut editor = PanelEditor::new(PanelMetadata::default());
        editor.upload(png());
        editor.colorize(&MockColorizer::new(Duration::ZERO), &notifier).await.unwrap();

        let hair = LayerId::new("hair-layer");
        editor.session_mut().select(&hair);
        editor
            .session_mut()
            .apply_transform(TransformDelta::translate(10.0, 0.0));

        let first = editor.save(&store, &notifier).unwrap();
        editor.session_mut().list().move_down(&hair);
        let second = editor.save(&store, &notifier).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.list().unwrap().len(), 1);

        let reopened = PanelEditor::from_project(store.load(&first).unwrap(), Some(first));
        let stack = reopened.session().stack();
        assert_eq!(stack.index_of(&hair), Some(1));
        assert_eq!(stack.get(&hair).unwrap().geometry.x, 60.0);
    }

    #[test]
    fn view_toggles_between_bases() {
        let mut editor = PanelEditor::new(PanelMetadata::default());
        editor.upload(png());
        assert!(editor.base_image().is_none());
        assert_eq!(editor.toggle_view(), BaseView::Original);
        assert!(editor.base_image().is_some());
    }
}
