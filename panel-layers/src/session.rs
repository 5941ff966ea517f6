use crate::{
    Edit, History, Layer, LayerId, LayerList, LayerSpec, LayerStack, Selection, TransformDelta,
};

/// One editing session: the layer stack, the current selection and the
/// undo history. Every change to the stack goes through [`EditorSession::apply`].
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    stack: LayerStack,
    selection: Selection,
    pending: TransformDelta,
    history: History,
}

impl EditorSession {
    pub fn new(stack: LayerStack) -> Self {
        Self {
            stack,
            ..Default::default()
        }
    }

    pub fn stack(&self) -> &LayerStack {
        &self.stack
    }

    pub fn into_stack(self) -> LayerStack {
        self.stack
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected(&self) -> Option<&Layer> {
        self.selection.id().and_then(|id| self.stack.get(id))
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The part of an in-progress gesture that has not been committed yet.
    pub fn pending_transform(&self) -> TransformDelta {
        self.pending
    }

    pub fn list(&mut self) -> LayerList<'_> {
        LayerList::new(self)
    }

    /// Swaps in a different stack, e.g. after loading a project. Selection
    /// and history start over.
    pub fn replace_stack(&mut self, stack: LayerStack) {
        self.stack = stack;
        self.selection.clear();
        self.pending = TransformDelta::IDENTITY;
        self.history.clear();
    }

    /// Applies an edit and records it for undo if it changed anything.
    pub fn apply(&mut self, edit: Edit) -> bool {
        let before = self.stack.clone();
        if !edit.apply(&mut self.stack) {
            log::trace!("No-op edit: {}", edit.description());
            return false;
        }
        log::debug!("{}", edit.description());
        self.history.record(edit, before);
        self.drop_stale_selection();
        true
    }

    pub fn add_layer(&mut self, spec: LayerSpec) -> LayerId {
        let id = LayerId::generate();
        self.apply(Edit::AddLayer {
            id: id.clone(),
            spec,
        });
        id
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> bool {
        self.apply(Edit::RemoveLayer { id: id.clone() })
    }

    /// Selects `id`, or deselects it if it was already selected. Ids not in
    /// the stack are ignored.
    pub fn select(&mut self, id: &LayerId) {
        if self.stack.get(id).is_none() {
            return;
        }
        self.pending = TransformDelta::IDENTITY;
        self.selection.toggle(id.clone());
    }

    pub fn clear_selection(&mut self) {
        self.pending = TransformDelta::IDENTITY;
        self.selection.clear();
    }

    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selection.id().cloned() else {
            return false;
        };
        let removed = self.remove_layer(&id);
        self.clear_selection();
        removed
    }

    /// Accumulates a delta for the gesture in progress on the selected layer.
    pub fn update_transform(&mut self, delta: TransformDelta) -> bool {
        if self.selection.id().is_none() {
            return false;
        }
        self.pending = self.pending.then(delta);
        true
    }

    /// Commits the pending gesture to the selected layer's geometry. The
    /// scaled size is stored and the pending scale goes back to identity, so
    /// the next gesture starts from the new size.
    pub fn end_transform(&mut self) -> bool {
        let delta = std::mem::take(&mut self.pending);
        let Some(layer) = self.selected() else {
            return false;
        };
        if delta.is_identity() {
            return false;
        }
        let edit = Edit::SetGeometry {
            id: layer.id.clone(),
            geometry: delta.applied_to(layer.geometry),
        };
        self.apply(edit)
    }

    pub fn apply_transform(&mut self, delta: TransformDelta) -> bool {
        self.update_transform(delta) && self.end_transform()
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.stack);
        self.drop_stale_selection();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.stack);
        self.drop_stale_selection();
        redone
    }

    fn drop_stale_selection(&mut self) {
        let stale = self
            .selection
            .id()
            .is_some_and(|id| self.stack.get(id).is_none());
        if stale {
            self.clear_selection();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharacterPalette, Geometry, LayerKind};

    fn seeded() -> EditorSession {
        EditorSession::new(LayerStack::seeded(&CharacterPalette::default()))
    }

    fn hair() -> LayerId {
        LayerId::new("hair-layer")
    }

    fn eyes() -> LayerId {
        LayerId::new("eyes-layer")
    }

    #[test]
    fn select_toggles_and_switches() {
        let mut session = seeded();
        let before = session.stack().clone();

        session.select(&hair());
        assert_eq!(session.selection(), &Selection::Selected(hair()));
        session.select(&eyes());
        assert_eq!(session.selection(), &Selection::Selected(eyes()));
        session.select(&eyes());
        assert_eq!(session.selection(), &Selection::None);

        session.select(&LayerId::new("missing"));
        assert_eq!(session.selection(), &Selection::None);
        assert_eq!(session.stack(), &before);
    }

    #[test]
    fn delete_selected_clears_selection() {
        let mut session = seeded();
        assert!(!session.delete_selected());

        session.select(&eyes());
        assert!(session.delete_selected());
        assert_eq!(session.selection(), &Selection::None);
        assert!(session.stack().get(&eyes()).is_none());
    }

    #[test]
    fn removing_the_selected_layer_clears_selection() {
        let mut session = seeded();
        session.select(&hair());
        session.remove_layer(&hair());
        assert_eq!(session.selection(), &Selection::None);
    }

    #[test]
    fn transform_requires_a_selection() {
        let mut session = seeded();
        assert!(!session.apply_transform(TransformDelta::translate(10.0, 10.0)));
        assert!(!session.history().can_undo());
    }

    #[test]
    fn scale_does_not_compound() {
        let mut session = seeded();
        session.select(&hair());

        assert!(session.apply_transform(TransformDelta::scale(2.0, 2.0)));
        assert_eq!(session.pending_transform(), TransformDelta::IDENTITY);
        assert_eq!(
            session.selected().unwrap().geometry,
            Geometry::new(50.0, 50.0, 200.0, 200.0)
        );

        assert!(session.apply_transform(TransformDelta::translate(5.0, 5.0)));
        assert_eq!(
            session.selected().unwrap().geometry,
            Geometry::new(55.0, 55.0, 200.0, 200.0)
        );

        assert!(session.apply_transform(TransformDelta::scale(0.5, 1.0)));
        assert_eq!(
            session.selected().unwrap().geometry,
            Geometry::new(55.0, 55.0, 100.0, 200.0)
        );
    }

    #[test]
    fn shrinking_below_minimum_keeps_the_dimension() {
        let mut session = seeded();
        session.select(&eyes());
        // 40x20 scaled by 0.1 would be 4x2.
        assert!(!session.apply_transform(TransformDelta::scale(0.1, 0.1)));
        assert_eq!(
            session.selected().unwrap().geometry,
            Geometry::new(80.0, 80.0, 40.0, 20.0)
        );
    }

    #[test]
    fn gesture_updates_accumulate_until_committed() {
        let mut session = seeded();
        session.select(&hair());
        session.update_transform(TransformDelta::translate(1.0, 2.0));
        session.update_transform(TransformDelta::translate(3.0, 4.0));
        assert_eq!(session.stack().get(&hair()).unwrap().geometry.x, 50.0);

        assert!(session.end_transform());
        let geometry = session.stack().get(&hair()).unwrap().geometry;
        assert_eq!((geometry.x, geometry.y), (54.0, 56.0));
        assert!(!session.end_transform());
    }

    #[test]
    fn undo_restores_a_deleted_layer_without_reselecting() {
        let mut session = seeded();
        session.select(&hair());
        session.delete_selected();
        assert!(session.undo());
        assert!(session.stack().get(&hair()).is_some());
        assert_eq!(session.selection(), &Selection::None);

        assert!(session.redo());
        assert!(session.stack().get(&hair()).is_none());
    }

    #[test]
    fn undo_of_an_add_drops_its_selection() {
        let mut session = EditorSession::default();
        let id = session.add_layer(LayerSpec::new(
            LayerKind::Background,
            Geometry::new(0.0, 0.0, 300.0, 400.0),
        ));
        session.select(&id);
        assert!(session.undo());
        assert!(session.stack().is_empty());
        assert_eq!(session.selection(), &Selection::None);
    }
}
