use crate::{Direction, Edit, EditorSession, HexColor, LayerId, LayerStack};

/// The operations behind the layer panel's buttons and sliders. Every call
/// forwards to the session and hands back the stack to redraw.
pub struct LayerList<'a> {
    session: &'a mut EditorSession,
}

impl<'a> LayerList<'a> {
    pub fn new(session: &'a mut EditorSession) -> Self {
        Self { session }
    }

    pub fn stack(&self) -> &LayerStack {
        self.session.stack()
    }

    pub fn toggle_visibility(&mut self, id: &LayerId) -> &LayerStack {
        self.forward(Edit::ToggleVisibility { id: id.clone() })
    }

    pub fn move_up(&mut self, id: &LayerId) -> &LayerStack {
        self.forward(Edit::Reorder {
            id: id.clone(),
            direction: Direction::Up,
        })
    }

    pub fn move_down(&mut self, id: &LayerId) -> &LayerStack {
        self.forward(Edit::Reorder {
            id: id.clone(),
            direction: Direction::Down,
        })
    }

    pub fn delete(&mut self, id: &LayerId) -> &LayerStack {
        self.forward(Edit::RemoveLayer { id: id.clone() })
    }

    pub fn set_opacity(&mut self, id: &LayerId, opacity: f64) -> &LayerStack {
        self.forward(Edit::SetOpacity {
            id: id.clone(),
            opacity,
        })
    }

    pub fn rename(&mut self, id: &LayerId, name: impl Into<String>) -> &LayerStack {
        self.forward(Edit::Rename {
            id: id.clone(),
            name: name.into(),
        })
    }

    pub fn set_color(&mut self, id: &LayerId, color: Option<HexColor>) -> &LayerStack {
        self.forward(Edit::SetColor {
            id: id.clone(),
            color,
        })
    }

    fn forward(&mut self, edit: Edit) -> &LayerStack {
        self.session.apply(edit);
        self.session.stack()
    }
}

#[cfg(test)]
mod tests {
    use crate::{CharacterPalette, EditorSession, LayerId, LayerStack, Selection};

    #[test]
    fn list_forwards_to_the_session() {
        let mut session = EditorSession::new(LayerStack::seeded(&CharacterPalette::default()));
        let hair = LayerId::new("hair-layer");
        let eyes = LayerId::new("eyes-layer");
        session.select(&eyes);

        let mut list = session.list();
        let stack = list.move_down(&hair);
        assert_eq!(stack.index_of(&hair), Some(1));
        let stack = list.move_down(&hair);
        assert_eq!(stack.index_of(&hair), Some(1));

        assert!(!list.toggle_visibility(&hair).get(&hair).unwrap().visible);
        assert_eq!(list.set_opacity(&hair, 3.0).get(&hair).unwrap().opacity, 1.0);
        assert_eq!(list.rename(&hair, "Bangs").get(&hair).unwrap().name, "Bangs");
        assert_eq!(list.set_color(&hair, None).get(&hair).unwrap().color, None);
        assert_eq!(list.delete(&eyes).len(), 1);

        assert_eq!(session.selection(), &Selection::None);
        assert!(session.history().can_undo());
    }
}
