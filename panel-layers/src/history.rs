use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{Direction, Geometry, HexColor, LayerId, LayerSpec, LayerStack};

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One discrete change to a [`LayerStack`]. Edits carry every id they touch
/// so a log of them can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Edit {
    AddLayer { id: LayerId, spec: LayerSpec },
    RemoveLayer { id: LayerId },
    SetVisibility { id: LayerId, visible: bool },
    ToggleVisibility { id: LayerId },
    SetOpacity { id: LayerId, opacity: f64 },
    Reorder { id: LayerId, direction: Direction },
    SetGeometry { id: LayerId, geometry: Geometry },
    Rename { id: LayerId, name: String },
    SetColor { id: LayerId, color: Option<HexColor> },
}

impl Edit {
    /// Applies the edit, returning whether the stack changed.
    pub fn apply(&self, stack: &mut LayerStack) -> bool {
        match self {
            Edit::AddLayer { id, spec } => stack.push_with_id(id.clone(), spec.clone()),
            Edit::RemoveLayer { id } => stack.remove_layer(id),
            Edit::SetVisibility { id, visible } => stack.set_visibility(id, *visible),
            Edit::ToggleVisibility { id } => stack.toggle_visibility(id),
            Edit::SetOpacity { id, opacity } => stack.set_opacity(id, *opacity),
            Edit::Reorder { id, direction } => stack.reorder(id, *direction),
            Edit::SetGeometry { id, geometry } => stack.set_geometry(id, *geometry),
            Edit::Rename { id, name } => stack.rename(id, name.as_str()),
            Edit::SetColor { id, color } => stack.set_color(id, color.clone()),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Edit::AddLayer { spec, .. } => format!("Add {} layer", spec.kind.label()),
            Edit::RemoveLayer { id } => format!("Remove layer {id}"),
            Edit::SetVisibility { id, visible: true } => format!("Show layer {id}"),
            Edit::SetVisibility { id, visible: false } => format!("Hide layer {id}"),
            Edit::ToggleVisibility { id } => format!("Toggle layer {id}"),
            Edit::SetOpacity { id, opacity } => {
                format!("Set opacity of {id} to {}%", (opacity * 100.0).round())
            }
            Edit::Reorder { id, direction } => format!("Move layer {id} {direction:?}"),
            Edit::SetGeometry { id, .. } => format!("Transform layer {id}"),
            Edit::Rename { id, name } => format!("Rename layer {id} to {name}"),
            Edit::SetColor { id, .. } => format!("Recolor layer {id}"),
        }
    }
}

/// Rebuilds a stack by applying an edit log on top of `initial`.
pub fn replay<'a>(initial: LayerStack, edits: impl IntoIterator<Item = &'a Edit>) -> LayerStack {
    edits.into_iter().fold(initial, |mut stack, edit| {
        edit.apply(&mut stack);
        stack
    })
}

#[derive(Debug, Clone)]
struct Revision {
    edit: Edit,
    before: LayerStack,
}

/// Bounded undo/redo over whole-stack snapshots.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Revision>,
    redo: Vec<Revision>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn record(&mut self, edit: Edit, before: LayerStack) {
        self.redo.clear();
        self.undo.push_back(Revision { edit, before });
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo.back().map(|rev| rev.edit.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo.last().map(|rev| rev.edit.description())
    }

    /// Edits currently applied, oldest first.
    pub fn edits(&self) -> impl Iterator<Item = &Edit> {
        self.undo.iter().map(|rev| &rev.edit)
    }

    /// Rolls `stack` back one edit.
    pub fn undo(&mut self, stack: &mut LayerStack) -> bool {
        let Some(revision) = self.undo.pop_back() else {
            return false;
        };
        let after = std::mem::replace(stack, revision.before);
        self.redo.push(Revision {
            edit: revision.edit,
            before: after,
        });
        true
    }

    /// Re-applies the most recently undone edit.
    pub fn redo(&mut self, stack: &mut LayerStack) -> bool {
        let Some(revision) = self.redo.pop() else {
            return false;
        };
        let before = std::mem::replace(stack, revision.before);
        self.undo.push_back(Revision {
            edit: revision.edit,
            before,
        });
        true
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
