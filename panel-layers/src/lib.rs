mod history;
mod layer;
mod list;
mod project;
mod selection;
mod session;
mod stack;
mod style;

pub use history::{DEFAULT_HISTORY_LIMIT, Edit, History, replay};
pub use layer::{
    Geometry, HexColor, HexColorError, Layer, LayerId, LayerKind, LayerSpec, MIN_LAYER_SIZE,
    ParseKindError,
};
pub use list::LayerList;
pub use project::{FORMAT_VERSION, PanelImage, PanelMetadata, PanelProject, ProjectError};
pub use selection::{Selection, TransformDelta};
pub use session::EditorSession;
pub use stack::{Direction, LayerStack, StackError};
pub use style::{CharacterPalette, ColorStyle, ColoringMode, PostProcessSettings};
