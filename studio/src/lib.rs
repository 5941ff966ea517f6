pub mod colorize;
pub mod config;
pub mod editor;
pub mod gallery;
pub mod notify;
pub mod preferences;
pub mod session;
pub mod storage;
pub mod store;
pub mod telemetry;

pub use colorize::{ColorizeError, ColorizeRequest, Colorized, Colorizer, MockColorizer};
pub use config::AppConfig;
pub use editor::{BaseView, EditorError, PanelEditor};
pub use gallery::{Gallery, GalleryPost, GalleryQuery, SortOrder};
pub use notify::{Notice, NoticeLevel, Notifier};
pub use preferences::{AccountSettings, Language, Preferences, ThemePreferences};
pub use session::{AuthError, AuthSession, User};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{PanelStore, StoreError, StoredId};
