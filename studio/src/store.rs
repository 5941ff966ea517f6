use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use panel_layers::{PanelProject, ProjectError};

const EXTENSION: &str = "panel";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoredId(String);

impl StoredId {
    /// Accepts ids made of ascii letters, digits, `-` and `_`.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoredId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("No saved panel with id {0}")]
    NotFound(StoredId),
    #[error("Invalid panel id {0:?}")]
    InvalidId(String),
    #[error("Failed to read or write panel: {0}")]
    Project(#[from] ProjectError),
    #[error("IO error")]
    Io(#[from] std::io::Error),
}

/// Saved panel projects, one `<id>.panel` archive each.
pub struct PanelStore {
    dir: PathBuf,
}

impl PanelStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, id: &StoredId) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }

    /// Saves under a fresh id.
    pub fn save(&self, project: &PanelProject) -> Result<StoredId, StoreError> {
        let id = StoredId::generate();
        self.save_as(&id, project)?;
        Ok(id)
    }

    /// Saves under `id`, replacing any earlier save.
    #[tracing::instrument(skip(self, project), fields(id = %id, layers = project.stack.len()))]
    pub fn save_as(&self, id: &StoredId, project: &PanelProject) -> Result<(), StoreError> {
        // write beside the target first so a failed save keeps the old file
        let tmp = self.dir.join(format!("{id}.{EXTENSION}.tmp"));
        let saved = project
            .save(&tmp)
            .map_err(StoreError::from)
            .and_then(|()| Ok(fs::rename(&tmp, self.path_of(id))?));
        if let Err(err) = saved {
            let _ = fs::remove_file(&tmp);
            return Err(err);
        }
        tracing::info!("Saved panel");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn load(&self, id: &StoredId) -> Result<PanelProject, StoreError> {
        let path = self.path_of(id);
        if !path.is_file() {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(PanelProject::open(path)?)
    }

    pub fn delete(&self, id: &StoredId) -> Result<bool, StoreError> {
        match fs::remove_file(self.path_of(id)) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Ids of every saved panel, sorted.
    pub fn list(&self) -> Result<Vec<StoredId>, StoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Ok(id) = StoredId::parse(stem) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
