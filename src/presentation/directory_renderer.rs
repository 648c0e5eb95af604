//! Slot renderer that saves revealed images to a directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::domain::entities::{LoadedImage, SlotId};
use crate::domain::ports::SlotRendererPort;

/// Writes each revealed slot to `{dir}/{stem}-{id}.{ext}`.
#[derive(Debug)]
pub struct DirectoryRenderer {
    dir: PathBuf,
    written: Mutex<HashMap<SlotId, PathBuf>>,
    removed: Mutex<Vec<SlotId>>,
}

impl DirectoryRenderer {
    /// Creates the renderer, creating `dir` if needed.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Mutex::new(HashMap::new()),
            removed: Mutex::new(Vec::new()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of images written.
    #[must_use]
    pub fn written_count(&self) -> usize {
        self.written.lock().len()
    }

    /// Number of slots removed after a failed load.
    #[must_use]
    pub fn removed_count(&self) -> usize {
        self.removed.lock().len()
    }

    fn file_name(slot: &SlotId, image: &LoadedImage) -> String {
        let last = image
            .url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default();
        let stem = last.rsplit_once('.').map_or(last, |(stem, _)| stem);
        let stem: String = stem
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .take(48)
            .collect();
        let id: String = slot.as_str().chars().take(8).collect();

        if stem.is_empty() {
            format!("{id}.{}", image.extension())
        } else {
            format!("{stem}-{id}.{}", image.extension())
        }
    }
}

impl SlotRendererPort for DirectoryRenderer {
    fn reveal(&self, slot: &SlotId, image: &LoadedImage) {
        let path = self.dir.join(Self::file_name(slot, image));
        match std::fs::write(&path, &image.bytes) {
            Ok(()) => {
                debug!(slot = %slot, path = %path.display(), "Saved image");
                self.written.lock().insert(slot.clone(), path);
            }
            Err(e) => warn!(slot = %slot, path = %path.display(), error = %e, "Failed to save image"),
        }
    }

    fn remove(&self, slot: &SlotId) {
        if let Some(path) = self.written.lock().remove(slot)
            && let Err(e) = std::fs::remove_file(&path)
        {
            debug!(path = %path.display(), error = %e, "Failed to delete image");
        }
        self.removed.lock().push(slot.clone());
    }
}
