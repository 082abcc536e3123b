use std::fs;
use std::io::Write;
use std::path::Path;

use reader_core::DEFAULT_RATIO;
use reader_logging::{reader_error, reader_info, reader_warn};
use serde::{Deserialize, Serialize};

const STATE_FILENAME: &str = "ui_state.ron";

/// Layout preferences kept between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct UiState {
    pub split_ratio: f32,
    pub dark_mode: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            split_ratio: DEFAULT_RATIO,
            dark_mode: false,
        }
    }
}

pub(crate) fn load_ui_state(dir: &Path) -> UiState {
    let path = dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return UiState::default();
        }
        Err(err) => {
            reader_warn!("Failed to read UI state from {:?}: {}", path, err);
            return UiState::default();
        }
    };

    match ron::from_str(&content) {
        Ok(state) => {
            reader_info!("Loaded UI state from {:?}", path);
            state
        }
        Err(err) => {
            reader_warn!("Failed to parse UI state from {:?}: {}", path, err);
            UiState::default()
        }
    }
}

pub(crate) fn save_ui_state(dir: &Path, state: UiState) {
    let content = match ron::ser::to_string_pretty(&state, ron::ser::PrettyConfig::new()) {
        Ok(text) => text,
        Err(err) => {
            reader_error!("Failed to serialize UI state: {}", err);
            return;
        }
    };
    if let Err(err) = write_atomic(dir, STATE_FILENAME, &content) {
        reader_error!("Failed to write UI state to {:?}: {}", dir, err);
    }
}

/// Write through a temp file in the same directory, then rename over the target.
fn write_atomic(dir: &Path, filename: &str, content: &str) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dir.join(filename)).map_err(|err| err.error)?;
    Ok(())
}
