use crate::preferences::{PreferenceSnapshot, PreferenceStore};

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

const PREFERENCES_FILE: &str = "preferences.bin";

pub fn save_preferences(store: &PreferenceStore, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating data dir {}", dir.display()))?;

    // Replace atomically via a temp file
    let path = dir.join(PREFERENCES_FILE);
    let tmp_path = dir.join(format!("{}.tmp", PREFERENCES_FILE));
    let mut writer = BufWriter::new(File::create(&tmp_path)?);
    bincode::serialize_into(&mut writer, &store.export())?;
    writer.flush()?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// Restores saved preferences if a file exists. Returns whether one was
/// found.
pub fn load_preferences(store: &PreferenceStore, dir: &Path) -> Result<bool> {
    let path = dir.join(PREFERENCES_FILE);
    if !path.exists() {
        return Ok(false);
    }

    let f = File::open(&path)?;
    let saved: PreferenceSnapshot = bincode::deserialize_from(f)
        .with_context(|| format!("decoding {}", path.display()))?;
    let applied = store.restore(saved);
    info!("Loaded {} preferences from disk.", applied);
    Ok(true)
}
