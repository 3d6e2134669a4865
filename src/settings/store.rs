use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, error, warn};

use super::entities::{Preset, Settings};

pub const SETTINGS_FILE: &str = "settings.json";
pub const PRESETS_FILE: &str = "presets.json";

type Presets = BTreeMap<String, Preset>;

/// Interface for persisting [Settings] and named [Preset]s.
///
/// Settings persistence never fails from the caller's point of view: reminders have to keep
/// working even when the disk doesn't. Presets are an explicit user action, so their errors are
/// returned.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns stored settings or defaults when nothing usable is stored.
    async fn load(&self) -> Settings;

    async fn save(&self, settings: &Settings);

    /// Names of all saved presets in alphabetical order.
    async fn list_presets(&self) -> Result<Vec<String>>;

    /// Saves `preset` under `name`, replacing any previous preset with that name.
    async fn save_preset(&self, name: &str, preset: &Preset) -> Result<()>;

    async fn load_preset(&self, name: &str) -> Result<Option<Preset>>;
}

/// The main realization of [SettingsStore]. Keeps two pretty-printed JSON files in a directory.
pub struct JsonSettingsStore {
    dir: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn presets_path(&self) -> PathBuf {
        self.dir.join(PRESETS_FILE)
    }

    async fn read_presets(&self) -> Presets {
        match read_json::<Presets>(&self.presets_path()).await {
            Ok(Some(presets)) => presets,
            Ok(None) => Presets::new(),
            Err(e) => {
                warn!("Presets file is unreadable, treating it as empty: {e:?}");
                Presets::new()
            }
        }
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> Settings {
        match read_json::<Settings>(&self.settings_path()).await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("No settings stored yet, using defaults");
                Settings::default()
            }
            Err(e) => {
                warn!("Stored settings are corrupt, using defaults: {e:?}");
                Settings::default()
            }
        }
    }

    async fn save(&self, settings: &Settings) {
        if let Err(e) = write_json_atomic(&self.settings_path(), settings).await {
            error!("Failed to save settings {e:?}");
        }
    }

    async fn list_presets(&self) -> Result<Vec<String>> {
        Ok(self.read_presets().await.into_keys().collect())
    }

    async fn save_preset(&self, name: &str, preset: &Preset) -> Result<()> {
        preset.validate()?;
        let mut presets = self.read_presets().await;
        presets.insert(name.to_owned(), preset.clone());
        write_json_atomic(&self.presets_path(), &presets)
            .await
            .with_context(|| format!("Failed to save preset {name:?}"))
    }

    async fn load_preset(&self, name: &str) -> Result<Option<Preset>> {
        Ok(self.read_presets().await.remove(name))
    }
}

/// Reads a JSON file. A missing file is `Ok(None)`.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {path:?}")),
    };
    let value = serde_json::from_slice(&content)
        .with_context(|| format!("Failed to parse {path:?}"))?;
    Ok(Some(value))
}

/// Writes into a sibling temporary file and renames it over `path`, so a crash mid-write never
/// leaves a half-written file behind.
async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buffer = serde_json::to_vec_pretty(value)?;
    buffer.push(b'\n');

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file = fs::File::create(&temp_path).await?;
    file.write_all(&buffer).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&temp_path, path).await?;
    Ok(())
}
