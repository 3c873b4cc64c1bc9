//! Local persisted state
//!
//! A small key/value JSON file next to the config. Holds the remembered
//! finder, the chosen language and the preferred coordinate system.

use crate::error::Result;
use funnskjema_common::{CoordSystem, FinderInfo, Lang};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const STORE_FILE_NAME: &str = "storage.json";

pub const KEY_FINDER: &str = "funnskjema.finder";
pub const KEY_LANG: &str = "funnskjema.lang";
pub const KEY_COORDSYS: &str = "funnskjema.coordsys";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStore {
    /// Version (compatibility check)
    version: u32,
    entries: BTreeMap<String, serde_json::Value>,
}

impl LocalStore {
    const CURRENT_VERSION: u32 = 1;

    /// Default store location, `~/.config/funnskjema/storage.json`
    pub fn default_path() -> Result<PathBuf> {
        Ok(crate::config::Config::config_dir()?.join(STORE_FILE_NAME))
    }

    /// Reads the store. Missing, unreadable or outdated files give an empty store.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                log::warn!("local store unreadable ({}): {}", path.display(), e);
                return Self::default();
            }
        };
        Self::checked(serde_json::from_reader(BufReader::new(file)))
    }

    /// `load` on tokio's file API, for use inside the export pipeline
    pub async fn load_async(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Self::checked(serde_json::from_str(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => {
                log::warn!("local store unreadable ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn checked(parsed: serde_json::Result<LocalStore>) -> Self {
        match parsed {
            Ok(store) if store.version == Self::CURRENT_VERSION => store,
            Ok(store) => {
                log::warn!(
                    "local store version {} does not match {}, starting fresh",
                    store.version,
                    Self::CURRENT_VERSION
                );
                Self::default()
            }
            Err(e) => {
                log::warn!("local store is not valid JSON, starting fresh: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub async fn save_async(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, serde_json::to_vec_pretty(self)?).await?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.entries.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("ignoring malformed store entry {}: {}", key, e);
                None
            }
        }
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        self.entries
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remembered_finder(&self) -> Option<FinderInfo> {
        self.get(KEY_FINDER)
    }

    pub fn remember_finder(&mut self, finder: &FinderInfo) -> Result<()> {
        self.set(KEY_FINDER, finder)
    }

    pub fn lang(&self) -> Option<Lang> {
        self.get(KEY_LANG)
    }

    pub fn set_lang(&mut self, lang: Lang) -> Result<()> {
        self.set(KEY_LANG, &lang)
    }

    pub fn coord_system(&self) -> Option<CoordSystem> {
        self.get(KEY_COORDSYS)
    }

    pub fn set_coord_system(&mut self, system: CoordSystem) -> Result<()> {
        self.set(KEY_COORDSYS, &system)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: BTreeMap::new(),
        }
    }
}
