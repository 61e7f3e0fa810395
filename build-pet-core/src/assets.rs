//! Mood presentation records.
//!
//! The mood enum carries no presentation data of its own; this module maps
//! each mood to the asset the rendering layer should show. The map can be
//! loaded from a JSON object keyed by mood name, and any mood missing from
//! the file keeps its default record.

use crate::error::{Error, Result};
use crate::mood::Mood;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What the rendering layer shows for one mood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodAsset {
    /// Path or identifier of the animation to play.
    pub asset: PathBuf,

    /// Short text form for surfaces that cannot play the animation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl MoodAsset {
    /// Create a record for the given asset path.
    pub fn new(asset: impl Into<PathBuf>) -> Self {
        Self {
            asset: asset.into(),
            caption: None,
        }
    }

    /// Attach a caption to the record.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// One presentation record per mood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetMap {
    pub happy: MoodAsset,
    pub excited: MoodAsset,
    pub warning: MoodAsset,
    pub panic: MoodAsset,
    pub asleep: MoodAsset,
}

impl Default for AssetMap {
    fn default() -> Self {
        Self {
            happy: MoodAsset::new("assets/happy.gif").with_caption("(^_^)"),
            excited: MoodAsset::new("assets/excited.gif").with_caption("(*o*)!"),
            warning: MoodAsset::new("assets/sad.gif").with_caption("(._.)"),
            panic: MoodAsset::new("assets/panic.gif").with_caption("(>_<)!!"),
            asleep: MoodAsset::new("assets/asleep.gif").with_caption("(-_-) zZ"),
        }
    }
}

impl AssetMap {
    /// Load an asset map from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::AssetsReadError {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| Error::AssetsParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the record for a mood.
    pub fn get(&self, mood: Mood) -> &MoodAsset {
        match mood {
            Mood::Happy => &self.happy,
            Mood::Excited => &self.excited,
            Mood::Warning => &self.warning,
            Mood::Panic => &self.panic,
            Mood::Asleep => &self.asleep,
        }
    }

    /// Paths of every asset that does not exist on disk.
    pub fn missing(&self) -> Vec<&Path> {
        Mood::ALL
            .iter()
            .map(|mood| self.get(*mood).asset.as_path())
            .filter(|path| !path.exists())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_default_map_covers_every_mood() {
        let assets = AssetMap::default();
        for mood in Mood::ALL {
            assert!(!assets.get(mood).asset.as_os_str().is_empty());
            assert!(assets.get(mood).caption.is_some());
        }
        assert_eq!(assets.get(Mood::Warning).asset, PathBuf::from("assets/sad.gif"));
    }

    #[test]
    fn test_load_partial_map_keeps_defaults() {
        let path = temp_file(
            "partial_assets.json",
            r#"{
                "happy": { "asset": "/home/me/pika_happy.gif" },
                "panic": { "asset": "/home/me/pika_sad.gif", "caption": "PANIC" }
            }"#,
        );

        let assets = AssetMap::load(&path).unwrap();
        assert_eq!(assets.happy.asset, PathBuf::from("/home/me/pika_happy.gif"));
        assert_eq!(assets.happy.caption, None);
        assert_eq!(assets.panic.caption.as_deref(), Some("PANIC"));
        assert_eq!(assets.asleep, AssetMap::default().asleep);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file() {
        let result = AssetMap::load("/nonexistent/build-pet/assets.json");
        assert!(matches!(result, Err(Error::AssetsReadError { .. })));
    }

    #[test]
    fn test_load_invalid_json() {
        let path = temp_file("broken_assets.json", "{ not json");
        let result = AssetMap::load(&path);
        assert!(matches!(result, Err(Error::AssetsParseError { .. })));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_reports_absent_files() {
        let present = temp_file("present.gif", "GIF89a");
        let mut assets = AssetMap::default();
        assets.happy = MoodAsset::new(&present);

        let missing = assets.missing();
        assert_eq!(missing.len(), 4);
        assert!(!missing.contains(&present.as_path()));

        std::fs::remove_file(&present).ok();
    }
}
