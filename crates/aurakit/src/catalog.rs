use crate::store::get_data_dir;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

const BUNDLED_CATALOG: &str = include_str!("content/catalog.toml");
const VISUALIZATION_PREFIX: &str = "Visualización:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Crystal {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub body: String,
    pub benefits: String,
    pub message: String,
}

impl Crystal {
    /// Plain-text card copied to the clipboard.
    pub fn clipboard_text(&self) -> String {
        [
            &self.name,
            &self.description,
            &self.body,
            &self.benefits,
            &self.message,
        ]
        .map(|s| s.as_str())
        .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Frequency {
    pub hz: u32,
    pub title: String,
    pub content: String,
}

impl Frequency {
    /// Usage paragraphs and the optional visualization paragraph, with its
    /// prefix stripped.
    pub fn sections(&self) -> (Vec<&str>, Option<&str>) {
        let segments: Vec<&str> = split_paragraphs(&self.content);
        let vis = segments
            .iter()
            .position(|s| has_prefix_ignore_case(s.trim_start(), VISUALIZATION_PREFIX));

        match vis {
            Some(idx) => {
                let text = segments[idx].trim_start();
                let text = text[VISUALIZATION_PREFIX.len()..].trim_start();
                (segments[..idx].to_vec(), Some(text))
            }
            None => (segments, None),
        }
    }

    pub fn display_title(&self) -> String {
        format!("{} Hz – {}", self.hz, self.title)
    }

    pub fn media_name(&self) -> String {
        format!("frequencies/{}.mp3", self.hz)
    }
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.to_lowercase() == prefix.to_lowercase())
}

/// Splits on blank lines (lines holding only whitespace count as blank).
fn split_paragraphs(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                out.push(text[s..end].trim_end());
            }
        } else {
            start.get_or_insert(offset);
            end = offset + line.len();
        }
        offset += line.len();
    }
    if let Some(s) = start {
        out.push(text[s..end].trim_end());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Command {
    pub id: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Geometry {
    pub slug: String,
    pub name: String,
    pub file: String,
    pub description: String,
}

impl Geometry {
    pub fn image_name(&self) -> String {
        format!("geometries/{}", self.file)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub crystals: Vec<Crystal>,
    #[serde(default)]
    pub frequencies: Vec<Frequency>,
    #[serde(default)]
    pub commands: Vec<Command>,
    #[serde(default)]
    pub geometries: Vec<Geometry>,
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

impl Catalog {
    pub fn from_toml_str(s: &str) -> Result<Self, CatalogError> {
        let c = config::Config::builder()
            .add_source(config::File::from_str(s, config::FileFormat::Toml))
            .build()?;
        Ok(c.try_deserialize()?)
    }

    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUNDLED_CATALOG)
    }

    /// The override file if it exists, the bundled catalog otherwise.
    pub fn load(override_path: &Path) -> Result<Self, CatalogError> {
        if !override_path.exists() {
            return Self::bundled();
        }
        log::info!("Loading catalog from {}", override_path.display());
        let c = config::Config::builder()
            .add_source(config::File::from(override_path.to_path_buf()))
            .build()?;
        Ok(c.try_deserialize()?)
    }

    pub fn crystal(&self, index: usize) -> Option<&Crystal> {
        self.crystals.get(index)
    }
}

pub fn get_override_path() -> Result<PathBuf, CatalogError> {
    Ok(get_data_dir()?.join("catalog.toml"))
}

static CATALOG: OnceLock<RwLock<Arc<Catalog>>> = OnceLock::new();

fn load_current() -> Catalog {
    let loaded = get_override_path().and_then(|p| Catalog::load(&p));
    match loaded {
        Ok(c) => c,
        Err(e) => {
            log::error!("Failed to load catalog, using bundled content: {}", e);
            Catalog::bundled().unwrap_or_else(|e| {
                log::error!("Bundled catalog is unreadable: {}", e);
                Catalog::default()
            })
        }
    }
}

/// Process-wide catalog, loaded on first use.
pub fn current() -> Arc<Catalog> {
    let lock = CATALOG.get_or_init(|| RwLock::new(Arc::new(load_current())));
    lock.read().clone()
}

pub fn reload() -> Arc<Catalog> {
    let fresh = Arc::new(load_current());
    let lock = CATALOG.get_or_init(|| RwLock::new(fresh.clone()));
    *lock.write() = fresh.clone();
    fresh
}

/// Finds `name` (e.g. `frequencies/396.mp3`) under the XDG data dirs.
pub fn find_media(name: &str) -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix("aura").find_data_file(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog() {
        let c = Catalog::bundled().unwrap();
        assert_eq!(c.crystals.len(), 16);
        assert_eq!(c.crystals[0].name, "Cuarzo Cristal (Transparente)");
        assert!(!c.frequencies.is_empty());
        assert_eq!(c.commands.len(), 4);
        assert!(!c.geometries.is_empty());
        assert!(c.crystal(16).is_none());
    }

    #[test]
    fn test_crystal_clipboard_text() {
        let c = Crystal {
            slug: "jade".into(),
            name: "Jade".into(),
            description: "Piedra verde.".into(),
            body: "Riñones".into(),
            benefits: "Calma".into(),
            message: "Respirá.".into(),
        };
        assert_eq!(c.clipboard_text(), "Jade\nPiedra verde.\nRiñones\nCalma\nRespirá.");
    }

    #[test]
    fn test_frequency_sections() {
        let f = Frequency {
            hz: 174,
            title: "Alivio".into(),
            content: "Uso: Relajación.\n  \nOtra línea.\n\nVisualización: Imagina luz.".into(),
        };
        let (usage, vis) = f.sections();
        assert_eq!(usage, vec!["Uso: Relajación.", "Otra línea."]);
        assert_eq!(vis, Some("Imagina luz."));
        assert_eq!(f.display_title(), "174 Hz – Alivio");
        assert_eq!(f.media_name(), "frequencies/174.mp3");

        let plain = Frequency {
            hz: 1,
            title: String::new(),
            content: "Solo uso.".into(),
        };
        assert_eq!(plain.sections(), (vec!["Solo uso."], None));
    }

    #[test]
    fn test_bundled_frequencies_have_visualizations() {
        let c = Catalog::bundled().unwrap();
        let f = c.frequencies.iter().find(|f| f.hz == 174).unwrap();
        let (usage, vis) = f.sections();
        assert!(usage[0].starts_with("Uso:"));
        assert!(vis.is_some_and(|v| v.starts_with("Imagina")));
    }

    #[test]
    fn test_override_file_replaces_bundle() {
        let dir = crate::store::scratch_dir("catalog");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("catalog.toml");
        std::fs::write(
            &path,
            "[[crystals]]\nslug = \"jade\"\nname = \"Jade\"\ndescription = \"d\"\nbody = \"b\"\nbenefits = \"x\"\nmessage = \"m\"\n",
        )
        .unwrap();

        let c = Catalog::load(&path).unwrap();
        assert_eq!(c.crystals.len(), 1);
        assert!(c.frequencies.is_empty());

        let missing = Catalog::load(&dir.join("nope.toml")).unwrap();
        assert_eq!(missing.crystals.len(), 16);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
