use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One (scene, distortion label) pair used to open round 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub scene: String,
    pub distortion_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct SeedDataset {
    entries: Vec<SeedEntry>,
}

impl SeedDataset {
    pub fn new(entries: Vec<SeedEntry>) -> Self {
        Self { entries }
    }

    /// Loads a `.json` array of entries, or a two-column `scene,distortion_type`
    /// CSV file. Input must be UTF-8.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading seed dataset {}", path.display()))?;
        let raw = raw.trim_start_matches('\u{feff}');

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
            || raw.trim_start().starts_with('[');

        let entries = if is_json {
            serde_json::from_str::<Vec<SeedEntry>>(raw)
                .with_context(|| format!("parsing seed dataset {}", path.display()))?
        } else {
            parse_csv(raw)
        };

        let dataset = Self::new(
            entries
                .into_iter()
                .filter(|e| !e.scene.trim().is_empty() && !e.distortion_type.trim().is_empty())
                .collect(),
        );

        if dataset.is_empty() {
            bail!("seed dataset {} has no usable entries", path.display());
        }

        tracing::info!(entries = dataset.len(), "loaded seed dataset {}", path.display());
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&SeedEntry> {
        self.entries.choose(rng)
    }
}

/// The label is the last column, so commas inside the scene text survive.
fn parse_csv(raw: &str) -> Vec<SeedEntry> {
    raw.lines()
        .filter_map(|line| {
            let (scene, label) = line.rsplit_once(',')?;
            let scene = unquote(scene);
            let label = unquote(label);
            if scene.eq_ignore_ascii_case("scene") {
                return None;
            }
            Some(SeedEntry {
                scene: scene.to_string(),
                distortion_type: label.to_string(),
            })
        })
        .collect()
}

fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field)
}
