//! Template catalog.
//!
//! The catalog is built once from a JSON tag index of the form
//! `{"meme_templates/drake.jpg": ["choice", "preference"], ...}` and
//! reconciled against the files actually present in the template directory.
//! Only the basename of each key is looked up on disk. If the index is
//! missing, malformed or yields no usable entry, the catalog falls back to a
//! plain listing of the template directory and tag matching is disabled.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{Result, eyre::WrapErr as _};
use log::{info, warn};
use rand::{Rng, seq::SliceRandom};

pub const TEMPLATE_EXTENSIONS: [&str; 2] = ["jpg", "png"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRecord {
    /// Key as written in the tag index
    pub id: String,
    pub file_name: String,
    pub tags: Vec<String>,
}

impl TemplateRecord {
    pub fn matches(&self, topic_lower: &str) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(topic_lower))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates_dir: PathBuf,
    records: Vec<TemplateRecord>,
    templates: Vec<String>,
}

impl Catalog {
    pub fn load(tag_index: &Path, templates_dir: &Path) -> Self {
        match Self::load_tagged(tag_index, templates_dir) {
            Ok(catalog) if !catalog.records.is_empty() => {
                info!(
                    "Loaded tags for {} existing templates from {tag_index:?}",
                    catalog.records.len()
                );
                return catalog;
            }
            Ok(_) => warn!(
                "No valid templates with tags in {tag_index:?}, selection will be random"
            ),
            Err(e) => warn!("{e:#}, selection will be random"),
        }

        let templates = list_templates(templates_dir);
        info!("Found {} untagged templates in {templates_dir:?}", templates.len());
        Self {
            templates_dir: templates_dir.to_path_buf(),
            records: vec![],
            templates,
        }
    }

    fn load_tagged(tag_index: &Path, templates_dir: &Path) -> Result<Self> {
        let src = fs::read_to_string(tag_index)
            .wrap_err_with(|| format!("Couldn't read tag index {tag_index:?}"))?;
        let index: BTreeMap<String, Vec<String>> = serde_json::from_str(&src)
            .wrap_err_with(|| format!("Couldn't parse tag index {tag_index:?}"))?;
        Ok(Self::from_index(index, templates_dir))
    }

    /// Keeps the index entries whose file exists in `templates_dir`.
    pub fn from_index(index: BTreeMap<String, Vec<String>>, templates_dir: &Path) -> Self {
        let mut records = vec![];
        let mut templates = vec![];

        for (id, tags) in index {
            let Some(file_name) = base_name(&id) else {
                warn!("Tag index key {id:?} has no file name. Skipping.");
                continue;
            };

            let on_disk = templates_dir.join(&file_name);
            if !on_disk.is_file() {
                warn!("Template {id:?} not found at {on_disk:?}. Skipping.");
                continue;
            }

            templates.push(file_name.clone());
            records.push(TemplateRecord { id, file_name, tags });
        }

        Self {
            templates_dir: templates_dir.to_path_buf(),
            records,
            templates,
        }
    }

    pub fn select(&self, topic: &str) -> Option<String> {
        self.select_with_rng(topic, &mut rand::thread_rng())
    }

    /// Picks a template whose tags contain `topic` (case-insensitive substring),
    /// or any template when nothing matches.
    pub fn select_with_rng<R: Rng + ?Sized>(&self, topic: &str, rng: &mut R) -> Option<String> {
        let topic_lower = topic.to_lowercase();
        let matching: Vec<&String> = self
            .records
            .iter()
            .filter(|r| r.matches(&topic_lower))
            .map(|r| &r.file_name)
            .collect();

        if let Some(name) = matching.choose(rng) {
            log::debug!("Selected template {name:?} for topic {topic:?} based on tags");
            return Some((*name).clone());
        }

        log::debug!("No tag matched {topic:?}, picking a random template");
        self.templates.choose(rng).cloned()
    }

    pub fn records(&self) -> &[TemplateRecord] {
        &self.records
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn is_tagged(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn template_path(&self, file_name: &str) -> PathBuf {
        self.templates_dir.join(file_name)
    }
}

fn base_name(key: &str) -> Option<String> {
    // keys may have been recorded on another OS
    let normalized = key.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

fn list_templates(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Couldn't list template directory {dir:?}: {e}");
            return vec![];
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
        })
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::{SeedableRng, rngs::StdRng};
    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"not really an image").unwrap();
    }

    fn tagged_fixture() -> (TempDir, Catalog) {
        let dir = TempDir::new().unwrap();
        let templates = dir.path().join("meme_templates");
        fs::create_dir(&templates).unwrap();
        for name in ["drake.jpg", "distracted.png", "fine.jpg", "astronaut.png"] {
            touch(&templates, name);
        }

        let index = dir.path().join("meme_tags.json");
        fs::write(
            &index,
            r#"{
                "meme_templates/drake.jpg": ["choice", "Preference"],
                "meme_templates/distracted.png": ["temptation", "choice", "category"],
                "/home/someone/memes/fine.jpg": ["denial", "fire"],
                "meme_templates/astronaut.png": ["always has been", "space"],
                "meme_templates/missing.jpg": ["choice"]
            }"#,
        )
        .unwrap();

        let catalog = Catalog::load(&index, &templates);
        (dir, catalog)
    }

    #[test]
    fn keeps_only_records_present_on_disk() {
        let (_dir, catalog) = tagged_fixture();
        assert!(catalog.is_tagged());
        assert_eq!(catalog.records().len(), 4);
        assert!(catalog.templates().iter().all(|t| t != "missing.jpg"));

        let fine = catalog
            .records()
            .iter()
            .find(|r| r.file_name == "fine.jpg")
            .unwrap();
        assert_eq!(fine.id, "/home/someone/memes/fine.jpg");
    }

    #[test]
    fn matching_topic_only_selects_tagged_templates() {
        let (_dir, catalog) = tagged_fixture();
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts: HashMap<String, usize> = HashMap::new();

        for _ in 0..2000 {
            let t = catalog.select_with_rng("CHOICE", &mut rng).unwrap();
            *counts.entry(t).or_default() += 1;
        }

        assert_eq!(counts.len(), 2, "{counts:?}");
        for name in ["drake.jpg", "distracted.png"] {
            let n = counts[name];
            assert!((800..=1200).contains(&n), "{name}: {n}");
        }
    }

    #[test]
    fn matching_is_substring_containment() {
        let (_dir, catalog) = tagged_fixture();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(
                catalog.select_with_rng("cat", &mut rng).as_deref(),
                Some("distracted.png")
            );
            assert_eq!(
                catalog.select_with_rng("prefer", &mut rng).as_deref(),
                Some("drake.jpg")
            );
        }
    }

    #[test]
    fn unmatched_topic_selects_from_whole_catalog() {
        let (_dir, catalog) = tagged_fixture();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..200 {
            let t = catalog.select_with_rng("quantum soup", &mut rng).unwrap();
            assert!(catalog.templates().contains(&t));
        }
    }

    #[test]
    fn missing_index_falls_back_to_directory_listing() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt", "c.jpeg"] {
            touch(dir.path(), name);
        }

        let catalog = Catalog::load(&dir.path().join("nope.json"), dir.path());
        assert!(!catalog.is_tagged());
        assert_eq!(catalog.templates(), ["a.jpg", "b.png"]);
    }

    #[test]
    fn malformed_index_falls_back_to_directory_listing() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.jpg");
        let index = dir.path().join("tags.json");
        fs::write(&index, "{ this is not json").unwrap();

        let catalog = Catalog::load(&index, dir.path());
        assert!(!catalog.is_tagged());
        assert_eq!(catalog.templates(), ["a.jpg"]);
        assert_eq!(catalog.select("anything").as_deref(), Some("a.jpg"));
    }

    #[test]
    fn index_without_existing_files_falls_back() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "only.png");
        let index = dir.path().join("tags.json");
        fs::write(&index, r#"{"elsewhere/gone.jpg": ["x"]}"#).unwrap();

        let catalog = Catalog::load(&index, dir.path());
        assert!(!catalog.is_tagged());
        assert_eq!(catalog.templates(), ["only.png"]);
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::load(&dir.path().join("nope.json"), &dir.path().join("missing"));
        assert!(catalog.is_empty());
        assert_eq!(catalog.select("anything"), None);
    }
}
