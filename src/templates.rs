use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of template documents.
const TEMPLATE_EXTENSION: &str = "md";

/// A PR description template read from disk.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Template {
    pub name: String,
    #[serde(rename = "path")]
    pub source_path: String,
    pub content: String,
}

/// A registry slot: either a readable template or the reason it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum TemplateEntry {
    Loaded(Template),
    Unreadable { name: String, error: String },
}

impl TemplateEntry {
    pub fn name(&self) -> &str {
        match self {
            TemplateEntry::Loaded(template) => &template.name,
            TemplateEntry::Unreadable { name, .. } => name,
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Templates directory not found at {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to list templates in {}: {source}", dir.display())]
    Unlistable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Snapshot of a templates directory, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    dir: PathBuf,
    entries: Vec<(String, TemplateEntry)>,
}

impl TemplateRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TemplateEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    /// First entry in discovery order.
    pub fn first(&self) -> Option<(&str, &TemplateEntry)> {
        self.entries
            .first()
            .map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Insert under `key`. An existing key keeps its position but takes the
    /// new entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: TemplateEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => {
                log::debug!("Template {key} read twice, keeping the later copy");
                slot.1 = entry;
            }
            None => self.entries.push((key, entry)),
        }
    }
}

impl Serialize for TemplateRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

/// Read every template document directly inside `dir`.
///
/// Only a missing directory fails the call. A file that cannot be read is
/// kept in the registry under its full filename with the read error in place
/// of its content, so one bad template never hides the others. Nothing is
/// cached; each call reflects what is on disk now.
pub fn list_templates(dir: &Path) -> Result<TemplateRegistry, RegistryError> {
    if !dir.is_dir() {
        return Err(RegistryError::NotFound(dir.to_path_buf()));
    }

    let listing = fs::read_dir(dir).map_err(|source| RegistryError::Unlistable {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut registry = TemplateRegistry::new(dir);

    for dir_entry in listing {
        let path = match dir_entry {
            Ok(dir_entry) => dir_entry.path(),
            Err(err) => {
                log::warn!("Skipping unreadable entry in {}: {err}", dir.display());
                continue;
            }
        };

        if !is_template_document(&path) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        match fs::read_to_string(&path) {
            Ok(content) => {
                log::trace!("Loaded template {stem} from {}", path.display());
                registry.insert(
                    stem.clone(),
                    TemplateEntry::Loaded(Template {
                        name: stem,
                        source_path: path.display().to_string(),
                        content,
                    }),
                );
            }
            Err(err) => {
                log::warn!("Failed to read template {}: {err}", path.display());
                registry.insert(
                    file_name.clone(),
                    TemplateEntry::Unreadable {
                        name: file_name,
                        error: format!("Failed to read template: {err}"),
                    },
                );
            }
        }
    }

    log::debug!(
        "Found {} template(s) in {}: {}",
        registry.len(),
        dir.display(),
        registry.names().collect::<Vec<_>>().join(", ")
    );
    Ok(registry)
}

/// Matches on the name only; entries that are not readable files are
/// recorded as unreadable when the read fails.
fn is_template_document(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn templates_dir(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    #[test]
    fn missing_directory_is_the_only_fatal_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = list_templates(&missing).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
        assert_eq!(
            err.to_string(),
            format!("Templates directory not found at {}", missing.display())
        );
    }

    #[test]
    fn a_file_is_not_a_templates_directory() {
        let dir = templates_dir(&[("bug.md", "# Bug")]);
        let err = list_templates(&dir.path().join("bug.md")).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn reads_markdown_documents_only() {
        let dir = templates_dir(&[
            ("bug.md", "# Bug fix"),
            ("feature.md", "# Feature"),
            ("notes.txt", "ignored"),
        ]);
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("docs.md"), "# Docs").unwrap();

        let registry = list_templates(dir.path()).unwrap();

        let mut names: Vec<&str> = registry.names().collect();
        names.sort();
        assert_eq!(names, vec!["bug", "feature"]);

        match registry.get("bug") {
            Some(TemplateEntry::Loaded(template)) => {
                assert_eq!(template.name, "bug");
                assert_eq!(template.content, "# Bug fix");
                assert!(template.source_path.ends_with("bug.md"));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn unreadable_template_is_kept_under_full_filename() {
        let dir = templates_dir(&[("bug.md", "# Bug")]);
        fs::write(dir.path().join("broken.md"), [0xff, 0xfe, 0x00]).unwrap();

        let registry = list_templates(dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("bug").is_some());
        match registry.get("broken.md") {
            Some(TemplateEntry::Unreadable { name, error }) => {
                assert_eq!(name, "broken.md");
                assert!(error.starts_with("Failed to read template: "));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_recorded_as_unreadable() {
        let dir = templates_dir(&[("bug.md", "# Bug")]);
        std::os::unix::fs::symlink(dir.path().join("gone.md"), dir.path().join("feature.md"))
            .unwrap();

        let registry = list_templates(dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("feature").is_none());
        match registry.get("feature.md") {
            Some(TemplateEntry::Unreadable { name, error }) => {
                assert_eq!(name, "feature.md");
                assert!(error.starts_with("Failed to read template: "));
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn markdown_named_directory_is_recorded_as_unreadable() {
        let dir = templates_dir(&[("bug.md", "# Bug")]);
        fs::create_dir(dir.path().join("drafts.md")).unwrap();

        let registry = list_templates(dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(matches!(
            registry.get("drafts.md"),
            Some(TemplateEntry::Unreadable { .. })
        ));
    }

    #[test]
    fn empty_directory_gives_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = list_templates(dir.path()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.dir(), dir.path());
    }

    #[test]
    fn repeated_reads_agree_and_see_live_edits() {
        let dir = templates_dir(&[("bug.md", "v1"), ("docs.md", "docs")]);

        let first = list_templates(dir.path()).unwrap();
        let second = list_templates(dir.path()).unwrap();
        let mut a: Vec<_> = first.names().map(|n| (n, first.get(n).cloned())).collect();
        let mut b: Vec<_> = second.names().map(|n| (n, second.get(n).cloned())).collect();
        a.sort_by(|x, y| x.0.cmp(y.0));
        b.sort_by(|x, y| x.0.cmp(y.0));
        assert_eq!(a, b);

        fs::write(dir.path().join("bug.md"), "v2").unwrap();
        let third = list_templates(dir.path()).unwrap();
        match third.get("bug") {
            Some(TemplateEntry::Loaded(template)) => assert_eq!(template.content, "v2"),
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn duplicate_key_overwrites_in_place() {
        let loaded = |content: &str| {
            TemplateEntry::Loaded(Template {
                name: "bug".into(),
                source_path: "bug.md".into(),
                content: content.into(),
            })
        };
        let mut registry = TemplateRegistry::new("templates");
        registry.insert("bug", loaded("first"));
        registry.insert("feature", loaded("feature"));
        registry.insert("bug", loaded("second"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.first().map(|(key, _)| key), Some("bug"));
        assert_eq!(registry.get("bug"), Some(&loaded("second")));
    }

    #[test]
    fn serializes_entries_in_registry_order() {
        let mut registry = TemplateRegistry::new("templates");
        registry.insert(
            "zeta",
            TemplateEntry::Loaded(Template {
                name: "zeta".into(),
                source_path: "templates/zeta.md".into(),
                content: "# Z".into(),
            }),
        );
        registry.insert(
            "alpha.md",
            TemplateEntry::Unreadable {
                name: "alpha.md".into(),
                error: "Failed to read template: denied".into(),
            },
        );

        let json = serde_json::to_string(&registry).unwrap();
        assert_eq!(
            json,
            r##"{"zeta":{"name":"zeta","path":"templates/zeta.md","content":"# Z"},"alpha.md":{"name":"alpha.md","error":"Failed to read template: denied"}}"##
        );
    }
}
