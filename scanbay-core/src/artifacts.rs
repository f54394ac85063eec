use crate::domain::Domain;
use crate::error::Result;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Basename of the structured (XML) report for a domain.
pub fn xml_basename(domain: &Domain) -> String {
    format!("{domain}_scan.xml")
}

/// Basename of the rendered (HTML) report for a domain.
pub fn html_basename(domain: &Domain) -> String {
    format!("{domain}_report.html")
}

/// The canonical pair of artifact paths for one scan of one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub xml: PathBuf,
    pub html: PathBuf,
}

impl ArtifactPaths {
    fn for_domain(dir: &Path, domain: &Domain) -> Self {
        Self {
            xml: dir.join(xml_basename(domain)),
            html: dir.join(html_basename(domain)),
        }
    }
}

/// Filesystem area holding scan artifacts.
///
/// Published artifacts live flat under the root, keyed by domain.
/// In-progress artifacts live under `.staging/<task_id>/` on the same
/// filesystem so completion can move them into place with an atomic
/// rename; a half-written file is never visible under a published name.
#[derive(Debug, Clone)]
pub struct ResultStore {
    root: PathBuf,
}

impl ResultStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn staging_root(&self) -> PathBuf {
        self.root.join(".staging")
    }

    /// Create the result and staging directories if they don't exist.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.staging_root())?;
        Ok(())
    }

    /// Deterministic published paths for a domain's artifact pair.
    pub fn published_paths(&self, domain: &Domain) -> ArtifactPaths {
        ArtifactPaths::for_domain(&self.root, domain)
    }

    pub fn staging_dir(&self, task_id: Uuid) -> PathBuf {
        self.staging_root().join(task_id.to_string())
    }

    /// Staged counterparts of the published paths, private to one task.
    pub fn staging_paths(&self, task_id: Uuid, domain: &Domain) -> ArtifactPaths {
        ArtifactPaths::for_domain(&self.staging_dir(task_id), domain)
    }

    pub async fn create_staging(&self, task_id: Uuid) -> Result<()> {
        tokio::fs::create_dir_all(self.staging_dir(task_id)).await?;
        Ok(())
    }

    /// Move a staged artifact onto its published path.
    pub async fn publish(&self, staged: &Path, published: &Path) -> Result<()> {
        debug!(from = %staged.display(), to = %published.display(), "Publishing artifact");
        tokio::fs::rename(staged, published).await?;
        Ok(())
    }

    /// Best-effort removal of a task's staging directory.
    pub async fn discard_staging(&self, task_id: Uuid) {
        let dir = self.staging_dir(task_id);
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(task_id = %task_id, "Failed to remove staging directory: {e}");
            }
        }
    }

    /// Presence of the (structured, rendered) artifacts for a domain.
    pub fn exists(&self, domain: &Domain) -> (bool, bool) {
        let paths = self.published_paths(domain);
        (paths.xml.exists(), paths.html.exists())
    }

    /// Basenames of both artifacts, only when both are published.
    pub fn published_basenames(&self, domain: &Domain) -> Option<(String, String)> {
        match self.exists(domain) {
            (true, true) => Some((xml_basename(domain), html_basename(domain))),
            _ => None,
        }
    }

    /// Resolve a download filename to a path under the result root.
    ///
    /// Accepts only a bare, unhidden filename; separators, parent
    /// components, absolute forms, and dot-prefixed names (the staging
    /// area lives under one) are rejected outright.
    pub fn resolve_download(&self, filename: &str) -> Option<PathBuf> {
        if filename.is_empty() || filename.starts_with('.') || filename.contains(['/', '\\']) {
            return None;
        }
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name.to_str() == Some(filename) => {
                Some(self.root.join(filename))
            }
            _ => None,
        }
    }
}
