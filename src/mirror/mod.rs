//! Source tree mirroring with reload-script injection.
//!
//! The mirror is a scratch copy of the served directory: every file under the
//! source root has exactly one counterpart at the same relative path under
//! the mirror root. HTML documents get the delta-streamer tag spliced into
//! their head on the way through; everything else is copied verbatim. The
//! static file handler serves the mirror, never the source tree itself.
//!
//! ```text
//! source/a/b.html --read--> sniff --html--> inject --write--> mirror/a/b.html
//!                                 --other-------------------> byte-identical
//! ```

mod inject;
mod sniff;


use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use jwalk::WalkDir;
use tempfile::TempDir;

use crate::embed::serve::{DELTA_STREAMER_JS, STREAMER_FILE_NAME, STREAMER_TAG, StreamerVars};

/// Mirror of the served source tree.
///
/// Holding the `TempDir` keeps the scratch root alive; it is removed when
/// the `Mirror` is dropped on clean shutdown.
pub struct Mirror {
    source_root: PathBuf,
    scratch: TempDir,
}

impl Mirror {
    /// Create the scratch root for `source_root`.
    ///
    /// The scratch directory is uniquely named and owned by this instance
    /// alone; two running servers never share a mirror.
    pub fn new(source_root: &Path) -> Result<Self> {
        let source_root = source_root
            .canonicalize()
            .with_context(|| format!("failed to resolve source dir: {}", source_root.display()))?;

        let scratch = tempfile::Builder::new()
            .prefix("mira_")
            .tempdir()
            .context("failed to create mirror scratch dir")?;

        Ok(Self {
            source_root,
            scratch,
        })
    }

    /// The tree being mirrored.
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// The scratch tree served to clients.
    pub fn mirror_root(&self) -> &Path {
        self.scratch.path()
    }

    /// Walk the source tree once, mirroring every file.
    ///
    /// Each directory encountered (the root included) is handed to
    /// `register` so the caller can attach change notification to it.
    /// Directories created after this walk are not registered; see the
    /// watcher docs for the consequences.
    ///
    /// Any read, write, mkdir or registration failure aborts the walk and is
    /// returned to the caller. No partial-mirror cleanup is attempted.
    pub fn setup(&self, mut register: impl FnMut(&Path) -> Result<()>) -> Result<()> {
        crate::log!("mirror"; "mirroring root: '{}'", self.source_root.display());

        for entry in WalkDir::new(&self.source_root).sort(true) {
            let entry = entry.context("failed to walk source dir")?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                register(&path)?;
            } else {
                self.mirror_file(&path)?;
            }
        }

        Ok(())
    }

    /// Mirror a single source file to its counterpart path.
    ///
    /// Used both by the initial walk and by the watcher to re-mirror one
    /// changed file. HTML content (sniffed, not extension-matched) gets the
    /// streamer tag; a document without a closing head tag is mirrored
    /// unmodified and the skip is logged, not surfaced.
    pub fn mirror_file(&self, orig: &Path) -> Result<()> {
        let rel = orig.strip_prefix(&self.source_root).with_context(|| {
            format!("path escapes the source root: {}", orig.display())
        })?;

        let content = fs::read(orig)
            .with_context(|| format!("failed to read source file: {}", orig.display()))?;

        let content = if sniff::is_html(&content) {
            match inject::inject_streamer_tag(&content, STREAMER_TAG) {
                Some(injected) => {
                    crate::debug!("mirror"; "injected streamer tag in: '{}'", orig.display());
                    injected
                }
                None => {
                    crate::debug!("mirror"; "no closing head tag in: '{}', mirrored as-is", orig.display());
                    content
                }
            }
        } else {
            content
        };

        let mirrored = self.scratch.path().join(rel);
        if let Some(parent) = mirrored.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create mirror dir: {}", parent.display()))?;
        }

        fs::write(&mirrored, content)
            .with_context(|| format!("failed to write mirrored file: {}", mirrored.display()))
    }

    /// Emit the parameterized client script at the mirror root.
    pub fn write_streamer(&self, vars: &StreamerVars) -> Result<()> {
        let path = self.scratch.path().join(STREAMER_FILE_NAME);
        fs::write(&path, DELTA_STREAMER_JS.render(vars))
            .with_context(|| format!("failed to write {STREAMER_FILE_NAME}"))
    }

    /// Source-relative path of `path` in notification form: leading slash,
    /// forward-slash separated.
    pub fn relative_url(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.source_root).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .collect();
        Some(format!("/{}", parts.join("/")))
    }
}
