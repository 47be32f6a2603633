//! On-disk layout of generated sites.
//!
//! Every site owns `{base}/{slug}/` with three children:
//!
//! ```text
//! {base}/{slug}/markdown/   content/, images/, meta/ (a valid import root)
//! {base}/{slug}/html/       the published site
//! {base}/{slug}/images/     master copies of uploaded images
//! ```
//!
//! Path functions are pure. Only [`clean_dir`] and [`ensure_site_dirs`]
//! touch the filesystem.

use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path escapes its root: {0}")]
    Escape(String),
}

impl WorkspaceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    base: PathBuf,
}

impl Workspace {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn site(&self, slug: &str) -> SitePaths {
        let root = self.base.join(slug);
        SitePaths {
            markdown: root.join("markdown"),
            html: root.join("html"),
            images: root.join("images"),
            root,
        }
    }

    /// Join `rel` onto `root`, refusing anything that would leave `root`
    pub fn confine(root: &Path, rel: &str) -> Result<PathBuf, WorkspaceError> {
        let mut out = root.to_path_buf();
        for component in Path::new(rel).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(WorkspaceError::Escape(rel.to_string()));
                }
            }
        }
        if out == root {
            return Err(WorkspaceError::Escape(rel.to_string()));
        }
        Ok(out)
    }
}

/// Directories belonging to one site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePaths {
    pub root: PathBuf,
    pub markdown: PathBuf,
    pub html: PathBuf,
    pub images: PathBuf,
}

impl SitePaths {
    pub fn markdown_content_dir(&self) -> PathBuf {
        self.markdown.join("content")
    }

    pub fn markdown_images_dir(&self) -> PathBuf {
        self.markdown.join("images")
    }

    pub fn markdown_meta_dir(&self) -> PathBuf {
        self.markdown.join("meta")
    }

    pub fn html_images_dir(&self) -> PathBuf {
        self.html.join("images")
    }

    pub fn content_markdown_path(&self, section_path: &str, content_slug: &str) -> PathBuf {
        join_segments(self.markdown_content_dir(), section_path).join(format!("{}.md", content_slug))
    }

    pub fn content_html_path(&self, section_path: &str, content_slug: &str) -> PathBuf {
        join_segments(self.html.clone(), section_path)
            .join(content_slug)
            .join("index.html")
    }

    pub fn section_index_path(&self, section_path: &str) -> PathBuf {
        join_segments(self.html.clone(), section_path).join("index.html")
    }

    pub fn root_index_path(&self) -> PathBuf {
        self.html.join("index.html")
    }

    /// Page 1 is the plain index; page N lives under `page/N/`
    pub fn paginated_index_path(&self, section_path: &str, page: usize) -> PathBuf {
        let dir = join_segments(self.html.clone(), section_path);
        if page <= 1 {
            dir.join("index.html")
        } else {
            dir.join("page").join(page.to_string()).join("index.html")
        }
    }
}

/// Sanitised components of a section path
pub fn section_segments(section_path: &str) -> Vec<&str> {
    section_path
        .split(['/', '\\'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect()
}

fn join_segments(mut dir: PathBuf, section_path: &str) -> PathBuf {
    for segment in section_segments(section_path) {
        dir.push(segment);
    }
    dir
}

/// Site-relative URL of a content page
pub fn content_url(section_path: &str, content_slug: &str) -> String {
    let mut url = section_url(section_path);
    url.push_str(content_slug);
    url.push('/');
    url
}

/// Site-relative URL of a section index (`/` for the root)
pub fn section_url(section_path: &str) -> String {
    let segments = section_segments(section_path);
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}

pub fn page_url(section_path: &str, page: usize) -> String {
    let base = section_url(section_path);
    if page <= 1 {
        base
    } else {
        format!("{}page/{}/", base, page)
    }
}

/// Remove everything inside `dir`, keeping `dir` itself. A missing
/// directory is fine.
pub fn clean_dir(dir: &Path) -> Result<(), WorkspaceError> {
    clean_dir_except(dir, &[])
}

/// [`clean_dir`], sparing top-level entries named in `keep`
pub fn clean_dir_except(dir: &Path, keep: &[&str]) -> Result<(), WorkspaceError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(WorkspaceError::io(dir, e)),
    };

    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::io(dir, e))?;
        if keep.iter().any(|k| entry.file_name() == *k) {
            continue;
        }
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| WorkspaceError::io(&path, e))?;
        let result = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| WorkspaceError::io(&path, e))?;
    }

    Ok(())
}

pub fn ensure_site_dirs(paths: &SitePaths) -> Result<(), WorkspaceError> {
    for dir in [&paths.markdown, &paths.html, &paths.images] {
        fs::create_dir_all(dir).map_err(|e| WorkspaceError::io(dir, e))?;
    }
    Ok(())
}
