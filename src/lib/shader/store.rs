//! Access to the graph shader resource tree (`<resourcePath>/resources`).

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

/// Directory, relative to the resource tree, holding one metadata document per function.
pub const FUNCTION_DIR: &str = "graph_shader";

/// Read access to resource documents, addressed relative to the resource tree root.
pub trait ResourceStore {
    /// Read a whole UTF-8 document.
    fn read(&self, path: &Path) -> io::Result<String>;
}

impl<S: ResourceStore + ?Sized> ResourceStore for &S {
    fn read(&self, path: &Path) -> io::Result<String> {
        (**self).read(path)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// [ResourceStore] backed by the `resources` directory of a resource path.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Store reading from `<resource_path>/resources`.
    pub fn new(resource_path: impl AsRef<Path>) -> Self {
        Self {
            root: resource_path.as_ref().join("resources"),
        }
    }

    /// Root directory documents are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceStore for DirStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(self.root.join(path))
    }
}

#[derive(Debug, Default)]
/// In-memory [ResourceStore], used to embed function libraries. Counts successful reads.
pub struct MemoryStore {
    documents: HashMap<PathBuf, String>,
    reads: AtomicUsize,
}

impl MemoryStore {
    /// Add or replace a document.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> &mut Self {
        self.documents.insert(path.into(), contents.into());
        self
    }

    /// Add the metadata document of `function`.
    pub fn insert_function(&mut self, function: &str, contents: impl Into<String>) -> &mut Self {
        self.insert(function_path(function), contents)
    }

    /// Number of documents served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl ResourceStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<String> {
        let contents = self.documents.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no document at {}", path.display()),
            )
        })?;

        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(contents)
    }
}

/// Path of the metadata document of `function`, relative to the resource tree.
pub fn function_path(function: &str) -> PathBuf {
    Path::new(FUNCTION_DIR).join(format!("{function}.yaml"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reads_below_resources() {
        let dir = tempfile::tempdir().unwrap();
        let functions = dir.path().join("resources").join(FUNCTION_DIR);
        std::fs::create_dir_all(&functions).unwrap();
        std::fs::write(functions.join("phong.yaml"), "source: shader/phong.frag\n").unwrap();

        let store = DirStore::new(dir.path());
        assert_eq!(
            store.read(&function_path("phong")).unwrap(),
            "source: shader/phong.frag\n"
        );

        let missing = store.read(&function_path("lambert")).unwrap_err();
        assert_eq!(missing.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn memory_store_counts_reads() {
        let mut store = MemoryStore::default();
        store
            .insert_function("phong", "{}")
            .insert("shader/phong.frag", "void phong() {}");

        assert_eq!(store.read(&function_path("phong")).unwrap(), "{}");
        assert_eq!(
            store.read(Path::new("shader/phong.frag")).unwrap(),
            "void phong() {}"
        );
        assert!(store.read(Path::new("shader/lambert.frag")).is_err());
        assert_eq!(store.reads(), 2);
    }
}
