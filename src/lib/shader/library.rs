//! Function metadata: what a graph node calls, which parameters it takes and which
//! uniforms/varyings/attributes it needs.

use super::{
    store::{function_path, ResourceStore},
    Declaration, DeclarationSet,
};

use std::{
    collections::{BTreeMap, HashMap},
    io,
    path::{Path, PathBuf},
    sync::{Arc, PoisonError, RwLock},
};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
/// [FunctionLibrary] error
pub enum Error {
    #[error("Could not read metadata of function `{function}` from {}: {source}", .path.display())]
    /// The metadata document is missing or unreadable.
    Read {
        /// Function identity.
        function: String,
        /// Document path, relative to the resource tree.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },

    #[error("Malformed metadata for function `{function}`: {source}")]
    /// The metadata document is not a valid function description.
    Malformed {
        /// Function identity.
        function: String,
        /// Underlying failure.
        source: serde_yaml::Error,
    },

    #[error("Could not read source `{}` of function `{function}`: {source}", .path.display())]
    /// The GLSL source file referenced by a function is missing or unreadable.
    Source {
        /// Function identity.
        function: String,
        /// Source path, relative to the resource tree.
        path: PathBuf,
        /// Underlying failure.
        source: io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// A function parameter.
pub struct Param {
    /// Parameter name, also the interface name edges refer to.
    pub name: String,
    /// GLSL type.
    pub ty: String,
    /// Position in the function's argument list.
    pub index: i32,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Metadata of one graph shader function.
pub struct FunctionSignature {
    /// Function identity.
    pub name: String,
    /// Input parameters by ascending index.
    pub inputs: Vec<Param>,
    /// Output parameters by ascending index.
    pub outputs: Vec<Param>,
    /// GLSL source defining the function, relative to the resource tree.
    pub source: Option<String>,
    /// Uniforms the function reads.
    pub uniforms: DeclarationSet,
    /// Varyings the function reads or writes.
    pub varyings: DeclarationSet,
    /// Vertex attributes the function reads.
    pub attributes: DeclarationSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FunctionDocument {
    source: Option<String>,
    uniforms: Option<BTreeMap<String, Vec<NamedDocument>>>,
    varyings: Option<BTreeMap<String, Vec<NamedDocument>>>,
    attributes: Option<BTreeMap<String, Vec<NamedDocument>>>,
    params: Option<ParamsDocument>,
}

#[derive(Debug, Deserialize)]
struct NamedDocument {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ParamsDocument {
    #[serde(rename = "in")]
    inputs: Option<BTreeMap<String, ParamDocument>>,
    #[serde(rename = "out")]
    outputs: Option<BTreeMap<String, ParamDocument>>,
}

#[derive(Debug, Deserialize)]
struct ParamDocument {
    #[serde(rename = "type")]
    ty: String,
    index: i32,
}

impl FunctionSignature {
    /// Parse a metadata document.
    pub fn from_yaml(name: &str, yaml: &str) -> Result<Self, serde_yaml::Error> {
        let document: Option<FunctionDocument> = serde_yaml::from_str(yaml)?;
        let document = document.unwrap_or_default();
        let params = document.params.unwrap_or_default();

        Ok(Self {
            name: name.to_owned(),
            inputs: params_by_index(params.inputs),
            outputs: params_by_index(params.outputs),
            source: document.source,
            uniforms: declarations(document.uniforms),
            varyings: declarations(document.varyings),
            attributes: declarations(document.attributes),
        })
    }
}

fn params_by_index(params: Option<BTreeMap<String, ParamDocument>>) -> Vec<Param> {
    let mut params: Vec<Param> = params
        .unwrap_or_default()
        .into_iter()
        .map(|(name, ParamDocument { ty, index })| Param { name, ty, index })
        .collect();

    // Stable sort: equal indices keep name order.
    params.sort_by_key(|param| param.index);
    params
}

fn declarations(entries: Option<BTreeMap<String, Vec<NamedDocument>>>) -> DeclarationSet {
    entries
        .unwrap_or_default()
        .into_iter()
        .flat_map(|(ty, names)| {
            let (ty, suffix) = match ty.find("[]") {
                Some(position) => (ty[..position].to_owned(), "[1]"),
                None => (ty, ""),
            };

            names
                .into_iter()
                .map(move |NamedDocument { name }| Declaration::new(ty.clone(), name + suffix))
        })
        .collect()
}

/// Cache of [FunctionSignature]s and function sources read through a [ResourceStore].
///
/// Documents are read at most once per library; the caches are never invalidated.
#[derive(Debug)]
pub struct FunctionLibrary<S> {
    store: S,
    signatures: RwLock<HashMap<String, Arc<FunctionSignature>>>,
    sources: RwLock<HashMap<PathBuf, Arc<str>>>,
}

impl<S: ResourceStore> FunctionLibrary<S> {
    /// Create an empty library over `store`.
    pub fn new(store: S) -> Self {
        Self {
            store,
            signatures: RwLock::default(),
            sources: RwLock::default(),
        }
    }

    /// Get the signature of `function`, reading its metadata document on first use.
    pub fn load(&self, function: &str) -> Result<Arc<FunctionSignature>, Error> {
        if let Some(signature) = self
            .signatures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(function)
        {
            return Ok(Arc::clone(signature));
        }

        let path = function_path(function);
        log::debug!("Loading function `{function}` from {}", path.display());

        let yaml = self.store.read(&path).map_err(|source| Error::Read {
            function: function.to_owned(),
            path,
            source,
        })?;
        let signature = FunctionSignature::from_yaml(function, &yaml).map_err(|source| {
            Error::Malformed {
                function: function.to_owned(),
                source,
            }
        })?;

        Ok(Arc::clone(
            self.signatures
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(function.to_owned())
                .or_insert_with(|| Arc::new(signature)),
        ))
    }

    /// Get the contents of the source file `path` declared by `function`.
    pub fn load_source(&self, function: &str, path: &str) -> Result<Arc<str>, Error> {
        let path = Path::new(path);

        if let Some(source) = self
            .sources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(Arc::clone(source));
        }

        log::debug!("Loading source {} of function `{function}`", path.display());

        let contents = self.store.read(path).map_err(|source| Error::Source {
            function: function.to_owned(),
            path: path.to_owned(),
            source,
        })?;

        Ok(Arc::clone(
            self.sources
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(path.to_owned())
                .or_insert_with(|| Arc::from(contents)),
        ))
    }

    /// Number of cached signatures.
    pub fn cached(&self) -> usize {
        self.signatures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}
