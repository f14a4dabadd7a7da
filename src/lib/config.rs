//! Compiler settings, loadable from a YAML file.

use crate::shader::{compiler::Compiler, library::FunctionLibrary, store::DirStore};

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
/// Where function metadata lives and which uniforms the pipeline provides on its own.
pub struct CompilerConfig {
    /// Resource path; documents are read from its `resources` subdirectory.
    pub resource_path: PathBuf,
    /// Uniform names provided outside of the graph.
    pub supplied: BTreeSet<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            resource_path: PathBuf::from("."),
            supplied: BTreeSet::new(),
        }
    }
}

impl CompilerConfig {
    /// Load settings from a YAML file. Missing keys take their default value.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        log::debug!(
            "Loaded compiler config from {}: resources at {}",
            path.display(),
            config.resource_path.display()
        );

        Ok(config)
    }

    /// Function library reading from the configured resource path.
    pub fn library(&self) -> FunctionLibrary<DirStore> {
        FunctionLibrary::new(DirStore::new(&self.resource_path))
    }

    /// Compiler over `library` that skips the configured uniforms.
    pub fn compiler<'lib>(&self, library: &'lib FunctionLibrary<DirStore>) -> Compiler<'lib, DirStore> {
        Compiler::new(library).with_supplied(self.supplied.iter().cloned())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shader::store::FUNCTION_DIR;

    use std::fs;

    #[test]
    fn defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compiler.yaml");
        fs::write(&path, "{}").unwrap();

        assert_eq!(CompilerConfig::from_path(&path).unwrap(), CompilerConfig::default());
        assert_eq!(CompilerConfig::default().resource_path, Path::new("."));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = CompilerConfig::from_path(dir.path().join("nope.yaml")).unwrap_err();
        assert!(error.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compiler.yaml");
        fs::write(&path, "supplied: 12").unwrap();

        let error = CompilerConfig::from_path(&path).unwrap_err();
        assert!(error.to_string().contains("Failed to parse YAML config"));
    }

    #[test]
    fn compile_from_resource_tree() {
        let _ = env_logger::builder().is_test(true).try_init();

        let dir = tempfile::tempdir().unwrap();
        let functions = dir.path().join("resources").join(FUNCTION_DIR);
        fs::create_dir_all(&functions).unwrap();
        fs::write(
            functions.join("tint.yaml"),
            r#"
source: graph_shader/tint.glsl
uniforms:
  vec4: [{name: tintColor}, {name: time}]
params:
  in: {color: {type: vec4, index: 0}}
  out: {tinted: {type: vec4, index: 1}}
"#,
        )
        .unwrap();
        fs::write(
            functions.join("tint.glsl"),
            "void tint(vec4 c, out vec4 t) { t = c * tintColor; }",
        )
        .unwrap();

        let path = dir.path().join("compiler.yaml");
        fs::write(
            &path,
            format!(
                "resourcePath: {}\nsupplied: [time]\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let config = CompilerConfig::from_path(&path).unwrap();
        let library = config.library();
        let shader = config
            .compiler(&library)
            .compile_yaml(
                r#"
nodes:
  - {name: base, model: {name: vec4}}
  - {name: tinted, model: {name: tint}}
edges:
  - {from: {name: base, interface: value}, to: {name: tinted, interface: color}}
"#,
            )
            .unwrap();

        assert!(shader.main_source().contains("tint( base, tinted_at_tinted );"));
        assert!(shader.fragment_source().contains("t = c * tintColor;"));

        let uniforms: Vec<String> = shader.uniforms().iter().map(ToString::to_string).collect();
        assert_eq!(uniforms, ["vec4 tintColor"]);
    }
}
