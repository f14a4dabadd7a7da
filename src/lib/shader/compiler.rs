//! Compiler entry point: document in, vertex and fragment GLSL out.

use super::{
    document::{self, GraphDocument},
    emit,
    graph::{self, Graph},
    library::{self, FunctionLibrary},
    store::ResourceStore,
    synth::{self, synthesize, Diagnostic, Program, ScheduledCall},
    DeclarationSet,
};

use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error)]
/// Compilation error. Nothing is produced when compilation fails.
pub enum Error {
    #[error(transparent)]
    /// The document or a node configuration is malformed.
    Document(#[from] document::Error),

    #[error("Could not load function `{function}` for node `{node}`: {source}")]
    /// A function's metadata or source could not be loaded.
    Metadata {
        #[allow(missing_docs)]
        node: String,
        #[allow(missing_docs)]
        function: String,
        /// Underlying failure.
        source: library::Error,
    },

    #[error("Detected a cycle through nodes {}", .nodes.join(" -> "))]
    /// The edges form a cycle.
    Cycle {
        /// Names of the nodes along the cycle, in precedence order.
        nodes: Vec<String>,
    },

    #[error("Unusable value {value} for input `{input}` of node `{node}`")]
    /// An input override cannot be written as GLSL.
    InvalidOverride {
        #[allow(missing_docs)]
        node: String,
        #[allow(missing_docs)]
        input: String,
        #[allow(missing_docs)]
        value: String,
    },
}

impl From<graph::Error> for Error {
    fn from(value: graph::Error) -> Self {
        match value {
            graph::Error::Document(error) => Self::Document(error),
            graph::Error::Cycle { during, .. } => Self::Cycle { nodes: during },
        }
    }
}

impl From<synth::Error> for Error {
    fn from(value: synth::Error) -> Self {
        match value {
            synth::Error::Metadata {
                node,
                function,
                source,
            } => Self::Metadata {
                node,
                function,
                source,
            },
            synth::Error::InvalidOverride { node, input, value } => {
                Self::InvalidOverride { node, input, value }
            }
        }
    }
}

/// Compiles graph documents against a [FunctionLibrary].
///
/// The library (and its caches) may outlive many compilers and be shared between them; all
/// other state is local to a [compile](Compiler::compile) call.
pub struct Compiler<'lib, S> {
    library: &'lib FunctionLibrary<S>,
    supplied: BTreeSet<String>,
}

impl<'lib, S: ResourceStore> Compiler<'lib, S> {
    #[allow(missing_docs)]
    pub fn new(library: &'lib FunctionLibrary<S>) -> Self {
        Self {
            library,
            supplied: BTreeSet::new(),
        }
    }

    /// Names of uniforms provided outside of the graph, which are not declared.
    pub fn with_supplied<T: Into<String>>(mut self, names: impl IntoIterator<Item = T>) -> Self {
        self.supplied.extend(names.into_iter().map(Into::into));
        self
    }

    /// Compile a parsed document.
    pub fn compile(&self, document: &GraphDocument) -> Result<CompiledShader, Error> {
        let graph = Graph::ingest(document, &self.supplied)?.schedule()?;
        let program = synthesize(&graph, self.library, &self.supplied)?;
        let main = emit::main_body(&program);

        log::info!(
            "Compiled shader graph: {} nodes, {} calls, {} varyings, {} warnings",
            graph.nodes.len(),
            program.calls.len(),
            program.varyings.len(),
            program.diagnostics.len()
        );

        Ok(CompiledShader { program, main })
    }

    /// Parse then compile a YAML document.
    pub fn compile_yaml(&self, yaml: &str) -> Result<CompiledShader, Error> {
        self.compile(&GraphDocument::from_yaml(yaml)?)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Result of a successful compilation.
pub struct CompiledShader {
    program: Program,
    main: String,
}

impl CompiledShader {
    /// The generated `main` function.
    pub fn main_source(&self) -> &str {
        &self.main
    }

    /// Complete vertex stage source.
    pub fn vertex_source(&self) -> String {
        emit::stage_source(&self.vertex_header(), &self.program, &self.main)
    }

    /// Complete fragment stage source.
    pub fn fragment_source(&self) -> String {
        emit::stage_source(&self.fragment_header(), &self.program, &self.main)
    }

    #[allow(missing_docs)]
    pub fn vertex_header(&self) -> String {
        emit::vertex_header(&self.program)
    }

    #[allow(missing_docs)]
    pub fn fragment_header(&self) -> String {
        emit::fragment_header(&self.program)
    }

    /// Inlined function sources.
    pub fn definitions(&self) -> String {
        emit::definitions(&self.program)
    }

    /// Uniforms the pipeline must provide.
    pub fn uniforms(&self) -> &DeclarationSet {
        &self.program.uniforms
    }

    /// Values passed from the vertex to the fragment stage.
    pub fn varyings(&self) -> &DeclarationSet {
        &self.program.varyings
    }

    /// Vertex attributes the functions read.
    pub fn attributes(&self) -> &DeclarationSet {
        &self.program.attributes
    }

    /// Calls in execution order.
    pub fn calls(&self) -> &[ScheduledCall] {
        &self.program.calls
    }

    /// Non-fatal findings.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.program.diagnostics
    }

    #[allow(missing_docs)]
    pub fn program(&self) -> &Program {
        &self.program
    }
}
