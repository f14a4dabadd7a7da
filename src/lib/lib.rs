#![warn(missing_docs)]

//! Shader graph compiler used by the vsg graphics plugin. Turns a node/edge description of a
//! shader into vertex and fragment GLSL sources, see [Compiler](shader::compiler::Compiler).

pub mod config;
pub mod shader;

pub use config::CompilerConfig;
pub use shader::compiler::{CompiledShader, Compiler};

macro_rules! states {
    {$($(#[$attr:meta])* $state:ident),+ $(,)?} => {
        $(
            #[derive(Clone, Debug, Default, PartialEq)]
            $(#[$attr])*
            pub struct $state;
        )+
    };
}

states! {
    /// Nodes, bindings and precedence constraints have been collected from a document.
    Ingested,
    /// Nodes have been put in a total order that respects every precedence constraint.
    Scheduled,
}
