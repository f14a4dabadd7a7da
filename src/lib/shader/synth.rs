//! Variable and interface synthesis: turns scheduled nodes into function calls, the locals
//! they write, the defaults they read and the declarations the stages need.

use super::{
    graph::{Graph, GraphNode},
    library::{self, FunctionLibrary, Param},
    store::ResourceStore,
    types::{default_literal, is_pass_through},
    Declaration, DeclarationSet,
};

use crate::Scheduled;

use std::{collections::BTreeSet, sync::Arc};

use derive_more::Display;
use serde_yaml::{Number, Value};

#[derive(Debug, thiserror::Error)]
/// Synthesis error
pub enum Error {
    #[error("Could not load function `{function}` for node `{node}`: {source}")]
    /// The function a node calls could not be loaded.
    Metadata {
        #[allow(missing_docs)]
        node: String,
        #[allow(missing_docs)]
        function: String,
        /// Underlying failure.
        source: library::Error,
    },

    #[error("Unusable value {value} for input `{input}` of node `{node}`")]
    /// An override is neither a scalar, a string nor a list of numbers.
    InvalidOverride {
        #[allow(missing_docs)]
        node: String,
        #[allow(missing_docs)]
        input: String,
        /// Offending value, as YAML.
        value: String,
    },
}

#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display(fmt = "{} {} = {}", ty, name, value)]
/// Local variable initialised with a literal, holding an input nothing feeds.
pub struct DefaultVariable {
    #[allow(missing_docs)]
    pub ty: String,
    #[allow(missing_docs)]
    pub name: String,
    /// GLSL literal or variable name.
    pub value: String,
}

#[derive(Clone, Debug, Display, PartialEq, Eq)]
/// Non-fatal finding.
pub enum Diagnostic {
    #[display(
        fmt = "Input `{}` of node `{}` is not connected, defaulting to {} {}",
        input,
        node,
        ty,
        literal
    )]
    /// An input had neither an edge nor an override.
    UnconnectedInput {
        #[allow(missing_docs)]
        node: String,
        #[allow(missing_docs)]
        input: String,
        #[allow(missing_docs)]
        ty: String,
        /// Substituted literal.
        literal: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Call generated for one node.
pub struct ScheduledCall {
    /// Node name.
    pub node: String,
    /// Called function identity.
    pub function: String,
    /// Argument variables for the input parameters, by ascending index.
    pub inputs: Vec<String>,
    /// Argument variables for the output parameters, by ascending index.
    pub outputs: Vec<String>,
    /// Complete call statement.
    pub statement: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Everything code emission needs, in emission order.
pub struct Program {
    /// Output variables of every call.
    pub locals: Vec<Declaration>,
    /// Default-initialised input variables.
    pub defaults: Vec<DefaultVariable>,
    /// Calls in scheduled order.
    pub calls: Vec<ScheduledCall>,
    /// Varying assignments, run last.
    pub epilogue: Vec<String>,

    #[allow(missing_docs)]
    pub uniforms: DeclarationSet,
    #[allow(missing_docs)]
    pub varyings: DeclarationSet,
    #[allow(missing_docs)]
    pub attributes: DeclarationSet,

    /// Inlined source files by function identity, in first-referenced order.
    pub sources: Vec<(String, Arc<str>)>,
    #[allow(missing_docs)]
    pub diagnostics: Vec<Diagnostic>,
}

/// Synthesize the calls of a scheduled graph. Uniforms named in `supplied` are provided
/// externally and not declared.
pub fn synthesize<S: ResourceStore>(
    graph: &Graph<Scheduled>,
    library: &FunctionLibrary<S>,
    supplied: &BTreeSet<String>,
) -> Result<Program, Error> {
    let mut program = Program {
        uniforms: graph.uniforms.clone(),
        varyings: graph.varyings.clone(),
        epilogue: graph.epilogue.clone(),
        ..Default::default()
    };

    for node in graph.scheduled() {
        if is_pass_through(&node.function) {
            log::debug!("Node `{}` is a raw `{}` value", node.name, node.function);
            continue;
        }

        let metadata_error = |source| Error::Metadata {
            node: node.name.clone(),
            function: node.function.clone(),
            source,
        };

        let signature = library.load(&node.function).map_err(metadata_error)?;

        if let Some(path) = &signature.source {
            if !program.sources.iter().any(|(function, _)| *function == node.function) {
                let contents = library
                    .load_source(&node.function, path)
                    .map_err(metadata_error)?;
                program.sources.push((node.function.clone(), contents));
            }
        }

        let outputs: Vec<String> = signature
            .outputs
            .iter()
            .map(|param| {
                let variable = format!("{}_at_{}", node.name, param.name);
                program.locals.push(Declaration::new(&param.ty, &variable));
                variable
            })
            .collect();

        let inputs = signature
            .inputs
            .iter()
            .map(|param| resolve_input(graph, node, param, &mut program))
            .collect::<Result<Vec<String>, Error>>()?;

        let statement = call_statement(&node.function, inputs.iter().chain(&outputs));
        log::debug!("Node `{}`: {statement}", node.name);

        program.uniforms.extend(
            signature
                .uniforms
                .iter()
                .filter(|uniform| !supplied.contains(&uniform.name)),
        );
        program.varyings.extend(&signature.varyings);
        program.attributes.extend(&signature.attributes);

        program.calls.push(ScheduledCall {
            node: node.name.clone(),
            function: node.function.clone(),
            inputs,
            outputs,
            statement,
        });
    }

    Ok(program)
}

/// Edge binding first, then the node's override, then the type's default literal.
fn resolve_input(
    graph: &Graph<Scheduled>,
    node: &GraphNode,
    param: &Param,
    program: &mut Program,
) -> Result<String, Error> {
    if let Some(bound) = graph.binding(&node.name, &param.name) {
        return Ok(bound.to_owned());
    }

    let name = format!("default_{}_for_{}", param.name, node.name);

    let value = match node.overrides.get(&param.name) {
        Some(value) => override_literal(value, &param.ty).ok_or_else(|| Error::InvalidOverride {
            node: node.name.clone(),
            input: param.name.clone(),
            value: serde_yaml::to_string(value)
                .map(|yaml| yaml.trim_end().to_owned())
                .unwrap_or_else(|_| format!("{value:?}")),
        })?,
        None => {
            let diagnostic = Diagnostic::UnconnectedInput {
                node: node.name.clone(),
                input: param.name.clone(),
                ty: param.ty.clone(),
                literal: default_literal(&param.ty).to_owned(),
            };
            log::warn!("{diagnostic}");
            program.diagnostics.push(diagnostic);
            default_literal(&param.ty).to_owned()
        }
    };

    program.defaults.push(DefaultVariable {
        ty: param.ty.clone(),
        name: name.clone(),
        value,
    });

    Ok(name)
}

/// `function( a, b )`, or `function()` without arguments.
fn call_statement<'a>(function: &str, arguments: impl Iterator<Item = &'a String>) -> String {
    let arguments: Vec<&str> = arguments.map(String::as_str).collect();

    if arguments.is_empty() {
        format!("{function}();")
    } else {
        format!("{function}( {} );", arguments.join(", "))
    }
}

/// GLSL spelling of an override value. Lists of numbers become a constructor of `ty`.
fn override_literal(value: &Value, ty: &str) -> Option<String> {
    match value {
        Value::String(literal) => Some(literal.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number_literal(number)),
        Value::Sequence(items) => {
            let components = items
                .iter()
                .map(|item| match item {
                    Value::Number(number) => Some(number_literal(number)),
                    _ => None,
                })
                .collect::<Option<Vec<String>>>()?;

            Some(format!("{ty}({})", components.join(", ")))
        }
        _ => None,
    }
}

fn number_literal(number: &Number) -> String {
    if let Some(integer) = number.as_i64() {
        return integer.to_string();
    }
    if let Some(integer) = number.as_u64() {
        return integer.to_string();
    }

    match number.as_f64() {
        Some(float) if float.is_finite() && float.fract() == 0. => format!("{float:.1}"),
        Some(float) => float.to_string(),
        None => number.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shader::{document::GraphDocument, store::MemoryStore};

    fn library() -> FunctionLibrary<MemoryStore> {
        let mut store = MemoryStore::default();
        store
            .insert_function(
                "scale",
                r#"
source: graph_shader/math.glsl
uniforms:
  float: [{name: time}, {name: globalScale}]
params:
  in:
    factor: {type: float, index: 1}
    value: {type: vec3, index: 0}
  out:
    scaled: {type: vec3, index: 2}
"#,
            )
            .insert_function(
                "mix3",
                r#"
source: graph_shader/math.glsl
attributes:
  vec3: [{name: vsg_Normal}]
params:
  in:
    a: {type: vec3, index: 0}
    b: {type: vec3, index: 1}
    t: {type: float, index: 2}
  out:
    result: {type: vec3, index: 3}
"#,
            )
            .insert("graph_shader/math.glsl", "// math\n");

        FunctionLibrary::new(store)
    }

    fn program(yaml: &str, supplied: &[&str]) -> Result<Program, Error> {
        let document = GraphDocument::from_yaml(yaml).unwrap();
        let supplied = supplied.iter().map(|name| name.to_string()).collect();
        let graph = Graph::ingest(&document, &supplied).unwrap().schedule().unwrap();

        synthesize(&graph, &library(), &supplied)
    }

    const GRAPH: &str = r#"
nodes:
  - {name: position, model: {name: vec3}}
  - {name: grow, model: {name: scale}}
  - {name: blend, model: {name: mix3}}
edges:
  - {from: {name: position, interface: value}, to: {name: grow, interface: value}}
  - {from: {name: grow, interface: scaled}, to: {name: blend, interface: a}}
configuration:
  nodes:
    - name: blend
      data: {data: {inputs: {b: [0, 0.5, 1], t: 0.25}}}
"#;

    #[test]
    fn calls_and_variables() {
        let program = program(GRAPH, &[]).unwrap();

        let statements: Vec<&str> = program
            .calls
            .iter()
            .map(|call| call.statement.as_str())
            .collect();
        assert_eq!(
            statements,
            [
                "scale( position, default_factor_for_grow, grow_at_scaled );",
                "mix3( grow_at_scaled, default_b_for_blend, default_t_for_blend, blend_at_result );",
            ]
        );

        let locals: Vec<String> = program.locals.iter().map(ToString::to_string).collect();
        assert_eq!(locals, ["vec3 grow_at_scaled", "vec3 blend_at_result"]);

        let defaults: Vec<String> = program.defaults.iter().map(ToString::to_string).collect();
        assert_eq!(
            defaults,
            [
                "float default_factor_for_grow = 1.0",
                "vec3 default_b_for_blend = vec3(0, 0.5, 1)",
                "float default_t_for_blend = 0.25",
            ]
        );
    }

    #[test]
    fn unconnected_input_diagnostic() {
        let program = program(GRAPH, &[]).unwrap();

        assert_eq!(
            program.diagnostics,
            [Diagnostic::UnconnectedInput {
                node: "grow".into(),
                input: "factor".into(),
                ty: "float".into(),
                literal: "1.0".into(),
            }]
        );
        assert_eq!(
            program
                .defaults
                .iter()
                .filter(|default| default.name == "default_factor_for_grow")
                .count(),
            1
        );
    }

    #[test]
    fn declarations_and_sources() {
        let program = program(GRAPH, &["time"]).unwrap();

        let uniforms: Vec<String> = program.uniforms.iter().map(ToString::to_string).collect();
        assert_eq!(uniforms, ["float globalScale"]);
        assert!(program
            .attributes
            .contains(&Declaration::new("vec3", "vsg_Normal")));

        // Both functions share a file but sources are kept per function.
        let functions: Vec<&str> = program
            .sources
            .iter()
            .map(|(function, _)| function.as_str())
            .collect();
        assert_eq!(functions, ["scale", "mix3"]);
    }

    #[test]
    fn missing_function() {
        let error = program(
            "nodes: [{name: fancy, model: {name: fresnel}, data: {data: {loadName: _v2}}}]",
            &[],
        )
        .unwrap_err();

        assert!(
            matches!(&error, Error::Metadata { node, function, source: library::Error::Read { .. } }
                if node == "fancy" && function == "fresnel_v2"),
            "{error:?}"
        );
    }

    #[test]
    fn invalid_override() {
        let error = program(
            "nodes: [{name: grow, model: {name: scale}, data: {data: {inputs: {factor: {x: 1}}}}}]",
            &[],
        )
        .unwrap_err();

        assert!(matches!(error, Error::InvalidOverride { node, input, .. }
            if node == "grow" && input == "factor"));
    }

    #[test]
    fn override_literals() {
        let literal = |yaml: &str, ty: &str| {
            override_literal(&serde_yaml::from_str(yaml).unwrap(), ty)
        };

        assert_eq!(literal("2", "int").as_deref(), Some("2"));
        assert_eq!(literal("-3", "int").as_deref(), Some("-3"));
        assert_eq!(literal("2.0", "float").as_deref(), Some("2.0"));
        assert_eq!(literal("0.125", "float").as_deref(), Some("0.125"));
        assert_eq!(literal("true", "bool").as_deref(), Some("true"));
        assert_eq!(literal("myUniform", "vec4").as_deref(), Some("myUniform"));
        assert_eq!(literal("[1, 0, 0, 1]", "vec4").as_deref(), Some("vec4(1, 0, 0, 1)"));
        assert_eq!(literal("[1, a]", "vec2"), None);
        assert_eq!(literal("~", "float"), None);
    }

    #[test]
    fn empty_call() {
        assert_eq!(call_statement("noop", std::iter::empty()), "noop();");
    }
}
