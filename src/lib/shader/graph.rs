//! Flat dependency [Graph] built from a [GraphDocument].

use super::{
    document::{self, GraphDocument, NodeConfig},
    schedule::{schedule, CycleError},
    types::is_pass_through,
    Declaration, DeclarationSet,
};

use crate::{Ingested, Scheduled};

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    marker::PhantomData,
};

use derive_more::Display;
use serde_yaml::Value;

#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Wrapper around a node's 1-based declaration index.
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// How a node's value is exposed outside of `main`.
pub enum NodeKind {
    #[default]
    /// Plain local value or function call.
    Plain,
    /// Externally supplied value.
    Uniform,
    /// Value passed from the vertex to the fragment stage.
    Varying,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// A node of the shader graph.
pub struct GraphNode {
    #[allow(missing_docs)]
    pub id: NodeId,
    /// Function identity: the model name followed by the optional `loadName` suffix.
    pub function: String,
    /// Normalized node name, also the prefix of every variable the node owns.
    pub name: String,
    #[allow(missing_docs)]
    pub kind: NodeKind,
    /// Literal values or variable names for inputs no edge feeds.
    pub overrides: BTreeMap<String, Value>,
}

#[derive(Debug, thiserror::Error)]
/// [Graph] error
pub enum Error {
    #[error(transparent)]
    /// A node's configuration could not be read.
    Document(#[from] document::Error),

    #[error("Detected a cycle through nodes {}", .during.join(" -> "))]
    /// Precedence constraints cannot be satisfied.
    Cycle {
        /// Names of the nodes along the cycle, in precedence order.
        during: Vec<String>,
        /// Ids matching `during`.
        ids: Vec<NodeId>,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Shader graph state machine: [Ingested] from a document, then [Scheduled].
pub struct Graph<State> {
    /// Nodes by id.
    pub nodes: BTreeMap<NodeId, GraphNode>,
    names: HashMap<String, NodeId>,

    /// Input bindings by destination node name, then input name, to the source variable.
    /// Destinations that are not nodes of the graph are kept as-is.
    pub bindings: HashMap<String, BTreeMap<String, String>>,
    /// `(before, after)` precedence constraints.
    pub constraints: BTreeSet<(NodeId, NodeId)>,
    /// Assignments into varyings, run after every call.
    pub epilogue: Vec<String>,

    /// Uniforms declared by nodes.
    pub uniforms: DeclarationSet,
    /// Varyings declared by nodes.
    pub varyings: DeclarationSet,

    order: Vec<NodeId>,
    state: PhantomData<State>,
}

/// Replace `::` with `_` and rename the legacy `gl_Vertex` to `vsg_Vertex`.
pub fn normalize_name(name: &str) -> String {
    match name.replace("::", "_") {
        legacy if legacy == "gl_Vertex" => "vsg_Vertex".to_owned(),
        name => name,
    }
}

impl Graph<Ingested> {
    /// Build the graph of `document`. Uniform nodes named in `supplied` are provided
    /// externally and not declared.
    pub fn ingest(document: &GraphDocument, supplied: &BTreeSet<String>) -> Result<Self, Error> {
        let mut configs = HashMap::new();
        for configured in &document.configuration.nodes {
            configs.insert(
                normalize_name(&configured.name),
                NodeConfig::from_data(&configured.name, &configured.data)?,
            );
        }

        let mut graph = Graph::<Ingested>::default();

        for (index, declared) in document.nodes.iter().enumerate() {
            let id = NodeId(index as u32 + 1);
            let name = normalize_name(&declared.name);

            let config = match (configs.get(&name).cloned(), &declared.data) {
                (Some(config), _) => config,
                (None, Some(data)) => NodeConfig::from_data(&declared.name, data)?,
                (None, None) => NodeConfig::default(),
            };

            let function = match &config.load_name {
                Some(suffix) => format!("{}{suffix}", declared.model.name),
                None => declared.model.name.clone(),
            };

            let kind = if config.is("uniform") {
                if supplied.contains(&name) {
                    log::debug!("Uniform `{name}` is supplied externally");
                } else {
                    graph.uniforms.insert(Declaration::new(&function, &name));
                }
                NodeKind::Uniform
            } else if config.is("varying") {
                graph.varyings.insert(Declaration::new(&function, &name));
                NodeKind::Varying
            } else {
                NodeKind::Plain
            };

            graph.names.insert(name.clone(), id);
            graph.nodes.insert(
                id,
                GraphNode {
                    id,
                    function,
                    name,
                    kind,
                    overrides: config.inputs.unwrap_or_default(),
                },
            );
        }

        for edge in &document.edges {
            let from = normalize_name(&edge.from.name);
            let to = normalize_name(&edge.to.name);

            let source = graph
                .node_by_name(&from)
                .map(|node| (node.id, is_pass_through(&node.function)));
            let destination = graph.node_by_name(&to).map(|node| (node.id, node.kind));

            match (source, destination) {
                (Some((source, _)), Some((destination, _))) => {
                    graph.constraints.insert((source, destination));
                }
                _ => log::warn!(
                    "Edge `{from}.{}` -> `{to}.{}` references an unknown node, it does not \
                     constrain the call order",
                    edge.from.interface,
                    edge.to.interface
                ),
            }

            let variable = match source {
                Some((_, true)) => from.clone(),
                _ => format!("{from}_at_{}", edge.from.interface),
            };

            if let Some((_, NodeKind::Varying)) = destination {
                graph.epilogue.push(format!("{to} = {variable};"));
            }

            graph
                .bindings
                .entry(to)
                .or_default()
                .insert(edge.to.interface.clone(), variable);
        }

        log::debug!(
            "Ingested {} nodes and {} constraints",
            graph.nodes.len(),
            graph.constraints.len()
        );

        Ok(graph)
    }

    /// Order the nodes, failing if the precedence constraints form a cycle.
    pub fn schedule(self) -> Result<Graph<Scheduled>, Error> {
        let order = match schedule(self.nodes.keys().copied(), &self.constraints) {
            Ok(order) => order,
            Err(CycleError { cycle }) => {
                return Err(Error::Cycle {
                    during: cycle
                        .iter()
                        .map(|id| {
                            self.nodes
                                .get(id)
                                .map_or_else(|| id.to_string(), |node| node.name.clone())
                        })
                        .collect(),
                    ids: cycle,
                })
            }
        };

        let Self {
            nodes,
            names,
            bindings,
            constraints,
            epilogue,
            uniforms,
            varyings,
            order: _order,
            state: _state,
        } = self;

        Ok(Graph {
            nodes,
            names,
            bindings,
            constraints,
            epilogue,
            uniforms,
            varyings,
            order,
            state: PhantomData::<Scheduled>,
        })
    }
}

impl Graph<Scheduled> {
    /// Nodes in call order.
    pub fn scheduled(&self) -> impl Iterator<Item = &GraphNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Node ids in call order.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }
}

impl<State> Graph<State> {
    /// Look a node up by its normalized name. With duplicate names the last declaration wins.
    pub fn node_by_name(&self, name: &str) -> Option<&GraphNode> {
        self.names.get(name).and_then(|id| self.nodes.get(id))
    }

    /// Variable bound to the `input` interface of node `node` by an edge.
    pub fn binding(&self, node: &str, input: &str) -> Option<&str> {
        self.bindings
            .get(node)
            .and_then(|inputs| inputs.get(input))
            .map(String::as_str)
    }
}
