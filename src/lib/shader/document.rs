//! Typed form of the node/edge documents produced by the graph editor.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

#[derive(Debug, thiserror::Error)]
/// Document ingestion error
pub enum Error {
    #[error("Invalid graph document: {0}")]
    /// The document does not have the expected shape.
    Yaml(#[from] serde_yaml::Error),

    #[error("Versioned graph document has no components")]
    /// A `versions` wrapper without a first version holding `components`.
    MissingComponents,

    #[error("Invalid configuration for node `{node}`: {source}")]
    /// A node's configuration data is not a valid [NodeConfig].
    NodeConfig {
        /// Node name as written in the document.
        node: String,
        /// Underlying failure.
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
/// A shader graph: function nodes, the edges between their interfaces and per-node settings.
pub struct GraphDocument {
    /// Nodes, in declaration order.
    pub nodes: Vec<NodeDocument>,
    /// Data dependencies between node interfaces.
    pub edges: Vec<EdgeDocument>,
    /// Per-node settings.
    pub configuration: ConfigurationDocument,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// A node declaration.
pub struct NodeDocument {
    /// Display name, possibly containing `::`.
    pub name: String,
    /// Function the node calls.
    pub model: ModelDocument,
    /// Inline settings, used when the configuration section has no entry for the node.
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[allow(missing_docs)]
pub struct ModelDocument {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// Edge from an output interface to an input interface.
pub struct EdgeDocument {
    #[allow(missing_docs)]
    pub from: EndpointDocument,
    #[allow(missing_docs)]
    pub to: EndpointDocument,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// Node name and interface name.
pub struct EndpointDocument {
    #[allow(missing_docs)]
    pub name: String,
    #[allow(missing_docs)]
    pub interface: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
#[allow(missing_docs)]
pub struct ConfigurationDocument {
    pub nodes: Vec<ConfiguredNode>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
/// Settings entry of the configuration section.
pub struct ConfiguredNode {
    /// Node name, possibly containing `::`.
    pub name: String,
    /// Either a mapping or a YAML string encoding one.
    #[serde(default)]
    pub data: Value,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
/// Settings of a single node.
pub struct NodeConfig {
    /// `uniform`, `varying` or nothing.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Suffix appended to the model name to form the function identity.
    #[serde(rename = "loadName")]
    pub load_name: Option<String>,
    /// Literal values or variable names for unconnected inputs.
    pub inputs: Option<BTreeMap<String, Value>>,
}

impl GraphDocument {
    /// Parse a document, accepting both the bare form and the versioned
    /// `{versions: [{components: ...}]}` wrapper (first version wins).
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let value: Value = serde_yaml::from_str(yaml)?;

        let value = match value.get("versions") {
            Some(versions) => versions
                .get(0)
                .and_then(|version| version.get("components"))
                .cloned()
                .ok_or(Error::MissingComponents)?,
            None => value,
        };

        if value.is_null() {
            return Ok(Self::default());
        }

        Ok(serde_yaml::from_value(value)?)
    }
}

impl NodeConfig {
    /// Interpret a node's `data` value. Strings are parsed as YAML first and an inner `data`
    /// mapping, as written by the graph editor, is unwrapped.
    pub fn from_data(node: &str, data: &Value) -> Result<Self, Error> {
        let error = |source| Error::NodeConfig {
            node: node.to_owned(),
            source,
        };

        let data = match data {
            Value::String(yaml) => serde_yaml::from_str(yaml).map_err(error)?,
            other => other.clone(),
        };
        let data = match data.get("data") {
            Some(inner) => inner.clone(),
            None => data,
        };

        if data.is_null() {
            return Ok(Self::default());
        }

        serde_yaml::from_value(data).map_err(error)
    }

    /// Whether the node is declared with the given type.
    pub fn is(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }

    /// Override value for an input, if any.
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.as_ref().and_then(|inputs| inputs.get(name))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DOCUMENT: &str = r#"
nodes:
  - name: "material::base"
    model: {name: vec4}
  - name: phong
    model: {name: phong}
    data: {data: {inputs: {shininess: 8}}}
edges:
  - from: {name: "material::base", interface: value}
    to: {name: phong, interface: color}
configuration:
  nodes:
    - name: "material::base"
      data: "data: {type: uniform, loadName: _lit}"
"#;

    #[test]
    fn parse_document() {
        let document = GraphDocument::from_yaml(DOCUMENT).unwrap();

        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.nodes[0].model.name, "vec4");
        assert_eq!(document.edges[0].to.interface, "color");
        assert_eq!(document.configuration.nodes[0].name, "material::base");
    }

    #[test]
    fn versioned_wrapper() {
        let wrapped = format!(
            "versions:\n  - components:\n{}",
            DOCUMENT
                .lines()
                .map(|line| format!("      {line}\n"))
                .collect::<String>()
        );

        assert_eq!(
            GraphDocument::from_yaml(&wrapped).unwrap(),
            GraphDocument::from_yaml(DOCUMENT).unwrap()
        );
        assert!(matches!(
            GraphDocument::from_yaml("versions: []"),
            Err(Error::MissingComponents)
        ));
    }

    #[test]
    fn empty_document() {
        assert_eq!(GraphDocument::from_yaml("").unwrap(), GraphDocument::default());
    }

    #[test]
    fn reject_wrong_shapes() {
        assert!(matches!(
            GraphDocument::from_yaml("nodes: {a: 1}"),
            Err(Error::Yaml(_))
        ));
        assert!(GraphDocument::from_yaml("edges: [{from: {name: a}}]").is_err());
    }

    #[test]
    fn node_config_from_string_and_map() {
        let document = GraphDocument::from_yaml(DOCUMENT).unwrap();

        let uniform = NodeConfig::from_data("base", &document.configuration.nodes[0].data).unwrap();
        assert!(uniform.is("uniform"));
        assert_eq!(uniform.load_name.as_deref(), Some("_lit"));

        let phong = NodeConfig::from_data("phong", document.nodes[1].data.as_ref().unwrap()).unwrap();
        assert!(!phong.is("uniform"));
        assert_eq!(phong.input("shininess").and_then(Value::as_i64), Some(8));
        assert_eq!(phong.input("color"), None);

        assert_eq!(NodeConfig::from_data("x", &Value::Null).unwrap(), NodeConfig::default());
        assert!(matches!(
            NodeConfig::from_data("x", &Value::from("type: [")),
            Err(Error::NodeConfig { node, .. }) if node == "x"
        ));
    }
}
