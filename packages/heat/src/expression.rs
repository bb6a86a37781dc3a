//! Earth Engine expression graphs.
//!
//! The REST API evaluates computations described as a graph of function
//! invocations. A [`Node`] tree is built locally and flattened by
//! [`Expression::to_json`] into the `{ "result": id, "values": { ... } }`
//! form, hoisting function bodies into named values as the API requires.
//!
//! See <https://developers.google.com/earth-engine/reference/rest/v1/Expression>

use serde_json::{Map, Value, json};

/// One node of an expression graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A literal JSON value.
    Constant(Value),
    /// A call to a server-side algorithm with named arguments.
    Invoke {
        function: &'static str,
        arguments: Vec<(&'static str, Self)>,
    },
    /// Reference to an argument of the enclosing [`Node::Function`].
    Argument(&'static str),
    /// A lambda passed to algorithms such as `Collection.map`.
    Function {
        arguments: Vec<&'static str>,
        body: Box<Self>,
    },
}

impl Node {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    pub fn invoke(
        function: &'static str,
        arguments: impl IntoIterator<Item = (&'static str, Self)>,
    ) -> Self {
        Self::Invoke {
            function,
            arguments: arguments.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn function(arguments: Vec<&'static str>, body: Self) -> Self {
        Self::Function {
            arguments,
            body: Box::new(body),
        }
    }
}

/// A complete expression rooted at one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Node,
}

impl Expression {
    #[must_use]
    pub const fn new(root: Node) -> Self {
        Self { root }
    }

    #[must_use]
    pub const fn root(&self) -> &Node {
        &self.root
    }

    /// Serializes the graph in the REST `Expression` format.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut encoder = Encoder::default();
        let result = encoder.hoist(&self.root);
        json!({
            "result": result,
            "values": Value::Object(encoder.values),
        })
    }
}

#[derive(Default)]
struct Encoder {
    values: Map<String, Value>,
}

impl Encoder {
    /// Encodes `node` as a named value and returns its id.
    fn hoist(&mut self, node: &Node) -> String {
        let encoded = self.encode(node);
        let id = self.values.len().to_string();
        self.values.insert(id.clone(), encoded);
        id
    }

    fn encode(&mut self, node: &Node) -> Value {
        match node {
            Node::Constant(value) => json!({ "constantValue": value }),
            Node::Invoke {
                function,
                arguments,
            } => {
                let arguments: Map<String, Value> = arguments
                    .iter()
                    .map(|(name, arg)| ((*name).to_string(), self.encode(arg)))
                    .collect();
                json!({
                    "functionInvocationValue": {
                        "functionName": function,
                        "arguments": arguments,
                    }
                })
            }
            Node::Argument(name) => json!({ "argumentReference": name }),
            Node::Function { arguments, body } => {
                let body = self.hoist(body);
                json!({
                    "functionDefinitionValue": {
                        "argumentNames": arguments,
                        "body": body,
                    }
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_root_is_hoisted() {
        let json = Expression::new(Node::constant(42)).to_json();
        assert_eq!(json["result"], "0");
        assert_eq!(json["values"]["0"]["constantValue"], 42);
    }

    #[test]
    fn invocations_are_nested_inline() {
        let node = Node::invoke("Image.constant", [("value", Node::constant(1.5))]);
        let json = Expression::new(node).to_json();
        let call = &json["values"]["0"]["functionInvocationValue"];

        assert_eq!(call["functionName"], "Image.constant");
        assert_eq!(call["arguments"]["value"]["constantValue"], 1.5);
    }

    #[test]
    fn function_bodies_become_separate_values() {
        let body = Node::invoke(
            "Image.rename",
            [
                ("input", Node::Argument("_MAPPING_VAR_0_0")),
                ("names", Node::constant(vec!["X"])),
            ],
        );
        let map = Node::invoke(
            "Collection.map",
            [
                ("collection", Node::constant("ignored")),
                (
                    "baseAlgorithm",
                    Node::function(vec!["_MAPPING_VAR_0_0"], body),
                ),
            ],
        );

        let json = Expression::new(map).to_json();

        // Body first, root last.
        assert_eq!(json["result"], "1");
        let body = &json["values"]["0"]["functionInvocationValue"];
        assert_eq!(body["functionName"], "Image.rename");
        assert_eq!(
            body["arguments"]["input"]["argumentReference"],
            "_MAPPING_VAR_0_0"
        );

        let definition =
            &json["values"]["1"]["functionInvocationValue"]["arguments"]["baseAlgorithm"]
                ["functionDefinitionValue"];
        assert_eq!(definition["body"], "0");
        assert_eq!(definition["argumentNames"][0], "_MAPPING_VAR_0_0");
    }
}
