use std::fmt;

use tessel_engine::render::DeviceError;

use crate::graph::NodeId;

/// Errors raised while building or mutating the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// The device failed to compile, link or allocate for a node.
    ResourceCreation { node: String, source: DeviceError },
    /// A linked program lacks a binding the node requires.
    Configuration { node: String, missing: String },
    /// The node's `create()` has not succeeded.
    NotCreated { node: String },
    UnknownNode(NodeId),
}

impl SceneError {
    pub(crate) fn resource(node: &str, source: DeviceError) -> Self {
        SceneError::ResourceCreation {
            node: node.to_string(),
            source,
        }
    }
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::ResourceCreation { node, source } => {
                write!(f, "{node}: resource creation failed: {source}")
            }
            SceneError::Configuration { node, missing } => {
                write!(f, "{node}: program has no binding named '{missing}'")
            }
            SceneError::NotCreated { node } => write!(f, "{node}: create() has not succeeded"),
            SceneError::UnknownNode(id) => write!(f, "no scene node {id:?}"),
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SceneError::ResourceCreation { source, .. } => Some(source),
            _ => None,
        }
    }
}
