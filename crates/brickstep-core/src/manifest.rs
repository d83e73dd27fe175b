//! Assembly manifest - the on-disk form of an instruction tree
//!
//! Manifests are TOML (or JSON) documents listing the nodes of the root
//! assembly in build order. Nested sub-assemblies carry their own
//! `children` list:
//!
//! ```toml
//! name = "house"
//!
//! [[node]]
//! kind = "part"
//! name = "wall-1"
//! position = "0 0 0"
//!
//! [[node]]
//! kind = "step"
//!
//! [[node]]
//! kind = "sub_assembly"
//! name = "roof"
//!
//! [[node.children]]
//! kind = "part"
//! name = "tile-1"
//!
//! [[node.children]]
//! kind = "step"
//!
//! [[node]]
//! kind = "step"
//! number = "2.5"
//! direction = "0 0 1"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::animation::{parse_vec3_string, Vec3};
use crate::assembly::{AssemblyNode, Part, StepMarker, SubAssembly};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize manifest: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Failed to parse JSON manifest: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Invalid vector '{value}' on node {node}")]
    InvalidPose { node: String, value: String },
}

/// A node as written in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeSpec {
    Part {
        name: String,
        /// Final position "x y z"
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<String>,
    },
    Step {
        /// Authored step number, overriding automatic numbering
        #[serde(default, skip_serializing_if = "Option::is_none")]
        number: Option<String>,
        #[serde(default)]
        sub_step: bool,
        /// Animation direction "x y z" (defaults to down)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<String>,
    },
    SubAssembly {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<String>,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
}

/// Root of a manifest document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyManifest {
    /// Version of the manifest format
    #[serde(default = "default_version")]
    pub version: String,
    /// Name of the root assembly
    #[serde(default = "default_name")]
    pub name: String,
    /// Root nodes in build order
    #[serde(default)]
    pub node: Vec<NodeSpec>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_name() -> String {
    "model".to_string()
}

impl Default for AssemblyManifest {
    fn default() -> Self {
        Self {
            version: default_version(),
            name: default_name(),
            node: Vec::new(),
        }
    }
}

impl AssemblyManifest {
    /// Load a manifest from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        let manifest: AssemblyManifest = toml::from_str(content)?;
        Ok(manifest)
    }

    /// Load a manifest from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        let manifest: AssemblyManifest = serde_json::from_str(content)?;
        Ok(manifest)
    }

    /// Load a manifest from a file; `.json` files are read as JSON,
    /// everything else as TOML
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_toml(&content)
        }
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, ManifestError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the manifest to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<(), ManifestError> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Build the root sub-assembly described by this manifest
    pub fn into_root(self) -> Result<SubAssembly, ManifestError> {
        let children = build_nodes(self.node)?;
        Ok(SubAssembly::root(self.name, children))
    }
}

fn build_nodes(specs: Vec<NodeSpec>) -> Result<Vec<AssemblyNode>, ManifestError> {
    specs.into_iter().map(build_node).collect()
}

fn build_node(spec: NodeSpec) -> Result<AssemblyNode, ManifestError> {
    let node = match spec {
        NodeSpec::Part { name, position } => {
            let position = parse_vector(&name, position.as_deref(), Vec3::ZERO)?;
            Part::new(name).at(position).into()
        }
        NodeSpec::Step {
            number,
            sub_step,
            direction,
        } => {
            let node_name = number.clone().unwrap_or_else(|| "step".to_string());
            let mut step = StepMarker::new()
                .with_direction(parse_vector(&node_name, direction.as_deref(), Vec3::DOWN)?);
            step.manual_number = number;
            step.is_sub_step = sub_step;
            step.into()
        }
        NodeSpec::SubAssembly {
            name,
            position,
            children,
        } => {
            let position = parse_vector(&name, position.as_deref(), Vec3::ZERO)?;
            SubAssembly::new(name, build_nodes(children)?).at(position).into()
        }
    };
    Ok(node)
}

fn parse_vector(node: &str, value: Option<&str>, default: Vec3) -> Result<Vec3, ManifestError> {
    match value {
        None => Ok(default),
        Some(s) => parse_vec3_string(s).ok_or_else(|| ManifestError::InvalidPose {
            node: node.to_string(),
            value: s.to_string(),
        }),
    }
}
