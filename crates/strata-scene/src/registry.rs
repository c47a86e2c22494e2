// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Schema handlers turning prim descriptions into scene nodes.

use strata_core::source::{MeshSource, XformSource};
use strata_core::{ExportSettings, ImportSettings};
use strata_lanes::mesh::MeshNode;
use strata_lanes::xform::XformNode;

use crate::arena::NodeKind;

/// The data provider behind a prim.
pub enum PrimSource {
    /// A prim without resampled data.
    None,
    /// A polygon mesh.
    Mesh(Box<dyn MeshSource>),
    /// A transform op stack.
    Xform(Box<dyn XformSource>),
}

impl std::fmt::Debug for PrimSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::None => "None",
            Self::Mesh(_) => "Mesh(..)",
            Self::Xform(_) => "Xform(..)",
        })
    }
}

/// Everything a handler needs to create a node.
#[derive(Debug)]
pub struct PrimDesc {
    /// Node name, sanitized into the node path.
    pub name: String,
    /// The provider's type name for the prim.
    pub type_name: String,
    /// The provider.
    pub source: PrimSource,
}

impl PrimDesc {
    /// A typeless grouping prim.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: String::new(),
            source: PrimSource::None,
        }
    }

    /// A mesh prim.
    pub fn mesh(name: impl Into<String>, source: impl MeshSource + 'static) -> Self {
        Self {
            name: name.into(),
            type_name: "Mesh".to_owned(),
            source: PrimSource::Mesh(Box::new(source)),
        }
    }

    /// A transform prim.
    pub fn xform(name: impl Into<String>, source: impl XformSource + 'static) -> Self {
        Self {
            name: name.into(),
            type_name: "Xform".to_owned(),
            source: PrimSource::Xform(Box::new(source)),
        }
    }
}

/// Creates nodes for one family of prims.
///
/// Handlers are registered with `inventory::submit!` and consulted from the
/// deepest schema inheritance level down, so a specialized handler wins
/// over the generic ones it derives from.
pub struct SchemaHandler {
    /// Schema name, for logs.
    pub name: &'static str,
    /// Inheritance depth of the schema.
    pub depth: u32,
    /// Whether this handler accepts the prim.
    pub matches: fn(&PrimDesc) -> bool,
    /// Builds the node kind for the prim at `path`.
    pub create: fn(&str, PrimSource, &ImportSettings, &ExportSettings) -> NodeKind,
}

inventory::collect!(SchemaHandler);

/// Registered handlers, deepest first.
pub fn handlers() -> Vec<&'static SchemaHandler> {
    let mut handlers: Vec<_> = inventory::iter::<SchemaHandler>.into_iter().collect();
    handlers.sort_by(|a, b| b.depth.cmp(&a.depth));
    handlers
}

fn any_prim(_: &PrimDesc) -> bool {
    true
}

fn is_mesh(desc: &PrimDesc) -> bool {
    matches!(desc.source, PrimSource::Mesh(_))
}

fn is_xform(desc: &PrimDesc) -> bool {
    matches!(desc.source, PrimSource::Xform(_))
}

fn create_group(_: &str, _: PrimSource, _: &ImportSettings, _: &ExportSettings) -> NodeKind {
    NodeKind::Group
}

fn create_mesh(
    path: &str,
    source: PrimSource,
    import: &ImportSettings,
    export: &ExportSettings,
) -> NodeKind {
    match source {
        PrimSource::Mesh(source) => {
            NodeKind::Mesh(MeshNode::new(path, source, import.clone(), export.clone()))
        }
        other => {
            log::warn!("{path}: mesh handler got {other:?}; creating a group");
            NodeKind::Group
        }
    }
}

fn create_xform(
    path: &str,
    source: PrimSource,
    import: &ImportSettings,
    export: &ExportSettings,
) -> NodeKind {
    match source {
        PrimSource::Xform(source) => {
            NodeKind::Xform(XformNode::new(path, source, import.clone(), export.clone()))
        }
        other => {
            log::warn!("{path}: xform handler got {other:?}; creating a group");
            NodeKind::Group
        }
    }
}

inventory::submit! {
    SchemaHandler {
        name: "Group",
        depth: 0,
        matches: any_prim,
        create: create_group,
    }
}

inventory::submit! {
    SchemaHandler {
        name: "Xform",
        depth: 1,
        matches: is_xform,
        create: create_xform,
    }
}

inventory::submit! {
    SchemaHandler {
        name: "Mesh",
        depth: 2,
        matches: is_mesh,
        create: create_mesh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::source::{MemoryMesh, MemoryXform};

    #[test]
    fn test_handlers_are_sorted_by_depth() {
        let names: Vec<_> = handlers().iter().map(|h| h.name).collect();
        assert_eq!(names, vec!["Mesh", "Xform", "Group"]);
    }

    #[test]
    fn test_first_matching_handler_wins() {
        let pick = |desc: &PrimDesc| {
            handlers()
                .into_iter()
                .find(|h| (h.matches)(desc))
                .map(|h| h.name)
        };
        assert_eq!(pick(&PrimDesc::mesh("m", MemoryMesh::new())), Some("Mesh"));
        assert_eq!(pick(&PrimDesc::xform("x", MemoryXform::new())), Some("Xform"));
        assert_eq!(pick(&PrimDesc::group("g")), Some("Group"));
    }
}
