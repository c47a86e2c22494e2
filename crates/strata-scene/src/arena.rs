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

//! Node storage and the relations between nodes.

use std::fmt;

use strata_core::source::{MeshSource, XformSource};
use strata_core::{ExportSettings, ImportSettings, Time, UpdateFlags};
use strata_lanes::mesh::MeshNode;
use strata_lanes::xform::XformNode;

use crate::registry::{handlers, PrimDesc};

/// Handle to a node. Handles are never reused, so a handle to a removed
/// node stays dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The arena slot.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a node resamples.
pub enum NodeKind {
    /// Nothing; groups and instances.
    Group,
    /// A polygon mesh.
    Mesh(MeshNode<Box<dyn MeshSource>>),
    /// A transform.
    Xform(XformNode<Box<dyn XformSource>>),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group => f.write_str("Group"),
            Self::Mesh(mesh) => f.debug_tuple("Mesh").field(&mesh.path()).finish(),
            Self::Xform(xform) => f.debug_tuple("Xform").field(&xform.path()).finish(),
        }
    }
}

/// One scene node.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    name: String,
    type_name: String,
    path: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    master: Option<NodeId>,
    instances: Vec<NodeId>,
    import_override: bool,
    kind: NodeKind,
}

impl Node {
    /// This node's handle.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The name the node was created with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The provider's type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Full path from the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The parent node.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in creation order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The node this one instances.
    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    /// Nodes instancing this one.
    pub fn instances(&self) -> &[NodeId] {
        &self.instances
    }

    /// Whether this node instances another.
    pub fn is_instance(&self) -> bool {
        self.master.is_some()
    }

    /// Whether this node keeps its own import settings.
    pub fn has_settings_override(&self) -> bool {
        self.import_override
    }

    /// The resampling controller.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable access to the resampling controller.
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// The mesh controller, if this is a mesh.
    pub fn as_mesh_mut(&mut self) -> Option<&mut MeshNode<Box<dyn MeshSource>>> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    /// The transform controller, if this is a transform.
    pub fn as_xform_mut(&mut self) -> Option<&mut XformNode<Box<dyn XformSource>>> {
        match &mut self.kind {
            NodeKind::Xform(xform) => Some(xform),
            _ => None,
        }
    }

    /// Resamples the node at `t`.
    pub fn update(&mut self, t: Time) -> UpdateFlags {
        match &mut self.kind {
            NodeKind::Group => UpdateFlags::empty(),
            NodeKind::Mesh(mesh) => mesh.update_sample(t),
            NodeKind::Xform(xform) => xform.update_sample(t),
        }
    }

    /// Forwards externally observed changes to the controller.
    pub fn notify(&mut self, flags: UpdateFlags) {
        match &mut self.kind {
            NodeKind::Group => {}
            NodeKind::Mesh(mesh) => mesh.notify(flags),
            NodeKind::Xform(xform) => xform.notify(flags),
        }
    }

    fn apply_import_settings(&mut self, settings: &ImportSettings) {
        match &mut self.kind {
            NodeKind::Group => {}
            NodeKind::Mesh(mesh) => mesh.set_import_settings(settings.clone()),
            NodeKind::Xform(xform) => xform.set_import_settings(settings.clone()),
        }
    }

    fn apply_export_settings(&mut self, settings: &ExportSettings) {
        match &mut self.kind {
            NodeKind::Group => {}
            NodeKind::Mesh(mesh) => mesh.set_export_settings(settings.clone()),
            NodeKind::Xform(xform) => xform.set_export_settings(settings.clone()),
        }
    }
}

/// Joins `name` onto `parent`, replacing characters that are not ASCII
/// alphanumerics with `_`.
fn make_path(parent: Option<&str>, name: &str) -> String {
    let mut path = parent.unwrap_or_default().to_owned();
    if !path.ends_with('/') {
        path.push('/');
    }
    path.extend(
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }),
    );
    path
}

/// Owns every node of a scene.
///
/// Removal empties a slot but never frees it, so the slot vector only grows
/// and a stale [`NodeId`] keeps resolving to `None`. Scenes are built once
/// per load, which bounds the growth.
#[derive(Debug, Default)]
pub struct Scene {
    pub(crate) nodes: Vec<Option<Node>>,
    roots: Vec<NodeId>,
    import: ImportSettings,
    export: ExportSettings,
}

impl Scene {
    /// An empty scene with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty scene whose nodes start from the given settings.
    pub fn with_settings(import: ImportSettings, export: ExportSettings) -> Self {
        Self {
            import,
            export,
            ..Default::default()
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Whether the scene has no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nodes without a parent.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Live nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    /// The node behind `id`, `None` once it was removed.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())?.as_ref()
    }

    /// Mutable access to the node behind `id`.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())?.as_mut()
    }

    /// The node at `path`.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.iter().find(|n| n.path == path).map(|n| n.id)
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        type_name: String,
        master: Option<NodeId>,
        kind: NodeKind,
        path: String,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node {
            id,
            name: name.to_owned(),
            type_name,
            path,
            parent,
            children: Vec::new(),
            master,
            instances: Vec::new(),
            import_override: false,
            kind,
        }));
        match parent.and_then(|p| self.get_mut(p)) {
            Some(parent) => parent.children.push(id),
            None => self.roots.push(id),
        }
        if let Some(master) = master.and_then(|m| self.get_mut(m)) {
            master.instances.push(id);
        }
        id
    }

    fn live_parent(&self, parent: Option<NodeId>) -> Option<NodeId> {
        let parent = parent?;
        if self.get(parent).is_none() {
            log::warn!("parent {parent:?} is gone; adding as a root");
            return None;
        }
        Some(parent)
    }

    /// Creates a node for `desc` under `parent` with the deepest handler
    /// that accepts it.
    pub fn add_prim(&mut self, parent: Option<NodeId>, desc: PrimDesc) -> NodeId {
        let parent = self.live_parent(parent);
        let path = make_path(parent.and_then(|p| self.get(p)).map(Node::path), &desc.name);

        let kind = match handlers().into_iter().find(|h| (h.matches)(&desc)) {
            Some(handler) => {
                log::debug!("{path}: created by the {} handler", handler.name);
                (handler.create)(&path, desc.source, &self.import, &self.export)
            }
            None => NodeKind::Group,
        };
        self.insert(parent, &desc.name, desc.type_name, None, kind, path)
    }

    /// Creates a node instancing `master` under `parent`; `None` if the
    /// master is gone.
    pub fn add_instance(
        &mut self,
        parent: Option<NodeId>,
        name: &str,
        master: NodeId,
    ) -> Option<NodeId> {
        let type_name = self.get(master)?.type_name.clone();
        let parent = self.live_parent(parent);
        let path = make_path(parent.and_then(|p| self.get(p)).map(Node::path), name);
        Some(self.insert(parent, name, type_name, Some(master), NodeKind::Group, path))
    }

    /// Removes `id` and its subtree and returns how many nodes were removed.
    ///
    /// Removed nodes are detached from their surviving parent and masters;
    /// surviving instances of a removed master lose their master.
    pub fn remove(&mut self, id: NodeId) -> usize {
        let mut doomed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(next.index()).and_then(Option::take) {
                stack.extend_from_slice(&node.children);
                doomed.push(node);
            }
        }

        for node in &doomed {
            if let Some(parent) = node.parent.and_then(|p| self.get_mut(p)) {
                parent.children.retain(|&c| c != node.id);
            }
            if let Some(master) = node.master.and_then(|m| self.get_mut(m)) {
                master.instances.retain(|&i| i != node.id);
            }
            for &instance in &node.instances {
                if let Some(instance) = self.get_mut(instance) {
                    log::debug!("{}: master {} removed", instance.path, node.path);
                    instance.master = None;
                }
            }
        }
        self.roots.retain(|r| self.nodes[r.index()].is_some());
        doomed.len()
    }

    /// Import settings given to new nodes.
    pub fn import_settings(&self) -> &ImportSettings {
        &self.import
    }

    /// Export settings given to new nodes.
    pub fn export_settings(&self) -> &ExportSettings {
        &self.export
    }

    /// Replaces the scene's import settings and applies them to every node
    /// without its own override.
    pub fn set_import_settings(&mut self, settings: ImportSettings) {
        for node in self.nodes.iter_mut().flatten() {
            if !node.import_override {
                node.apply_import_settings(&settings);
            }
        }
        self.import = settings;
    }

    /// Replaces the export settings of the scene and every node.
    pub fn set_export_settings(&mut self, settings: ExportSettings) {
        for node in self.nodes.iter_mut().flatten() {
            node.apply_export_settings(&settings);
        }
        self.export = settings;
    }

    /// Gives `id` its own import settings, kept across scene-wide changes.
    pub fn set_node_import_settings(&mut self, id: NodeId, settings: ImportSettings) -> bool {
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        node.import_override = true;
        node.apply_import_settings(&settings);
        true
    }

    /// Drops the override of `id` and reapplies the scene settings.
    pub fn clear_node_import_settings(&mut self, id: NodeId) -> bool {
        let settings = self.import.clone();
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        node.import_override = false;
        node.apply_import_settings(&settings);
        true
    }

    /// Forwards changes observed by the provider to one node.
    pub fn notify(&mut self, id: NodeId, flags: UpdateFlags) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.notify(flags);
                true
            }
            None => false,
        }
    }
}
