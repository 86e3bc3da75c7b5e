//! The untyped configuration tree.
//!
//! A [`RawConfig`] owns every node of one tree in an arena. Nodes refer to
//! their parent and children by [`NodeId`], so copying a tree is a plain
//! arena clone and detaching a subtree never leaves a dangling owner.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use tracing::debug;

use crate::path;

/// Handle to a node inside one [`RawConfig`].
///
/// Ids are generation checked: once a node is removed its id never resolves
/// again, even after the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    value: Option<String>,
    type_tag: Option<String>,
    comment: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            value: None,
            type_tag: None,
            comment: None,
            parent,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// An ordered tree of named nodes holding optional string values.
#[derive(Debug, Clone)]
pub struct RawConfig {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RawConfig {
    /// An empty tree whose root has an empty name.
    pub fn new() -> Self {
        Self::named("")
    }

    pub fn named(name: &str) -> Self {
        let mut raw = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId { index: 0, generation: 0 },
        };
        raw.root = raw.alloc(Node::new(name, None));
        raw
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Whether `id` still refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.try_data(id).is_some()
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        let root = self.data(self.root);
        root.value.is_none() && root.children.is_empty()
    }

    // ── Arena ──────────────────────────────────────────────────

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Free `id` and everything below it. The caller unlinks it from its parent.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self.slots.get_mut(id.index as usize) else {
                continue;
            };
            if slot.generation != id.generation {
                continue;
            }
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
                stack.extend(node.children);
            }
        }
    }

    fn try_data(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn data(&self, id: NodeId) -> &Node {
        self.try_data(id)
            .unwrap_or_else(|| panic!("stale node id {:?}", id))
    }

    fn data_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .unwrap_or_else(|| panic!("stale node id {:?}", id))
    }

    fn add_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        let child = self.alloc(Node::new(name, Some(parent)));
        self.data_mut(parent).children.push(child);
        child
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.data(id).parent {
            self.data_mut(parent).children.retain(|c| *c != id);
            self.data_mut(id).parent = None;
        }
    }

    // ── Accessors ──────────────────────────────────────────────

    pub fn name(&self, id: NodeId) -> &str {
        &self.data(id).name
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.data(id).value.as_deref()
    }

    pub fn type_tag(&self, id: NodeId) -> Option<&str> {
        self.data(id).type_tag.as_deref()
    }

    pub fn comment(&self, id: NodeId) -> Option<&str> {
        self.data(id).comment.as_deref()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    /// Children in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.data(id).children
    }

    pub fn has_sub_items(&self, id: NodeId) -> bool {
        !self.data(id).children.is_empty()
    }

    /// Snapshot of the immediate child names in insertion order.
    pub fn sub_items(&self, id: NodeId) -> Vec<String> {
        self.data(id)
            .children
            .iter()
            .map(|c| self.data(*c).name.clone())
            .collect()
    }

    fn find_child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.data(id)
            .children
            .iter()
            .copied()
            .find(|c| self.data(*c).name == name)
    }

    // ── Path access ────────────────────────────────────────────

    /// Look up a descendant by path without creating anything.
    pub fn get(&self, id: NodeId, path: &str) -> Option<NodeId> {
        let mut current = id;
        for name in path::segments(path) {
            current = self.find_child(current, name)?;
        }
        Some(current)
    }

    /// Look up a descendant by path, creating missing nodes on the way.
    ///
    /// Segments are literal names: `Price$USD` and `Price$EUR` are two
    /// different children. Type tags are only set through [`set_type_tag`].
    ///
    /// [`set_type_tag`]: RawConfig::set_type_tag
    pub fn entry(&mut self, id: NodeId, path: &str) -> NodeId {
        let mut current = id;
        for name in path::segments(path) {
            current = match self.find_child(current, name) {
                Some(child) => child,
                None => self.add_child(current, name),
            };
        }
        current
    }

    pub fn get_path(&self, path: &str) -> Option<NodeId> {
        self.get(self.root, path)
    }

    pub fn entry_path(&mut self, path: &str) -> NodeId {
        self.entry(self.root, path)
    }

    pub fn value_by_path(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(|id| self.value(id))
    }

    pub fn set_value_by_path(&mut self, path: &str, value: impl Into<String>) -> NodeId {
        let id = self.entry_path(path);
        self.set_value(id, value);
        id
    }

    // ── Mutation ───────────────────────────────────────────────

    /// Set the scalar value. Children are left alone.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.data_mut(id).value = Some(value.into());
    }

    pub fn clear_value(&mut self, id: NodeId) {
        self.data_mut(id).value = None;
    }

    pub fn set_type_tag(&mut self, id: NodeId, tag: impl Into<String>) {
        self.data_mut(id).type_tag = Some(tag.into());
    }

    pub fn clear_type_tag(&mut self, id: NodeId) {
        self.data_mut(id).type_tag = None;
    }

    pub fn set_comment(&mut self, id: NodeId, comment: impl Into<String>) {
        self.data_mut(id).comment = Some(comment.into());
    }

    pub fn clear_comment(&mut self, id: NodeId) {
        self.data_mut(id).comment = None;
    }

    /// Drop every child of `id`, recursively.
    pub fn remove_all(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.data_mut(id).children);
        for child in children {
            self.release(child);
        }
    }

    /// Remove the child called `name`. Returns whether it existed.
    pub fn remove(&mut self, id: NodeId, name: &str) -> bool {
        match self.find_child(id, name) {
            Some(child) => {
                self.unlink(child);
                self.release(child);
                true
            }
            None => false,
        }
    }

    /// Take `id` out of the tree and return it as an independent tree.
    ///
    /// The returned root keeps the node's name, tag and comment and has no
    /// parent. Returns `None` for a node without a parent.
    pub fn detach(&mut self, id: NodeId) -> Option<RawConfig> {
        self.parent(id)?;
        let node = self.data(id);
        let mut detached = RawConfig::named(&node.name);
        let root = detached.root;
        {
            let target = detached.data_mut(root);
            target.value = node.value.clone();
            target.type_tag = node.type_tag.clone();
            target.comment = node.comment.clone();
        }
        detached.graft_children(root, self, id);
        debug!(name = %self.name(id), "detaching node");
        self.unlink(id);
        self.release(id);
        Some(detached)
    }

    /// Independent copy of the subtree at `id`: its value and children, with an
    /// empty root name.
    pub fn copy_subtree(&self, id: NodeId) -> RawConfig {
        let mut copy = RawConfig::new();
        let root = copy.root;
        copy.assign_from(root, self, id);
        copy
    }

    /// Replace the value and children of `dst` with those of `other`'s root.
    pub fn assign(&mut self, dst: NodeId, other: &RawConfig) {
        self.assign_from(dst, other, other.root);
    }

    /// Replace the value and children of `dst` with those of `src` in `other`.
    ///
    /// `dst` keeps its own name, parent, tag and comment.
    pub fn assign_from(&mut self, dst: NodeId, other: &RawConfig, src: NodeId) {
        self.remove_all(dst);
        self.data_mut(dst).value = other.data(src).value.clone();
        self.graft_children(dst, other, src);
    }

    /// Assignment between two nodes of the same tree.
    ///
    /// The source is copied out before `dst` is cleared, so either node may be
    /// an ancestor of the other.
    pub fn assign_node(&mut self, dst: NodeId, src: NodeId) {
        let snapshot = self.copy_subtree(src);
        debug!(
            dst = %self.name(dst),
            src = %self.name(src),
            nodes = snapshot.len(),
            "assigning subtree"
        );
        self.assign(dst, &snapshot);
    }

    fn graft_children(&mut self, dst: NodeId, other: &RawConfig, src: NodeId) {
        for child in other.children(src) {
            let source = other.data(*child);
            let copied = self.add_child(dst, &source.name);
            {
                let target = self.data_mut(copied);
                target.value = source.value.clone();
                target.type_tag = source.type_tag.clone();
                target.comment = source.comment.clone();
            }
            self.graft_children(copied, other, *child);
        }
    }

    // ── Equality ───────────────────────────────────────────────

    /// Structural equality of `a` in `self` and `b` in `other`.
    ///
    /// Values and children (by name, recursively) are compared. Node names,
    /// parents, tags, comments and child order are not.
    pub fn node_eq(&self, a: NodeId, other: &RawConfig, b: NodeId) -> bool {
        let left = self.data(a);
        let right = other.data(b);
        if left.value != right.value || left.children.len() != right.children.len() {
            return false;
        }
        left.children.iter().all(|child| {
            other
                .find_child(b, &self.data(*child).name)
                .is_some_and(|peer| self.node_eq(*child, other, peer))
        })
    }

    /// Every child is listed under its own name exactly once and points back
    /// at the node that lists it.
    pub fn check_invariants(&self) -> bool {
        if self.data(self.root).parent.is_some() {
            return false;
        }
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.data(id);
            for (i, child) in node.children.iter().enumerate() {
                let Some(data) = self.try_data(*child) else {
                    return false;
                };
                if data.parent != Some(id) || self.find_child(id, &data.name) != Some(*child) {
                    return false;
                }
                if node.children[..i].contains(child) {
                    return false;
                }
                stack.push(*child);
            }
        }
        true
    }

    // ── Views ──────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    pub fn node_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut { tree: self, id }
    }

    pub fn root_node(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    pub fn root_mut(&mut self) -> NodeMut<'_> {
        let root = self.root;
        self.node_mut(root)
    }

    /// Pretty JSON rendering of the whole tree.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl PartialEq for RawConfig {
    fn eq(&self, other: &Self) -> bool {
        self.node_eq(self.root, other, other.root)
    }
}

impl fmt::Display for RawConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root_node(), f)
    }
}

impl Serialize for RawConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root_node().serialize(serializer)
    }
}

// ── NodeRef ────────────────────────────────────────────────────

/// Read-only view of one node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    tree: &'a RawConfig,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'a RawConfig {
        self.tree
    }

    pub fn name(&self) -> &'a str {
        self.tree.name(self.id)
    }

    pub fn value(&self) -> Option<&'a str> {
        self.tree.value(self.id)
    }

    pub fn type_tag(&self) -> Option<&'a str> {
        self.tree.type_tag(self.id)
    }

    pub fn comment(&self) -> Option<&'a str> {
        self.tree.comment(self.id)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.tree.parent(self.id).map(|id| self.tree.node(id))
    }

    pub fn get(&self, path: &str) -> Option<NodeRef<'a>> {
        self.tree.get(self.id, path).map(|id| self.tree.node(id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id).iter().map(move |id| tree.node(*id))
    }

    pub fn has_sub_items(&self) -> bool {
        self.tree.has_sub_items(self.id)
    }

    pub fn sub_items(&self) -> Vec<String> {
        self.tree.sub_items(self.id)
    }

    pub fn to_owned_tree(&self) -> RawConfig {
        self.tree.copy_subtree(self.id)
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.tree.node_eq(self.id, other.tree, other.id)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if let Some(value) = self.value() {
            write!(f, "={}", value)?;
        }
        if self.has_sub_items() {
            f.write_str("{")?;
            for (i, child) in self.children().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                fmt::Display::fmt(&child, f)?;
            }
            f.write_str("}")?;
        }
        Ok(())
    }
}

impl Serialize for NodeRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if !self.has_sub_items() {
            if let Some(value) = self.value() {
                return serializer.serialize_str(value);
            }
        }
        let len = self.tree.children(self.id).len() + usize::from(self.value().is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(value) = self.value() {
            map.serialize_entry("$value", value)?;
        }
        for child in self.children() {
            map.serialize_entry(child.name(), &child)?;
        }
        map.end()
    }
}

// ── NodeMut ────────────────────────────────────────────────────

/// Mutable cursor on one node, for chained create-on-access edits.
pub struct NodeMut<'a> {
    tree: &'a mut RawConfig,
    id: NodeId,
}

impl<'a> NodeMut<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Move the cursor to the descendant at `path`, creating it if needed.
    pub fn child(self, path: &str) -> NodeMut<'a> {
        let id = self.tree.entry(self.id, path);
        NodeMut { tree: self.tree, id }
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.tree.set_value(self.id, value);
        self
    }

    pub fn set_type_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tree.set_type_tag(self.id, tag);
        self
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.tree.set_comment(self.id, comment);
        self
    }

    pub fn remove_all(&mut self) -> &mut Self {
        self.tree.remove_all(self.id);
        self
    }

    pub fn assign(&mut self, other: &RawConfig) -> &mut Self {
        self.tree.assign(self.id, other);
        self
    }

    pub fn detach(self) -> Option<RawConfig> {
        self.tree.detach(self.id)
    }

    pub fn as_ref(&self) -> NodeRef<'_> {
        self.tree.node(self.id)
    }
}
