//! A path-segment trie over storage locations.
//!
//! Nodes live in an arena owned by the [`LocationTree`] and refer to each
//! other by [`NodeId`]. A node owns nothing: its parent and children are
//! indices, so the parent link exists only to rebuild the node's path.

use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use lakegrant_resource::STORAGE_SCHEME;

const ROOT_SEGMENT: &str = "s3:/";

/// The index of a node within a [`LocationTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node, standing for the storage scheme
    pub const ROOT: NodeId = NodeId(0);
}

#[derive(Debug, Clone)]
struct Node<V> {
    segment: String,
    parent: Option<NodeId>,
    children: IndexMap<String, NodeId>,
    values: IndexSet<V>,
}

impl<V> Node<V> {
    fn new(segment: &str, parent: Option<NodeId>) -> Self {
        Self {
            segment: segment.to_owned(),
            parent,
            children: IndexMap::new(),
            values: IndexSet::new(),
        }
    }
}

/// A trie keyed by the `/`-delimited segments of `s3://` locations. The
/// root stands for the scheme, its children are buckets, and each deeper
/// level is one "directory" segment. Every node holds a set of values,
/// since several values may share one location.
///
/// Locations are read as directories: `s3://b/db/t/` and `s3://b/db/t`
/// name different nodes, because the last segment of a location without a
/// trailing `/` is taken to be an object name and dropped.
#[derive(Debug, Clone)]
pub struct LocationTree<V> {
    nodes: Vec<Node<V>>,
}

impl<V> Default for LocationTree<V> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::new(ROOT_SEGMENT, None)],
        }
    }
}

/// A borrowed view of one node of a [`LocationTree`]
#[derive(Debug)]
pub struct LocationNode<'a, V> {
    tree: &'a LocationTree<V>,
    id: NodeId,
}

impl<V> Clone for LocationNode<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for LocationNode<'_, V> {}

impl<'a, V> LocationNode<'a, V> {
    /// The id of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The last path segment of this node
    pub fn segment(&self) -> &'a str {
        &self.tree.node(self.id).segment
    }

    /// The values held directly by this node
    pub fn values(&self) -> impl Iterator<Item = &'a V> + 'a {
        self.tree.node(self.id).values.iter()
    }

    /// The parent of this node, or `None` for the root
    pub fn parent(&self) -> Option<LocationNode<'a, V>> {
        self.tree.node(self.id).parent.map(|id| LocationNode {
            tree: self.tree,
            id,
        })
    }

    /// The location this node stands for, ending in `/`
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut current = Some(*self);
        while let Some(node) = current {
            if node.id != NodeId::ROOT {
                segments.push(node.segment());
            }
            current = node.parent();
        }

        segments.reverse();
        let mut path = String::from(STORAGE_SCHEME);
        for segment in segments {
            path.push_str(segment);
            path.push('/');
        }
        path
    }
}

impl<V> LocationTree<V>
where
    V: Hash + Eq,
{
    /// Associate `value` with the node for `location`, creating nodes as
    /// needed. Returns `None` without inserting if the location is not an
    /// `s3://` location.
    pub fn insert(&mut self, location: &str, value: V) -> Option<NodeId> {
        let segments = directory_segments(location)?;

        let mut current = NodeId::ROOT;
        for segment in segments {
            current = match self.node(current).children.get(segment) {
                Some(child) => *child,
                None => {
                    let child = NodeId(self.nodes.len());
                    self.nodes.push(Node::new(segment, Some(current)));
                    self.node_mut(current)
                        .children
                        .insert(segment.to_owned(), child);
                    child
                }
            };
        }

        self.node_mut(current).values.insert(value);
        Some(current)
    }

    /// The deepest existing node along `location`. The walk stops at the
    /// first segment with no matching child, so paths that extend past any
    /// registered location (partition directories, object names) resolve to
    /// their closest registered ancestor. Returns `None` if the location is
    /// not an `s3://` location or its bucket is unknown.
    pub fn nearest_enclosing(&self, location: &str) -> Option<LocationNode<'_, V>> {
        let segments = directory_segments(location)?;

        let mut current = NodeId::ROOT;
        for (depth, segment) in segments.into_iter().enumerate() {
            match self.node(current).children.get(segment) {
                Some(child) => current = *child,
                None if depth == 0 => return None,
                None => break,
            }
        }

        Some(self.view(current))
    }

    /// The node for exactly `location`, or `None` if any segment is missing
    pub fn exact(&self, location: &str) -> Option<LocationNode<'_, V>> {
        let segments = directory_segments(location)?;

        let mut current = NodeId::ROOT;
        for segment in segments {
            current = *self.node(current).children.get(segment)?;
        }

        Some(self.view(current))
    }

    /// Every value held at or below the node for exactly `location`. Within
    /// each node, the values of its children come before its own. Empty if
    /// there is no such node.
    pub fn all_descendant_values(&self, location: &str) -> Vec<&V> {
        let mut values = Vec::new();
        if let Some(node) = self.exact(location) {
            self.collect_values(node.id, &mut values);
        }
        values
    }

    /// The number of nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing but the root exists
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn collect_values<'a>(&'a self, id: NodeId, values: &mut Vec<&'a V>) {
        let node = self.node(id);
        for child in node.children.values() {
            self.collect_values(*child, values);
        }
        values.extend(node.values.iter());
    }
}

impl<V> LocationTree<V> {
    fn node(&self, id: NodeId) -> &Node<V> {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<V> {
        &mut self.nodes[id.0]
    }

    fn view(&self, id: NodeId) -> LocationNode<'_, V> {
        LocationNode { tree: self, id }
    }
}

/// Split a location into its bucket and directory segments
fn directory_segments(location: &str) -> Option<Vec<&str>> {
    let path = location.strip_prefix(STORAGE_SCHEME)?;
    if path.is_empty() {
        return Some(Vec::new());
    }

    let directory = match path.strip_suffix('/') {
        Some(directory) => directory,
        None => match path.rsplit_once('/') {
            Some((directory, _object)) => directory,
            None => path,
        },
    };

    Some(directory.split('/').collect())
}
