//! The document tree.
//!
//! Nodes live in an index arena owned by [`Document`]. Parents hold the
//! ordered list of their children; children point back to their parent by
//! index. Detaching a node only unlinks it, the node stays in the arena as an
//! unreachable orphan.

use chrono::NaiveTime;

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Declares `name` as a short form of `issue_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub issue_key: String,
    pub name: String,
}

/// A day header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Day {
    /// Date text exactly as written in the header.
    pub date: String,
    /// Everything after the date on the header line.
    pub decoration: String,
}

/// A wall clock time. Childless times are interval boundaries; a time with a
/// [`Minutes`] child is a standalone quick entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Time {
    pub clock: NaiveTime,
}

/// Duration of a quick entry. Wraps exactly one issue or pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minutes {
    pub minutes: i64,
}

/// Alias resolution of an issue, written by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub issue_key: String,
    pub alias: String,
    pub comment: String,
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Raw text without the done marker.
    pub input: String,
    pub is_done: bool,
    pub resolved: Option<Resolution>,
}

impl Issue {
    pub fn new(input: impl Into<String>, is_done: bool) -> Self {
        Self {
            input: input.into(),
            is_done,
            resolved: None,
        }
    }

    /// Resolved issue key, falling back to the first word of the input.
    pub fn key(&self) -> &str {
        self.resolved.as_ref().map_or_else(
            || self.input.split(' ').next().unwrap_or_default(),
            |r| r.issue_key.as_str(),
        )
    }

    /// Resolved alias, falling back to the key.
    pub fn alias(&self) -> &str {
        self.resolved
            .as_ref()
            .map_or_else(|| self.key(), |r| r.alias.as_str())
    }

    /// Resolved comment, falling back to everything after the first word.
    pub fn comment(&self) -> &str {
        self.resolved.as_ref().map_or_else(
            || self.input.split_once(' ').map_or("", |(_, rest)| rest),
            |r| r.comment.as_str(),
        )
    }
}

/// An explicit "no work" marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pause {
    pub is_done: bool,
}

/// Payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    EmptyLine,
    Alias(Alias),
    Day(Day),
    Time(Time),
    Minutes(Minutes),
    Issue(Issue),
    Pause(Pause),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A parsed work log.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends a new node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let index = self.children(parent).len();
        self.insert_at(parent, index, kind)
    }

    /// Inserts a new node at `index` among the children of `parent`.
    pub fn insert_at(&mut self, parent: NodeId, index: usize, kind: NodeKind) -> NodeId {
        let id = self.alloc(kind);
        self.attach(id, parent, index);
        id
    }

    /// Inserts a new node directly after `anchor`. An unattached anchor
    /// (the root or an orphan) gets the node appended to the root instead.
    pub fn insert_after(&mut self, anchor: NodeId, kind: NodeKind) -> NodeId {
        match (self.parent(anchor), self.index_in_parent(anchor)) {
            (Some(parent), Some(index)) => self.insert_at(parent, index + 1, kind),
            _ => self.append(self.root(), kind),
        }
    }

    /// Moves an existing node to `index` among the children of `parent`.
    pub fn move_to(&mut self, id: NodeId, parent: NodeId, index: usize) {
        self.detach(id);
        let index = index.min(self.children(parent).len());
        self.attach(id, parent, index);
    }

    fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) {
        self.nodes[parent.0].children.insert(index, id);
        self.nodes[id.0].parent = Some(parent);
    }

    /// Unlinks a node from its parent. The node and its subtree stay
    /// readable but are no longer part of the document.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// The sibling `offset` positions away (negative = before).
    pub fn sibling(&self, id: NodeId, offset: isize) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?.checked_add_signed(offset)?;
        self.children(parent).get(index).copied()
    }

    /// Nodes of the subtree under `from` in document order, `from` excluded.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(from).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            result.push(id);
            stack.extend(self.children(id).iter().rev());
        }
        result
    }

    /// Searches the subtree under `from` backwards in document order and
    /// returns the match after skipping `skip` earlier hits.
    pub fn find_last(
        &self,
        from: NodeId,
        skip: usize,
        predicate: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        self.descendants(from)
            .into_iter()
            .rev()
            .filter(|&id| predicate(self.kind(id)))
            .nth(skip)
    }

    /// 1-based line a node starts in the serialized text. Nodes folded into
    /// a quick entry line share the line of their time and return `None`.
    pub fn line_number(&self, id: NodeId) -> Option<usize> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&node| self.starts_line(node))
            .position(|node| node == id)
            .map(|index| index + 1)
    }

    fn starts_line(&self, id: NodeId) -> bool {
        !self.parent(id).is_some_and(|parent| {
            matches!(self.kind(parent), NodeKind::Time(_) | NodeKind::Minutes(_))
        })
    }

    /// The day a node belongs to, if any.
    pub fn enclosing_day(&self, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if matches!(self.kind(node), NodeKind::Day(_)) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Day headers in document order.
    pub fn days(&self) -> Vec<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .filter(|&id| matches!(self.kind(id), NodeKind::Day(_)))
            .collect()
    }

    pub fn day(&self, id: NodeId) -> Option<&Day> {
        match self.kind(id) {
            NodeKind::Day(day) => Some(day),
            _ => None,
        }
    }

    pub fn time(&self, id: NodeId) -> Option<&Time> {
        match self.kind(id) {
            NodeKind::Time(time) => Some(time),
            _ => None,
        }
    }

    pub fn time_mut(&mut self, id: NodeId) -> Option<&mut Time> {
        match self.kind_mut(id) {
            NodeKind::Time(time) => Some(time),
            _ => None,
        }
    }

    pub fn issue(&self, id: NodeId) -> Option<&Issue> {
        match self.kind(id) {
            NodeKind::Issue(issue) => Some(issue),
            _ => None,
        }
    }

    pub fn issue_mut(&mut self, id: NodeId) -> Option<&mut Issue> {
        match self.kind_mut(id) {
            NodeKind::Issue(issue) => Some(issue),
            _ => None,
        }
    }

    /// Whether the node is a childless time.
    pub fn is_boundary(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Time(_)) && self.children(id).is_empty()
    }

    /// The issue or pause wrapped by a quick entry time, if `id` is one.
    pub fn quick_entry(&self, id: NodeId) -> Option<(i64, NodeId)> {
        self.time(id)?;
        let minutes = *self.children(id).first()?;
        let NodeKind::Minutes(Minutes { minutes: value }) = self.kind(minutes) else {
            return None;
        };
        let entry = *self.children(minutes).first()?;
        Some((*value, entry))
    }

    /// The top-level quick entry time wrapping `id`, if any.
    pub fn quick_entry_owner(&self, id: NodeId) -> Option<NodeId> {
        let minutes = self.parent(id)?;
        if !matches!(self.kind(minutes), NodeKind::Minutes(_)) {
            return None;
        }
        self.parent(minutes)
    }

    /// Number of nodes reachable from the root, root excluded.
    pub fn len(&self) -> usize {
        self.descendants(self.root()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root()).is_empty()
    }

    fn subtree_eq(&self, a: NodeId, other: &Self, b: NodeId) -> bool {
        self.kind(a) == other.kind(b)
            && self.children(a).len() == other.children(b).len()
            && self
                .children(a)
                .iter()
                .zip(other.children(b))
                .all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}

impl PartialEq for Document {
    /// Structural equality of the reachable trees; orphans are ignored.
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root(), other, other.root())
    }
}

impl Eq for Document {}
