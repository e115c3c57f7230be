use std::cell::RefCell;

use slotmap::{SlotMap, new_key_type};

new_key_type! {
    /// Opaque reference to a platform element.
    pub struct NodeId;
}

/// Minimal document-tree surface the hooks need: enough to look up or build
/// a portal mount point and to name observation targets.
pub trait DocumentHost {
    fn body(&self) -> NodeId;
    fn create_element(&self, tag: &str) -> NodeId;
    fn set_id(&self, node: NodeId, id: &str);
    fn element_by_id(&self, id: &str) -> Option<NodeId>;
    /// Attaches `child` under `parent`, detaching it from any previous
    /// parent first.
    fn append(&self, parent: NodeId, child: NodeId);
    /// Detaches `child` from its parent. The node itself stays allocated.
    fn remove(&self, child: NodeId);
    fn contains(&self, node: NodeId) -> bool;
}

struct Node {
    tag: String,
    id_attr: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory document tree rooted at a synthetic `body`. Backs the headless
/// platform and the unsupported fallback (portal consumers always get a
/// usable container).
pub struct MemoryDocument {
    nodes: RefCell<SlotMap<NodeId, Node>>,
    body: NodeId,
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let body = nodes.insert(Node {
            tag: "body".to_string(),
            id_attr: None,
            parent: None,
            children: Vec::new(),
        });
        Self {
            nodes: RefCell::new(nodes),
            body,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        self.nodes.borrow().get(node).map(|n| n.tag.clone())
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node).and_then(|n| n.parent)
    }

    fn detach(nodes: &mut SlotMap<NodeId, Node>, child: NodeId) {
        let Some(parent) = nodes.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = nodes.get_mut(parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = nodes.get_mut(child) {
            c.parent = None;
        }
    }

    // Ids are rare enough that a linear scan is fine.
    fn find_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .find(|(_, node)| node.id_attr.as_deref() == Some(id))
            .map(|(key, _)| key)
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentHost for MemoryDocument {
    fn body(&self) -> NodeId {
        self.body
    }

    fn create_element(&self, tag: &str) -> NodeId {
        self.nodes.borrow_mut().insert(Node {
            tag: tag.to_string(),
            id_attr: None,
            parent: None,
            children: Vec::new(),
        })
    }

    fn set_id(&self, node: NodeId, id: &str) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(node) {
            n.id_attr = Some(id.to_string());
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_id(id)
    }

    fn append(&self, parent: NodeId, child: NodeId) {
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(parent) || !nodes.contains_key(child) {
            log::warn!("append on a node that no longer exists");
            return;
        }
        Self::detach(&mut nodes, child);
        nodes[parent].children.push(child);
        nodes[child].parent = Some(parent);
    }

    fn remove(&self, child: NodeId) {
        Self::detach(&mut self.nodes.borrow_mut(), child);
    }

    fn contains(&self, node: NodeId) -> bool {
        self.nodes.borrow().contains_key(node)
    }
}
