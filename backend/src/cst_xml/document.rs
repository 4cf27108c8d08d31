//! Read-only element tree of a CST text.
//!
//! Nodes live in one arena in document (pre-)order, so a smaller `NodeId`
//! always means "earlier in the file". Navigation mirrors what the citation
//! scanner needs: siblings, ancestors and the nearest preceding element.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    paragraphs: Vec<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Appends an element under `parent` and returns its id.
    pub fn push_element(&mut self, parent: Option<NodeId>, name: &str, attrs: Vec<(String, String)>) -> NodeId {
        let id = self.push(parent, NodeKind::Element { name: name.to_string(), attrs });
        if name == "p" {
            self.paragraphs.push(id);
        }
        id
    }

    /// Appends a text run under `parent`, merging it into a directly preceding text sibling.
    pub fn push_text(&mut self, parent: Option<NodeId>, text: &str) {
        if text.is_empty() {
            return;
        }

        let last_sibling = match parent {
            Some(p) => self.nodes[p.0].children.last().copied(),
            None => None,
        };
        // Only merge with the very last node, otherwise document order would break.
        if let Some(last) = last_sibling
            && last.0 + 1 == self.nodes.len()
            && let NodeKind::Text(existing) = &mut self.nodes[last.0].kind {
                existing.push_str(text);
                return;
            }

        self.push(parent, NodeKind::Text(text.to_string()));
    }

    fn push(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, parent, children: Vec::new() });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// All `<p>` elements in document order.
    pub fn paragraphs(&self) -> &[NodeId] {
        &self.paragraphs
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn is_element(&self, id: NodeId, tag: &str) -> bool {
        self.name(id) == Some(tag)
    }

    /// True for a `tag` element whose `key` attribute equals `value`.
    pub fn matches(&self, id: NodeId, tag: &str, key: &str, value: &str) -> bool {
        self.is_element(id, tag) && self.attr(id, key) == Some(value)
    }

    /// Concatenated text of the node and all its descendants.
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        match &node.kind {
            NodeKind::Text(t) => out.push_str(t),
            NodeKind::Element { .. } => {
                for child in &node.children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.nodes[id.0].parent {
            Some(p) => &self.nodes[p.0].children,
            None => &[],
        }
    }

    /// The closest element before this node under the same parent; text runs are skipped.
    pub fn prev_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.siblings(id);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[..pos].iter().rev().copied().find(|s| self.name(*s).is_some())
    }

    /// The closest element after this node under the same parent; text runs are skipped.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.siblings(id);
        let pos = siblings.iter().position(|s| *s == id)?;
        siblings[pos + 1..].iter().copied().find(|s| self.name(*s).is_some())
    }

    /// The nearest element that starts before `id` in document order and satisfies `pred`.
    /// Ancestors count as preceding.
    pub fn find_previous<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        (0..id.0).rev().map(NodeId).find(|n| pred(self, *n))
    }

    /// The nearest ancestor satisfying `pred`.
    pub fn find_ancestor<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&Document, NodeId) -> bool,
    {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if pred(self, p) {
                return Some(p);
            }
            current = self.parent(p);
        }
        None
    }

    /// The first descendant element with this tag, in document order.
    pub fn find_descendant(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        for child in &self.nodes[id.0].children {
            if self.is_element(*child, tag) {
                return Some(*child);
            }
            if let Some(found) = self.find_descendant(*child, tag) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn sample() -> (Document, NodeId, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.push_element(None, "body", vec![]);
        let head = doc.push_element(Some(body), "head", attrs(&[("rend", "chapter")]));
        doc.push_text(Some(head), "1. Brahmajālasuttaṃ");
        doc.push_text(Some(body), "\n");
        let p1 = doc.push_element(Some(body), "p", attrs(&[("rend", "subhead")]));
        doc.push_text(Some(p1), "Paribbājakakathā");
        doc.push_text(Some(body), "\n");
        let p2 = doc.push_element(Some(body), "p", attrs(&[("rend", "bodytext"), ("n", "1")]));
        doc.push_text(Some(p2), "Evaṃ me ");
        doc.push_text(Some(p2), "sutaṃ.");
        (doc, body, head, p1, p2)
    }

    #[test]
    fn test_paragraphs_in_order() {
        let (doc, _, _, p1, p2) = sample();
        assert_eq!(doc.paragraphs(), &[p1, p2]);
    }

    #[test]
    fn test_text_merges_runs() {
        let (doc, _, _, _, p2) = sample();
        assert_eq!(doc.text(p2), "Evaṃ me sutaṃ.");
        assert_eq!(doc.node(p2).children.len(), 1);
    }

    #[test]
    fn test_siblings_skip_text() {
        let (doc, _, head, p1, p2) = sample();
        assert_eq!(doc.next_element_sibling(p1), Some(p2));
        assert_eq!(doc.prev_element_sibling(p1), Some(head));
        assert_eq!(doc.next_element_sibling(p2), None);
    }

    #[test]
    fn test_find_previous_and_ancestor() {
        let (doc, body, head, _, p2) = sample();
        let found = doc.find_previous(p2, |d, n| d.matches(n, "head", "rend", "chapter"));
        assert_eq!(found, Some(head));
        assert_eq!(doc.find_ancestor(p2, |d, n| d.is_element(n, "body")), Some(body));
        assert_eq!(doc.find_descendant(body, "head"), Some(head));
    }
}
