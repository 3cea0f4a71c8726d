// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::error::Error;

// ============================================================================
// Node
// ============================================================================

/// A value vertex in the data-flow DAG.  Nodes are immutable and
/// cheaply cloned (an `Rc` handle), so the same sub-expression can be
/// shared as an operand of many parents without duplication.
///
/// Equality and hashing are *structural*, over `(name, operands,
/// is_constant)`, and are cached at construction time since they are
/// consulted constantly during search.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

struct NodeData {
    name: String,
    operands: Vec<EffectfulNode>,
    is_constant: bool,
    dependencies: HashSet<Node>,
    hash: u64,
}

impl Node {
    /// Construct a (non-constant) value node with the given operands.
    /// Operand `0` is the deepest consumed: in forward execution it
    /// is pushed last, so it ends up on top.
    pub fn new<S: Into<String>>(name: S, operands: Vec<EffectfulNode>) -> Node {
        Self::make(name.into(), operands, false)
    }

    /// Construct a constant node, which may be freely rematerialised
    /// (duplicate copies on the stack never inhibit reconstructing
    /// other copies via re-execution).
    pub fn new_constant<S: Into<String>>(name: S) -> Node {
        Self::make(name.into(), Vec::new(), true)
    }

    fn make(name: String, operands: Vec<EffectfulNode>, is_constant: bool) -> Node {
        let mut dependencies = HashSet::new();
        for operand in &operands {
            dependencies.insert(operand.node().clone());
            dependencies.extend(operand.dependencies().iter().cloned());
        }
        let hash = Self::compute_hash(&name, &operands, is_constant);
        Node(Rc::new(NodeData {
            name,
            operands,
            is_constant,
            dependencies,
            hash,
        }))
    }

    fn compute_hash(name: &str, operands: &[EffectfulNode], is_constant: bool) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        is_constant.hash(&mut hasher);
        for operand in operands {
            operand.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// The node's symbol, e.g. `sload`, `add`, or an input symbol
    /// such as `frm`.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Ordered operands; operand 0 is consumed first (topmost).
    pub fn operands(&self) -> &[EffectfulNode] {
        &self.0.operands
    }

    pub fn is_constant(&self) -> bool {
        self.0.is_constant
    }

    /// Transitive closure of nodes reachable through operands (and,
    /// transitively, through their post-effects).
    pub fn dependencies(&self) -> &HashSet<Node> {
        &self.0.dependencies
    }

    pub fn has_dependency(&self, dependency: &Node) -> bool {
        self.0.dependencies.contains(dependency)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash
                && self.0.name == other.0.name
                && self.0.is_constant == other.0.is_constant
                && self.0.operands == other.0.operands)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

// ============================================================================
// EffectfulNode
// ============================================================================

/// A [`Node`] bundled with the *post-effects* that must have been
/// executed, in forward order, strictly before it.  The post-effect
/// graph is a parallel ordering graph: it need not coincide with the
/// operand DAG.
#[derive(Clone)]
pub struct EffectfulNode(Rc<EffectfulData>);

struct EffectfulData {
    node: Node,
    post_effects: Vec<EffectfulNode>,
    dependencies: HashSet<Node>,
    hash: u64,
}

impl EffectfulNode {
    /// Wrap a node with no post-effects.
    pub fn new(node: Node) -> EffectfulNode {
        let dependencies = node.dependencies().clone();
        let hash = Self::compute_hash(&node, &[]);
        EffectfulNode(Rc::new(EffectfulData {
            node,
            post_effects: Vec::new(),
            dependencies,
            hash,
        }))
    }

    /// Wrap a node with the given post-effects.  Fails with
    /// [`Error::DuplicateNode`] if the same effect object appears
    /// twice in `post_effects`.
    pub fn with_post_effects(
        node: Node,
        post_effects: Vec<EffectfulNode>,
    ) -> Result<EffectfulNode, Error> {
        let mut seen: Vec<&EffectfulNode> = Vec::with_capacity(post_effects.len());
        for effect in &post_effects {
            if seen.iter().any(|s| Rc::ptr_eq(&s.0, &effect.0)) {
                return Err(Error::DuplicateNode);
            }
            seen.push(effect);
        }
        let mut dependencies = node.dependencies().clone();
        for effect in &post_effects {
            dependencies.extend(effect.dependencies().iter().cloned());
        }
        let hash = Self::compute_hash(&node, &post_effects);
        Ok(EffectfulNode(Rc::new(EffectfulData {
            node,
            post_effects,
            dependencies,
            hash,
        })))
    }

    fn compute_hash(node: &Node, post_effects: &[EffectfulNode]) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        node.hash(&mut hasher);
        for effect in post_effects {
            effect.hash(&mut hasher);
        }
        hasher.finish()
    }

    pub fn node(&self) -> &Node {
        &self.0.node
    }

    pub fn post_effects(&self) -> &[EffectfulNode] {
        &self.0.post_effects
    }

    pub fn name(&self) -> &str {
        self.0.node.name()
    }

    pub fn is_constant(&self) -> bool {
        self.0.node.is_constant()
    }

    pub fn dependencies(&self) -> &HashSet<Node> {
        &self.0.dependencies
    }

    pub fn has_dependency(&self, dependency: &Node) -> bool {
        self.0.dependencies.contains(dependency)
    }
}

impl PartialEq for EffectfulNode {
    fn eq(&self, other: &EffectfulNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
            || (self.0.hash == other.0.hash
                && self.0.node == other.0.node
                && self.0.post_effects == other.0.post_effects)
    }
}

impl Eq for EffectfulNode {}

impl Hash for EffectfulNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Debug for EffectfulNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.node.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = Node::new("add", vec![EffectfulNode::new(Node::new_constant("0x1"))]);
        let b = Node::new("add", vec![EffectfulNode::new(Node::new_constant("0x1"))]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_structural_inequality() {
        let a = Node::new("add", vec![EffectfulNode::new(Node::new_constant("0x1"))]);
        let b = Node::new("add", vec![EffectfulNode::new(Node::new_constant("0x2"))]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_duplicate_post_effect_rejected() {
        let effect = EffectfulNode::new(Node::new_constant("sstore"));
        let err = EffectfulNode::with_post_effects(
            Node::new_constant("x"),
            vec![effect.clone(), effect],
        )
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateNode));
    }

    #[test]
    fn test_dependencies_transitive() {
        let leaf = EffectfulNode::new(Node::new_constant("x"));
        let mid = Node::new("f", vec![leaf.clone()]);
        let top = Node::new("g", vec![EffectfulNode::new(mid.clone())]);
        assert!(top.has_dependency(&mid));
        assert!(top.has_dependency(leaf.node()));
    }
}
