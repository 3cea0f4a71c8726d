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
use crate::dag::{EffectfulNode, Node};
use crate::stack::{Stack, MAX_DEPTH};

/// The result of a single backward transition: the state it leads to,
/// its shuffle-weight cost (0 or 1), and the mnemonics that, read
/// forward, realise it.
pub struct Transition {
    pub state: SearchState,
    pub weight: usize,
    pub ops: Vec<String>,
}

/// A point in the backward search: the stack contents we'd need to
/// have on hand to run the remaining forward instructions, paired
/// with the effects still owed a (reverse) execution.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SearchState {
    pub stack: Stack,
    pub effects_to_undo: Vec<EffectfulNode>,
}

impl SearchState {
    pub fn new(stack: Stack, effects_to_undo: Vec<EffectfulNode>) -> SearchState {
        SearchState {
            stack,
            effects_to_undo,
        }
    }

    /// Whether `node` is still needed: either as a dependency of
    /// something sitting on the stack (unless `node` is itself a
    /// rematerialisable constant), or as a dependency of a
    /// still-pending effect.
    pub fn has_dependency(&self, node: &Node) -> bool {
        (!node.is_constant() && self.stack.iter().any(|v| v.has_dependency(node)))
            || self
                .effects_to_undo
                .iter()
                .any(|e| e.has_dependency(node))
    }

    /// Undo a pending effect: it leaves no value on the stack, so
    /// there is nothing to swap to the top first.
    pub fn undo_effect(&self, effect: &EffectfulNode) -> Transition {
        let i = self
            .effects_to_undo
            .iter()
            .position(|e| e == effect)
            .expect("effect must be pending to undo it");
        let mut new_effects = self.effects_to_undo.clone();
        new_effects.remove(i);

        let mut ops = Vec::new();
        let state = Self::finish_undo(self.stack.clone(), new_effects, &mut ops, effect);
        Transition {
            state,
            weight: 0,
            ops,
        }
    }

    /// Undo a value-producing node: bring it to the top (if it isn't
    /// already), pop it, then push back its operands.  Returns
    /// `None` if bringing it to the top would require a swap depth
    /// beyond the 16-deep window.
    pub fn undo_node(&self, enode: &EffectfulNode) -> Option<Transition> {
        let (stack, swap_op) = self.stack.swap_to_top(enode).ok()?;
        let mut ops = Vec::new();
        let weight = if let Some(op) = swap_op {
            ops.push(op);
            1
        } else {
            0
        };
        let (popped, stack) = stack.pop();
        debug_assert!(&popped == enode);
        let state = Self::finish_undo(stack, self.effects_to_undo.clone(), &mut ops, enode);
        Some(Transition { state, weight, ops })
    }

    /// Undo a duplication: a value present at `depth` also appears
    /// elsewhere on the stack, so the copy at `depth` must have been
    /// produced by a `dupN`.  Removes that copy and (if `depth != 0`)
    /// records the `swapN` needed to bring it to the top first.
    /// Returns `None` if the resulting `dupN` would need a depth
    /// beyond the 16-deep window.
    pub fn dedup(&self, enode: &EffectfulNode, depth: usize) -> Option<Transition> {
        let (stack, ops_prefix, weight) = if depth != 0 {
            let (stack, op) = self.stack.swap(depth).ok()?;
            (stack, vec![op], 1)
        } else {
            (self.stack.clone(), Vec::new(), 0)
        };
        // Search below the top (which is `enode` itself, about to be
        // popped) for the *nearest* matching copy, so the resulting
        // `dupN` is as shallow as possible.
        let below_top = &stack.as_slice()[..stack.len() - 1];
        let dedup_index = below_top
            .iter()
            .rposition(|v| v == enode)
            .expect("enode must be present to dedup it");
        let (popped, stack) = stack.pop();
        debug_assert!(&popped == enode);
        let dup_depth = stack.len() - dedup_index;
        if dup_depth == 0 || dup_depth > MAX_DEPTH {
            return None;
        }
        let mut ops = ops_prefix;
        ops.push(format!("dup{dup_depth}"));

        Some(Transition {
            state: SearchState::new(stack, self.effects_to_undo.clone()),
            weight: weight + 1,
            ops,
        })
    }

    /// Common tail of `undo_node`/`undo_effect`: push the undone
    /// node's operands back (reversed, so operand 0 lands on top),
    /// reveal its post-effects as newly pending, and emit its name.
    fn finish_undo(
        stack: Stack,
        mut effects_to_undo: Vec<EffectfulNode>,
        ops: &mut Vec<String>,
        enode: &EffectfulNode,
    ) -> SearchState {
        let stack = stack.push_operands(enode);
        for effect in enode.post_effects() {
            effects_to_undo.push(effect.clone());
        }
        ops.push(enode.name().to_string());
        SearchState::new(stack, effects_to_undo)
    }
}
