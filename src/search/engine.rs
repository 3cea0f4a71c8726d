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
use std::collections::HashMap;

use crate::dag::EffectfulNode;
use crate::error::Error;
use crate::permute::get_swaps;
use crate::search::state::{SearchState, Transition};
use crate::stack::Stack;

/// A state discovered by the engine: its best-known predecessor, the
/// shuffle weight accumulated to reach it, and where it sits in its
/// weight bucket (for O(1) removal on relaxation).
struct Explored {
    prev_state: SearchState,
    is_terminal: bool,
    weight: usize,
    ops_to_prev: Vec<String>,
    index_in_bucket: usize,
}

/// Best-first (Dijkstra) search over backward [`SearchState`]
/// transitions, bucketed by integer shuffle weight since every
/// transition costs exactly 0 or 1.
pub struct Engine {
    target_input_symbols: Vec<String>,
    input_value_counts: HashMap<String, usize>,
    explored: HashMap<SearchState, Explored>,
    weight_to_bucket: HashMap<usize, Vec<SearchState>>,
    best_weight: usize,
    max_weight_seen: usize,
}

impl Engine {
    pub fn new(
        target_input_symbols: Vec<String>,
        start_output_stack: Vec<EffectfulNode>,
        start_done_effects: Vec<EffectfulNode>,
    ) -> Engine {
        let mut input_value_counts = HashMap::new();
        for s in &target_input_symbols {
            *input_value_counts.entry(s.clone()).or_insert(0) += 1;
        }
        let mut engine = Engine {
            target_input_symbols,
            input_value_counts,
            explored: HashMap::new(),
            weight_to_bucket: HashMap::new(),
            best_weight: 0,
            max_weight_seen: 0,
        };

        let start_state = SearchState::new(Stack::new(start_output_stack), start_done_effects);
        // No transition led here, only (possibly) a closing permutation,
        // which `close` already returns in forward order.
        let (is_terminal, extra_weight, ops) = engine.close(&start_state);
        engine.explored.insert(
            start_state.clone(),
            Explored {
                prev_state: start_state.clone(),
                is_terminal,
                weight: extra_weight,
                ops_to_prev: ops,
                index_in_bucket: 0,
            },
        );
        engine.add_to_bucket(start_state, extra_weight);
        engine
    }

    /// Run the search to completion, returning the minimum-weight
    /// instruction sequence or [`Error::NoSchedule`] if the reachable
    /// state space is exhausted first.
    pub fn run(mut self) -> Result<(usize, Vec<String>), Error> {
        loop {
            let state = self.pop_best().ok_or(Error::NoSchedule)?;
            let (weight, is_terminal) = {
                let e = self
                    .explored
                    .get(&state)
                    .expect("popped state must be explored");
                (e.weight, e.is_terminal)
            };
            if is_terminal {
                log::info!("new best solution found (weight: {weight})");
                let ops = self.reconstruct(&state);
                return Ok((weight, ops));
            }
            self.relax_from(&state, weight);
        }
    }

    fn relax_from(&mut self, state: &SearchState, cur_weight: usize) {
        log::debug!("expanding state with {} pending effects", state.effects_to_undo.len());
        for transition in self.next_transitions(state) {
            let Transition {
                state: next_state,
                weight: dw,
                ops: mut own_ops,
            } = transition;
            let (terminal, extra_weight, closing_ops) = self.close(&next_state);
            // `own_ops` was built backward (innermost op recorded last), so
            // reverse it to read forward; `closing_ops` is already forward
            // (it realises the literal input order before anything else
            // runs) and must stay in front, unreversed.
            own_ops.reverse();
            let mut ops = closing_ops;
            ops.extend(own_ops);
            let weight = cur_weight + dw + extra_weight;

            match self.explored.get(&next_state) {
                None => {
                    self.explored.insert(
                        next_state.clone(),
                        Explored {
                            prev_state: state.clone(),
                            is_terminal: terminal,
                            weight,
                            ops_to_prev: ops,
                            index_in_bucket: 0,
                        },
                    );
                    self.add_to_bucket(next_state, weight);
                }
                Some(existing) if weight < existing.weight => {
                    let (old_weight, old_index) = (existing.weight, existing.index_in_bucket);
                    self.remove_from_bucket(&next_state, old_weight, old_index);
                    if let Some(e) = self.explored.get_mut(&next_state) {
                        e.prev_state = state.clone();
                        e.ops_to_prev = ops;
                        e.weight = weight;
                    }
                    self.add_to_bucket(next_state, weight);
                }
                _ => {}
            }
        }
    }

    // ========================================================================
    // Frontier generation
    // ========================================================================

    fn next_transitions(&self, state: &SearchState) -> Vec<Transition> {
        let mut out = Vec::new();

        if let Some(top) = state.stack.peek().cloned() {
            if let Some(t) = self.try_dedup(state, &top, 0) {
                out.push(t);
            }
            if let Some(t) = self.try_undo_node(state, &top) {
                out.push(t);
            }
        }

        for effect in state.effects_to_undo.clone() {
            out.push(state.undo_effect(&effect));
        }

        for value in state.stack.tail().to_vec() {
            if let Some(t) = self.try_undo_node(state, &value) {
                out.push(t);
            }
        }

        for (depth, node) in state.stack.tail().iter().rev().enumerate() {
            let depth = depth + 1;
            if let Some(t) = self.try_dedup(state, node, depth) {
                out.push(t);
            }
        }

        out
    }

    fn try_undo_node(&self, state: &SearchState, enode: &EffectfulNode) -> Option<Transition> {
        if self.is_input_symbol(enode) {
            return None;
        }
        if self.still_many_on_stack(state, enode) {
            return None;
        }
        if state.has_dependency(enode.node()) {
            return None;
        }
        // A non-constant leaf has no operation to emit for it: it can
        // only ever have arrived by already being on the input stack.
        if !enode.is_constant() && enode.node().operands().is_empty() {
            return None;
        }
        state.undo_node(enode)
    }

    fn try_dedup(&self, state: &SearchState, enode: &EffectfulNode, depth: usize) -> Option<Transition> {
        if enode.is_constant() {
            return None;
        }
        let count = state.stack.count(enode, None);
        if count == 1 {
            return None;
        }
        if *self.input_value_counts.get(enode.name()).unwrap_or(&0) >= count {
            return None;
        }
        if state.has_dependency(enode.node()) {
            return None;
        }
        state.dedup(enode, depth)
    }

    fn still_many_on_stack(&self, state: &SearchState, enode: &EffectfulNode) -> bool {
        !enode.is_constant() && state.stack.count(enode, Some(2)) > 1
    }

    fn is_input_symbol(&self, enode: &EffectfulNode) -> bool {
        self.input_value_counts.contains_key(enode.name())
    }

    // ========================================================================
    // Goal recognition & closure
    // ========================================================================

    fn is_terminal(&self, state: &SearchState) -> bool {
        if !state.effects_to_undo.is_empty() || state.stack.len() != self.target_input_symbols.len() {
            return false;
        }
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for v in state.stack.iter() {
            *counts.entry(v.name()).or_insert(0) += 1;
        }
        counts.len() == self.input_value_counts.len()
            && counts
                .iter()
                .all(|(name, n)| self.input_value_counts.get(*name) == Some(n))
    }

    /// If `state` is terminal, returns the swap mnemonics (and their
    /// weight) needed to permute its stack into the exact required
    /// input-symbol order.
    fn close(&self, state: &SearchState) -> (bool, usize, Vec<String>) {
        if !self.is_terminal(state) {
            return (false, 0, Vec::new());
        }
        let names: Vec<&str> = state.stack.iter().map(|v| v.name()).collect();
        let mut names_rev: Vec<&str> = names.clone();
        names_rev.reverse();
        let mut target_rev: Vec<&str> = self.target_input_symbols.iter().map(|s| s.as_str()).collect();
        target_rev.reverse();

        let depths = get_swaps(&target_rev, &names_rev);
        let ops: Vec<String> = depths.iter().map(|d| format!("swap{d}")).collect();
        let weight = ops.len();
        (true, weight, ops)
    }

    /// `relax_from`/`new` already store each `Explored.ops_to_prev` in
    /// forward order for that single edge (closing permutation first,
    /// then the reversed undo-ops realising the transition itself).
    /// `terminal` is the earliest state in forward time (the literal
    /// input stack, up to permutation); walking `prev_state` from there
    /// moves later and later in forward time, so concatenating each
    /// state's segment in that traversal order, without any further
    /// reversal, yields the full forward instruction sequence.
    fn reconstruct(&self, terminal: &SearchState) -> Vec<String> {
        let mut solution = Vec::new();
        let mut cur = terminal.clone();
        loop {
            let e = self.explored.get(&cur).expect("state must be explored");
            solution.extend(e.ops_to_prev.iter().cloned());
            if e.prev_state == cur {
                break;
            }
            cur = e.prev_state.clone();
        }
        solution
    }

    // ========================================================================
    // Bucket queue
    // ========================================================================

    fn pop_best(&mut self) -> Option<SearchState> {
        while self.best_weight <= self.max_weight_seen {
            if let Some(bucket) = self.weight_to_bucket.get_mut(&self.best_weight) {
                if let Some(state) = bucket.pop() {
                    return Some(state);
                }
            }
            self.best_weight += 1;
        }
        None
    }

    fn add_to_bucket(&mut self, state: SearchState, weight: usize) {
        let bucket = self.weight_to_bucket.entry(weight).or_default();
        let index = bucket.len();
        bucket.push(state.clone());
        if let Some(e) = self.explored.get_mut(&state) {
            e.index_in_bucket = index;
        }
        if weight > self.max_weight_seen {
            self.max_weight_seen = weight;
        }
        if weight < self.best_weight {
            self.best_weight = weight;
        }
    }

    fn remove_from_bucket(&mut self, state: &SearchState, weight: usize, index: usize) {
        let bucket = self
            .weight_to_bucket
            .get_mut(&weight)
            .expect("bucket must exist for a tracked weight");
        let last = bucket.len() - 1;
        if index != last {
            bucket.swap(index, last);
            let moved = bucket[index].clone();
            if let Some(e) = self.explored.get_mut(&moved) {
                e.index_in_bucket = index;
            }
        }
        bucket.pop();
    }
}
