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
use std::fmt;

use crate::dag::EffectfulNode;
use crate::error::Error;
use crate::search::Engine;

/// The minimum-weight instruction sequence found for a problem, and
/// its shuffle weight (the count of `swapN`/`dupN` mnemonics within
/// it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub weight: usize,
    pub ops: Vec<String>,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "weight: {}", self.weight)?;
        for op in &self.ops {
            writeln!(f, "{op}")?;
        }
        Ok(())
    }
}

/// Finds a minimum-shuffle-weight instruction sequence which, starting
/// from a machine stack holding exactly `input_symbols` (bottom-up),
/// executes every effect in `start_done_effects` (respecting their
/// declared post-effect order) and leaves `start_output_stack`
/// (bottom-up) on the stack.
///
/// Returns [`Error::NoSchedule`] if the backward search exhausts the
/// reachable state space without finding one — e.g. a required input
/// symbol never appears anywhere in the DAG.
pub fn schedule(
    input_symbols: Vec<String>,
    start_output_stack: Vec<EffectfulNode>,
    start_done_effects: Vec<EffectfulNode>,
) -> Result<Schedule, Error> {
    let engine = Engine::new(input_symbols, start_output_stack, start_done_effects);
    let (weight, ops) = engine.run()?;
    Ok(Schedule { weight, ops })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Node;

    /// An input-stack symbol: distinct from a constant, since it can't
    /// be freely rematerialised — duplicating it costs a `dupN`.
    fn sym(name: &str) -> EffectfulNode {
        EffectfulNode::new(Node::new(name, vec![]))
    }

    fn syms(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// A freely rematerialisable immediate value (e.g. a call-data
    /// offset baked into the bytecode), as opposed to an input symbol.
    fn konst(name: &str) -> EffectfulNode {
        EffectfulNode::new(Node::new_constant(name))
    }

    /// Scenario 1 — trivial store: `store(to, mod(to))` with no
    /// inputs/outputs other than the effect itself.
    #[test]
    fn test_scenario_trivial_store() {
        let arg = EffectfulNode::new(Node::new_constant("arg"));
        let to = Node::new("to", vec![arg]);
        let modnode = Node::new("mod", vec![EffectfulNode::new(to.clone())]);
        let store = EffectfulNode::new(Node::new(
            "store",
            vec![EffectfulNode::new(modnode), EffectfulNode::new(to)],
        ));

        let result = schedule(vec![], vec![], vec![store]).unwrap();
        assert_eq!(result.weight, 1);
        assert_eq!(result.ops.iter().filter(|o| o.starts_with("dup")).count(), 1);
        assert_eq!(result.ops.last().map(String::as_str), Some("store"));
        assert_eq!(result.ops[result.ops.len() - 2], "mod");
    }

    /// Scenario 4 — dup-only: three copies of a single input symbol.
    #[test]
    fn test_scenario_dup_only() {
        let x = sym("x");
        let result = schedule(syms(&["x"]), vec![x.clone(), x.clone(), x], vec![]).unwrap();
        assert_eq!(result.weight, 2);
        assert_eq!(
            result.ops,
            vec!["dup1".to_string(), "dup1".to_string()]
        );
    }

    /// Scenario 5 — swap chain: reverse three input symbols.
    #[test]
    fn test_scenario_swap_chain() {
        let (a, b, c) = (sym("a"), sym("b"), sym("c"));
        let result = schedule(
            syms(&["a", "b", "c"]),
            vec![c, b, a],
            vec![],
        )
        .unwrap();
        assert_eq!(result.weight, 1);
        assert_eq!(result.ops, vec!["swap2".to_string()]);
    }

    /// Scenario 3 — pure reordering with side-effecting pops.
    #[test]
    fn test_scenario_pure_reordering() {
        let (a, b, c, d) = (sym("a"), sym("b"), sym("c"), sym("d"));
        let mstore = EffectfulNode::new(Node::new(
            "mstore",
            vec![a.clone(), b.clone()],
        ));
        let pop = EffectfulNode::new(Node::new("pop", vec![c.clone()]));

        let result = schedule(
            syms(&["a", "b", "c", "d"]),
            vec![a, b, d],
            vec![mstore, pop],
        )
        .unwrap();
        // `a` and `b` are each consumed by `mstore` yet must also survive
        // to the output, and as input symbols (not constants) can't be
        // rematerialised: 2 mandatory dups. `c` sits directly under `d`
        // in the initial stack and `d` must stay put, so `pop(c)` needs
        // one swap to bring `c` to the top first: 1 mandatory swap.
        assert_eq!(result.weight, 3);
    }

    /// Scenario 6 — infeasible: an output symbol not derivable from
    /// any DAG node and not a constant.
    #[test]
    fn test_scenario_infeasible() {
        let y = EffectfulNode::new(Node::new("undefined", vec![]));
        let result = schedule(vec![], vec![y], vec![]);
        assert!(matches!(result, Err(Error::NoSchedule)));
    }

    /// Scenario 2 — ERC20 transfer skeleton: two `sstore`s ordered by
    /// a shared post-effect, gated by a guard built from one true
    /// input symbol and several immediate values.
    #[test]
    fn test_scenario_erc20_transfer_skeleton() {
        let frm = konst("frm");
        let to = konst("to");
        let amt = konst("amt");
        let dispatch_error = sym("dispatch_error");

        let from_bal = EffectfulNode::new(Node::new("sload", vec![frm.clone()]));
        let diff = EffectfulNode::new(Node::new("sub", vec![from_bal.clone(), amt.clone()]));
        let sstore_frm = EffectfulNode::new(Node::new("sstore", vec![frm, diff]));
        let to_bal = EffectfulNode::with_post_effects(
            Node::new("sload", vec![to.clone()]),
            vec![sstore_frm],
        )
        .unwrap();
        let cmp = EffectfulNode::new(Node::new("gt", vec![amt.clone(), from_bal]));
        let cond = EffectfulNode::new(Node::new("or", vec![cmp, dispatch_error]));
        let combined_assert = EffectfulNode::new(Node::new("assert", vec![cond]));
        let sum = EffectfulNode::new(Node::new("add", vec![to_bal.clone(), amt]));
        let sstore_to = EffectfulNode::new(Node::new("sstore", vec![to, sum]));

        let result = schedule(
            syms(&["dispatch_error"]),
            vec![],
            vec![combined_assert, sstore_to],
        )
        .unwrap();
        assert!(result.weight <= 6);
    }

    #[test]
    fn test_determinism() {
        let (a, b, c) = (sym("a"), sym("b"), sym("c"));
        let r1 = schedule(syms(&["a", "b", "c"]), vec![c.clone(), b.clone(), a.clone()], vec![]).unwrap();
        let r2 = schedule(syms(&["a", "b", "c"]), vec![c, b, a], vec![]).unwrap();
        assert_eq!(r1, r2);
    }
}
