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
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Greedily transforms `src` into `dst` (both read bottom-up, equal
/// length, permutations of each other as multisets) using only
/// top-swaps, returning the sequence of depths `d1,...,dk` such that
/// successively applying `swap(di)` to `src` yields `dst`.
///
/// `src`/`dst` here use array index `0` as the element a `swap(0)`
/// would affect, i.e. they are already oriented so that position `0`
/// is "the top"; callers comparing stacks bottom-up must reverse
/// first (see [`crate::search::Engine`]'s goal-closing step).
pub fn get_swaps<T>(src: &[T], dst: &[T]) -> Vec<usize>
where
    T: Eq + Hash + Clone,
{
    assert_eq!(src.len(), dst.len());

    let mut src = src.to_vec();
    let mut to_move: BTreeMap<usize, T> = BTreeMap::new();
    let mut dest: HashMap<T, Vec<usize>> = HashMap::new();
    for (i, (x, y)) in src.iter().zip(dst.iter()).enumerate() {
        if x != y {
            to_move.insert(i, x.clone());
            dest.entry(y.clone()).or_default().push(i);
        }
    }

    let total = to_move.len();
    let mut swaps = Vec::new();
    for _ in 0..total {
        let top = src[0].clone();
        let to = match dest.get_mut(&top).and_then(|v| v.pop()) {
            Some(to) => to,
            None => {
                let (&from, val) = to_move
                    .iter()
                    .next()
                    .map(|(k, v)| (k, v.clone()))
                    .expect("to_move non-empty while total remains");
                do_swap(&mut src, from, &mut swaps);
                dest.get_mut(&val)
                    .and_then(|v| v.pop())
                    .expect("dest entry exists for every to_move value")
            }
        };
        do_swap(&mut src, to, &mut swaps);
        to_move.remove(&to);
    }
    swaps
}

fn do_swap<T>(src: &mut [T], i: usize, swaps: &mut Vec<usize>) {
    if i > 0 {
        swaps.push(i);
        src.swap(0, i);
    }
}
