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

//! A shuffle-minimizing instruction scheduler for stack-based virtual
//! machines.  Given a data-flow DAG of values and effects, [`schedule`]
//! finds a sequence of `swapN`/`dupN`/op instructions that realises it
//! on a 16-deep-addressable evaluation stack, minimising the number of
//! `swapN`/`dupN` instructions emitted.

/// The DAG model: [`dag::Node`] (pure values) and [`dag::EffectfulNode`]
/// (values wrapped with a post-effect ordering).
pub mod dag;
/// Errors which can arise constructing a DAG or scheduling it.
pub mod error;
/// The greedy `swapN`-only permutation solver used to close a terminal
/// search state against the required input stack.
pub mod permute;
/// The backward best-first search engine: [`search::SearchState`],
/// [`search::Engine`].
pub mod search;
/// Top-level entry point ([`schedule::schedule`]) tying the DAG, the
/// search engine and the permutation solver together.
pub mod schedule;
/// Immutable persistent stack of [`dag::EffectfulNode`] references.
pub mod stack;
/// A small line-oriented text format for describing scheduling
/// problems, used by the CLI driver and by fixture-driven tests.
pub mod text;

pub use error::Error;
pub use schedule::{schedule, Schedule};
