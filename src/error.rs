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
use crate::text::{ErrorCode, ParseError};

// ============================================================================
// Errors
// ============================================================================

/// Errors which can arise either constructing a DAG, or scheduling
/// it.
#[derive(Debug)]
pub enum Error {
    /// The same [`crate::dag::Node`] object reference was passed more
    /// than once into a single `post_effects` (or `operands`) list.
    DuplicateNode,
    /// A `swapN`/`dupN` transition was requested with a depth outside
    /// `[1,16]`.
    InvalidDepth(usize),
    /// An operand referred to an effect which is not amongst the
    /// DAG's registered effectful nodes.
    UnknownEffect,
    /// The search engine exhausted the reachable state space without
    /// finding a terminal state (e.g. a required input symbol never
    /// appears in the DAG).
    NoSchedule,
    /// Wraps an error arising from parsing the textual problem
    /// format (see [`crate::text`]).
    Parse(ParseError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::DuplicateNode => write!(f, "duplicate node reference"),
            Error::InvalidDepth(d) => write!(f, "invalid swap/dup depth ({d})"),
            Error::UnknownEffect => write!(f, "reference to unknown effect"),
            Error::NoSchedule => write!(f, "no feasible schedule exists"),
            Error::Parse(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Error {
        match e.code {
            ErrorCode::UnknownEffect(_) => Error::UnknownEffect,
            _ => Error::Parse(e),
        }
    }
}
