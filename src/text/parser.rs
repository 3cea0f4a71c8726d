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
use std::fmt;

use crate::dag::{EffectfulNode, Node};

// ============================================================================
// Error
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum ErrorCode {
    /// A line was neither `input:`/`output:`/`done:` nor a `name =
    /// op(...)` assignment.
    UnexpectedLine,
    /// An assignment's right-hand side was missing its `op(...)` call.
    ExpectedCall,
    /// A name was assigned more than once.
    DuplicateName(String),
    /// The same effect was listed twice in a single `post(...)` list.
    DuplicatePostEffect(String),
    /// A `post(...)` or `done:` entry named an effect with no prior
    /// `name = op(...)` binding.
    UnknownEffect(String),
    /// No `output:` line was present.
    MissingOutput,
}

/// A parse failure, carrying the 1-indexed source line it occurred on
/// (mirroring how the teacher's `bytecode`/`il` parsers surface
/// position information).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub code: ErrorCode,
}

impl ParseError {
    fn new(line: usize, code: ErrorCode) -> ParseError {
        ParseError { line, code }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: {:?}", self.line, self.code)
    }
}

impl std::error::Error for ParseError {}

pub type Result<T> = std::result::Result<T, ParseError>;

// ============================================================================
// Problem
// ============================================================================

/// A fully-resolved scheduling problem, ready to hand to
/// [`crate::schedule`].
#[derive(Debug, Clone)]
pub struct Problem {
    pub input_symbols: Vec<String>,
    pub start_output_stack: Vec<EffectfulNode>,
    pub start_done_effects: Vec<EffectfulNode>,
}

/// Parse a `.sched` problem file.
///
/// Grammar (one statement per line, `#` starts a line comment):
/// ```text
/// input: a, b, c
/// name = op(operand, operand, ...) post(effect, effect, ...)
/// output: name, name, ...
/// done: name, name, ...
/// ```
/// `post(...)` is optional. Any operand/effect token not bound by an
/// earlier `name = ...` line is resolved as an input symbol (if
/// declared on the `input:` line) or, failing that, as a freely
/// rematerialisable constant.
pub fn parse(source: &str) -> Result<Problem> {
    let input_symbols = find_input_line(source)?;

    let mut names: HashMap<String, EffectfulNode> = HashMap::new();
    let mut output: Option<Vec<String>> = None;
    let mut done: Vec<(usize, String)> = Vec::new();

    for (line_no, raw) in source.lines().enumerate() {
        let line_no = line_no + 1;
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("input:") {
            let _ = rest; // already extracted by find_input_line
        } else if let Some(rest) = line.strip_prefix("output:") {
            output = Some(parse_symbol_list(rest));
        } else if let Some(rest) = line.strip_prefix("done:") {
            done = parse_symbol_list(rest).into_iter().map(|n| (line_no, n)).collect();
        } else {
            parse_assignment(line, line_no, &input_symbols, &mut names)?;
        }
    }

    let output = output.ok_or_else(|| ParseError::new(source.lines().count().max(1), ErrorCode::MissingOutput))?;

    let start_output_stack = output
        .iter()
        .map(|name| resolve(name, &input_symbols, &mut names))
        .collect();
    let start_done_effects = done
        .iter()
        .map(|(line_no, name)| resolve_effect(name, *line_no, &names))
        .collect::<Result<Vec<_>>>()?;

    Ok(Problem {
        input_symbols,
        start_output_stack,
        start_done_effects,
    })
}

fn find_input_line(source: &str) -> Result<Vec<String>> {
    for raw in source.lines() {
        let line = strip_comment(raw).trim();
        if let Some(rest) = line.strip_prefix("input:") {
            return Ok(parse_symbol_list(rest));
        }
    }
    Ok(Vec::new())
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    }
}

fn parse_symbol_list(rest: &str) -> Vec<String> {
    rest.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Resolve a bare token into the `EffectfulNode` it names: a
/// previously-assigned node, an input symbol (registered on first
/// use), or an implicit constant.
fn resolve(token: &str, input_symbols: &[String], names: &mut HashMap<String, EffectfulNode>) -> EffectfulNode {
    if let Some(existing) = names.get(token) {
        return existing.clone();
    }
    let enode = if input_symbols.iter().any(|s| s == token) {
        EffectfulNode::new(Node::new(token, Vec::new()))
    } else {
        EffectfulNode::new(Node::new_constant(token))
    };
    names.insert(token.to_string(), enode.clone());
    enode
}

/// Resolve a `post(...)`/`done:` token, which must name an
/// already-registered effectful node (a `post(...)` entry refers to an
/// operation that must already have been given a name, not a fresh
/// value), rather than synthesizing one.
fn resolve_effect(token: &str, line_no: usize, names: &HashMap<String, EffectfulNode>) -> Result<EffectfulNode> {
    names
        .get(token)
        .cloned()
        .ok_or_else(|| ParseError::new(line_no, ErrorCode::UnknownEffect(token.to_string())))
}

/// Parse a `name = op(a, b, ...) [post(e, e, ...)]` line.
fn parse_assignment(
    line: &str,
    line_no: usize,
    input_symbols: &[String],
    names: &mut HashMap<String, EffectfulNode>,
) -> Result<()> {
    let (lhs, rhs) = line
        .split_once('=')
        .ok_or_else(|| ParseError::new(line_no, ErrorCode::UnexpectedLine))?;
    let name = lhs.trim().to_string();
    if names.contains_key(&name) {
        return Err(ParseError::new(line_no, ErrorCode::DuplicateName(name)));
    }

    let rhs = rhs.trim();
    let (op_call, post_call) = match rhs.find("post(") {
        Some(i) => (rhs[..i].trim(), Some(&rhs[i + "post".len()..])),
        None => (rhs, None),
    };

    let (op_name, op_args) = parse_call(op_call, line_no)?;
    let operands: Vec<EffectfulNode> = op_args
        .iter()
        .map(|tok| resolve(tok, input_symbols, names))
        .collect();
    let node = Node::new(op_name, operands);

    let enode = match post_call {
        None => EffectfulNode::new(node),
        Some(call) => {
            let (_, post_args) = parse_call(call, line_no)?;
            let effects: Vec<EffectfulNode> = post_args
                .iter()
                .map(|tok| resolve_effect(tok, line_no, names))
                .collect::<Result<Vec<_>>>()?;
            EffectfulNode::with_post_effects(node, effects)
                .map_err(|_| ParseError::new(line_no, ErrorCode::DuplicatePostEffect(name.clone())))?
        }
    };

    names.insert(name, enode);
    Ok(())
}

/// Parse `ident(a, b, c)`, returning the identifier and its
/// comma-separated argument tokens.
fn parse_call(text: &str, line_no: usize) -> Result<(&str, Vec<&str>)> {
    let open = text
        .find('(')
        .ok_or_else(|| ParseError::new(line_no, ErrorCode::ExpectedCall))?;
    let close = text
        .rfind(')')
        .ok_or_else(|| ParseError::new(line_no, ErrorCode::ExpectedCall))?;
    if close < open {
        return Err(ParseError::new(line_no, ErrorCode::ExpectedCall));
    }
    let name = text[..open].trim();
    let args: Vec<&str> = text[open + 1..close]
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    Ok((name, args))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trivial_store() {
        let src = "\
to = lookup()
mod = mod_op(to)
store = store_op(to, mod) post()
output:
done: store
";
        let problem = parse(src).unwrap();
        assert!(problem.input_symbols.is_empty());
        assert_eq!(problem.start_done_effects.len(), 1);
        assert_eq!(problem.start_done_effects[0].name(), "store_op");
    }

    #[test]
    fn test_parse_with_inputs_and_post_effects() {
        let src = "\
input: a, b
sload_a = sload(a)
store = sstore(a, b) post(sload_a)
output: b
done: store
";
        let problem = parse(src).unwrap();
        assert_eq!(problem.input_symbols, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(problem.start_output_stack.len(), 1);
        assert_eq!(problem.start_output_stack[0].name(), "b");
        assert_eq!(problem.start_done_effects[0].post_effects().len(), 1);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let src = "\
a = f()
a = g()
output: a
";
        let err = parse(src).unwrap_err();
        assert!(matches!(err.code, ErrorCode::DuplicateName(_)));
    }

    #[test]
    fn test_missing_output_rejected() {
        let src = "a = f()\n";
        let err = parse(src).unwrap_err();
        assert!(matches!(err.code, ErrorCode::MissingOutput));
    }

    #[test]
    fn test_unknown_post_effect_rejected() {
        let src = "\
a = f() post(never_assigned)
output: a
";
        let err = parse(src).unwrap_err();
        assert!(matches!(err.code, ErrorCode::UnknownEffect(_)));
    }

    #[test]
    fn test_unknown_done_effect_rejected() {
        let src = "\
a = f()
output: a
done: never_assigned
";
        let err = parse(src).unwrap_err();
        assert!(matches!(err.code, ErrorCode::UnknownEffect(_)));
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let src = "\
# a trivial problem
input: x

output: x
";
        let problem = parse(src).unwrap();
        assert_eq!(problem.start_output_stack[0].name(), "x");
    }
}
