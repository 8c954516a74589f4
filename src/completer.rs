use std::cell::RefCell;

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

use klox::scanner;

/// Tab completion for the REPL over reserved words and the names defined
/// in the global environment.
pub struct KloxHelper {
    variables: RefCell<Vec<String>>,
}

impl KloxHelper {
    pub fn new(variables: Vec<String>) -> Self {
        Self {
            variables: RefCell::new(variables),
        }
    }

    pub fn set_variables(&self, variables: Vec<String>) {
        *self.variables.borrow_mut() = variables;
    }

    /// Byte offset where the identifier under the cursor starts.
    fn word_start(line: &str, pos: usize) -> usize {
        line[..pos]
            .char_indices()
            .rev()
            .find(|&(_, c)| !(c.is_ascii_alphanumeric() || c == '_'))
            .map_or(0, |(i, c)| i + c.len_utf8())
    }

    fn candidates(prefix: &str, variables: &[String]) -> Vec<String> {
        if prefix.is_empty() {
            return Vec::new();
        }

        let mut found: Vec<String> = scanner::keywords()
            .filter(|k| k.starts_with(prefix))
            .map(str::to_string)
            .chain(variables.iter().filter(|v| v.starts_with(prefix)).cloned())
            .collect();

        found.sort();
        found.dedup();
        found
    }
}

impl Helper for KloxHelper {}
impl Highlighter for KloxHelper {}
impl Validator for KloxHelper {}

impl Hinter for KloxHelper {
    type Hint = String;
}

impl Completer for KloxHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = Self::word_start(line, pos);
        let variables = self.variables.borrow();

        let pairs: Vec<Pair> = Self::candidates(&line[start..pos], &variables)
            .into_iter()
            .map(|s| Pair {
                display: s.clone(),
                replacement: s,
            })
            .collect();

        Ok((start, pairs))
    }
}
