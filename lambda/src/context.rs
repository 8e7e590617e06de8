use rpds::HashTrieMap;
use tracing::debug;

use crate::{operator::OperatorTable, prelude::*, term::Term};

/// Named top-level terms. Stored terms are closed under binders, so copies can be spliced in at
/// any depth without shifting.
#[derive(Default, Clone, Debug)]
pub struct Definitions {
    terms: HashTrieMap<Identifier, Term>,
}

impl Definitions {
    /// Binds `name`, dropping any previous binding. Returns whether one was replaced.
    pub fn define(&mut self, name: Identifier, term: Term) -> bool {
        let replaced = self.terms.remove_mut(&name);
        debug!(%name, replaced, "definition");
        self.terms.insert_mut(name, term);
        replaced
    }

    /// A fresh copy of the term bound to `name`.
    pub fn lookup(&self, name: &Identifier) -> Option<Term> {
        self.terms.get(name).cloned()
    }

    #[cfg(test)]
    pub fn contains(&self, name: &Identifier) -> bool {
        self.terms.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.terms.size()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Everything a statement may read or update: definitions and the operator table.
#[derive(Default, Clone, Debug)]
pub struct Context {
    pub definitions: Definitions,
    pub operators: OperatorTable,
}
