use thiserror::Error;

use crate::{prelude::*, term::Term};

#[derive(PartialEq, Eq, Clone, Copy, derive_more::Display, Debug)]
pub enum Fixity {
    #[display(fmt = "prefix")]
    Prefix,
    #[display(fmt = "suffix")]
    Suffix,
    #[display(fmt = "infix-left")]
    InfixLeft,
    #[display(fmt = "infix-right")]
    InfixRight,
}

impl Fixity {
    /// Prefix and suffix levels accept registrations but never combine operands.
    pub fn is_infix(self) -> bool {
        matches!(self, Fixity::InfixLeft | Fixity::InfixRight)
    }
}

/// Fixity of each level, tightest binding first. Levels are numbered from 1.
pub const LEVEL_FIXITIES: [Fixity; 8] = [
    Fixity::Prefix,
    Fixity::Suffix,
    Fixity::InfixLeft,
    Fixity::InfixRight,
    Fixity::InfixLeft,
    Fixity::InfixRight,
    Fixity::InfixLeft,
    Fixity::InfixRight,
];

pub const LEVEL_CAPACITY: usize = 8;

#[derive(PartialEq, Eq, Clone, Debug, Error)]
pub enum OperatorError {
    #[error("Operator level {level} is out of range, levels are 1 to {levels}")]
    LevelOutOfRange { level: usize, levels: usize },
    #[error("Operator level {level} already holds {capacity} operators")]
    LevelFull { level: usize, capacity: usize },
}

#[derive(Clone, Debug)]
pub struct Level {
    fixity: Fixity,
    operators: Vec<(Identifier, Term)>,
}

impl Level {
    fn new(fixity: Fixity) -> Self {
        Level {
            fixity,
            operators: Vec::with_capacity(LEVEL_CAPACITY),
        }
    }

    pub fn fixity(&self) -> Fixity {
        self.fixity
    }

    /// The function of the first operator registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&Term> {
        self.operators
            .iter()
            .find_map(|(n, term)| (n.as_str() == name).then(|| term))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct OperatorTable {
    levels: Vec<Level>,
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new(LEVEL_FIXITIES.len())
    }
}

impl OperatorTable {
    /// Builds `levels` empty levels, taking fixities from [`LEVEL_FIXITIES`] in order.
    pub fn new(levels: usize) -> Self {
        OperatorTable {
            levels: LEVEL_FIXITIES
                .iter()
                .cycle()
                .take(levels)
                .map(|&fixity| Level::new(fixity))
                .collect(),
        }
    }

    /// Number of levels; also the number of the loosest binding one.
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> Option<&Level> {
        level.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    pub fn register(
        &mut self,
        level: usize,
        name: Identifier,
        function: Term,
    ) -> Result<(), OperatorError> {
        let levels = self.levels.len();
        let slot = level
            .checked_sub(1)
            .and_then(|i| self.levels.get_mut(i))
            .ok_or(OperatorError::LevelOutOfRange { level, levels })?;
        if slot.operators.len() >= LEVEL_CAPACITY {
            return Err(OperatorError::LevelFull {
                level,
                capacity: LEVEL_CAPACITY,
            });
        }
        slot.operators.push((name, function));
        Ok(())
    }

    /// Whether `name` would combine operands somewhere, which ends an application.
    pub fn is_infix_operator(&self, name: &str) -> bool {
        self.levels
            .iter()
            .any(|level| level.fixity.is_infix() && level.lookup(name).is_some())
    }
}
