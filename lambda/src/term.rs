use std::collections::HashSet;

use crate::prelude::*;

pub type Index = usize;

/// Untyped lambda terms with de Bruijn indices.
///
/// Every node is exclusively owned by its parent. Copying, comparing and dropping walk the tree
/// with an explicit stack, so arbitrarily deep terms never exhaust the call stack.
#[derive(Debug)]
pub enum Term {
    /// `t t`
    Apply(Box<Term>, Box<Term>),
    /// `\x. t`, where the name is only kept for printing.
    Abstract(Option<Identifier>, Box<Term>),
    /// An identifier that is neither bound nor defined.
    Free(Identifier),
    /// Number of abstractions between the occurrence and its binder.
    Variable(Index),
}

impl Term {
    pub fn apply(lhs: Term, rhs: Term) -> Self {
        Term::Apply(lhs.into(), rhs.into())
    }

    pub fn lambda(name: Option<Identifier>, body: Term) -> Self {
        Term::Abstract(name, body.into())
    }

    #[cfg(test)]
    pub fn free(name: impl Into<String>) -> Self {
        Term::Free(Identifier::new(name.into()))
    }

    pub fn is_redex(&self) -> bool {
        matches!(self, Term::Apply(lhs, _) if matches!(**lhs, Term::Abstract(..)))
    }

    /// Copy of `self` where every variable pointing outside of it is moved `diff` binders further.
    pub fn shifted(&self, diff: usize) -> Term {
        struct M(usize);
        impl VarMapper for M {
            fn on_var(&mut self, depth: usize, index: Index) -> Term {
                Term::Variable(if index >= depth { index + self.0 } else { index })
            }
        }
        map_var(self, &mut M(diff))
    }

    /// In-place counterpart of [`Term::shifted`].
    pub fn shift(&mut self, diff: usize) {
        if diff == 0 {
            return;
        }
        let mut pending = vec![(self, 0)];
        while let Some((term, depth)) = pending.pop() {
            match term {
                Term::Apply(lhs, rhs) => {
                    pending.push((rhs.as_mut(), depth));
                    pending.push((lhs.as_mut(), depth));
                }
                Term::Abstract(_, body) => pending.push((body.as_mut(), depth + 1)),
                Term::Free(_) => {}
                Term::Variable(index) => {
                    if *index >= depth {
                        *index += diff;
                    }
                }
            }
        }
    }

    /// Forgets every binder name. Printing falls back to generated names afterwards.
    #[cfg(test)]
    pub fn erase_names(&mut self) {
        let mut pending = vec![self];
        while let Some(term) = pending.pop() {
            match term {
                Term::Apply(lhs, rhs) => {
                    pending.push(rhs.as_mut());
                    pending.push(lhs.as_mut());
                }
                Term::Abstract(name, body) => {
                    *name = None;
                    pending.push(body.as_mut());
                }
                Term::Free(_) | Term::Variable(_) => {}
            }
        }
    }

    pub fn free_names(&self) -> HashSet<&str> {
        let mut names = HashSet::new();
        let mut pending = vec![self];
        while let Some(term) = pending.pop() {
            match term {
                Term::Apply(lhs, rhs) => {
                    pending.push(rhs.as_ref());
                    pending.push(lhs.as_ref());
                }
                Term::Abstract(_, body) => pending.push(body.as_ref()),
                Term::Free(name) => {
                    names.insert(name.as_str());
                }
                Term::Variable(_) => {}
            }
        }
        names
    }

    #[cfg(test)]
    pub fn size(&self) -> usize {
        let mut size = 0;
        let mut pending = vec![self];
        while let Some(term) = pending.pop() {
            size += 1;
            match term {
                Term::Apply(lhs, rhs) => {
                    pending.push(rhs.as_ref());
                    pending.push(lhs.as_ref());
                }
                Term::Abstract(_, body) => pending.push(body.as_ref()),
                Term::Free(_) | Term::Variable(_) => {}
            }
        }
        size
    }
}

pub trait VarMapper {
    fn on_var(&mut self, depth: usize, index: Index) -> Term;
}

/// Rebuilds `term`, replacing each bound variable by whatever `mapper` makes of it.
/// `depth` counts the abstractions entered since the root of `term`.
pub fn map_var(term: &Term, mapper: &mut impl VarMapper) -> Term {
    enum Frame<'a> {
        Visit(&'a Term, usize),
        Apply,
        Abstract(&'a Option<Identifier>),
    }
    fn pop(built: &mut Vec<Term>) -> Term {
        built
            .pop()
            .expect("Something went wrong while rebuilding a term")
    }

    let mut frames = vec![Frame::Visit(term, 0)];
    let mut built = vec![];
    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Visit(Term::Apply(lhs, rhs), depth) => {
                frames.push(Frame::Apply);
                frames.push(Frame::Visit(rhs.as_ref(), depth));
                frames.push(Frame::Visit(lhs.as_ref(), depth));
            }
            Frame::Visit(Term::Abstract(name, body), depth) => {
                frames.push(Frame::Abstract(name));
                frames.push(Frame::Visit(body.as_ref(), depth + 1));
            }
            Frame::Visit(Term::Free(name), _) => built.push(Term::Free(name.clone())),
            Frame::Visit(Term::Variable(index), depth) => built.push(mapper.on_var(depth, *index)),
            Frame::Apply => {
                let rhs = pop(&mut built);
                let lhs = pop(&mut built);
                built.push(Term::apply(lhs, rhs));
            }
            Frame::Abstract(name) => {
                let body = pop(&mut built);
                built.push(Term::lambda(name.clone(), body));
            }
        }
    }
    pop(&mut built)
}

impl Clone for Term {
    fn clone(&self) -> Self {
        struct M;
        impl VarMapper for M {
            fn on_var(&mut self, _: usize, index: Index) -> Term {
                Term::Variable(index)
            }
        }
        map_var(self, &mut M)
    }
}

/// Moves the subtree out of `slot` unless it is a leaf, which drops without recursion anyway.
fn detach(slot: &mut Term, out: &mut Vec<Term>) {
    if matches!(slot, Term::Apply(..) | Term::Abstract(..)) {
        out.push(std::mem::replace(slot, Term::Variable(0)));
    }
}

fn detach_children(term: &mut Term, out: &mut Vec<Term>) {
    match term {
        Term::Apply(lhs, rhs) => {
            detach(lhs, out);
            detach(rhs, out);
        }
        Term::Abstract(_, body) => detach(body, out),
        Term::Free(_) | Term::Variable(_) => {}
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        let mut pending = vec![];
        detach_children(self, &mut pending);
        // Each popped term has only leaf children left when it goes out of scope.
        while let Some(mut term) = pending.pop() {
            detach_children(&mut term, &mut pending);
        }
    }
}

/// Alpha-equivalence: binder names are ignored.
impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some(pair) = pending.pop() {
            match pair {
                (Term::Apply(l1, r1), Term::Apply(l2, r2)) => {
                    pending.push((r1.as_ref(), r2.as_ref()));
                    pending.push((l1.as_ref(), l2.as_ref()));
                }
                (Term::Abstract(_, b1), Term::Abstract(_, b2)) => {
                    pending.push((b1.as_ref(), b2.as_ref()))
                }
                (Term::Free(x), Term::Free(y)) if x == y => {}
                (Term::Variable(i), Term::Variable(j)) if i == j => {}
                _ => return false,
            }
        }
        true
    }
}
impl Eq for Term {}

fn fresh_name(base: &str, bound: &[String], reserved: &HashSet<&str>) -> String {
    let taken = |name: &str| bound.iter().any(|b| b == name) || reserved.contains(name);
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{base}{i}"))
        .find(|name| !taken(name))
        .expect("Ran out of fresh names")
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        enum Frame<'a> {
            Visit(&'a Term),
            Text(&'static str),
            PopBinder,
        }
        fn parenthesized<'a>(frames: &mut Vec<Frame<'a>>, term: &'a Term) {
            frames.push(Frame::Text(")"));
            frames.push(Frame::Visit(term));
            frames.push(Frame::Text("("));
        }

        let reserved = self.free_names();
        let mut bound: Vec<String> = vec![];
        let mut frames = vec![Frame::Visit(self)];
        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Visit(Term::Apply(lhs, rhs)) => {
                    if matches!(**rhs, Term::Apply(..) | Term::Abstract(..)) {
                        parenthesized(&mut frames, rhs);
                    } else {
                        frames.push(Frame::Visit(rhs));
                    }
                    frames.push(Frame::Text(" "));
                    if matches!(**lhs, Term::Abstract(..)) {
                        parenthesized(&mut frames, lhs);
                    } else {
                        frames.push(Frame::Visit(lhs));
                    }
                }
                Frame::Visit(Term::Abstract(name, body)) => {
                    let base = name.as_deref().map_or("x", String::as_str);
                    let name = fresh_name(base, &bound, &reserved);
                    write!(f, "\\{name}. ")?;
                    bound.push(name);
                    frames.push(Frame::PopBinder);
                    frames.push(Frame::Visit(body));
                }
                Frame::Visit(Term::Free(name)) => f.write_str(name)?,
                Frame::Visit(Term::Variable(index)) => match bound.len().checked_sub(index + 1) {
                    Some(i) => f.write_str(&bound[i])?,
                    None => write!(f, "<{index}>")?,
                },
                Frame::Text(text) => f.write_str(text)?,
                Frame::PopBinder => {
                    bound.pop();
                }
            }
        }
        Ok(())
    }
}
