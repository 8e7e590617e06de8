use crate::{prelude::*, term::Term};

/// `\f. \x. f (f ... (f x))` with `n` applications of `f`.
pub fn encode(n: Nat) -> Term {
    let mut body = Term::Variable(0);
    for _ in 0..n {
        body = Term::apply(Term::Variable(1), body);
    }
    Term::lambda(
        Some(Identifier::new("f".into())),
        Term::lambda(Some(Identifier::new("x".into())), body),
    )
}

/// Reads back a numeral in exactly the shape [`encode`] produces. This is a structural check,
/// so the term has to be normalized first.
pub fn decode(term: &Term) -> Option<Nat> {
    let Term::Abstract(_, inner) = term else {
        return None;
    };
    let Term::Abstract(_, body) = inner.as_ref() else {
        return None;
    };
    let mut body: &Term = body;
    let mut n: Nat = 0;
    loop {
        match body {
            Term::Variable(0) => return Some(n),
            Term::Apply(f, arg) if matches!(**f, Term::Variable(1)) => {
                n += 1;
                body = arg.as_ref();
            }
            _ => return None,
        }
    }
}
