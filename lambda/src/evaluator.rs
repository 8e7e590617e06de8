use crate::term::Term;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Step {
    Func,
    Arg,
    Body,
}

/// Path from the root to the leftmost-outermost redex.
fn redex_path(term: &Term) -> Option<Vec<Step>> {
    let mut path = vec![];
    // Argument positions still to be searched, with the path length at their application.
    let mut pending: Vec<(usize, &Term)> = vec![];
    let mut node = term;
    loop {
        match node {
            _ if node.is_redex() => return Some(path),
            Term::Apply(lhs, rhs) => {
                pending.push((path.len(), rhs.as_ref()));
                path.push(Step::Func);
                node = lhs.as_ref();
            }
            Term::Abstract(_, body) => {
                path.push(Step::Body);
                node = body.as_ref();
            }
            Term::Free(_) | Term::Variable(_) => {
                let (len, rhs) = pending.pop()?;
                path.truncate(len);
                path.push(Step::Arg);
                node = rhs;
            }
        }
    }
}

/// The leftmost-outermost application whose function is an abstraction, if any.
pub fn find_next_redex(term: &mut Term) -> Option<&mut Term> {
    let path = redex_path(term)?;
    let mut node = term;
    for step in path {
        node = match (step, node) {
            (Step::Func, Term::Apply(lhs, _)) => lhs.as_mut(),
            (Step::Arg, Term::Apply(_, rhs)) => rhs.as_mut(),
            (Step::Body, Term::Abstract(_, body)) => body.as_mut(),
            _ => unreachable!("Something went wrong: the redex path does not fit the term"),
        };
    }
    Some(node)
}

/// Decrements the variables of `body` that point past the abstraction being removed and
/// collects the occurrences of its parameter together with their depth.
fn collect_occurrences(body: &mut Term) -> Vec<(&mut Term, usize)> {
    let mut occurrences = vec![];
    let mut pending = vec![(body, 0)];
    while let Some((term, depth)) = pending.pop() {
        if let Term::Variable(index) = *term {
            if index == depth {
                occurrences.push((term, depth));
                continue;
            }
        }
        match term {
            Term::Apply(lhs, rhs) => {
                pending.push((rhs.as_mut(), depth));
                pending.push((lhs.as_mut(), depth));
            }
            Term::Abstract(_, inner) => pending.push((inner.as_mut(), depth + 1)),
            Term::Free(_) => {}
            Term::Variable(index) => {
                if *index > depth {
                    *index -= 1;
                }
            }
        }
    }
    occurrences
}

/// Contracts `(\x. body) arg` in place. Returns `false`, leaving the term alone, if it is not a
/// redex.
pub fn reduce_redex(redex: &mut Term) -> bool {
    let Term::Apply(lhs, rhs) = redex else {
        return false;
    };
    let Term::Abstract(_, body) = lhs.as_mut() else {
        return false;
    };
    let mut body = std::mem::replace(body.as_mut(), Term::Variable(0));
    let arg = std::mem::replace(rhs.as_mut(), Term::Variable(0));

    let mut occurrences = collect_occurrences(&mut body);
    if let Some((last, depth)) = occurrences.pop() {
        for (site, depth) in occurrences {
            *site = arg.shifted(depth);
        }
        let mut arg = arg;
        arg.shift(depth);
        *last = arg;
    }
    *redex = body;
    true
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Outcome {
    NormalForm { steps: u64 },
    StepLimit { steps: u64 },
}

impl Outcome {
    pub fn steps(self) -> u64 {
        match self {
            Outcome::NormalForm { steps } | Outcome::StepLimit { steps } => steps,
        }
    }
}

/// Normal-order reduction of `term` in place, performing at most `max_steps` contractions when
/// given. `on_step` sees the whole term after every contraction.
pub fn reduce(
    term: &mut Term,
    max_steps: Option<u64>,
    mut on_step: impl FnMut(u64, &Term),
) -> Outcome {
    let mut steps = 0;
    loop {
        let Some(redex) = find_next_redex(term) else {
            return Outcome::NormalForm { steps };
        };
        if max_steps.map_or(false, |max| steps >= max) {
            return Outcome::StepLimit { steps };
        }
        reduce_redex(redex);
        steps += 1;
        on_step(steps, term);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        church,
        context::Context,
        library,
        parser::{self, Statement},
        term::Index,
    };

    fn parse(s: &str) -> Term {
        match parser::parse_statement(s, &mut Context::default()) {
            Ok(Statement::Expression(term)) => term,
            other => panic!("`{s}` is not an expression: {other:?}"),
        }
    }

    fn count_redexes(term: &Term) -> usize {
        let mut count = 0;
        let mut pending = vec![term];
        while let Some(term) = pending.pop() {
            count += usize::from(term.is_redex());
            match term {
                Term::Apply(lhs, rhs) => {
                    pending.push(lhs.as_ref());
                    pending.push(rhs.as_ref());
                }
                Term::Abstract(_, body) => pending.push(body.as_ref()),
                Term::Free(_) | Term::Variable(_) => {}
            }
        }
        count
    }

    /// How many binders the term is missing around it for every index to be bound.
    fn open_depth(term: &Term) -> Index {
        let mut open = 0;
        let mut pending = vec![(term, 0)];
        while let Some((term, depth)) = pending.pop() {
            match term {
                Term::Apply(lhs, rhs) => {
                    pending.push((lhs.as_ref(), depth));
                    pending.push((rhs.as_ref(), depth));
                }
                Term::Abstract(_, body) => pending.push((body.as_ref(), depth + 1)),
                Term::Free(_) => {}
                Term::Variable(index) => open = open.max((index + 1).saturating_sub(depth)),
            }
        }
        open
    }

    #[test]
    fn test_identity() {
        let mut term = parse("(\\x. x) y");
        let outcome = reduce(&mut term, None, |_, _| {});
        assert_eq!(outcome, Outcome::NormalForm { steps: 1 });
        assert_eq!(term, Term::free("y"));
        assert!(find_next_redex(&mut term).is_none());
        assert_eq!(reduce(&mut term, None, |_, _| {}), Outcome::NormalForm { steps: 0 });
    }

    #[test]
    fn test_step_limit() {
        let mut term = parse("(\\x. \\y. x) a b");
        assert_eq!(count_redexes(&term), 1);
        let outcome = reduce(&mut term, Some(1), |_, _| {});
        assert_eq!(outcome, Outcome::StepLimit { steps: 1 });
        assert_eq!(term, parse("(\\y. a) b"));
        assert_eq!(count_redexes(&term), 1);
        assert_eq!(reduce(&mut term, Some(1), |_, _| {}), Outcome::NormalForm { steps: 1 });
        assert_eq!(term, Term::free("a"));

        let omega = parse("(\\x. x x) (\\x. x x)");
        let mut term = omega.clone();
        assert_eq!(reduce(&mut term, Some(10), |_, _| {}), Outcome::StepLimit { steps: 10 });
        assert_eq!(term, omega);
    }

    #[test]
    fn test_normal_order() {
        // The divergent argument is discarded before it is ever reduced.
        let mut term = parse("(\\x. y) ((\\x. x x) (\\x. x x))");
        assert_eq!(reduce(&mut term, Some(5), |_, _| {}), Outcome::NormalForm { steps: 1 });
        assert_eq!(term, Term::free("y"));

        // The outer redex goes first even when the function position has one inside.
        let mut term = parse("(\\x. x) ((\\y. y) z)");
        let redex = find_next_redex(&mut term).unwrap();
        reduce_redex(redex);
        assert_eq!(term, parse("(\\y. y) z"));
    }

    #[test]
    fn test_substitution_under_binders() {
        let cases = [
            // The argument is a variable bound outside the redex.
            ("\\z. (\\x. \\y. x) z", Term::lambda(None, Term::lambda(None, Term::Variable(1)))),
            // Variables of the body pointing past the removed binder move one step closer.
            ("\\z. (\\x. z) w", Term::lambda(None, Term::Variable(0))),
            // Indices bound inside the argument stay put.
            ("(\\x. \\y. x) (\\z. z)", Term::lambda(None, Term::lambda(None, Term::Variable(0)))),
            // Both at once, with the parameter used at two different depths.
            (
                "\\a. (\\x. x (\\b. x b)) (\\c. a c)",
                parse("\\a. (\\c. a c) (\\b. (\\c. a c) b)"),
            ),
        ];
        for (source, expected) in cases {
            let mut term = parse(source);
            let redex = find_next_redex(&mut term).unwrap();
            assert!(reduce_redex(redex));
            assert_eq!(term, expected, "reducing `{source}`");
            assert_eq!(open_depth(&term), 0);
        }
    }

    #[test]
    fn test_indices_stay_bound() {
        let mut context = Context::default();
        library::load(&mut context).unwrap();
        for source in ["add 2 3", "pred 3", "mul 2 (sub 3 1)", "square 2"] {
            let Ok(Statement::Expression(mut term)) = parser::parse_statement(source, &mut context)
            else {
                panic!("`{source}` is not an expression");
            };
            let mut last = 0;
            let outcome = reduce(&mut term, None, |step, term| {
                assert_eq!(step, last + 1);
                last = step;
                assert_eq!(open_depth(term), 0, "step {step} of `{source}`: {term}");
            });
            assert_eq!(outcome.steps(), last);
            assert!(church::decode(&term).is_some());
        }
    }

    #[test]
    fn test_not_a_redex() {
        let mut term = parse("f (\\x. x)");
        assert!(!reduce_redex(&mut term));
        assert_eq!(term, parse("f (\\x. x)"));
    }

    #[test]
    fn test_deep_terms() {
        let n = 100_000;
        let mut term = Term::apply(Term::lambda(None, Term::Variable(0)), church::encode(n));
        assert_eq!(reduce(&mut term, None, |_, _| {}), Outcome::NormalForm { steps: 1 });
        assert_eq!(church::decode(&term), Some(n));

        // \\f. \\x. f (f ... (f ((\\y. y) x))) with the only redex at the bottom
        let mut body = Term::apply(Term::lambda(None, Term::Variable(0)), Term::Variable(0));
        for _ in 0..n {
            body = Term::apply(Term::Variable(1), body);
        }
        let mut term = Term::lambda(None, Term::lambda(None, body));
        assert_eq!(reduce(&mut term, None, |_, _| {}), Outcome::NormalForm { steps: 1 });
        assert_eq!(term, church::encode(n));
    }
}
