use anyhow::{Context as _, Result};
use util::ResultExt;

use crate::{context::Context, parser};

/// Church-encoded arithmetic, one statement per line.
pub const STANDARD_LIBRARY: &str = r"
def id = \x. x
def true = \t f. t
def false = \t f. f
def iszero = \n. n (\x. false) true
def fix = \f. (\x. f (x x)) (\x. f (x x))
def succ = \n f x. f (n f x)
def add = \m n f x. m f (n f x)
def mul = \m n f. m (n f)
def exp = \m n. n m
def square = \n. mul n n
def pred = \n f x. n (\g h. h (g f)) (\u. x) (\u. u)
def sub = \m n. n pred m
def div = \n. fix (\c n m f x. (\d. iszero d (0 f x) (f (c d m f x))) (sub n m)) (succ n)
opdef ^ 3 = exp
opdef * 4 = mul
opdef / 4 = div
opdef + 5 = add
opdef - 5 = sub
";

pub fn load(context: &mut Context) -> Result<()> {
    for line in STANDARD_LIBRARY.lines().map(str::trim).filter(|l| !l.is_empty()) {
        parser::parse_statement(line, context)
            .staticalize()
            .with_context(|| format!("Failed to load `{line}`"))?;
    }
    Ok(())
}
