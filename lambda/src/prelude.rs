use std::rc::Rc;

pub type Nat = u64;
pub type Identifier = Rc<String>;

pub type Span = std::ops::Range<usize>;

#[derive(derive_more::AsRef, Clone, PartialEq, Eq, derive_more::Display, Debug)]
#[display(bound = "T: std::fmt::Display")]
#[display(fmt = "{value}")]
pub struct Spanned<T> {
    pub span: Span,
    #[as_ref]
    pub value: T,
}
impl<T> Spanned<T> {
    pub fn forget_span(self) -> T {
        self.value
    }
    pub fn span(&self) -> Span {
        self.span.clone()
    }
}
