pub mod repl;

use anyhow::anyhow;
/// Turns errors that cannot cross threads, e.g. ones holding an `Rc`, into `anyhow::Error`.
pub trait ResultExt<T> {
    fn staticalize(self) -> anyhow::Result<T>;
}
impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn staticalize(self) -> anyhow::Result<T> {
        self.map_err(|e| anyhow!("{e}"))
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_staticalize() {
        let ok: Result<u8, Rc<String>> = Ok(1);
        assert_eq!(ok.staticalize().unwrap(), 1);
        let err: Result<u8, Rc<String>> = Err(Rc::new("unexpected dot".to_string()));
        let err = err.staticalize().unwrap_err();
        assert_eq!(err.to_string(), "unexpected dot");
    }
}
