use crate::common::Result;
use crate::query::Predicate;
use crate::tuple::Tuple;

/// Keeps the tuples of a child iterator that satisfy a predicate.
pub struct Filter<I> {
    predicate: Predicate,
    child: I,
}

impl<I> Filter<I> {
    pub fn new(predicate: Predicate, child: I) -> Self {
        Self { predicate, child }
    }
}

impl<I: Iterator<Item = Result<Tuple>>> Iterator for Filter<I> {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.child.next()? {
                Ok(tuple) => match self.predicate.eval(&tuple) {
                    Ok(true) => return Some(Ok(tuple)),
                    Ok(false) => continue,
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
