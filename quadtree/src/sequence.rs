//! Ordered, lazy composition of up to four element sources.
//!
//! [`Compose`] drains its sources front to back. A source is either an
//! iterator that already exists ([`Source::Ready`]) or a thunk that builds one
//! the first time the composition reaches it ([`Source::Deferred`]), so a
//! source that is never reached is never built. Elements can be filtered and
//! projected on the way out; every element that passes the filter takes the
//! next value of a [`Cursor`], which may be shared between several
//! compositions to number one logical stream.

use smallvec::SmallVec;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub const MAX_SOURCES: usize = 4;

pub enum Source<I, F> {
    Ready(I),
    Deferred(F),
}

impl<I, F> Source<I, F>
where
    F: FnOnce() -> I,
{
    fn produce(self) -> I {
        match self {
            Source::Ready(iter) => iter,
            Source::Deferred(thunk) => thunk(),
        }
    }
}

impl<I, F> fmt::Debug for Source<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Ready(_) => f.write_str("Ready"),
            Source::Deferred(_) => f.write_str("Deferred"),
        }
    }
}

/// Running index handed out to matching elements. Clones share the counter.
#[derive(Clone, Debug, Default)]
pub struct Cursor(Rc<Cell<usize>>);

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(index: usize) -> Self {
        Cursor(Rc::new(Cell::new(index)))
    }

    /// Index the next matching element will receive.
    pub fn get(&self) -> usize {
        self.0.get()
    }

    fn advance(&self) -> usize {
        let index = self.0.get();
        self.0.set(index + 1);
        index
    }
}

pub trait Predicate<X> {
    fn test(&mut self, item: &X) -> bool;
}

impl<X, F> Predicate<X> for F
where
    F: FnMut(&X) -> bool,
{
    fn test(&mut self, item: &X) -> bool {
        self(item)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<X> Predicate<X> for AcceptAll {
    fn test(&mut self, _item: &X) -> bool {
        true
    }
}

pub type Identity<X> = fn(usize, X) -> X;

fn identity<X>(_index: usize, item: X) -> X {
    item
}

pub struct Compose<I, F, P, M> {
    sources: smallvec::IntoIter<[Source<I, F>; MAX_SOURCES]>,
    current: Option<I>,
    filter: P,
    map: M,
    cursor: Cursor,
}

impl<I, F> Compose<I, F, AcceptAll, Identity<I::Item>>
where
    I: Iterator,
    F: FnOnce() -> I,
{
    /// Panics if given more than [`MAX_SOURCES`] sources.
    pub fn new(sources: impl IntoIterator<Item = Source<I, F>>) -> Self {
        let sources: SmallVec<[Source<I, F>; MAX_SOURCES]> = sources.into_iter().collect();
        assert!(
            sources.len() <= MAX_SOURCES,
            "a composition takes at most {MAX_SOURCES} sources, got {}",
            sources.len()
        );
        Compose {
            sources: sources.into_iter(),
            current: None,
            filter: AcceptAll,
            map: identity::<I::Item>,
            cursor: Cursor::new(),
        }
    }
}

impl<I, F, P, M> Compose<I, F, P, M> {
    pub fn filtered<P2>(self, filter: P2) -> Compose<I, F, P2, M> {
        Compose {
            sources: self.sources,
            current: self.current,
            filter,
            map: self.map,
            cursor: self.cursor,
        }
    }

    pub fn mapped<M2>(self, map: M2) -> Compose<I, F, P, M2> {
        Compose {
            sources: self.sources,
            current: self.current,
            filter: self.filter,
            map,
            cursor: self.cursor,
        }
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }
}

impl<I, F, P, M, O> Iterator for Compose<I, F, P, M>
where
    I: Iterator,
    F: FnOnce() -> I,
    P: Predicate<I::Item>,
    M: FnMut(usize, I::Item) -> O,
{
    type Item = O;

    fn next(&mut self) -> Option<O> {
        loop {
            if let Some(current) = &mut self.current {
                for item in current {
                    if self.filter.test(&item) {
                        let index = self.cursor.advance();
                        return Some((self.map)(index, item));
                    }
                }
                self.current = None;
            }
            self.current = Some(self.sources.next()?.produce());
        }
    }
}

impl<I, F, P, M> fmt::Debug for Compose<I, F, P, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compose")
            .field("pending_sources", &self.sources.len())
            .field("draining", &self.current.is_some())
            .field("cursor", &self.cursor.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Thunk = Box<dyn FnOnce() -> std::vec::IntoIter<u32>>;

    fn ready(items: &[u32]) -> Source<std::vec::IntoIter<u32>, Thunk> {
        Source::Ready(items.to_vec().into_iter())
    }

    #[test]
    fn yields_sources_in_order() {
        let out: Vec<u32> = Compose::new([ready(&[1, 2]), ready(&[]), ready(&[3]), ready(&[4, 5])])
            .collect();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn deferred_sources_are_built_only_when_reached() {
        let built = Rc::new(RefCell::new(Vec::new()));
        let source = |tag: u32, items: Vec<u32>| -> Source<std::vec::IntoIter<u32>, Thunk> {
            let built = built.clone();
            Source::Deferred(Box::new(move || {
                built.borrow_mut().push(tag);
                items.into_iter()
            }))
        };
        let mut compose = Compose::new([source(0, vec![10]), source(1, vec![11])]);
        assert!(built.borrow().is_empty());
        assert_eq!(compose.next(), Some(10));
        assert_eq!(*built.borrow(), vec![0]);
        assert_eq!(compose.next(), Some(11));
        assert_eq!(*built.borrow(), vec![0, 1]);
        assert_eq!(compose.next(), None);
    }

    #[test]
    fn filter_and_map_share_one_index() {
        let out: Vec<(usize, u32)> = Compose::new([ready(&[1, 2, 3]), ready(&[4, 5, 6])])
            .filtered(|x: &u32| x % 2 == 0)
            .mapped(|index: usize, x: u32| (index, x * 10))
            .collect();
        assert_eq!(out, vec![(0, 20), (1, 40), (2, 60)]);
    }

    #[test]
    fn cursor_is_shared_between_compositions() {
        let cursor = Cursor::starting_at(5);
        let first: Vec<usize> = Compose::new([ready(&[7, 8])])
            .with_cursor(cursor.clone())
            .mapped(|index: usize, _: u32| index)
            .collect();
        let second: Vec<usize> = Compose::new([ready(&[9])])
            .with_cursor(cursor.clone())
            .mapped(|index: usize, _: u32| index)
            .collect();
        assert_eq!(first, vec![5, 6]);
        assert_eq!(second, vec![7]);
        assert_eq!(cursor.get(), 8);
    }

    #[test]
    fn empty_composition_is_empty() {
        let mut compose = Compose::new(Vec::<Source<std::vec::IntoIter<u32>, Thunk>>::new());
        assert_eq!(compose.next(), None);
    }

    #[test]
    #[should_panic(expected = "at most 4 sources")]
    fn rejects_a_fifth_source() {
        let _ = Compose::new([ready(&[1]), ready(&[2]), ready(&[3]), ready(&[4]), ready(&[5])]);
    }
}
