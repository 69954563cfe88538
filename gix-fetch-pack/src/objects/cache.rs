//! The forward-reference resolution cache of one fetch.
//!
//! Pack streams may reference objects that have not arrived yet. The pack
//! decoder looks dependencies up through [`ResolutionCache::find()`]; a hit
//! is delivered immediately, a miss parks the continuation until the object
//! is [`insert()`](ResolutionCache::insert)ed. The cache is owned by the
//! single pack-consumption flow and discarded with it; it is not shared
//! across fetches.

use std::collections::HashMap;
use std::rc::Rc;

use gix_hash::ObjectId;

use crate::{
    error::{Error, Result},
    types::HydratedObject,
};

/// A parked continuation waiting for an object to arrive.
pub type Waiter = Box<dyn FnOnce(Rc<HydratedObject>)>;

/// Hydrated objects by id, plus continuations waiting on ids not yet seen.
#[derive(Default)]
pub struct ResolutionCache {
    seen: HashMap<ObjectId, Rc<HydratedObject>>,
    pending: HashMap<ObjectId, Vec<Waiter>>,
}

impl ResolutionCache {
    /// Create an empty cache for one fetch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver the object with `id` to `ready`: immediately if it was seen
    /// already, otherwise once it arrives.
    ///
    /// Each call is served exactly once; multiple waiters on the same
    /// missing id are served in registration order when it arrives.
    pub fn find(&mut self, id: ObjectId, ready: impl FnOnce(Rc<HydratedObject>) + 'static) {
        match self.seen.get(&id) {
            Some(object) => ready(Rc::clone(object)),
            None => self.pending.entry(id).or_default().push(Box::new(ready)),
        }
    }

    /// Record a newly hydrated object and wake every waiter parked on its id.
    ///
    /// An id can be inserted at most once per fetch; a second delivery is a
    /// protocol error.
    pub fn insert(&mut self, object: HydratedObject) -> Result<Rc<HydratedObject>> {
        let id = object.id;
        if self.seen.contains_key(&id) {
            return Err(Error::DuplicateObject { id });
        }
        let object = Rc::new(object);
        self.seen.insert(id, Rc::clone(&object));
        for waiter in self.pending.remove(&id).unwrap_or_default() {
            waiter(Rc::clone(&object));
        }
        Ok(object)
    }

    /// The object with `id`, if it has arrived.
    pub fn get(&self, id: &ObjectId) -> Option<&Rc<HydratedObject>> {
        self.seen.get(id)
    }

    /// How many objects have been recorded.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// `true` if no object has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Verify that no waiter is left parked on an id that never arrived.
    ///
    /// Call once the pack stream has ended; a non-empty pending table means
    /// an object referenced a hash the server never delivered.
    pub fn finish(&self) -> Result<()> {
        let mut unresolved: Vec<_> = self.pending.keys().copied().collect();
        unresolved.sort_unstable();
        match unresolved.first() {
            None => Ok(()),
            Some(first) => Err(Error::DanglingReference {
                first: *first,
                remaining: unresolved.len() - 1,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectKind;
    use std::cell::RefCell;

    fn object(hex: &str) -> HydratedObject {
        HydratedObject {
            id: ObjectId::from_hex(hex.as_bytes()).unwrap(),
            kind: ObjectKind::Blob,
            data: "payload".into(),
        }
    }

    const H1: &str = "9ec967f164af38b7ddeb8f126cfba166ae5fab71";
    const H2: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn find_after_insert_is_immediate() {
        let mut cache = ResolutionCache::new();
        let inserted = cache.insert(object(H1)).unwrap();
        let delivered = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&delivered);
        cache.find(inserted.id, move |obj| *slot.borrow_mut() = Some(obj));
        assert_eq!(delivered.borrow().as_ref().unwrap().id, inserted.id);
        cache.finish().unwrap();
    }

    #[test]
    fn waiters_are_served_on_arrival_in_registration_order() {
        let mut cache = ResolutionCache::new();
        let id = object(H1).id;
        let order = Rc::new(RefCell::new(Vec::new()));
        for n in 0..3 {
            let order = Rc::clone(&order);
            cache.find(id, move |_| order.borrow_mut().push(n));
        }
        assert!(order.borrow().is_empty(), "nothing delivered before arrival");
        cache.insert(object(H1)).unwrap();
        assert_eq!(*order.borrow(), [0, 1, 2]);
        // The pending entry is gone; later finds hit `seen` directly.
        cache.finish().unwrap();
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut cache = ResolutionCache::new();
        cache.insert(object(H1)).unwrap();
        assert!(matches!(
            cache.insert(object(H1)),
            Err(Error::DuplicateObject { .. })
        ));
    }

    #[test]
    fn unresolved_waiters_fail_finish() {
        let mut cache = ResolutionCache::new();
        cache.insert(object(H1)).unwrap();
        cache.find(object(H2).id, |_| panic!("never arrives"));
        match cache.finish().unwrap_err() {
            Error::DanglingReference { first, remaining } => {
                assert_eq!(first, object(H2).id);
                assert_eq!(remaining, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
