//! [`Cache`] of the records shared between the console screens.

use std::{cell::RefCell, collections::HashSet, rc::Rc};

use crate::domain::{account, opportunity, Opportunity};

/// Key of a [`Cache`] entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    /// Collection of [`Opportunity`]s shown in lists and on the board.
    OpportunityList,

    /// Details of a single [`Opportunity`].
    Opportunity(opportunity::Id),

    /// Details of a single account.
    Account(account::Id),
}

/// Cache of the [`Opportunity`] collection shared between the console
/// screens, along with staleness marks of the cached entries.
///
/// Invalidating an entry signals the screens showing it that it's due for a
/// refresh.
pub trait Cache {
    /// Returns a snapshot of the cached [`Opportunity`] collection.
    fn opportunities(&self) -> Vec<Opportunity>;

    /// Returns the cached [`Opportunity`] with the provided `id`, if any.
    fn opportunity(&self, id: opportunity::Id) -> Option<Opportunity>;

    /// Replaces the whole cached [`Opportunity`] collection, marking it fresh.
    fn store_opportunities(&self, items: Vec<Opportunity>);

    /// Replaces the cached [`Opportunity`] having the same ID.
    ///
    /// Returns `false` if there is no such [`Opportunity`] in the collection,
    /// leaving it untouched.
    fn put_opportunity(&self, opp: Opportunity) -> bool;

    /// Marks the entry with the provided [`Key`] as stale.
    fn invalidate(&self, key: Key);

    /// Indicates whether the entry with the provided [`Key`] was marked as
    /// stale.
    fn is_stale(&self, key: Key) -> bool;
}

impl<C: Cache + ?Sized> Cache for &C {
    fn opportunities(&self) -> Vec<Opportunity> {
        (**self).opportunities()
    }

    fn opportunity(&self, id: opportunity::Id) -> Option<Opportunity> {
        (**self).opportunity(id)
    }

    fn store_opportunities(&self, items: Vec<Opportunity>) {
        (**self).store_opportunities(items);
    }

    fn put_opportunity(&self, opp: Opportunity) -> bool {
        (**self).put_opportunity(opp)
    }

    fn invalidate(&self, key: Key) {
        (**self).invalidate(key);
    }

    fn is_stale(&self, key: Key) -> bool {
        (**self).is_stale(key)
    }
}

impl<C: Cache + ?Sized> Cache for Rc<C> {
    fn opportunities(&self) -> Vec<Opportunity> {
        (**self).opportunities()
    }

    fn opportunity(&self, id: opportunity::Id) -> Option<Opportunity> {
        (**self).opportunity(id)
    }

    fn store_opportunities(&self, items: Vec<Opportunity>) {
        (**self).store_opportunities(items);
    }

    fn put_opportunity(&self, opp: Opportunity) -> bool {
        (**self).put_opportunity(opp)
    }

    fn invalidate(&self, key: Key) {
        (**self).invalidate(key);
    }

    fn is_stale(&self, key: Key) -> bool {
        (**self).is_stale(key)
    }
}

/// In-memory [`Cache`] for a single-threaded console.
#[derive(Debug, Default)]
pub struct Memory {
    /// Cached [`Opportunity`] collection.
    opportunities: RefCell<Vec<Opportunity>>,

    /// [`Key`]s of the stale entries.
    stale: RefCell<HashSet<Key>>,
}

impl Cache for Memory {
    fn opportunities(&self) -> Vec<Opportunity> {
        self.opportunities.borrow().clone()
    }

    fn opportunity(&self, id: opportunity::Id) -> Option<Opportunity> {
        self.opportunities
            .borrow()
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    fn store_opportunities(&self, items: Vec<Opportunity>) {
        *self.opportunities.borrow_mut() = items;
        _ = self.stale.borrow_mut().remove(&Key::OpportunityList);
    }

    fn put_opportunity(&self, opp: Opportunity) -> bool {
        let mut items = self.opportunities.borrow_mut();
        let Some(cached) = items.iter_mut().find(|o| o.id == opp.id) else {
            return false;
        };
        *cached = opp;
        true
    }

    fn invalidate(&self, key: Key) {
        _ = self.stale.borrow_mut().insert(key);
    }

    fn is_stale(&self, key: Key) -> bool {
        self.stale.borrow().contains(&key)
    }
}
