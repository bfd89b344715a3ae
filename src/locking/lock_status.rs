use std::collections::HashSet;

use crate::common::{Permissions, TransactionId};

/// Lock state of a single page: the set of shared holders and at most one
/// exclusive holder. Invariant: the two sides are never populated at the
/// same time.
#[derive(Debug, Default)]
pub struct LockStatus {
    shared: HashSet<TransactionId>,
    exclusive: Option<TransactionId>,
}

impl LockStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts to add a lock for `tid` at `perm`. An empty return set
    /// means the lock was granted; otherwise the set contains the
    /// transactions `tid` would have to wait for. The requester itself
    /// never appears in the set.
    ///
    /// A transaction may re-acquire a lock it already holds, and the sole
    /// shared holder may upgrade to exclusive in place. Two concurrent
    /// upgraders cannot both succeed: each blocks on the other's shared
    /// hold.
    pub fn try_acquire(
        &mut self,
        tid: TransactionId,
        perm: Permissions,
    ) -> HashSet<TransactionId> {
        let mut blockers = HashSet::new();
        match perm {
            Permissions::ReadOnly => match self.exclusive {
                None => {
                    self.shared.insert(tid);
                }
                Some(holder) if holder == tid => {}
                Some(holder) => {
                    blockers.insert(holder);
                }
            },
            Permissions::ReadWrite => match self.exclusive {
                Some(holder) if holder == tid => {}
                Some(holder) => {
                    blockers.insert(holder);
                }
                None => {
                    if self.shared.is_empty() {
                        self.exclusive = Some(tid);
                    } else if self.shared.len() == 1 && self.shared.contains(&tid) {
                        // Lock upgrade: sole shared holder becomes the
                        // exclusive holder.
                        self.shared.remove(&tid);
                        self.exclusive = Some(tid);
                    } else {
                        blockers.extend(self.shared.iter().filter(|t| **t != tid).copied());
                    }
                }
            },
        }
        blockers
    }

    /// Drops whatever hold `tid` has on this page. Returns true if a lock
    /// was actually released, so the caller knows to wake waiters.
    pub fn release(&mut self, tid: TransactionId) -> bool {
        let mut released = false;
        if self.exclusive == Some(tid) {
            self.exclusive = None;
            released = true;
        }
        released |= self.shared.remove(&tid);
        released
    }

    pub fn holds(&self, tid: TransactionId) -> bool {
        self.exclusive == Some(tid) || self.shared.contains(&tid)
    }

    pub fn exclusive_holder(&self) -> Option<TransactionId> {
        self.exclusive
    }

    pub fn shared_holders(&self) -> &HashSet<TransactionId> {
        &self.shared
    }
}
