//! Operator-curated allow-list of alternate fingerprints per type.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::RwLock;

use crate::descriptor::{Fingerprint, TypeIdentity};

type Slot = Arc<ArcSwap<Vec<Fingerprint>>>;

/// Maps a type identity to the historical fingerprints accepted in place of
/// its current local fingerprint.
///
/// Growth is additive only. The identity map is write-locked only when an
/// identity is seen for the first time; after that, each identity's list is
/// replaced copy-on-write through its own [`ArcSwap`], so readers always see a
/// complete list and writers to different identities never contend.
#[derive(Default)]
pub struct FingerprintRegistry {
    slots: RwLock<HashMap<TypeIdentity, Slot>>,
}

impl FingerprintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `fingerprint` as an accepted alternate for `identity`.
    ///
    /// Allowing the same pair twice leaves the registry unchanged.
    pub fn allow(&self, identity: impl Into<TypeIdentity>, fingerprint: impl Into<Fingerprint>) {
        let fingerprint = fingerprint.into();
        let slot = self.slot(identity.into());
        slot.rcu(|current| {
            let mut next = Vec::clone(current);
            if !next.contains(&fingerprint) {
                next.push(fingerprint);
            }
            next
        });
    }

    /// Allows every fingerprint in `fingerprints` for `identity` in one swap.
    pub fn allow_all<I, F>(&self, identity: impl Into<TypeIdentity>, fingerprints: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<Fingerprint>,
    {
        let incoming: Vec<Fingerprint> = fingerprints.into_iter().map(Into::into).collect();
        if incoming.is_empty() {
            return;
        }
        let slot = self.slot(identity.into());
        slot.rcu(|current| {
            let mut next = Vec::clone(current);
            for fingerprint in &incoming {
                if !next.contains(fingerprint) {
                    next.push(*fingerprint);
                }
            }
            next
        });
    }

    /// Snapshot of the alternates for `identity`, in insertion order. Empty
    /// when nothing was ever allowed for it.
    pub fn alternates_for(&self, identity: &TypeIdentity) -> Arc<Vec<Fingerprint>> {
        match self.slots.read().get(identity) {
            Some(slot) => slot.load_full(),
            None => Arc::default(),
        }
    }

    /// Whether `fingerprint` is an allowed alternate for `identity`.
    pub fn is_allowed(&self, identity: &TypeIdentity, fingerprint: Fingerprint) -> bool {
        self.slots
            .read()
            .get(identity)
            .is_some_and(|slot| slot.load().contains(&fingerprint))
    }

    /// Number of identities with at least one allowed alternate.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    fn slot(&self, identity: TypeIdentity) -> Slot {
        if let Some(slot) = self.slots.read().get(&identity) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write();
        Arc::clone(slots.entry(identity).or_default())
    }
}

impl std::fmt::Debug for FingerprintRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.read();
        let mut map = f.debug_map();
        for (identity, slot) in slots.iter() {
            map.entry(identity, &**slot.load());
        }
        map.finish()
    }
}
