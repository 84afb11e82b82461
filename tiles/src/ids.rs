use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod orig {
    use serde::{Deserialize, Serialize};

    /// The trip identifier a tile feature carries, if any
    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct VesselName(pub String);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VesselID(pub usize);

impl CheapID for SegmentID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}
impl CheapID for VesselID {
    fn new(x: usize) -> Self {
        Self(x)
    }
}

pub trait CheapID: Copy {
    fn new(x: usize) -> Self;
}

/// Hands out fresh IDs. Never reuses one, so segments from tiles arriving in any order don't
/// collide.
#[derive(Default)]
pub struct IDAllocator {
    next: usize,
}

impl IDAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next<V: CheapID>(&mut self) -> V {
        let id = V::new(self.next);
        self.next += 1;
        id
    }
}

#[derive(Serialize, Deserialize)]
pub struct IDMapping<K: Ord, V> {
    orig_to_cheap: BTreeMap<K, V>,
}

impl<K: Clone + Ord, V: CheapID> IDMapping<K, V> {
    pub fn new() -> Self {
        Self {
            orig_to_cheap: BTreeMap::new(),
        }
    }

    pub fn insert_idempotent(&mut self, orig: &K) -> V {
        match self.orig_to_cheap.get(orig) {
            Some(x) => *x,
            None => {
                let v = V::new(self.orig_to_cheap.len());
                self.orig_to_cheap.insert(orig.clone(), v);
                v
            }
        }
    }

    pub fn len(&self) -> usize {
        self.orig_to_cheap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orig_to_cheap.is_empty()
    }
}
