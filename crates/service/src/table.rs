//! A small `ahash`-backed map newtype, sized so the common case (a handful
//! of sources or sessions) never needs to rehash.

use std::ops::{Deref, DerefMut};

use ahash::HashMap;

const DEFAULT_CAPACITY: usize = 64;

pub struct Table<K, V>(HashMap<K, V>);

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self(HashMap::with_capacity_and_hasher(
            DEFAULT_CAPACITY,
            Default::default(),
        ))
    }
}

impl<K, V> Deref for Table<K, V> {
    type Target = HashMap<K, V>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K, V> DerefMut for Table<K, V> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
