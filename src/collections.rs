//! Map and set types used for keyed lookups.
//!
//! With the `hashmap` feature these are the hashbrown containers, otherwise the std ones.

#[cfg(feature = "hashmap")]
pub use hashbrown::{HashMap, HashSet, hash_map::Entry};

#[cfg(not(feature = "hashmap"))]
pub use std::collections::{HashMap, HashSet, hash_map::Entry};
