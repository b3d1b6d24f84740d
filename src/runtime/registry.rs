//! Instance registry.
//!
//! The registry is the arena that stores every object instance constructed during a run.
//! Instances refer to each other by [`InstanceId`] only, so mutually referencing instances
//! never form cyclic ownership, and an instance can be reopened from any scope that holds its
//! id.
//!
//! ## Registry Invariant
//! One registry per run. It is constructed by the engine and passed by reference to all
//! construction code; ids are never reused or recycled.

use std::collections::HashMap;
use std::fmt;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ast::ClassRef;
use crate::runtime::instance::ObjectInstance;
use crate::runtime::types::TypeReferenceId;

// Using a concrete, seedable PRNG for determinism.
type IdRng = Xoshiro256StarStar;

/// Opaque identity of an object instance. Rendered as 16 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl std::str::FromStr for InstanceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        u64::from_str_radix(s, 16).map(InstanceId)
    }
}

impl Serialize for InstanceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for InstanceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone)]
pub struct InstanceRegistry {
    instances: HashMap<InstanceId, ObjectInstance>,
    order: Vec<InstanceId>,
    rng: IdRng,
}

impl InstanceRegistry {
    pub fn new(seed: u64) -> Self {
        Self {
            instances: HashMap::new(),
            order: Vec::new(),
            rng: IdRng::seed_from_u64(seed),
        }
    }

    /// Constructs a new instance of `class` under a fresh identity and stores it.
    pub fn register(&mut self, class: ClassRef, type_ref: TypeReferenceId) -> InstanceId {
        let id = self.mint();
        self.instances
            .insert(id, ObjectInstance::new(id, class, type_ref));
        self.order.push(id);
        id
    }

    pub fn resolve(&self, id: InstanceId) -> Option<&ObjectInstance> {
        self.instances.get(&id)
    }

    pub fn resolve_mut(&mut self, id: InstanceId) -> Option<&mut ObjectInstance> {
        self.instances.get_mut(&id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.instances.contains_key(&id)
    }

    /// Instances in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectInstance> {
        self.order.iter().filter_map(|id| self.instances.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // Re-draws on collision so identities stay unique for the whole run.
    fn mint(&mut self) -> InstanceId {
        loop {
            let id = InstanceId(self.rng.next_u64());
            if !self.instances.contains_key(&id) {
                return id;
            }
        }
    }
}
