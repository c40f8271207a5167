/*!
World keys and the registry mapping them to kernel bodies.

# Bit layout
A [`WorldKey`] is a packed `u64` (least-significant bit = bit 0):

- bits 0..=31  : [`BodyId`] of the kernel body
- bits 32..=63 : world id, unique per world instance in this process (never zero)

A [`BodyId`] is itself packed:

- bits 0..=23  : kernel arena index
- bits 24..=31 : low 8 bits of the kernel arena generation

# Invariants
- Two worlds never hand out equal keys (distinct world ids).
- A kernel slot freed and reused gets a new generation, so the key of the removed body
  never resolves to the new one.
- A key is never zero, so `0` can be used as a null key by callers that need one.
*/

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, Ordering};

use rapier3d::prelude::RigidBodyHandle;

use crate::character::CharacterState;

const INDEX_BITS: u32 = 24;
const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = 0xFF;

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(1);

/// Allocate a process-unique world id.
pub(crate) fn next_world_id() -> u32 {
    loop {
        let id = NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed);
        if id != 0 {
            return id;
        }
    }
}

/// Kernel body identifier: arena index plus generation, packed into 32 bits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl BodyId {
    /// Sentinel for "no body". Never produced for a live body because body capacity stays
    /// below the index limit.
    pub const INVALID: BodyId = BodyId(u32::MAX);

    pub fn from_handle(handle: RigidBodyHandle) -> Self {
        let (index, generation) = handle.into_raw_parts();
        BodyId(((generation & GENERATION_MASK) << INDEX_BITS) | (index & INDEX_MASK))
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0 & INDEX_MASK
    }

    #[inline]
    pub fn generation(self) -> u32 {
        self.0 >> INDEX_BITS
    }

    /// The id reinterpreted as a signed item index (hit results carry it this way).
    #[inline]
    pub fn as_item(self) -> i32 {
        self.0 as i32
    }
}

/// Process-unique handle for a primitive in one world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorldKey(u64);

impl WorldKey {
    #[inline]
    pub fn compose(world_id: u32, body: BodyId) -> Self {
        WorldKey(((world_id as u64) << 32) | body.0 as u64)
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        WorldKey(raw)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn world_id(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn body_id(self) -> BodyId {
        BodyId(self.0 as u32)
    }
}

/// Bidirectional world-key bookkeeping for one world.
///
/// Characters are kept in an ordered map so per-step character processing runs in a
/// stable order.
#[derive(Debug)]
pub struct KeyRegistry {
    world_id: u32,
    bodies: HashMap<WorldKey, RigidBodyHandle>,
    characters: BTreeMap<WorldKey, CharacterState>,
}

impl KeyRegistry {
    pub fn new(world_id: u32) -> Self {
        Self {
            world_id,
            bodies: HashMap::new(),
            characters: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn world_id(&self) -> u32 {
        self.world_id
    }

    /// Key this world would assign to `handle`. Does not register anything.
    #[inline]
    pub fn key_for(&self, handle: RigidBodyHandle) -> WorldKey {
        WorldKey::compose(self.world_id, BodyId::from_handle(handle))
    }

    /// Key for a body id reported by a query against this world.
    #[inline]
    pub fn key_for_body_id(&self, body: BodyId) -> WorldKey {
        WorldKey::compose(self.world_id, body)
    }

    pub fn register(&mut self, handle: RigidBodyHandle) -> WorldKey {
        let key = self.key_for(handle);
        let previous = self.bodies.insert(key, handle);
        debug_assert!(previous.is_none(), "world key {key:?} registered twice");
        key
    }

    pub fn resolve(&self, key: WorldKey) -> Option<RigidBodyHandle> {
        if key.world_id() != self.world_id {
            return None;
        }
        self.bodies.get(&key).copied()
    }

    pub fn register_character(&mut self, key: WorldKey, state: CharacterState) {
        self.characters.insert(key, state);
    }

    pub fn find_character(&self, key: WorldKey) -> Option<&CharacterState> {
        self.characters.get(&key)
    }

    pub fn find_character_mut(&mut self, key: WorldKey) -> Option<&mut CharacterState> {
        self.characters.get_mut(&key)
    }

    pub(crate) fn characters(&self) -> impl Iterator<Item = (&WorldKey, &CharacterState)> {
        self.characters.iter()
    }

    /// Drop both the body mapping and any character mapping for `key`.
    pub fn remove(&mut self, key: WorldKey) -> Option<RigidBodyHandle> {
        self.characters.remove(&key);
        self.bodies.remove(&key)
    }

    /// Number of registered bodies (characters included).
    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    #[inline]
    pub fn character_count(&self) -> usize {
        self.characters.len()
    }
}
