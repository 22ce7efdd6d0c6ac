//! Ground classification as bitmask flags.
//!
//! Static colliders carry their layer bits in Rapier's `user_data`; ground probes carry a
//! [`GroundMask`] and only accept colliders whose bits intersect it.

use num_traits::{One, PrimInt};

/// Trait implemented by flag enums.
///
/// The enum's discriminant (via `#[repr(u8)]`) determines the bit index.
/// The backing integer type is chosen via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container over a primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn empty() -> Self {
        Self::new(T::zero())
    }

    pub fn all() -> Self {
        Self::new(!T::zero())
    }

    /// Build a mask from a list of flags.
    pub fn of<U: FlagBitmask<Storage = T> + Copy>(tags: &[U]) -> Self {
        let mut flags = Self::empty();
        flags.add_many(tags);
        flags
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits | tag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, tag: U) {
        self.bits = self.bits & !tag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, tag: U) -> bool {
        (self.bits & tag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, tags: &[U]) {
        for &tag in tags {
            self.add(tag);
        }
    }

    /// True when the two masks share at least one bit.
    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
#[macro_export]
macro_rules! define_bitmask_flags {
    ($name:ident, $storage:ty, { $($(#[$meta:meta])* $variant:ident),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($(#[$meta])* $variant),*
        }

        impl $crate::layers::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(GroundLayer, u32, {
    /// Flat or gently sloped terrain.
    Walkable,
    /// Walls and steep faces the body may attach to.
    Climbable,
    /// Moving platforms; the physics provider carries the body with them.
    Platform,
    /// Geometry legs must never plant on.
    Hazard,
});

/// Mask of ground layers accepted by a probe.
pub type GroundMask = BitmaskFlags<u32>;

impl GroundMask {
    /// Layers a walking body plants on by default.
    pub fn walkable() -> Self {
        Self::of(&[
            GroundLayer::Walkable,
            GroundLayer::Climbable,
            GroundLayer::Platform,
        ])
    }

    /// Stored in a collider's `user_data`.
    #[inline]
    pub fn to_user_data(self) -> u128 {
        self.bits as u128
    }

    #[inline]
    pub fn from_user_data(user_data: u128) -> Self {
        Self::new(user_data as u32)
    }
}
