//! Collision layer system for filtering ray casts
//!
//! Every body sits on one or more layers and carries a mask of the layers
//! it wants to interact with. Rays carry the same pair (group and mask), so
//! a weapon trace can ignore pickups and a ground probe can ignore enemies.

use bitflags::bitflags;

bitflags! {
    /// Collision layer bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionLayers: u32 {
        /// Static level geometry
        const WORLD = 1 << 0;
        /// Player characters
        const PLAYER = 1 << 1;
        /// Enemy characters
        const ENEMY = 1 << 2;
        /// Projectiles (rockets, grenades)
        const PROJECTILE = 1 << 3;
        /// Trigger volumes (no physical response)
        const TRIGGER = 1 << 4;
        /// Pickups and collectibles
        const PICKUP = 1 << 5;
        /// Gibs and small physics debris
        const DEBRIS = 1 << 6;
    }
}

impl Default for CollisionLayers {
    fn default() -> Self {
        Self::WORLD
    }
}

impl CollisionLayers {
    /// Check if two parties should interact based on their layers and masks
    ///
    /// A's layer must be in B's mask AND B's layer must be in A's mask.
    pub fn should_collide(
        layer_a: CollisionLayers,
        mask_a: CollisionLayers,
        layer_b: CollisionLayers,
        mask_b: CollisionLayers,
    ) -> bool {
        layer_a.intersects(mask_b) && layer_b.intersects(mask_a)
    }
}
