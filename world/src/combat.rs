//! Hit and damage rules applied by melee attacks.

use crate::Unit;

/// Decides whether an attack connects with its target.
pub trait HitRule {
    /// Returns `true` when the attack against `target` hits.
    fn hits(&self, target: &Unit) -> bool;
}

/// Decides how much damage a connecting attack deals.
pub trait DamageRule {
    /// Damage dealt to `target`.
    fn damage(&self, target: &Unit) -> u32;
}

impl<F> HitRule for F
where
    F: Fn(&Unit) -> bool,
{
    fn hits(&self, target: &Unit) -> bool {
        self(target)
    }
}

impl<F> DamageRule for F
where
    F: Fn(&Unit) -> u32,
{
    fn damage(&self, target: &Unit) -> u32 {
        self(target)
    }
}

/// Placeholder rule under which every attack hits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlwaysHit;

impl HitRule for AlwaysHit {
    fn hits(&self, _target: &Unit) -> bool {
        true
    }
}

/// Placeholder rule dealing the same damage on every hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedDamage(pub u32);

impl FixedDamage {
    /// Damage dealt by the default melee attack.
    pub const MELEE: Self = Self(10);
}

impl Default for FixedDamage {
    fn default() -> Self {
        Self::MELEE
    }
}

impl DamageRule for FixedDamage {
    fn damage(&self, _target: &Unit) -> u32 {
        self.0
    }
}

/// Applies an attack to `target`, returning the damage dealt on a hit.
pub(crate) fn resolve_melee<H, D>(target: &mut Unit, hit: &H, damage: &D) -> Option<u32>
where
    H: HitRule + ?Sized,
    D: DamageRule + ?Sized,
{
    if !hit.hits(target) {
        return None;
    }
    let amount = damage.damage(target);
    target.update_hp(-i32::try_from(amount).unwrap_or(i32::MAX));
    Some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_always_hit_for_ten() {
        let target = Unit::new("B");
        assert!(AlwaysHit.hits(&target));
        assert_eq!(FixedDamage::default().damage(&target), 10);
    }

    #[test]
    fn closures_act_as_rules() {
        let mut target = Unit::new("B");
        let only_healthy = |unit: &Unit| unit.current_hp() > 95;
        let scaled = |unit: &Unit| u32::try_from(unit.current_hp() / 20).unwrap_or(0);

        assert_eq!(resolve_melee(&mut target, &only_healthy, &scaled), Some(5));
        assert_eq!(target.current_hp(), 95);
        assert_eq!(resolve_melee(&mut target, &only_healthy, &scaled), None);
        assert_eq!(target.current_hp(), 95);
    }

    #[test]
    fn oversized_damage_kills_without_overflow() {
        let mut target = Unit::new("B");
        assert_eq!(
            resolve_melee(&mut target, &AlwaysHit, &FixedDamage(u32::MAX)),
            Some(u32::MAX)
        );
        assert!(!target.is_alive());
        assert_eq!(target.current_hp(), 0);
    }
}
