//! Test fixtures and helpers.
//!
//! Pre-built units, weapons and maps for consistent testing. Every mech
//! is built from the standard rules so structure values match the tables.

use mech_core::map::{BattleMap, Facing, Hex, HexCoord, Terrain};
use mech_core::rules::StandardRules;
use mech_core::to_hit::{AttackDeclaration, Weapon};
use mech_core::unit::{Component, Part, PartLocation, Pilot, Unit, UnitBuilder, UnitId, UnitKind};

/// Standard rules.
#[must_use]
pub fn rules() -> StandardRules {
    StandardRules::default()
}

/// Regular pilot: gunnery 4, piloting 5.
#[must_use]
pub fn regular_pilot() -> Pilot {
    Pilot::new("Regular", 4, 5)
}

/// Fully armored mech with standard internals and a regular pilot,
/// deployed at `position` facing `facing`.
#[must_use]
pub fn mech_at(id: u32, tonnage: u32, position: HexCoord, facing: Facing) -> Unit {
    UnitBuilder::mech(UnitId(id), format!("Mech {id}"), tonnage, &rules())
        .with_standard_internals()
        .with_pilot(regular_pilot())
        .deployed_at(position, facing)
        .build()
}

/// Standard mech at the origin facing north.
#[must_use]
pub fn standard_mech(id: u32, tonnage: u32) -> Unit {
    mech_at(id, tonnage, HexCoord::new(0, 0), Facing::NORTH)
}

/// Mech carrying an AC/20 bin in the right torso and SRM ammo in the left.
#[must_use]
pub fn ammo_mech(id: u32) -> Unit {
    UnitBuilder::mech(UnitId(id), "Hunchback", 50, &rules())
        .with_standard_internals()
        .with_component(PartLocation::RightTorso, Component::ammo("AC/20 Ammo", 0, 5, 20))
        .with_component(PartLocation::LeftTorso, Component::ammo("SRM-4 Ammo", 0, 25, 2))
        .with_pilot(regular_pilot())
        .deployed_at(HexCoord::new(0, 0), Facing::NORTH)
        .build()
}

/// Unit whose center torso has 2 armor and 8 structure and nothing else.
#[must_use]
pub fn thin_center_torso() -> Unit {
    UnitBuilder::blank(UnitId(1), "Thin", UnitKind::Mech, 50)
        .with_part(Part::new(PartLocation::CenterTorso, 2, 0, 8))
        .build()
}

/// Medium laser: no minimum range, 3/6/9.
#[must_use]
pub fn medium_laser() -> Weapon {
    Weapon {
        name: "Medium Laser".to_string(),
        min_range: 0,
        short_range: 3,
        medium_range: 6,
        long_range: 9,
        damage: 5,
        heat: 3,
    }
}

/// LRM-10: minimum range 6, 7/14/21.
#[must_use]
pub fn lrm_10() -> Weapon {
    Weapon {
        name: "LRM-10".to_string(),
        min_range: 6,
        short_range: 7,
        medium_range: 14,
        long_range: 21,
        damage: 1,
        heat: 4,
    }
}

/// Plain attack with `weapon` at the primary target.
#[must_use]
pub fn attack(weapon: Weapon) -> AttackDeclaration {
    AttackDeclaration {
        weapon,
        aimed_location: None,
        is_secondary: false,
    }
}

/// Map with a strip of woods north of the origin: light at (0,-1),
/// heavy at (0,-2).
#[must_use]
pub fn woods_map() -> BattleMap {
    BattleMap::new()
        .with_hex(HexCoord::new(0, -1), Hex::new(Terrain::LightWoods, 0))
        .with_hex(HexCoord::new(0, -2), Hex::new(Terrain::HeavyWoods, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mech_core::unit::ComponentKind;

    #[test]
    fn test_standard_mech_is_complete() {
        let mech = standard_mech(1, 55);
        assert_eq!(mech.parts.len(), 8);
        assert!(mech.has_component(ComponentKind::Gyro));
        assert!(mech.is_deployed());
        assert!(mech.has_active_pilot());
    }

    #[test]
    fn test_thin_center_torso() {
        let unit = thin_center_torso();
        let ct = unit.part(PartLocation::CenterTorso).unwrap();
        assert_eq!((ct.armor, ct.structure), (2, 8));
    }
}
