//! Hex board geometry: coordinates, facings, firing arcs, and terrain.
//!
//! Coordinates are axial (`q`, `r`) on a flat-topped grid. Facing 0 points
//! north (`r - 1`) and facings advance clockwise. All geometry is integer
//! or fixed-point so results never depend on the host's float behavior.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::math::Fixed;

/// Axial hex coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct HexCoord {
    /// Column.
    pub q: i32,
    /// Row.
    pub r: i32,
}

impl HexCoord {
    /// Create a coordinate.
    #[must_use]
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Third cube component.
    #[must_use]
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Hex distance between two coordinates.
    #[must_use]
    pub fn distance(self, other: Self) -> i32 {
        let dq = self.q - other.q;
        let dr = self.r - other.r;
        (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
    }

    /// Neighbouring hex in the given direction.
    #[must_use]
    pub const fn neighbor(self, facing: Facing) -> Self {
        let (dq, dr) = facing.offset();
        Self::new(self.q + dq, self.r + dr)
    }

    /// Which arc of an observer at `self` facing `facing` contains `other`.
    ///
    /// The delta is rotated so the facing points north, then classified in
    /// cube space: the front arc is the 120° wedge bounded by the two forward
    /// hexside diagonals, the rear arc its mirror, and the rest splits by side.
    #[must_use]
    pub fn arc_to(self, facing: Facing, other: Self) -> Arc {
        let (mut x, mut z) = (other.q - self.q, other.r - self.r);
        let mut y = -x - z;
        if x == 0 && z == 0 {
            return Arc::Front;
        }
        // Rotate counter-clockwise once per facing step.
        for _ in 0..facing.index() {
            (x, y, z) = (-y, -z, -x);
        }
        if y >= 0 && z <= 0 {
            Arc::Front
        } else if y <= 0 && z >= 0 {
            Arc::Rear
        } else if x < 0 {
            Arc::Left
        } else {
            Arc::Right
        }
    }

    /// Hexes on the straight line from `self` to `other`, excluding `self`
    /// and including `other`.
    ///
    /// Uses fixed-point cube interpolation with a small nudge so lines along
    /// hexside boundaries resolve the same way on every platform.
    #[must_use]
    pub fn line_to(self, other: Self) -> Vec<Self> {
        let n = self.distance(other);
        if n == 0 {
            return Vec::new();
        }
        let nudge = Fixed::from_num(1) / Fixed::from_num(1_000_000);
        let (aq, ar) = (Fixed::from_num(self.q) + nudge, Fixed::from_num(self.r) + nudge);
        let (bq, br) = (Fixed::from_num(other.q) + nudge, Fixed::from_num(other.r) + nudge);
        let steps = Fixed::from_num(n);

        (1..=n)
            .map(|i| {
                let t = Fixed::from_num(i) / steps;
                let q = aq + (bq - aq) * t;
                let r = ar + (br - ar) * t;
                cube_round(q, r)
            })
            .collect()
    }
}

/// Round fractional axial coordinates to the containing hex.
fn cube_round(q: Fixed, r: Fixed) -> HexCoord {
    let s = -q - r;
    let (mut rq, mut rr, rs) = (q.round(), r.round(), s.round());
    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();

    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    HexCoord::new(rq.to_num::<i32>(), rr.to_num::<i32>())
}

/// One of the six hexside facings, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Facing(u8);

impl Facing {
    /// North.
    pub const NORTH: Self = Self(0);

    /// Create a facing, wrapping values past 5.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index % 6)
    }

    /// Numeric facing 0-5.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Rotate clockwise by `steps` hexsides.
    #[must_use]
    pub const fn rotated(self, steps: u8) -> Self {
        Self::new(self.0 + steps % 6)
    }

    /// Facing pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        self.rotated(3)
    }

    /// Axial step for one hex in this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self.0 {
            0 => (0, -1),
            1 => (1, -1),
            2 => (1, 0),
            3 => (0, 1),
            4 => (-1, 1),
            _ => (-1, 0),
        }
    }
}

/// Firing arc relative to a unit's facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arc {
    /// Forward 120° wedge.
    Front,
    /// Left flank.
    Left,
    /// Right flank.
    Right,
    /// Rear 120° wedge.
    Rear,
}

/// Terrain occupying a hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Terrain {
    /// Open ground.
    #[default]
    Clear,
    /// Broken ground; harder to stand up in.
    Rough,
    /// Light woods.
    LightWoods,
    /// Heavy woods.
    HeavyWoods,
    /// Water of the given depth.
    Water(u8),
    /// Collapsed buildings.
    Rubble,
}

impl Terrain {
    /// Contribution to the woods count that blocks line of sight.
    #[must_use]
    pub const fn woods_density(self) -> i32 {
        match self {
            Terrain::LightWoods => 1,
            Terrain::HeavyWoods => 2,
            _ => 0,
        }
    }
}

/// A single map hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hex {
    /// Terrain type.
    pub terrain: Terrain,
    /// Ground level.
    pub elevation: i32,
}

impl Hex {
    /// Create a hex.
    #[must_use]
    pub const fn new(terrain: Terrain, elevation: i32) -> Self {
        Self { terrain, elevation }
    }
}

/// Sparse battle map. Hexes never set read as clear ground at level 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleMap {
    hexes: HashMap<HexCoord, Hex>,
}

/// Intervening woods points at which line of sight is blocked.
pub const WOODS_LOS_LIMIT: i32 = 3;

/// Height of a standing mech above its hex, in levels.
pub const MECH_HEIGHT: i32 = 1;

impl BattleMap {
    /// Create an empty (all clear) map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contents of a hex.
    pub fn set(&mut self, coord: HexCoord, hex: Hex) {
        self.hexes.insert(coord, hex);
    }

    /// Builder form of [`BattleMap::set`].
    #[must_use]
    pub fn with_hex(mut self, coord: HexCoord, hex: Hex) -> Self {
        self.set(coord, hex);
        self
    }

    /// Contents of a hex.
    #[must_use]
    pub fn hex(&self, coord: HexCoord) -> Hex {
        self.hexes.get(&coord).copied().unwrap_or_default()
    }

    /// Hexes between `from` and `to`, excluding `from` and including `to`.
    #[must_use]
    pub fn intervening_hexes(&self, from: HexCoord, to: HexCoord) -> Vec<(HexCoord, Hex)> {
        from.line_to(to)
            .into_iter()
            .map(|coord| (coord, self.hex(coord)))
            .collect()
    }

    /// Whether a unit at `from` can see a unit at `to`.
    ///
    /// Blocked by any hex strictly between them that rises above both
    /// units' heights, or by too many intervening woods.
    #[must_use]
    pub fn has_line_of_sight(&self, from: HexCoord, to: HexCoord) -> bool {
        let line = from.line_to(to);
        let Some((_, between)) = line.split_last() else {
            return true;
        };
        let eye = self.hex(from).elevation + MECH_HEIGHT;
        let target = self.hex(to).elevation + MECH_HEIGHT;
        let ceiling = eye.max(target);

        let mut woods = 0;
        for coord in between {
            let hex = self.hex(*coord);
            if hex.elevation > ceiling {
                return false;
            }
            woods += hex.terrain.woods_density();
        }
        woods < WOODS_LOS_LIMIT
    }
}
