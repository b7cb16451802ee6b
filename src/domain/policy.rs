/// Directional block policy: which quadrant of a block lets bodies through.
///
/// A block facing `Left` is open at its upper-left quadrant; a block
/// facing `Right` is open at its upper-right quadrant. In block-relative
/// terms the open quadrant is always front-upper. Everything else is solid
/// and behaves like ordinary ground or wall.
///
/// ┌────────────┬─────────────┬─────────────┐
/// │ direction  │ upper-left  │ upper-right │
/// ├────────────┼─────────────┼─────────────┤
/// │ Left       │ PASS        │ solid       │
/// │ Right      │ solid       │ PASS        │
/// └────────────┴─────────────┴─────────────┘
/// Lower quadrants are solid for both directions.

use super::entity::Direction;
use super::sensor::{BlockProbe, Quadrant};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactClass {
    Solid,
    PassThrough,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DirectionalBlockPolicy {
    direction: Direction,
}

impl DirectionalBlockPolicy {
    pub fn new(direction: Direction) -> Self {
        DirectionalBlockPolicy { direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Classify a contact on one of the block's probes.
    pub fn classify(&self, probe: BlockProbe) -> ContactClass {
        match probe {
            BlockProbe::FrontUpper => ContactClass::PassThrough,
            BlockProbe::FrontLower | BlockProbe::BackUpper | BlockProbe::BackLower => ContactClass::Solid,
        }
    }

    /// Classify by absolute quadrant.
    pub fn classify_quadrant(&self, quadrant: Quadrant) -> ContactClass {
        self.classify(BlockProbe::at(quadrant, self.direction))
    }

    /// The one open quadrant, in world terms.
    pub fn open_quadrant(&self) -> Quadrant {
        BlockProbe::FrontUpper.quadrant(self.direction)
    }

    pub fn is_solid(&self, quadrant: Quadrant) -> bool {
        self.classify_quadrant(quadrant) == ContactClass::Solid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUADRANTS: [Quadrant; 4] = [
        Quadrant::UpperLeft,
        Quadrant::UpperRight,
        Quadrant::LowerLeft,
        Quadrant::LowerRight,
    ];

    #[test]
    fn left_block_opens_upper_left_only() {
        let p = DirectionalBlockPolicy::new(Direction::Left);
        assert_eq!(p.classify_quadrant(Quadrant::UpperLeft), ContactClass::PassThrough);
        assert_eq!(p.classify_quadrant(Quadrant::UpperRight), ContactClass::Solid);
        assert_eq!(p.classify_quadrant(Quadrant::LowerLeft), ContactClass::Solid);
        assert_eq!(p.classify_quadrant(Quadrant::LowerRight), ContactClass::Solid);
    }

    #[test]
    fn right_block_is_the_mirror() {
        let l = DirectionalBlockPolicy::new(Direction::Left);
        let r = DirectionalBlockPolicy::new(Direction::Right);
        let mirror = |q| match q {
            Quadrant::UpperLeft => Quadrant::UpperRight,
            Quadrant::UpperRight => Quadrant::UpperLeft,
            Quadrant::LowerLeft => Quadrant::LowerRight,
            Quadrant::LowerRight => Quadrant::LowerLeft,
        };
        for q in QUADRANTS {
            assert_eq!(l.classify_quadrant(q), r.classify_quadrant(mirror(q)));
        }
    }

    #[test]
    fn exactly_one_open_quadrant_per_direction() {
        for d in [Direction::Left, Direction::Right] {
            let p = DirectionalBlockPolicy::new(d);
            let open: Vec<_> = QUADRANTS.into_iter().filter(|&q| !p.is_solid(q)).collect();
            assert_eq!(open, vec![p.open_quadrant()]);
        }
    }
}
