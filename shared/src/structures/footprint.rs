//! Shape footprints: which local columns a ruin covers, which of them are walls,
//! and where the doorways are.
//!
//! Local coordinates are centred on the structure origin, `x` in `-half_width..=half_width`
//! and `z` in `-half_depth..=half_depth`. North is `-z`. All predicates are pure; they are
//! evaluated once per column for every ruin, so keep them allocation free.

use super::StructureShape;

/// Whether `(x, z)` is in the shape but at least one 4-neighbour is not.
/// Works for any membership predicate.
#[inline]
pub fn is_boundary_cell(contains: impl Fn(i32, i32) -> bool, x: i32, z: i32) -> bool {
    contains(x, z)
        && [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .iter()
            .any(|&(dx, dz)| !contains(x + dx, z + dz))
}

/// Membership test for a shape with the given full width/depth.
pub fn is_in_shape(local_x: i32, local_z: i32, width: i32, depth: i32, shape: StructureShape) -> bool {
    Footprint::new(shape, width, depth).contains(local_x, local_z)
}

/// Wall test for a shape with the given full width/depth.
pub fn is_on_shape_edge(local_x: i32, local_z: i32, width: i32, depth: i32, shape: StructureShape) -> bool {
    Footprint::new(shape, width, depth).is_edge(local_x, local_z)
}

/// Resolved outline of one shape at one size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub shape: StructureShape,
    pub half_width: i32,
    pub half_depth: i32,
}

impl Footprint {
    pub fn new(shape: StructureShape, width: i32, depth: i32) -> Self {
        let half_width = width.max(1) / 2;
        let half_depth = match shape {
            // Rectangles stretch along z
            StructureShape::Rectangle => (depth.max(1) * 3 / 2) / 2,
            _ => depth.max(1) / 2,
        };
        Self {
            shape,
            half_width,
            half_depth,
        }
    }

    /// Full extent along x
    pub fn width(&self) -> i32 {
        self.half_width * 2 + 1
    }

    /// Full extent along z
    pub fn depth(&self) -> i32 {
        self.half_depth * 2 + 1
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x.abs() <= self.half_width && z.abs() <= self.half_depth
    }

    #[inline]
    fn circle_radius(&self) -> i32 {
        self.half_width.min(self.half_depth)
    }

    /// Thickness of the T's north bar, counted from the north wall
    #[inline]
    fn tee_bar(&self) -> i32 {
        (self.depth() / 3).max(1)
    }

    #[inline]
    pub fn contains(&self, x: i32, z: i32) -> bool {
        if !self.in_bounds(x, z) {
            return false;
        }
        let (hw, hd) = (self.half_width, self.half_depth);

        match self.shape {
            StructureShape::Square | StructureShape::Rectangle => true,
            // West wing over the full depth plus south wing over the full width
            StructureShape::LShape => x <= 0 || z >= 0,
            StructureShape::TShape => {
                let stem = (hw / 2).max(1);
                z <= -hd + self.tee_bar() || x.abs() <= stem
            }
            StructureShape::Cross => {
                let bar = (hd / 3).max(1);
                let post = (hw / 3).max(1);
                z.abs() <= bar || x.abs() <= post
            }
            StructureShape::UShape => {
                let arm = (self.width() / 4).max(1);
                let base = (self.depth() / 3).max(1);
                // Courtyard open to the south
                let in_notch = x.abs() <= hw - arm && z >= -hd + base;
                !in_notch
            }
            StructureShape::Circle => {
                let r = self.circle_radius();
                x * x + z * z <= r * r
            }
        }
    }

    /// Wall columns.
    #[inline]
    pub fn is_edge(&self, x: i32, z: i32) -> bool {
        if !self.contains(x, z) {
            return false;
        }
        match self.shape {
            StructureShape::Square | StructureShape::Rectangle => {
                x.abs() == self.half_width || z.abs() == self.half_depth
            }
            StructureShape::Circle => {
                let r = self.circle_radius() as f32;
                let dist = ((x * x + z * z) as f32).sqrt();
                dist > r - 1.0
            }
            StructureShape::LShape | StructureShape::TShape | StructureShape::Cross | StructureShape::UShape => {
                is_boundary_cell(|a, b| self.contains(a, b), x, z)
            }
        }
    }

    /// Columns cut open for 2-wide doorways. Only meaningful on edge columns and
    /// only applied between local y 1 and [`DOORWAY_HEIGHT`](super::DOORWAY_HEIGHT).
    pub fn is_doorway(&self, x: i32, z: i32) -> bool {
        let (hw, hd) = (self.half_width, self.half_depth);
        let pair = |v: i32, start: i32| v == start || v == start + 1;

        match self.shape {
            StructureShape::Square | StructureShape::Rectangle | StructureShape::UShape => z == -hd && pair(x, 0),
            StructureShape::Circle => z < 0 && pair(x, 0),
            StructureShape::LShape => {
                let west = z == -hd && pair(x, -hw / 2);
                let east = x == hw && pair(z, hd / 2);
                west || east
            }
            StructureShape::TShape => {
                let stem_end = z == hd && pair(x, 0);
                // Bar ends only open up once the bar is thick enough to keep corners
                let bar = self.tee_bar();
                let bar_ends = bar >= 3 && x.abs() == hw && pair(z, -hd + 1);
                stem_end || bar_ends
            }
            StructureShape::Cross => {
                let north_south = z.abs() == hd && pair(x, 0);
                let east_west = x.abs() == hw && pair(z, 0);
                north_south || east_west
            }
        }
    }

    /// Every covered local column, row by row from the north-west corner.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (-self.half_depth..=self.half_depth)
            .flat_map(move |z| (-self.half_width..=self.half_width).map(move |x| (x, z)))
            .filter(move |&(x, z)| self.contains(x, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::StructureSize;

    fn footprint(shape: StructureShape, size: StructureSize) -> Footprint {
        let dims = size.dimensions();
        Footprint::new(shape, dims.width, dims.depth)
    }

    #[test]
    fn test_square_small() {
        let fp = footprint(StructureShape::Square, StructureSize::Small);
        assert_eq!((fp.width(), fp.depth()), (5, 5));
        assert_eq!(fp.cells().count(), 25);
        let edges = fp.cells().filter(|&(x, z)| fp.is_edge(x, z)).count();
        assert_eq!(edges, 16);
        assert!(!fp.is_edge(0, 0));
        assert!(fp.is_edge(-2, 1));
        assert!(!fp.contains(3, 0));
    }

    #[test]
    fn test_rectangle_stretches_depth() {
        let fp = footprint(StructureShape::Rectangle, StructureSize::Medium);
        assert_eq!(fp.width(), 9);
        // 9 * 1.5 = 13
        assert_eq!(fp.depth(), 13);
        assert!(fp.contains(0, 6));
        assert!(fp.is_edge(0, 6));
        assert!(!fp.contains(0, 7));
    }

    #[test]
    fn test_lshape_missing_quadrant() {
        let fp = footprint(StructureShape::LShape, StructureSize::Medium);
        assert!(fp.contains(-4, -4));
        assert!(fp.contains(4, 4));
        assert!(!fp.contains(3, -3));
        // Inner corner walls are closed
        assert!(fp.is_edge(0, -3));
        assert!(fp.is_edge(3, 0));
    }

    #[test]
    fn test_tshape_stem_narrower_than_bar() {
        let fp = footprint(StructureShape::TShape, StructureSize::Large);
        // Bar spans the full width at the north wall
        assert!(fp.contains(-7, -7));
        assert!(fp.contains(7, -7));
        // Stem only near the middle at the south end
        assert!(fp.contains(0, 7));
        assert!(!fp.contains(7, 7));
        assert!(!fp.contains(4, 7));
        assert!(fp.contains(3, 7));
    }

    #[test]
    fn test_cross_arms_centered() {
        let fp = footprint(StructureShape::Cross, StructureSize::Large);
        assert!(fp.contains(0, 7));
        assert!(fp.contains(7, 0));
        assert!(!fp.contains(7, 7));
        assert!(!fp.contains(-7, -7));
        assert!(fp.contains(0, 0));
        assert!(!fp.is_edge(0, 0));
    }

    #[test]
    fn test_ushape_notch_open_to_south() {
        let fp = footprint(StructureShape::UShape, StructureSize::Medium);
        // Courtyard
        assert!(!fp.contains(0, 0));
        assert!(!fp.contains(0, 4));
        // Base and arms
        assert!(fp.contains(0, -4));
        assert!(fp.contains(-4, 4));
        assert!(fp.contains(4, 4));
        // Inner face of the base wall borders the courtyard
        assert!(fp.is_edge(0, -2));
        assert!(!fp.is_edge(0, -3));
    }

    #[test]
    fn test_circle_radius() {
        let fp = footprint(StructureShape::Circle, StructureSize::Medium);
        assert!(fp.contains(4, 0));
        assert!(fp.contains(0, -4));
        assert!(!fp.contains(4, 4));
        assert!(!fp.contains(3, 3));
        assert!(fp.is_edge(4, 0));
        assert!(!fp.is_edge(0, 0));
    }

    #[test]
    fn test_free_functions_match_footprint() {
        for shape in StructureShape::ALL {
            let fp = Footprint::new(shape, 9, 9);
            for z in -8..=8 {
                for x in -6..=6 {
                    assert_eq!(is_in_shape(x, z, 9, 9, shape), fp.contains(x, z));
                    assert_eq!(is_on_shape_edge(x, z, 9, 9, shape), fp.is_edge(x, z));
                }
            }
        }
    }

    #[test]
    fn test_composite_edges_match_generic_detector() {
        for shape in StructureShape::ALL.iter().copied().filter(|s| s.is_composite()) {
            for size in StructureSize::ALL {
                let fp = footprint(shape, size);
                for (x, z) in fp.cells() {
                    assert_eq!(fp.is_edge(x, z), is_boundary_cell(|a, b| fp.contains(a, b), x, z));
                }
            }
        }
    }

    #[test]
    fn test_every_shape_has_a_doorway_on_its_walls() {
        for shape in StructureShape::ALL {
            for size in StructureSize::ALL {
                let fp = footprint(shape, size);
                let doors = fp
                    .cells()
                    .filter(|&(x, z)| fp.is_edge(x, z) && fp.is_doorway(x, z))
                    .count();
                assert!(doors >= 2, "{shape:?} {size:?} has {doors} door cells");
            }
        }
    }

    #[test]
    fn test_edges_are_inside() {
        for shape in StructureShape::ALL {
            let fp = Footprint::new(shape, 15, 15);
            for z in -12..=12 {
                for x in -9..=9 {
                    if fp.is_edge(x, z) {
                        assert!(fp.contains(x, z));
                        assert!(fp.in_bounds(x, z));
                    }
                }
            }
        }
    }
}
