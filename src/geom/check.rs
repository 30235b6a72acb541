//! Point and ball hit tests against resolved primitives

use super::flags::ShapeFlag;
use super::iterate::{Primitive, ResolvedShape};
use super::node::NgonStyle;
use crate::math::{FVec2, Fixed};

/// Geometry being tested against a shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckShape {
    Point(FVec2),
    Ball { centre: FVec2, radius: Fixed },
}

impl CheckShape {
    pub fn centre(self) -> FVec2 {
        match self {
            Self::Point(p) => p,
            Self::Ball { centre, .. } => centre,
        }
    }

    pub fn radius(self) -> Fixed {
        match self {
            Self::Point(_) => Fixed::ZERO,
            Self::Ball { radius, .. } => radius,
        }
    }
}

/// Collision query: geometry, the flags of interest and the n-gon test mode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckQuery {
    pub shape: CheckShape,
    pub mask: ShapeFlag,
    /// Use the radius bound for every n-gon
    pub legacy: bool,
}

impl CheckQuery {
    pub fn point(point: FVec2, mask: ShapeFlag) -> Self {
        Self {
            shape: CheckShape::Point(point),
            mask,
            legacy: false,
        }
    }

    pub fn ball(centre: FVec2, radius: Fixed, mask: ShapeFlag) -> Self {
        Self {
            shape: CheckShape::Ball { centre, radius },
            mask,
            legacy: false,
        }
    }

    pub fn legacy(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }
}

/// Does the query geometry touch this primitive? Flags are not consulted.
pub fn hit(shape: &ResolvedShape, query: &CheckQuery) -> bool {
    let local = shape.transform.apply_inverse(query.shape.centre());
    let r = query.shape.radius();
    match shape.primitive {
        Primitive::Ball { radius, inner } => ball_hit(local, r, radius, inner),
        Primitive::Box { half_extents } => box_hit(local, r, half_extents),
        Primitive::Ngon {
            sides,
            radius,
            inner,
            style,
            ..
        } => {
            if query.legacy || style != NgonStyle::Polygon || sides < 3 {
                ball_hit(local, r, radius, inner)
            } else {
                polygon_hit(local, r, sides, radius, inner)
            }
        }
        Primitive::Line { .. } | Primitive::Attachment { .. } => false,
    }
}

/// Distance from the centre within [inner - r, radius + r]
fn ball_hit(local: FVec2, r: Fixed, radius: Fixed, inner: Fixed) -> bool {
    let d2 = local.length_squared();
    let outer = radius + r;
    if d2 > outer * outer {
        return false;
    }
    let hole = inner - r;
    hole <= Fixed::ZERO || d2 >= hole * hole
}

fn box_hit(local: FVec2, r: Fixed, half: FVec2) -> bool {
    if r == Fixed::ZERO {
        return local.x.abs() <= half.x && local.y.abs() <= half.y;
    }
    let closest = local.clamp(-half, half);
    local.distance_squared(closest) <= r * r
}

/// Regular polygon with a vertex on the local +x axis. The query is folded
/// into one edge sector and compared against the apothem.
fn polygon_hit(local: FVec2, r: Fixed, sides: u32, radius: Fixed, inner: Fixed) -> bool {
    if !ball_hit(local, r, radius, inner) {
        return false;
    }
    let distance = local.length();
    if distance == Fixed::ZERO {
        return true;
    }
    let sector = Fixed::TAU / Fixed::from_int(sides as i32);
    let half_sector = sector >> 1;
    let mut theta = local.angle();
    if theta.is_negative() {
        theta += Fixed::TAU;
    }
    let k = (theta / sector).to_int();
    let phi = theta - sector * Fixed::from_int(k) - half_sector;
    let apothem = radius * half_sector.cos();
    distance * phi.cos() <= apothem + r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::node::{NgonStyle, ball, ngon};
    use crate::geom::{Affine, Parameters, resolve};

    fn one(node: impl Into<crate::geom::Node>, at: Affine) -> ResolvedShape {
        resolve(&node.into(), &Parameters::new(), at)
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_ball_inner_outer() {
        let shape = one(ball(10).inner(4), Affine::IDENTITY);
        let hits = |x: i32| hit(&shape, &CheckQuery::point(FVec2::from_ints(x, 0), ShapeFlag::ALL));
        assert!(!hits(0));
        assert!(!hits(3));
        assert!(hits(4));
        assert!(hits(7));
        assert!(hits(10));
        assert!(!hits(11));
    }

    #[test]
    fn test_ball_query_widens() {
        let shape = one(ball(10), Affine::new(FVec2::from_ints(100, 100), Fixed::ZERO));
        let q = CheckQuery::ball(FVec2::from_ints(100, 114), Fixed::from_int(5), ShapeFlag::ALL);
        assert!(hit(&shape, &q));
        let q = CheckQuery::ball(FVec2::from_ints(100, 116), Fixed::from_int(5), ShapeFlag::ALL);
        assert!(!hit(&shape, &q));
    }

    #[test]
    fn test_box_under_rotation() {
        let at = Affine::new(FVec2::from_ints(50, 50), Fixed::HALF_PI);
        let shape = one(
            crate::geom::node::box_shape(FVec2::from_ints(20, 2)),
            at,
        );
        // Rotated a quarter turn, the long axis is vertical
        assert!(hit(&shape, &CheckQuery::point(FVec2::from_ints(50, 68), ShapeFlag::ALL)));
        assert!(!hit(&shape, &CheckQuery::point(FVec2::from_ints(68, 50), ShapeFlag::ALL)));
        // Ball query reaching the short side
        let q = CheckQuery::ball(FVec2::from_ints(55, 50), Fixed::from_int(4), ShapeFlag::ALL);
        assert!(hit(&shape, &q));
    }

    #[test]
    fn test_square_apothem_vs_legacy() {
        // Vertices sit on the axes; edge normals point along the diagonals
        // where the apothem is ≈ 7.07
        let shape = one(ngon(4, 10), Affine::IDENTITY);
        let point = |x: i32, y: i32| CheckQuery::point(FVec2::from_ints(x, y), ShapeFlag::ALL);
        assert!(hit(&shape, &point(3, 3)));
        assert!(hit(&shape, &point(9, 0)));
        assert!(!hit(&shape, &point(6, 6)));
        // The radius bound accepts anything within 10
        assert!(hit(&shape, &point(6, 6).legacy(true)));
        assert!(!hit(&shape, &point(8, 8).legacy(true)));
    }

    #[test]
    fn test_star_uses_radius_bound() {
        let shape = one(ngon(4, 10).kind(NgonStyle::Polystar), Affine::IDENTITY);
        assert!(hit(&shape, &CheckQuery::point(FVec2::from_ints(6, 6), ShapeFlag::ALL)));
    }
}
