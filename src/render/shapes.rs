//! Vertex generation for resolved outlines

use glam::Vec2;

use super::vertex::Vertex;
use crate::geom::LineSegment;

/// Two triangles per segment, `width` across, colour blending from `colour`
/// at `a` to `gradient` at `b`
pub fn line_vertices(segments: &[LineSegment]) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(segments.len() * 6);

    for segment in segments {
        let a = segment.a.to_glam();
        let b = segment.b.to_glam();
        let half = segment.width.to_f32() * 0.5;

        // Direction from a to b
        let dir = (b - a).normalize_or_zero();
        if dir == Vec2::ZERO {
            continue;
        }
        // Perpendicular for width
        let perp = Vec2::new(-dir.y, dir.x) * half;

        // Quad corners
        let a1 = a + perp;
        let a2 = a - perp;
        let b1 = b + perp;
        let b2 = b - perp;

        vertices.push(Vertex::at(a1, segment.colour));
        vertices.push(Vertex::at(a2, segment.colour));
        vertices.push(Vertex::at(b1, segment.gradient));

        vertices.push(Vertex::at(b1, segment.gradient));
        vertices.push(Vertex::at(a2, segment.colour));
        vertices.push(Vertex::at(b2, segment.gradient));
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{FVec2, Fixed};
    use glam::Vec4;

    fn segment(a: FVec2, b: FVec2) -> LineSegment {
        LineSegment {
            a,
            b,
            colour: Vec4::ONE,
            gradient: Vec4::new(1.0, 0.0, 0.0, 1.0),
            width: Fixed::from_int(2),
            z: 0,
            tag: 0,
        }
    }

    #[test]
    fn test_quad_per_segment() {
        let v = line_vertices(&[segment(FVec2::ZERO, FVec2::from_ints(10, 0))]);
        assert_eq!(v.len(), 6);
        assert_eq!(v[0].position, [0.0, 1.0]);
        assert_eq!(v[1].position, [0.0, -1.0]);
        assert_eq!(v[5].position, [10.0, -1.0]);
        assert_eq!(v[2].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(Vertex::as_bytes(&v).len(), 6 * 24);
    }

    #[test]
    fn test_degenerate_segment_skipped() {
        let p = FVec2::from_ints(3, 3);
        assert!(line_vertices(&[segment(p, p)]).is_empty());
    }
}
