//! Closed-form four-point homography solver.
//!
//! Matrices are row-major and act on column vectors `(x, y, 1)`:
//!
//! ```text
//! x' = (m0*x + m1*y + m2) / (m6*x + m7*y + m8)
//! y' = (m3*x + m4*y + m5) / (m6*x + m7*y + m8)
//! ```

use crate::foundation::core::{Affine, Point, Quad};
use crate::foundation::error::{MockupError, MockupResult};
use crate::foundation::math::{GEOMETRY_EPSILON, point_extent};

const SINGULAR_RATIO: f64 = 1e-14;

/// Projective map in homogeneous form, normalized so `m[8] == 1`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform3x3 {
    /// Row-major coefficients.
    pub m: [f64; 9],
}

impl Default for Transform3x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform3x3 {
    /// Identity map.
    pub const IDENTITY: Self = Self {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    /// Promote a 2D affine map.
    pub fn from_affine(a: Affine) -> Self {
        let [a0, b0, c0, d0, e0, f0] = a.as_coeffs();
        Self {
            m: [a0, c0, e0, b0, d0, f0, 0.0, 0.0, 1.0],
        }
    }

    /// Map a point. `None` when it lands on the line at infinity.
    pub fn apply(&self, p: Point) -> Option<Point> {
        let m = &self.m;
        let w = m[6] * p.x + m[7] * p.y + m[8];
        if w.abs() < f64::EPSILON {
            return None;
        }
        let x = (m[0] * p.x + m[1] * p.y + m[2]) / w;
        let y = (m[3] * p.x + m[4] * p.y + m[5]) / w;
        Some(Point::new(x, y))
    }

    /// `self * rhs`: apply `rhs` first, then `self`.
    pub fn mul(&self, rhs: &Self) -> Self {
        Self { m: mul3(&self.m, &rhs.m) }
    }

    /// Determinant.
    pub fn determinant(&self) -> f64 {
        det3(&self.m)
    }

    /// Adjugate (transposed cofactor matrix). Proportional to the inverse.
    pub fn adjugate(&self) -> Self {
        Self { m: adj3(&self.m) }
    }

    /// Inverse map, renormalized. Fails with `DegenerateGeometry` when singular.
    pub fn inverse(&self) -> MockupResult<Self> {
        // Hadamard bound: |det| <= product of row norms, with equality for orthogonal rows.
        let bound: f64 = self
            .m
            .chunks_exact(3)
            .map(|r| (r[0] * r[0] + r[1] * r[1] + r[2] * r[2]).sqrt())
            .product();
        let det = self.determinant();
        if !det.is_finite() || det.abs() <= SINGULAR_RATIO * bound {
            return Err(MockupError::degenerate(format!(
                "transform is singular (det={det:e})"
            )));
        }
        normalize(adj3(&self.m))
    }

    /// Whether every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.m.iter().all(|v| v.is_finite())
    }

    /// Whether the perspective row is `(0, 0, 1)`.
    pub fn is_affine(&self) -> bool {
        self.m[6] == 0.0 && self.m[7] == 0.0
    }
}

/// Solve the unique projective map taking `src` corners onto `dst` corners.
///
/// Corners correspond by label (`top_left` to `top_right` and so on). Any collinear 3-subset in
/// either quad is rejected with `DegenerateGeometry`; the result never holds NaN or infinity.
pub fn solve(src: &Quad, dst: &Quad) -> MockupResult<Transform3x3> {
    let s = basis_to_points(src).map_err(|e| prefix(e, "source quad"))?;
    let d = basis_to_points(dst).map_err(|e| prefix(e, "destination quad"))?;
    let t = normalize(mul3(&d, &adj3(&s)))?;
    Ok(t)
}

/// Map for a `width x height` buffer onto `dst`.
pub fn solve_from_size(width: f64, height: f64, dst: &Quad) -> MockupResult<Transform3x3> {
    solve(&Quad::from_size(width, height), dst)
}

// Matrix whose columns are A, B, C in homogeneous form, scaled so that it also takes (1,1,1)
// to D. Maps the projective basis onto the quad.
fn basis_to_points(q: &Quad) -> MockupResult<[f64; 9]> {
    let [a, b, c, d] = q.corners();
    if [a, b, c, d]
        .iter()
        .any(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(MockupError::degenerate("non-finite vertex"));
    }
    let extent = point_extent(&[a, b, c, d]);
    let tol = GEOMETRY_EPSILON * extent * extent;

    let m = [a.x, b.x, c.x, a.y, b.y, c.y, 1.0, 1.0, 1.0];
    let det = det3(&m);
    if det.abs() <= tol {
        return Err(MockupError::degenerate(
            "top_left, top_right and bottom_left are collinear",
        ));
    }

    // Each component is twice the signed area of the triangle with D replacing one vertex.
    let v = mul3v(&adj3(&m), [d.x, d.y, 1.0]);
    for (i, vi) in v.iter().enumerate() {
        if vi.abs() <= tol {
            return Err(MockupError::degenerate(format!(
                "bottom_right is collinear with two other vertices (component {i})"
            )));
        }
    }

    Ok(mul3(&m, &[v[0], 0.0, 0.0, 0.0, v[1], 0.0, 0.0, 0.0, v[2]]))
}

fn normalize(m: [f64; 9]) -> MockupResult<Transform3x3> {
    let scale = m.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let w = m[8];
    if !w.is_finite() || w.abs() <= f64::EPSILON * scale {
        return Err(MockupError::degenerate(format!(
            "homogeneous scale term vanished (m22={w:e})"
        )));
    }
    let out = Transform3x3 {
        m: m.map(|v| v / w),
    };
    if !out.is_finite() {
        return Err(MockupError::degenerate("transform has non-finite coefficients"));
    }
    Ok(out)
}

fn prefix(err: MockupError, what: &str) -> MockupError {
    match err {
        MockupError::DegenerateGeometry(msg) => MockupError::degenerate(format!("{what}: {msg}")),
        other => other,
    }
}

fn mul3(a: &[f64; 9], b: &[f64; 9]) -> [f64; 9] {
    let mut c = [0.0; 9];
    for i in 0..3 {
        for j in 0..3 {
            c[3 * i + j] = (0..3).map(|k| a[3 * i + k] * b[3 * k + j]).sum();
        }
    }
    c
}

fn mul3v(m: &[f64; 9], v: [f64; 3]) -> [f64; 3] {
    [
        m[0] * v[0] + m[1] * v[1] + m[2] * v[2],
        m[3] * v[0] + m[4] * v[1] + m[5] * v[2],
        m[6] * v[0] + m[7] * v[1] + m[8] * v[2],
    ]
}

fn adj3(m: &[f64; 9]) -> [f64; 9] {
    [
        m[4] * m[8] - m[5] * m[7],
        m[2] * m[7] - m[1] * m[8],
        m[1] * m[5] - m[2] * m[4],
        m[5] * m[6] - m[3] * m[8],
        m[0] * m[8] - m[2] * m[6],
        m[2] * m[3] - m[0] * m[5],
        m[3] * m[7] - m[4] * m[6],
        m[1] * m[6] - m[0] * m[7],
        m[0] * m[4] - m[1] * m[3],
    ]
}

fn det3(m: &[f64; 9]) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
        + m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[cfg(test)]
#[path = "../../tests/unit/transform/homography.rs"]
mod tests;
