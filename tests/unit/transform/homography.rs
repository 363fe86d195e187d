use super::*;

fn q(pts: [(f64, f64); 4]) -> Quad {
    Quad::new(
        Point::new(pts[0].0, pts[0].1),
        Point::new(pts[1].0, pts[1].1),
        Point::new(pts[2].0, pts[2].1),
        Point::new(pts[3].0, pts[3].1),
    )
}

fn close(a: Point, b: Point, tol: f64) -> bool {
    (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol
}

#[test]
fn solve_same_quad_is_identity() {
    let r = Quad::from_size(640.0, 480.0);
    let t = solve(&r, &r).unwrap();
    for (got, want) in t.m.iter().zip(Transform3x3::IDENTITY.m.iter()) {
        assert!((got - want).abs() < 1e-9, "{:?}", t.m);
    }
}

#[test]
fn solved_map_hits_every_destination_corner() {
    let src = Quad::from_size(1200.0, 800.0);
    let dst = q([(92.0, 0.0), (851.0, 0.0), (0.0, 36.0), (943.0, 36.0)]);
    let t = solve(&src, &dst).unwrap();
    assert_eq!(t.m[8], 1.0);
    for (s, d) in src.corners().into_iter().zip(dst.corners()) {
        let got = t.apply(s).unwrap();
        assert!(close(got, d, 1e-6), "{got:?} vs {d:?}");
    }
}

#[test]
fn forward_then_backward_recovers_source_points() {
    let src = q([(0.0, 0.0), (300.0, 10.0), (-5.0, 200.0), (310.0, 240.0)]);
    let dst = q([(100.0, 100.0), (1100.0, 80.0), (120.0, 700.0), (1050.0, 760.0)]);
    let fwd = solve(&src, &dst).unwrap();
    let back = solve(&dst, &src).unwrap();
    for p in [
        Point::new(0.0, 0.0),
        Point::new(150.0, 100.0),
        Point::new(299.0, 7.5),
        Point::new(40.0, 190.0),
    ] {
        let there = fwd.apply(p).unwrap();
        let again = back.apply(there).unwrap();
        assert!(close(p, again, 1e-6), "{p:?} -> {again:?}");
    }
}

#[test]
fn collinear_source_corners_are_degenerate() {
    let src = q([(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (5.0, 5.0)]);
    let dst = Quad::from_size(10.0, 10.0);
    let err = solve(&src, &dst).unwrap_err();
    assert!(matches!(err, MockupError::DegenerateGeometry(ref m) if m.starts_with("source quad")));
}

#[test]
fn collapsed_destination_is_degenerate_not_nan() {
    let src = Quad::from_size(10.0, 10.0);
    let p = Point::new(3.0, 3.0);
    let dst = Quad::new(p, p, p, p);
    let err = solve(&src, &dst).unwrap_err();
    assert!(matches!(err, MockupError::DegenerateGeometry(ref m) if m.starts_with("destination quad")));

    let three_on_a_line = q([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (20.0, -10.0)]);
    assert!(solve(&src, &three_on_a_line).is_err());
}

#[test]
fn small_quad_is_accepted_wherever_it_sits() {
    let src = Quad::from_size(3.0, 3.0);
    for (ox, oy) in [(0.0, 0.0), (3000.0, 3000.0), (-25_000.0, 90_000.0)] {
        let dst = q([(ox, oy), (ox + 3.0, oy), (ox, oy + 3.0), (ox + 3.0, oy + 3.0)]);
        let t = solve(&src, &dst).unwrap();
        let got = t.apply(Point::new(1.5, 1.5)).unwrap();
        assert!(close(got, Point::new(ox + 1.5, oy + 1.5), 1e-6), "{got:?}");
        let back = solve(&dst, &src).unwrap();
        assert!(back.apply(Point::new(ox, oy)).is_some());
    }
}

#[test]
fn non_finite_vertices_are_rejected() {
    let src = Quad::from_size(10.0, 10.0);
    let dst = q([(f64::NAN, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)]);
    assert!(solve(&src, &dst).is_err());
}

#[test]
fn inverse_undoes_the_map() {
    let dst = q([(10.0, 5.0), (90.0, 0.0), (0.0, 70.0), (100.0, 80.0)]);
    let t = solve_from_size(50.0, 40.0, &dst).unwrap();
    let inv = t.inverse().unwrap();
    let p = Point::new(12.5, 33.0);
    let back = inv.apply(t.apply(p).unwrap()).unwrap();
    assert!(close(p, back, 1e-9));

    let id = t.mul(&inv);
    for (got, want) in id.m.iter().zip(Transform3x3::IDENTITY.m.iter()) {
        assert!((got / id.m[8] - want).abs() < 1e-9);
    }
}

#[test]
fn singular_matrix_has_no_inverse() {
    let flat = Transform3x3 {
        m: [1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0],
    };
    assert!(matches!(
        flat.inverse(),
        Err(MockupError::DegenerateGeometry(_))
    ));
}

#[test]
fn from_affine_matches_kurbo() {
    let a = Affine::translate((30.0, -4.0)) * Affine::rotate(0.7) * Affine::scale(2.0);
    let t = Transform3x3::from_affine(a);
    assert!(t.is_affine());
    let p = Point::new(3.0, 9.0);
    assert!(close(t.apply(p).unwrap(), a * p, 1e-12));
}

#[test]
fn apply_at_infinity_is_none() {
    let t = Transform3x3 {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
    };
    assert!(t.apply(Point::new(-1.0, 0.0)).is_none());
    assert!(t.apply(Point::new(1.0, 0.0)).is_some());
}
