pub(super) fn circles_touch(a: (f64, f64), a_radius: f64, b: (f64, f64), b_radius: f64) -> bool {
    (a.0 - b.0).hypot(a.1 - b.1) <= a_radius + b_radius
}
