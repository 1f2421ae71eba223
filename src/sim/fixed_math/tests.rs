use super::*;

fn close(a: FixedNum, b: FixedNum, tolerance: f64) -> bool {
    (a.to_f64() - b.to_f64()).abs() <= tolerance
}

#[test]
fn test_from_num_round_trips_within_one_lsb() {
    let lsb = 1.0 / 65536.0;
    for &x in &[0.0, 1.0, -1.0, 0.5, 3.14159, -2.71828, 1234.5678, -32767.25, 0.00001] {
        let back = FixedNum::from_num(x).to_f64();
        assert!((back - x).abs() <= lsb, "{} came back as {}", x, back);
    }
}

#[test]
fn test_from_num_rounds_to_nearest() {
    // 0.8 * 65536 = 52428.8
    assert_eq!(FixedNum::from_num(0.8).to_bits(), 52_429);
    assert_eq!(FixedNum::from_num(-0.8).to_bits(), -52_429);
}

#[test]
fn test_non_finite_input_maps_to_zero() {
    assert_eq!(FixedNum::from_num(f64::NAN), FixedNum::ZERO);
    assert_eq!(FixedNum::from_num(f64::INFINITY), FixedNum::ZERO);
}

#[test]
fn test_division_by_zero_returns_zero() {
    assert_eq!(FixedNum::from_int(7) / FixedNum::ZERO, FixedNum::ZERO);
    assert_eq!(-FixedNum::ONE / FixedNum::ZERO, FixedNum::ZERO);
}

#[test]
fn test_mul_and_div_are_inverse_up_to_rounding() {
    let pairs = [(3.5, 2.0), (-7.25, 0.5), (100.0, -3.0), (0.125, 9.75)];
    for &(a, b) in &pairs {
        let a = FixedNum::from_num(a);
        let b = FixedNum::from_num(b);
        let back = (a * b) / b;
        assert!((back.to_bits() - a.to_bits()).abs() <= 2, "{:?} * {:?} / {:?} = {:?}", a, b, b, back);
    }
}

#[test]
fn test_mul_rounds_half_up() {
    // 1 LSB * 0.5 = 0.5 LSB, rounds up to 1 LSB.
    assert_eq!((FixedNum::EPSILON * FixedNum::HALF).to_bits(), 1);
    assert_eq!(FixedNum::from_int(3) * FixedNum::from_int(4), FixedNum::from_int(12));
}

#[test]
fn test_overflow_wraps_instead_of_panicking() {
    let wrapped = FixedNum::MAX + FixedNum::EPSILON;
    assert_eq!(wrapped, FixedNum::MIN);

    let big = FixedNum::from_int(30_000);
    let product = big * big;
    let expected = ((30_000i64 * 30_000i64) << 16) as i32;
    assert_eq!(product.to_bits(), expected);
}

#[test]
fn test_sqrt() {
    assert_eq!(FixedNum::ZERO.sqrt(), FixedNum::ZERO);
    assert_eq!(FixedNum::from_int(-4).sqrt(), FixedNum::ZERO);
    assert!(close(FixedNum::from_int(4).sqrt(), FixedNum::from_int(2), 2.0 / 65536.0));
    assert!(close(FixedNum::from_num(2.0).sqrt(), FixedNum::from_num(std::f64::consts::SQRT_2), 0.0002));
    assert!(close(FixedNum::from_int(10_000).sqrt(), FixedNum::from_int(100), 0.001));
    assert!(close(FixedNum::from_num(0.25).sqrt(), FixedNum::HALF, 0.0002));
}

#[test]
fn test_floor_and_ceil() {
    let x = FixedNum::from_num(2.75);
    assert_eq!(x.floor(), FixedNum::from_int(2));
    assert_eq!(x.ceil(), FixedNum::from_int(3));

    let y = FixedNum::from_num(-2.25);
    assert_eq!(y.floor(), FixedNum::from_int(-3));
    assert_eq!(y.ceil(), FixedNum::from_int(-2));

    assert_eq!(FixedNum::from_int(5).floor(), FixedNum::from_int(5));
    assert_eq!(FixedNum::from_int(5).ceil(), FixedNum::from_int(5));
    assert_eq!(FixedNum::from_num(-0.5).to_int(), -1);
}

#[test]
fn test_vec2_length_and_normalize() {
    let v = FixedVec2::new(FixedNum::from_int(3), FixedNum::from_int(4));
    assert!(close(v.length(), FixedNum::from_int(5), 0.0002));

    let n = v.normalize();
    assert!(close(n.x, FixedNum::from_num(0.6), 0.0002));
    assert!(close(n.y, FixedNum::from_num(0.8), 0.0002));

    assert_eq!(FixedVec2::ZERO.normalize(), FixedVec2::ZERO);
}

#[test]
fn test_vec2_dot_cross_perp() {
    let a = FixedVec2::new(FixedNum::ONE, FixedNum::ZERO);
    let b = FixedVec2::new(FixedNum::ZERO, FixedNum::ONE);
    assert_eq!(a.dot(b), FixedNum::ZERO);
    assert_eq!(a.cross(b), FixedNum::ONE);
    assert_eq!(a.perp(), b);
}

#[test]
fn test_sine_table_key_points() {
    let tol = 0.01;
    assert_eq!(trig::sin(FixedNum::ZERO), FixedNum::ZERO);
    assert!(close(trig::sin(FixedNum::HALF_PI), FixedNum::ONE, tol));
    assert!(close(trig::sin(FixedNum::PI), FixedNum::ZERO, tol));
    assert!(close(trig::sin(-FixedNum::HALF_PI), -FixedNum::ONE, tol));
    assert!(close(trig::cos(FixedNum::ZERO), FixedNum::ONE, tol));
    assert!(close(trig::cos(FixedNum::PI), -FixedNum::ONE, tol));
}

#[test]
fn test_sine_lookup_truncates_to_table_step() {
    // One table step is 2π/1024 ≈ 402.1 raw units; anything below the first
    // boundary must map to entry 0.
    assert_eq!(trig::sin(FixedNum::from_bits(400)), FixedNum::ZERO);
    assert_ne!(trig::sin(FixedNum::from_bits(403)), FixedNum::ZERO);
}

#[test]
fn test_sine_is_periodic() {
    let angle = FixedNum::from_num(0.7);
    assert_eq!(trig::sin(angle), trig::sin(angle + FixedNum::TWO_PI));
    assert_eq!(trig::sin(angle), trig::sin(angle - FixedNum::TWO_PI));
}

#[test]
fn test_atan2_quadrants() {
    let tol = 0.01;
    let cases = [(1.0, 1.0), (1.0, -1.0), (-1.0, -1.0), (-1.0, 1.0), (0.5, 2.0), (-2.0, 0.25), (0.0, -3.0), (3.0, 0.0)];
    for &(y, x) in &cases {
        let got = trig::atan2(FixedNum::from_num(y), FixedNum::from_num(x));
        let expected = f64::atan2(y, x);
        assert!((got.to_f64() - expected).abs() <= tol, "atan2({}, {}) = {} expected {}", y, x, got, expected);
    }
    assert_eq!(trig::atan2(FixedNum::ZERO, FixedNum::ZERO), FixedNum::ZERO);
}

#[test]
fn test_serde_uses_raw_bits() {
    let x = FixedNum::from_num(1.5);
    let json = serde_json::to_string(&x).unwrap();
    assert_eq!(json, "98304");
    let back: FixedNum = serde_json::from_str(&json).unwrap();
    assert_eq!(back, x);
}
