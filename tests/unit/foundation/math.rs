use super::*;

#[test]
fn fnv_seeded_hash_is_stable() {
    let mut a = Fnv1a64::new_default();
    a.write_bytes(b"textblend");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_bytes(b"text");
    b.write_bytes(b"blend");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn mul_div255_variants_align() {
    for x in [0u16, 1, 127, 255] {
        for y in [0u16, 1, 127, 255] {
            assert_eq!(u16::from(mul_div255_u8(x, y)), mul_div255_u16(x, y));
        }
    }
}

#[test]
fn clamp_finite_rejects_nan_and_infinity() {
    assert_eq!(clamp_finite(1000.0, -10.0, 50.0), Some(50.0));
    assert_eq!(clamp_finite(-1000.0, -10.0, 50.0), Some(-10.0));
    assert_eq!(clamp_finite(f64::NAN, -10.0, 50.0), None);
    assert_eq!(clamp_finite(f64::INFINITY, -10.0, 50.0), None);
}

#[test]
fn gcd_reduces_common_ratios() {
    assert_eq!(gcd(1920, 1080), 120);
    assert_eq!(gcd(7, 13), 1);
    assert_eq!(gcd(0, 5), 5);
}
