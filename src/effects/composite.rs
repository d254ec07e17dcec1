//! Premultiplied RGBA8 compositing kernels.
//!
//! Every kernel is Porter-Duff source-over with the blend function applied to unpremultiplied
//! channels:
//!
//! ```text
//! out_a = sa + da * (1 - sa)
//! out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
//! ```
//!
//! With `B(s, d) = s` this reduces to plain source-over, so `Normal` takes an integer fast path.

use crate::foundation::math::mul_div255_u8;
use crate::layer::model::BlendMode;

/// Composite `src` over `dst` in place, scaling `src` by `opacity` and combining colors with
/// `mode`. Both buffers are premultiplied RGBA8 of the same dimensions.
pub fn composite_in_place(dst: &mut [u8], src: &[u8], opacity: f32, mode: BlendMode) {
    debug_assert_eq!(dst.len(), src.len());
    debug_assert!(dst.len().is_multiple_of(4));

    // Mode dispatch happens once per layer; each arm monomorphizes its own kernel.
    match mode {
        BlendMode::Normal => over_opacity(dst, src, opacity),
        BlendMode::Multiply => blend_kernel(dst, src, opacity, |s, d| s * d),
        BlendMode::Screen => blend_kernel(dst, src, opacity, |s, d| s + d - s * d),
        BlendMode::Overlay => blend_kernel(dst, src, opacity, |s, d| hard_light(d, s)),
        BlendMode::Darken => blend_kernel(dst, src, opacity, f32::min),
        BlendMode::Lighten => blend_kernel(dst, src, opacity, f32::max),
        BlendMode::ColorDodge => blend_kernel(dst, src, opacity, |s, d| {
            if d <= 0.0 {
                0.0
            } else if s >= 1.0 {
                1.0
            } else {
                (d / (1.0 - s)).min(1.0)
            }
        }),
        BlendMode::ColorBurn => blend_kernel(dst, src, opacity, |s, d| {
            if d >= 1.0 {
                1.0
            } else if s <= 0.0 {
                0.0
            } else {
                1.0 - ((1.0 - d) / s).min(1.0)
            }
        }),
        BlendMode::HardLight => blend_kernel(dst, src, opacity, hard_light),
        BlendMode::SoftLight => blend_kernel(dst, src, opacity, soft_light),
        BlendMode::Difference => blend_kernel(dst, src, opacity, |s, d| (d - s).abs()),
        BlendMode::Exclusion => blend_kernel(dst, src, opacity, |s, d| d + s - 2.0 * d * s),
    }
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

fn soft_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        d - (1.0 - 2.0 * s) * d * (1.0 - d)
    } else {
        let g = if d <= 0.25 {
            ((16.0 * d - 12.0) * d + 4.0) * d
        } else {
            d.sqrt()
        };
        d + (2.0 * s - 1.0) * (g - d)
    }
}

fn opacity_u8(opacity: f32) -> u16 {
    if !opacity.is_finite() {
        return 0;
    }
    (opacity.clamp(0.0, 1.0) * 255.0).round() as u16
}

fn over_opacity(dst: &mut [u8], src: &[u8], opacity: f32) {
    let op = opacity_u8(opacity);
    if op == 0 {
        return;
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255 - u16::from(sa);
        for c in 0..4 {
            let sc = if c == 3 {
                sa
            } else {
                mul_div255_u8(u16::from(s[c]), op)
            };
            d[c] = sc.saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
}

fn unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn unpremultiply(p: f32, a: f32) -> f32 {
    if a > 0.0 { (p / a).clamp(0.0, 1.0) } else { 0.0 }
}

#[inline(always)]
fn blend_kernel<F>(dst: &mut [u8], src: &[u8], opacity: f32, blend_fn: F)
where
    F: Fn(f32, f32) -> f32,
{
    if opacity_u8(opacity) == 0 {
        return;
    }
    let opacity = opacity.clamp(0.0, 1.0);

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = unit(s[3]) * opacity;
        if sa <= 0.0 {
            continue;
        }
        let da = unit(d[3]);

        for c in 0..3 {
            let sp = unit(s[c]) * opacity;
            let dp = unit(d[c]);
            let b = blend_fn(unpremultiply(sp, sa), unpremultiply(dp, da)).clamp(0.0, 1.0);
            d[c] = to_u8(sp * (1.0 - da) + dp * (1.0 - sa) + b * sa * da);
        }
        d[3] = to_u8(sa + da * (1.0 - sa));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
