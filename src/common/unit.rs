//! Unit conversion utilities.
//!
//! RTF measures geometry in twips (1/1440 inch) and font sizes in half
//! points. The generated markup uses device-independent pixels (1/96 inch).

pub const TWIPS_PER_INCH: f64 = 1440.0;
pub const TWIPS_PER_POINT: f64 = 20.0;
pub const PX_PER_INCH: f64 = 96.0;
pub const POINTS_PER_INCH: f64 = 72.0;

/// Twips to device-independent pixels: `px = twips / 1440 * 96`.
#[inline]
pub fn twip_to_px(twips: f64) -> f64 {
    twips / TWIPS_PER_INCH * PX_PER_INCH
}

/// Twips to pixels, clamped to be non-negative.
#[inline]
pub fn twip_to_positive_px(twips: f64) -> f64 {
    twip_to_px(twips).max(0.0)
}

/// Twips to pixels for border- and padding-like metrics.
///
/// A positive source value never produces a width below one pixel, so a
/// thin-but-present border stays visible.
#[inline]
pub fn twip_to_positive_visible_px(twips: f64) -> f64 {
    let px = twip_to_positive_px(twips);
    if twips > 0.0 && px < 1.0 { 1.0 } else { px }
}

/// Pixels back to twips, rounded to the nearest twip.
#[inline]
pub fn px_to_twip_rounded(px: f64) -> i64 {
    (px / PX_PER_INCH * TWIPS_PER_INCH).round() as i64
}

/// Points to pixels.
#[inline]
pub fn pt_to_px(points: f64) -> f64 {
    points / POINTS_PER_INCH * PX_PER_INCH
}

/// Twips to points.
#[inline]
pub fn twip_to_pt(twips: f64) -> f64 {
    twips / TWIPS_PER_POINT
}

/// Half points (the unit of `\fs`) to pixels.
#[inline]
pub fn half_points_to_px(half_points: i64) -> f64 {
    pt_to_px(half_points as f64 / 2.0)
}

/// Append a pixel value rounded to two decimals, without a trailing `.0`.
pub fn push_px(out: &mut String, px: f64) {
    let rounded = (px * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        out.push_str(buf.format(rounded as i64));
    } else {
        let mut buf = ryu::Buffer::new();
        out.push_str(buf.format(rounded));
    }
}

/// Format a pixel value the way [`push_px`] appends it.
pub fn format_px(px: f64) -> String {
    let mut out = String::new();
    push_px(&mut out, px);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_twip_to_px() {
        assert_eq!(twip_to_px(1440.0), 96.0);
        assert_eq!(twip_to_px(720.0), 48.0);
        assert_eq!(twip_to_positive_px(-720.0), 0.0);
    }

    #[test]
    fn test_visible_px_floor() {
        assert_eq!(twip_to_positive_visible_px(5.0), 1.0);
        assert_eq!(twip_to_positive_visible_px(0.0), 0.0);
        assert_eq!(twip_to_positive_visible_px(-5.0), 0.0);
        assert_eq!(twip_to_positive_visible_px(30.0), 2.0);
    }

    #[test]
    fn test_half_points() {
        assert_eq!(half_points_to_px(24), 16.0);
    }

    #[test]
    fn test_format_px() {
        assert_eq!(format_px(16.0), "16");
        assert_eq!(format_px(13.333333), "13.33");
        assert_eq!(format_px(-0.5), "-0.5");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_twip_round_trip(twips in -1_000_000i64..1_000_000i64) {
            let back = px_to_twip_rounded(twip_to_px(twips as f64));
            prop_assert!((back - twips).abs() <= 1, "{} came back as {}", twips, back);
        }
    }
}
