//! Bilinear resampling of feature maps between pyramid scales.

use crate::feature::{FeatureMap, FeatureView, FeatureViewMut};
use crate::trace::trace_span;
use crate::util::math::bilinear_taps;
use crate::util::HogLiteResult;

/// Resamples `src` to the size of `dst`.
///
/// Both maps must share the feature layout. Equal sizes take a plain row copy;
/// otherwise every output cell blends the full vectors of its four nearest
/// source cells.
pub fn resize_features_into(src: FeatureView<'_>, dst: &mut FeatureViewMut<'_>) -> HogLiteResult<()> {
    let dst_width = dst.width();
    let dst_height = dst.height();
    dst.ensure_shape("resize destination", dst_width, dst_height, src.feature_size())?;
    let f = src.feature_size().channels();

    if src.width() == dst_width && src.height() == dst_height {
        for y in 0..dst_height {
            dst.row_mut_unchecked(y)
                .copy_from_slice(src.row_unchecked(y));
        }
        return Ok(());
    }

    let _span = trace_span!(
        "resize_features",
        src_width = src.width(),
        src_height = src.height(),
        dst_width = dst_width,
        dst_height = dst_height
    )
    .entered();

    let xs = bilinear_taps(src.width(), dst_width);
    let ys = bilinear_taps(src.height(), dst_height);
    for (y, ty) in ys.iter().enumerate() {
        let row0 = src.row_unchecked(ty.index);
        let row1 = src.row_unchecked(ty.next);
        let out = dst.row_mut_unchecked(y);
        for (x, tx) in xs.iter().enumerate() {
            let w00 = (1.0 - tx.frac) * (1.0 - ty.frac);
            let w01 = tx.frac * (1.0 - ty.frac);
            let w10 = (1.0 - tx.frac) * ty.frac;
            let w11 = tx.frac * ty.frac;
            let a = &row0[tx.index * f..(tx.index + 1) * f];
            let b = &row0[tx.next * f..(tx.next + 1) * f];
            let c = &row1[tx.index * f..(tx.index + 1) * f];
            let d = &row1[tx.next * f..(tx.next + 1) * f];
            let cell = &mut out[x * f..(x + 1) * f];
            for i in 0..f {
                cell[i] = a[i] * w00 + b[i] * w01 + c[i] * w10 + d[i] * w11;
            }
        }
    }
    Ok(())
}

/// Resamples `src` into a new `width x height` map.
pub fn resize_features(
    src: FeatureView<'_>,
    width: usize,
    height: usize,
) -> HogLiteResult<FeatureMap> {
    let mut map = FeatureMap::zeros(width, height, src.feature_size())?;
    resize_features_into(src, &mut map.view_mut())?;
    Ok(map)
}
