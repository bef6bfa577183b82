//! PCA projection of full descriptors onto eight channels.

use crate::feature::{FeatureMap, FeatureSize, FeatureView, FeatureViewMut};
use crate::util::{HogLiteError, HogLiteResult};

/// Input channels of the projection matrix.
pub const PCA_INPUT: usize = 16;
/// Output channels of the projection matrix.
pub const PCA_OUTPUT: usize = 8;

/// Projects every cell of a full map through a row-major 16x8 matrix.
///
/// `dst[c] = sum_i src[i] * pca[i * 8 + c]`.
pub fn compress_features_into(
    src: FeatureView<'_>,
    pca: &[f32],
    dst: &mut FeatureViewMut<'_>,
) -> HogLiteResult<()> {
    if src.feature_size() != FeatureSize::Full {
        return Err(HogLiteError::UnsupportedFeatureSize {
            size: src.feature_size().channels(),
        });
    }
    if pca.len() != PCA_INPUT * PCA_OUTPUT {
        return Err(HogLiteError::FilterLength {
            expected: PCA_INPUT * PCA_OUTPUT,
            got: pca.len(),
        });
    }
    dst.ensure_shape(
        "compressed map",
        src.width(),
        src.height(),
        FeatureSize::Compressed,
    )?;

    for y in 0..src.height() {
        let src_row = src.row_unchecked(y);
        let dst_row = dst.row_mut_unchecked(y);
        for (cell, out) in src_row
            .chunks_exact(PCA_INPUT)
            .zip(dst_row.chunks_exact_mut(PCA_OUTPUT))
        {
            out.fill(0.0);
            for (&value, weights) in cell.iter().zip(pca.chunks_exact(PCA_OUTPUT)) {
                for (o, &w) in out.iter_mut().zip(weights) {
                    *o += value * w;
                }
            }
        }
    }
    Ok(())
}

/// Projects a full map into a new compressed map.
pub fn compress_features(src: FeatureView<'_>, pca: &[f32]) -> HogLiteResult<FeatureMap> {
    let mut map = FeatureMap::zeros(src.width(), src.height(), FeatureSize::Compressed)?;
    compress_features_into(src, pca, &mut map.view_mut())?;
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::{compress_features, PCA_INPUT, PCA_OUTPUT};
    use crate::feature::{FeatureMap, FeatureSize};
    use crate::util::HogLiteError;

    #[test]
    fn identity_projection_keeps_first_channels() {
        let mut pca = vec![0.0f32; PCA_INPUT * PCA_OUTPUT];
        for c in 0..PCA_OUTPUT {
            pca[c * PCA_OUTPUT + c] = 1.0;
        }
        let data: Vec<f32> = (0..2 * 16).map(|i| i as f32).collect();
        let map = FeatureMap::from_vec(data, 2, 1, FeatureSize::Full).unwrap();
        let out = compress_features(map.view(), &pca).unwrap();
        assert_eq!(out.feature_size(), FeatureSize::Compressed);
        assert_eq!(out.cell(0, 0).unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(
            out.cell(1, 0).unwrap(),
            &[16.0, 17.0, 18.0, 19.0, 20.0, 21.0, 22.0, 23.0]
        );
    }

    #[test]
    fn sums_weighted_inputs() {
        let pca = vec![0.5f32; PCA_INPUT * PCA_OUTPUT];
        let map = FeatureMap::from_vec(vec![1.0; 16], 1, 1, FeatureSize::Full).unwrap();
        let out = compress_features(map.view(), &pca).unwrap();
        assert!(out.data().iter().all(|&v| (v - 8.0).abs() < 1e-6));
    }

    #[test]
    fn rejects_wrong_matrix_or_layout() {
        let map = FeatureMap::from_vec(vec![1.0; 16], 1, 1, FeatureSize::Full).unwrap();
        let err = compress_features(map.view(), &[0.0; 8]).unwrap_err();
        assert_eq!(err, HogLiteError::FilterLength { expected: 128, got: 8 });

        let small = FeatureMap::from_vec(vec![1.0; 8], 1, 1, FeatureSize::Compressed).unwrap();
        let err = compress_features(small.view(), &[0.0; 128]).unwrap_err();
        assert_eq!(err, HogLiteError::UnsupportedFeatureSize { size: 8 });
    }
}
