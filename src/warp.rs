//! Extraction of the upright landmark-model crop from an oriented region.

use crate::constants::GEOMETRY_EPSILON;
use crate::region::Region;
use crate::{Error, Result};
use nalgebra::{Matrix2x3, Matrix3, Vector3};
use opencv::core::{Mat, Point2f, Scalar, Size, BORDER_CONSTANT, CV_64F};
use opencv::imgproc::{self, InterpolationFlags};
use opencv::prelude::*;

/// 2×3 affine map between frame and crop pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix2x3<f64>,
}

impl AffineTransform {
    /// Solve the affine transform taking three source points onto three destination points
    ///
    /// # Errors
    ///
    /// Returns `Error::Geometry` when the source points are collinear,
    /// coincident or non-finite.
    pub fn from_points(src: [Point2f; 3], dst: [Point2f; 3]) -> Result<Self> {
        let system = Matrix3::new(
            f64::from(src[0].x), f64::from(src[0].y), 1.0,
            f64::from(src[1].x), f64::from(src[1].y), 1.0,
            f64::from(src[2].x), f64::from(src[2].y), 1.0,
        );

        // Twice the signed area of the source triangle
        let det = system.determinant();
        if !det.is_finite() || det.abs() < GEOMETRY_EPSILON {
            return Err(Error::Geometry(format!(
                "Source points ({:.2}, {:.2}), ({:.2}, {:.2}), ({:.2}, {:.2}) do not span a triangle",
                src[0].x, src[0].y, src[1].x, src[1].y, src[2].x, src[2].y
            )));
        }

        let inverse = system
            .try_inverse()
            .ok_or_else(|| Error::Geometry("Source point system is singular".to_string()))?;

        let xs = inverse * Vector3::new(f64::from(dst[0].x), f64::from(dst[1].x), f64::from(dst[2].x));
        let ys = inverse * Vector3::new(f64::from(dst[0].y), f64::from(dst[1].y), f64::from(dst[2].y));

        let matrix = Matrix2x3::new(xs[0], xs[1], xs[2], ys[0], ys[1], ys[2]);
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(Error::Geometry("Affine transform is not finite".to_string()));
        }

        Ok(Self { matrix })
    }

    /// Map a point through the transform
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Pixel coordinates are well inside f32 range
    pub fn apply(&self, point: Point2f) -> Point2f {
        let p = Vector3::new(f64::from(point.x), f64::from(point.y), 1.0);
        let out = self.matrix * p;
        Point2f::new(out[0] as f32, out[1] as f32)
    }

    /// Inverse transform
    ///
    /// # Errors
    ///
    /// Returns `Error::Geometry` if the linear part is singular
    pub fn inverse(&self) -> Result<Self> {
        let m = &self.matrix;
        let homogeneous = Matrix3::new(
            m[(0, 0)], m[(0, 1)], m[(0, 2)],
            m[(1, 0)], m[(1, 1)], m[(1, 2)],
            0.0, 0.0, 1.0,
        );
        let inv = homogeneous
            .try_inverse()
            .ok_or_else(|| Error::Geometry("Affine transform is not invertible".to_string()))?;
        Ok(Self {
            matrix: inv.fixed_view::<2, 3>(0, 0).into_owned(),
        })
    }

    /// Coefficients as `[[a, b, c], [d, e, f]]`
    #[must_use]
    pub fn coefficients(&self) -> [[f64; 3]; 2] {
        let m = &self.matrix;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        ]
    }

    /// Uniform scale factor of the linear part, `sqrt(|det|)`
    #[must_use]
    pub fn linear_scale(&self) -> f64 {
        let m = &self.matrix;
        (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]).abs().sqrt()
    }

    /// Transform as a 2×3 `CV_64F` matrix
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // Indices below 3
    fn to_mat(&self) -> Result<Mat> {
        let mut mat = Mat::new_rows_cols_with_default(2, 3, CV_64F, Scalar::all(0.0))?;
        for (row, values) in self.coefficients().iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                *mat.at_2d_mut::<f64>(row as i32, col as i32)? = value;
            }
        }
        Ok(mat)
    }
}

/// Upright crop handed to the landmark model
#[derive(Debug)]
pub struct Crop {
    /// Resampled image of exactly the warper's output size
    pub image: Mat,
    /// Frame → crop pixel transform
    pub transform: AffineTransform,
    inverse: AffineTransform,
}

impl Crop {
    /// Map a crop pixel position back onto the frame
    #[must_use]
    pub fn to_frame(&self, point: Point2f) -> Point2f {
        self.inverse.apply(point)
    }

    /// Map a frame pixel position into the crop
    #[must_use]
    pub fn to_crop(&self, point: Point2f) -> Point2f {
        self.transform.apply(point)
    }

    /// Frame pixels per crop pixel
    #[must_use]
    pub fn frame_scale(&self) -> f64 {
        self.inverse.linear_scale()
    }

    /// Crop width in pixels
    #[must_use]
    pub fn width(&self) -> i32 {
        self.image.cols()
    }

    /// Crop height in pixels
    #[must_use]
    pub fn height(&self) -> i32 {
        self.image.rows()
    }
}

/// Resamples a [`Region`] of a frame into an axis-aligned square image
#[derive(Debug, Clone, Copy)]
pub struct RegionWarper {
    output_size: Size,
}

impl RegionWarper {
    /// Create a warper producing `width` × `height` crops
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigError` for a zero or oversized output dimension,
    /// or when the crop is not square
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width != height {
            return Err(Error::ConfigError(format!(
                "Crop must be square, got {width}x{height}"
            )));
        }
        let to_i32 = |v: u32| {
            i32::try_from(v)
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| Error::ConfigError(format!("Invalid crop dimension: {v}")))
        };
        Ok(Self {
            output_size: Size::new(to_i32(width)?, to_i32(height)?),
        })
    }

    /// Output crop size
    #[must_use]
    pub fn output_size(&self) -> Size {
        self.output_size
    }

    /// Frame → crop transform for a region
    ///
    /// Corners p1, p2, p3 go to the crop's bottom-left, bottom-right and
    /// top-right; p0 is implied for a square.
    ///
    /// # Errors
    ///
    /// Returns `Error::Geometry` for degenerate region corners
    #[allow(clippy::cast_precision_loss)] // Crop sizes fit f32 exactly
    pub fn transform_for(&self, region: &Region) -> Result<AffineTransform> {
        let w = self.output_size.width as f32;
        let h = self.output_size.height as f32;
        AffineTransform::from_points(
            [region.corners[1], region.corners[2], region.corners[3]],
            [Point2f::new(0.0, h), Point2f::new(w, h), Point2f::new(w, 0.0)],
        )
    }

    /// Extract the region from `frame`
    ///
    /// Pixels outside the frame are filled with black.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an empty frame, `Error::Geometry` for
    /// degenerate region corners and `Error::OpenCV` if resampling fails.
    pub fn warp(&self, frame: &Mat, region: &Region) -> Result<Crop> {
        if frame.empty() {
            return Err(Error::InvalidInput("Cannot warp an empty frame".to_string()));
        }

        let transform = self.transform_for(region)?;
        let inverse = transform.inverse()?;

        let mut image = Mat::default();
        imgproc::warp_affine(
            frame,
            &mut image,
            &transform.to_mat()?,
            self.output_size,
            InterpolationFlags::INTER_LINEAR as i32,
            BORDER_CONSTANT,
            Scalar::default(),
        )?;

        Ok(Crop {
            image,
            transform,
            inverse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{to_pixels, SquareRegion};

    fn region(size: f32) -> Region {
        let square = SquareRegion {
            center_x: 0.5,
            center_y: 0.5,
            size,
            rotation: 0.0,
        };
        to_pixels(&square, 100, 100, 1.0, None).unwrap()
    }

    #[test]
    fn test_full_frame_transform_is_identity() {
        let warper = RegionWarper::new(100, 100).unwrap();
        let transform = warper.transform_for(&region(1.0)).unwrap();
        let [[a, b, c], [d, e, f]] = transform.coefficients();
        assert!((a - 1.0).abs() < 1e-5 && b.abs() < 1e-5 && c.abs() < 1e-3);
        assert!(d.abs() < 1e-5 && (e - 1.0).abs() < 1e-5 && f.abs() < 1e-3);
    }

    #[test]
    fn test_inverse_round_trip() {
        let warper = RegionWarper::new(256, 256).unwrap();
        let mut r = region(0.4);
        r.corners = crate::region::rotated_square_corners(50.0, 50.0, 40.0, 0.7);
        let transform = warper.transform_for(&r).unwrap();
        let inverse = transform.inverse().unwrap();

        let p = Point2f::new(37.5, 61.25);
        let back = inverse.apply(transform.apply(p));
        assert!((back.x - p.x).abs() < 1e-3);
        assert!((back.y - p.y).abs() < 1e-3);

        // Region corners land on the crop corners
        let bl = transform.apply(r.corners[1]);
        assert!((bl.x - 0.0).abs() < 1e-2 && (bl.y - 256.0).abs() < 1e-2);
    }

    #[test]
    fn test_zero_size_region_is_degenerate() {
        let warper = RegionWarper::new(64, 64).unwrap();
        let result = warper.transform_for(&region(0.0));
        assert!(matches!(result, Err(Error::Geometry(_))));
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let result = AffineTransform::from_points(
            [Point2f::new(0.0, 0.0), Point2f::new(1.0, 1.0), Point2f::new(2.0, 2.0)],
            [Point2f::new(0.0, 1.0), Point2f::new(1.0, 1.0), Point2f::new(1.0, 0.0)],
        );
        assert!(result.unwrap_err().is_frame_skip());
    }

    #[test]
    fn test_invalid_output_size() {
        assert!(RegionWarper::new(0, 256).is_err());
        assert!(RegionWarper::new(256, u32::MAX).is_err());
        assert!(RegionWarper::new(u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_non_square_crop_rejected() {
        assert!(matches!(RegionWarper::new(256, 128), Err(Error::ConfigError(_))));
        assert!(matches!(RegionWarper::new(128, 256), Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let warper = RegionWarper::new(64, 64).unwrap();
        let result = warper.warp(&Mat::default(), &region(1.0));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
