//! Binary face masks built from the convex hull of a landmark mesh.

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use crate::detector::Landmarks;
use crate::error::{Result, ScrambleError};

/// Mask value of pixels inside the face region.
pub const FOREGROUND: u8 = 255;
/// Mask value of pixels outside the face region.
pub const BACKGROUND: u8 = 0;

/// Minimal enclosing convex polygon of a point set, without a repeated
/// closing vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvexHull(Vec<Point<i32>>);

impl ConvexHull {
    /// Andrew's monotone chain. Collinear points are dropped, so a hull of
    /// three or more vertices always encloses a positive area.
    pub fn from_points(points: &[(i32, i32)]) -> Self {
        let mut pts: Vec<(i32, i32)> = points.to_vec();
        pts.sort_unstable();
        pts.dedup();
        if pts.len() <= 2 {
            return Self(pts.into_iter().map(|(x, y)| Point::new(x, y)).collect());
        }

        fn cross(o: (i32, i32), a: (i32, i32), b: (i32, i32)) -> i64 {
            (a.0 - o.0) as i64 * (b.1 - o.1) as i64 - (a.1 - o.1) as i64 * (b.0 - o.0) as i64
        }

        let mut hull: Vec<(i32, i32)> = Vec::with_capacity(pts.len() * 2);
        for &p in &pts {
            while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
                hull.pop();
            }
            hull.push(p);
        }
        let lower_len = hull.len() + 1;
        for &p in pts.iter().rev().skip(1) {
            while hull.len() >= lower_len
                && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0
            {
                hull.pop();
            }
            hull.push(p);
        }
        hull.pop();

        Self(hull.into_iter().map(|(x, y)| Point::new(x, y)).collect())
    }

    pub fn vertices(&self) -> &[Point<i32>] {
        &self.0
    }

    /// Centroid from the polygon's spatial moments `(m10 / m00, m01 / m00)`.
    ///
    /// Falls back to the vertex mean for a hull without area.
    pub fn centroid(&self) -> (f64, f64) {
        let n = self.0.len();
        if n == 0 {
            return (0.0, 0.0);
        }

        let mut m00 = 0.0;
        let mut m10 = 0.0;
        let mut m01 = 0.0;
        for i in 0..n {
            let a = self.0[i];
            let b = self.0[(i + 1) % n];
            let (xa, ya, xb, yb) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
            let cross = xa * yb - xb * ya;
            m00 += cross;
            m10 += (xa + xb) * cross;
            m01 += (ya + yb) * cross;
        }
        m00 /= 2.0;

        if m00.abs() < f64::EPSILON {
            let sx: f64 = self.0.iter().map(|p| p.x as f64).sum();
            let sy: f64 = self.0.iter().map(|p| p.y as f64).sum();
            return (sx / n as f64, sy / n as f64);
        }
        (m10 / (6.0 * m00), m01 / (6.0 * m00))
    }

    /// Centroid truncated to whole pixels, the blend centre used for seamless cloning.
    pub fn center(&self) -> (i32, i32) {
        let (cx, cy) = self.centroid();
        (cx as i32, cy as i32)
    }
}

/// Per-pixel face membership. Every value is either [`FOREGROUND`] or
/// [`BACKGROUND`]; the mask is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask(GrayImage);

impl Mask {
    /// Wraps an existing binary image, rejecting values other than 0 and 255.
    pub fn from_image(image: GrayImage) -> Result<Self> {
        if image
            .pixels()
            .any(|p| p[0] != FOREGROUND && p[0] != BACKGROUND)
        {
            return Err(ScrambleError::InvalidParameter(
                "mask values must be 0 or 255".into(),
            ));
        }
        Ok(Self(image))
    }

    /// Fills the hull polygon with [`FOREGROUND`] on a `width` x `height` canvas.
    pub fn from_hull(hull: &ConvexHull, width: u32, height: u32) -> Self {
        let mut canvas = GrayImage::new(width, height);
        let color = Luma([FOREGROUND]);
        match hull.vertices() {
            [] => {}
            [p] => {
                if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                    canvas.put_pixel(p.x as u32, p.y as u32, color);
                }
            }
            [a, b] => draw_line_segment_mut(
                &mut canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            ),
            poly => draw_polygon_mut(&mut canvas, poly, color),
        }
        Self(canvas)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] == FOREGROUND
    }

    /// Number of foreground pixels.
    pub fn area(&self) -> usize {
        self.0.pixels().filter(|p| p[0] == FOREGROUND).count()
    }

    /// Inclusive bounding box `(x_min, y_min, x_max, y_max)` of the foreground.
    pub fn bounding_box(&self) -> Option<(u32, u32, u32, u32)> {
        self.0
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] == FOREGROUND)
            .fold(None, |acc, (x, y, _)| match acc {
                None => Some((x, y, x, y)),
                Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
            })
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }
}

/// Mask and hull of one detected face.
#[derive(Debug, Clone)]
pub struct FaceRegion {
    pub mask: Mask,
    pub hull: ConvexHull,
}

/// Builds the face region for a `width` x `height` frame.
pub fn build_face_region(landmarks: &Landmarks, width: u32, height: u32) -> FaceRegion {
    let hull = ConvexHull::from_points(landmarks.points());
    let mask = Mask::from_hull(&hull, width, height);
    FaceRegion { mask, hull }
}

/// Builds the binary mask for a `width` x `height` frame.
pub fn build_mask(landmarks: &Landmarks, width: u32, height: u32) -> Mask {
    build_face_region(landmarks, width, height).mask
}
