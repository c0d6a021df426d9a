//! Bounding boxes and rays for picking.

use nalgebra as na;

/// Axis-aligned box in object space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: na::Point3<f32>,
    pub max: na::Point3<f32>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: na::Point3::origin(),
            max: na::Point3::origin(),
        }
    }
}

impl BoundingBox {
    pub fn new(min: na::Point3<f32>, max: na::Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Tightest box around `points`; the zero box if there are none.
    pub fn from_points(points: impl IntoIterator<Item = [f32; 3]>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Self::default();
        };
        let mut min = na::Point3::from(first);
        let mut max = min;
        for p in points {
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }
        Self { min, max }
    }

    pub fn center(&self) -> na::Point3<f32> {
        na::center(&self.min, &self.max)
    }

    pub fn size(&self) -> na::Vector3<f32> {
        self.max - self.min
    }

    /// The eight corners, bottom face first (counter-clockwise seen from +Y).
    pub fn corners(&self) -> [na::Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            na::Point3::new(a.x, a.y, a.z),
            na::Point3::new(b.x, a.y, a.z),
            na::Point3::new(b.x, a.y, b.z),
            na::Point3::new(a.x, a.y, b.z),
            na::Point3::new(a.x, b.y, a.z),
            na::Point3::new(b.x, b.y, a.z),
            na::Point3::new(b.x, b.y, b.z),
            na::Point3::new(a.x, b.y, b.z),
        ]
    }

    /// Slab test. Returns the nearest hit in front of the ray origin; a ray
    /// starting inside the box hits at its origin.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<RayHit> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            if dir.abs() < f32::EPSILON {
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let t1 = (self.min[axis] - origin) * inv;
            let t2 = (self.max[axis] - origin) * inv;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_far < t_near.max(0.0) {
            return None;
        }

        let distance = t_near.max(0.0);
        Some(RayHit {
            distance,
            point: ray.at(distance),
        })
    }
}

/// World-space ray with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: na::Point3<f32>,
    pub direction: na::Vector3<f32>,
}

impl Ray {
    pub fn new(origin: na::Point3<f32>, direction: na::Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, t: f32) -> na::Point3<f32> {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: na::Point3<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(
            na::Point3::new(-1.0, -1.0, -1.0),
            na::Point3::new(1.0, 1.0, 1.0),
        )
    }

    #[test]
    fn hit_from_outside_reports_entry_distance() {
        let ray = Ray::new(na::Point3::new(0.0, 0.0, 5.0), -na::Vector3::z());
        let hit = unit_box().intersect_ray(&ray).expect("should hit");
        assert!((hit.distance - 4.0).abs() < 1e-5);
        assert!((hit.point.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ray_from_inside_hits_at_origin() {
        let ray = Ray::new(na::Point3::origin(), na::Vector3::new(1.0, 0.3, 0.2));
        let hit = unit_box().intersect_ray(&ray).expect("inside counts as hit");
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn box_behind_the_ray_is_missed() {
        let ray = Ray::new(na::Point3::new(0.0, 0.0, 5.0), na::Vector3::z());
        assert!(unit_box().intersect_ray(&ray).is_none());
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let ray = Ray::new(na::Point3::new(0.0, 2.0, 5.0), -na::Vector3::z());
        assert!(unit_box().intersect_ray(&ray).is_none());

        let grazing = Ray::new(na::Point3::new(0.0, 0.5, 5.0), -na::Vector3::z());
        assert!(unit_box().intersect_ray(&grazing).is_some());
    }

    #[test]
    fn diagonal_miss() {
        let ray = Ray::new(
            na::Point3::new(5.0, 5.0, 5.0),
            na::Vector3::new(-1.0, 0.0, -1.0),
        );
        assert!(unit_box().intersect_ray(&ray).is_none());
    }

    #[test]
    fn box_from_points() {
        let b = BoundingBox::from_points([[1.0, -2.0, 3.0], [-1.0, 4.0, 0.5]]);
        assert_eq!(b.min, na::Point3::new(-1.0, -2.0, 0.5));
        assert_eq!(b.max, na::Point3::new(1.0, 4.0, 3.0));
        assert_eq!(b.center(), na::Point3::new(0.0, 1.0, 1.75));
        assert_eq!(BoundingBox::from_points([]), BoundingBox::default());
    }
}
