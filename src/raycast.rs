//! CPU-side ray casting against bounding boxes.
//!
//! Targets are tested in their own model space: the ray is carried through the
//! inverse world matrix, so rotated and non-uniformly scaled boxes are hit
//! exactly. Ray parameters are shared between spaces, which means a hit's
//! `distance` is always measured in world units along the world ray.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, SquareMatrix, Vector2, Vector3, Vector4};

pub type PickId = u32;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    /// `direction` is normalized.
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Unprojects a normalized device coordinate through `view_proj` (0..1 depth).
    pub fn from_ndc(ndc: Vector2<f32>, view_proj: Matrix4<f32>) -> Option<Self> {
        let inverse = view_proj.invert()?;
        let near = inverse * Vector4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inverse * Vector4::new(ndc.x, ndc.y, 1.0, 1.0);
        if near.w.abs() < f32::EPSILON || far.w.abs() < f32::EPSILON {
            return None;
        }
        let near = Point3::from_vec(near.truncate() / near.w);
        let far = Point3::from_vec(far.truncate() / far.w);
        let direction = far - near;
        if direction.magnitude2() < f32::EPSILON {
            return None;
        }
        Some(Self::new(near, direction))
    }

    pub fn at(&self, t: f32) -> Point3<f32> {
        self.origin + self.direction * t
    }

    /// The direction is deliberately left unnormalized so `t` keeps its meaning.
    fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        let origin = matrix * self.origin.to_homogeneous();
        let direction = matrix * self.direction.extend(0.0);
        Self {
            origin: Point3::from_homogeneous(origin),
            direction: direction.truncate(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self {
            min: Point3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = [f32; 3]>) -> Option<Self> {
        let mut points = points.into_iter();
        let first: Point3<f32> = points.next()?.into();
        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |acc, p| Self {
                min: Point3::new(acc.min.x.min(p[0]), acc.min.y.min(p[1]), acc.min.z.min(p[2])),
                max: Point3::new(acc.max.x.max(p[0]), acc.max.y.max(p[1]), acc.max.z.max(p[2])),
            },
        ))
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after `matrix`; loose for rotations.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Aabb {
        let corners = self.corners().map(|c| {
            let p = Point3::from_homogeneous(matrix * c.to_homogeneous());
            [p.x, p.y, p.z]
        });
        Self::from_points(corners).unwrap_or(*self)
    }

    /// Slab test. Returns the entry parameter, or 0 when the origin is inside.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if direction.abs() < 1e-8 {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(t_min.max(0.0))
    }
}

/// Something that can be hit: model-space bounds placed by a world matrix.
#[derive(Debug, Copy, Clone)]
pub struct PickTarget {
    pub id: PickId,
    pub world: Matrix4<f32>,
    pub bounds: Aabb,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hit {
    pub id: PickId,
    pub distance: f32,
    pub point: Point3<f32>,
}

/// All hits along `ray`, nearest first.
pub fn intersect(ray: &Ray, targets: &[PickTarget]) -> Vec<Hit> {
    let mut hits: Vec<Hit> = targets
        .iter()
        .filter_map(|target| {
            let Some(inverse) = target.world.invert() else {
                log::debug!("pick target {} has a singular transform", target.id);
                return None;
            };
            let local = ray.transformed(&inverse);
            target.bounds.intersect_ray(&local).map(|t| Hit {
                id: target.id,
                distance: t,
                point: ray.at(t),
            })
        })
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

pub fn nearest(ray: &Ray, targets: &[PickTarget]) -> Option<Hit> {
    intersect(ray, targets).into_iter().next()
}
