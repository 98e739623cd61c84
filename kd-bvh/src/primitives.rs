use glam::Vec3;

// --- AABB ---
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::empty()
    }
}

impl AABB {
    /// Inverted box, the identity for `union`.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Zero-sized box at the origin. Stands for "no content", not a bound.
    pub fn zero() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::empty();
        for &p in points {
            aabb.grow(p);
        }
        aabb
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    // 2(xy + yz + xz); inverted boxes count as zero
    pub fn area(&self) -> f32 {
        let d = self.extent();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            0.0
        } else {
            2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
        }
    }

    /// Axis with the largest extent. Ties go to x, then y.
    pub fn dominant_axis(&self) -> Axis {
        let d = self.extent();
        if d.x >= d.y && d.x >= d.z {
            Axis::X
        } else if d.y >= d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// Component-wise bounds of a run of boxes.
///
/// An empty run yields `AABB::zero()` instead of the inverted seed box, so
/// callers have to treat it as "nothing here".
pub fn bounds_of<'a, I>(boxes: I) -> AABB
where
    I: IntoIterator<Item = &'a AABB>,
{
    let mut boxes = boxes.into_iter().peekable();
    if boxes.peek().is_none() {
        return AABB::zero();
    }
    boxes.fold(AABB::empty(), |acc, aabb| acc.union(aabb))
}

// --- Shapes ---

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub v0: Vec3,
    pub v1: Vec3,
    pub v2: Vec3,
}

impl Triangle {
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    // No padding for flat triangles: parents must be the exact union.
    pub fn aabb(&self) -> AABB {
        AABB {
            min: self.v0.min(self.v1).min(self.v2),
            max: self.v0.max(self.v1).max(self.v2),
        }
    }

    pub fn area(&self) -> f32 {
        (self.v2 - self.v0).cross(self.v1 - self.v0).length() * 0.5
    }

    /// `(v1 - v0, v2 - v0)`, the two edges a leaf record carries.
    pub fn edges(&self) -> (Vec3, Vec3) {
        (self.v1 - self.v0, self.v2 - self.v0)
    }
}
