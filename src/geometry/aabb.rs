// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Axis-aligned bounding box in center/half-extent form

use nalgebra::{Point, SVector};

/// Axis-aligned bounding box
///
/// Stored as a center and a non-negative half-extent per axis; `min()` and
/// `max()` are derived on demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb<const N: usize> {
    pub center: SVector<f64, N>,
    pub extent: SVector<f64, N>,
}

impl<const N: usize> Aabb<N> {
    pub fn new(center: SVector<f64, N>, extent: SVector<f64, N>) -> Self {
        debug_assert!(extent.iter().all(|e| *e >= 0.0), "negative AABB extent");
        Self { center, extent }
    }

    /// Degenerate box at the origin, used for nodes without items
    pub fn degenerate() -> Self {
        Self {
            center: SVector::zeros(),
            extent: SVector::zeros(),
        }
    }

    /// Zero-extent box around a single point
    pub fn from_point(point: &Point<f64, N>) -> Self {
        Self {
            center: point.coords,
            extent: SVector::zeros(),
        }
    }

    pub fn from_min_max(min: &SVector<f64, N>, max: &SVector<f64, N>) -> Self {
        let center = (min + max) * 0.5;
        let extent = (max - min).map(|e| (e * 0.5).max(0.0));
        Self { center, extent }
    }

    /// Smallest box containing every point, or `None` for an empty input
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point<f64, N>>,
    {
        points
            .into_iter()
            .map(Self::from_point)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn min(&self) -> SVector<f64, N> {
        self.center - self.extent
    }

    pub fn max(&self) -> SVector<f64, N> {
        self.center + self.extent
    }

    /// Smallest box covering both `self` and `other`
    pub fn union(&self, other: &Self) -> Self {
        let min = self.min().zip_map(&other.min(), f64::min);
        let max = self.max().zip_map(&other.max(), f64::max);
        Self::from_min_max(&min, &max)
    }

    /// Axis with the greatest extent; ties go to the lowest index
    pub fn largest_axis(&self) -> usize {
        let mut best = 0;
        for axis in 1..N {
            if self.extent[axis] > self.extent[best] {
                best = axis;
            }
        }
        best
    }

    /// Axis with the greatest extent other than `excluded`; ties go to the
    /// lowest index. Returns `excluded` only for one-dimensional boxes.
    pub fn largest_axis_excluding(&self, excluded: usize) -> usize {
        let mut best: Option<usize> = None;
        for axis in (0..N).filter(|axis| *axis != excluded) {
            match best {
                Some(b) if self.extent[axis] <= self.extent[b] => {}
                _ => best = Some(axis),
            }
        }
        best.unwrap_or(excluded)
    }

    /// Whether `point` lies inside the box or on its boundary
    pub fn contains(&self, point: &Point<f64, N>) -> bool {
        (0..N).all(|axis| (point.coords[axis] - self.center[axis]).abs() <= self.extent[axis])
    }

    /// True when every extent is zero
    pub fn is_degenerate(&self) -> bool {
        self.extent.iter().all(|e| *e == 0.0)
    }
}

impl<const N: usize> Default for Aabb<N> {
    fn default() -> Self {
        Self::degenerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn boxed(min: [f64; 3], max: [f64; 3]) -> Aabb<3> {
        Aabb::from_min_max(&Vector3::from(min), &Vector3::from(max))
    }

    #[test]
    fn test_min_max_are_derived() {
        let aabb = Aabb::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(0.5, 1.0, 0.0));
        assert_eq!(aabb.min(), Vector3::new(0.5, 1.0, 3.0));
        assert_eq!(aabb.max(), Vector3::new(1.5, 3.0, 3.0));
    }

    #[test]
    fn test_union_covers_both() {
        let a = boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = boxed([2.0, -1.0, 0.5], [3.0, 0.5, 0.75]);
        let u = a.union(&b);

        assert_relative_eq!(u.min(), Vector3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(u.max(), Vector3::new(3.0, 1.0, 1.0));
        assert_eq!(u, b.union(&a));
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn test_union_is_associative() {
        let a = boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = boxed([4.0, 0.0, 0.0], [5.0, 2.0, 1.0]);
        let c = boxed([-2.0, -3.0, 7.0], [-1.0, 0.0, 8.0]);
        assert_relative_eq!(a.union(&b).union(&c).min(), a.union(&b.union(&c)).min());
        assert_relative_eq!(a.union(&b).union(&c).max(), a.union(&b.union(&c)).max());
    }

    #[test]
    fn test_largest_axis_ties_go_low() {
        assert_eq!(boxed([0.0; 3], [1.0, 1.0, 1.0]).largest_axis(), 0);
        assert_eq!(boxed([0.0; 3], [1.0, 2.0, 2.0]).largest_axis(), 1);
        assert_eq!(boxed([0.0; 3], [1.0, 2.0, 3.0]).largest_axis(), 2);
    }

    #[test]
    fn test_largest_axis_excluding() {
        let aabb = boxed([0.0; 3], [3.0, 1.0, 1.0]);
        assert_eq!(aabb.largest_axis_excluding(0), 1);
        assert_eq!(boxed([0.0; 3], [3.0, 1.0, 2.0]).largest_axis_excluding(0), 2);
        assert_eq!(boxed([0.0; 3], [3.0, 1.0, 2.0]).largest_axis_excluding(2), 0);
    }

    #[test]
    fn test_from_points() {
        let points = [Point3::new(1.0, 0.0, -1.0), Point3::new(-1.0, 4.0, 1.0)];
        let aabb = Aabb::from_points(points.iter()).unwrap();
        assert_eq!(aabb.center, Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(aabb.extent, Vector3::new(1.0, 2.0, 1.0));
        assert!(aabb.contains(&Point3::new(0.5, 3.9, 0.0)));
        assert!(!aabb.contains(&Point3::new(0.5, 4.1, 0.0)));
        assert!(Aabb::<3>::from_points(std::iter::empty()).is_none());
    }
}
