//! Per-frame vertex accumulator

use glam::Vec3;

/// Vertex positions collected for one frame, indexed by vertex number.
///
/// Slots stay empty until a complete triple is committed for them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FramePoints {
    slots: Vec<Option<Vec3>>,
}

impl FramePoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `position` for vertex `index`, growing the slot list as needed.
    ///
    /// Returns false, leaving the slots untouched, if `index` cannot be stored.
    pub fn set(&mut self, index: usize, position: Vec3) -> bool {
        if index >= self.slots.len() {
            let Some(len) = index.checked_add(1) else {
                return false;
            };
            if self.slots.try_reserve(len - self.slots.len()).is_err() {
                return false;
            }
            self.slots.resize(len, None);
        }
        self.slots[index] = Some(position);
        true
    }

    pub fn get(&self, index: usize) -> Option<Vec3> {
        self.slots.get(index).copied().flatten()
    }

    /// Number of slots (highest committed index + 1)
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of vertices with a committed position
    pub fn committed(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Committed `(index, position)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, Vec3)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.map(|p| (i, p)))
    }

    /// Drop all slots, keeping the allocation for the next frame
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl FromIterator<Vec3> for FramePoints {
    fn from_iter<I: IntoIterator<Item = Vec3>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().map(Some).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_out_of_order_leaves_gaps() {
        let mut points = FramePoints::new();
        points.set(2, Vec3::new(1.0, 2.0, 3.0));
        points.set(0, Vec3::ZERO);

        assert_eq!(points.len(), 3);
        assert_eq!(points.committed(), 2);
        assert_eq!(points.get(1), None);
        assert_eq!(points.get(2), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(points.get(7), None);

        let indices: Vec<usize> = points.iter().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_set_rejects_unaddressable_index() {
        let mut points = FramePoints::new();
        assert!(points.set(1, Vec3::ONE));
        assert!(!points.set(usize::MAX, Vec3::ONE));
        assert_eq!(points.len(), 2);
        assert_eq!(points.committed(), 1);
    }

    #[test]
    fn test_clear() {
        let mut points: FramePoints = [Vec3::X, Vec3::Y].into_iter().collect();
        assert_eq!(points.committed(), 2);
        points.clear();
        assert!(points.is_empty());
        assert_eq!(points.iter().count(), 0);
    }
}
