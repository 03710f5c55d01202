//! Nearest-defined-neighbor fill over ordered records.
//!
//! A record type implements [`Overlay`] to say which of its fields are defined.
//! [`fill_nearest`] then walks the rows once in the requested direction
//! carrying, field by field, the most recent defined value, so every field is
//! filled independently of the others.

use indexmap::IndexMap;

use crate::data::IssueMeta;

/// Direction of a fill pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillDirection {
    /// Take values from the nearest preceding row.
    Forward,
    /// Take values from the nearest following row.
    Backward,
}

/// Records whose defined fields can be laid over another instance.
pub trait Overlay {
    /// Copy every defined field of `other` onto `self`, leaving the rest untouched.
    fn overlay(&mut self, other: &Self);
}

impl<T: Clone> Overlay for Option<T> {
    fn overlay(&mut self, other: &Self) {
        if other.is_some() {
            self.clone_from(other);
        }
    }
}

impl<K, V> Overlay for IndexMap<K, V>
where
    K: Clone + Eq + std::hash::Hash,
    V: Overlay + Clone + Default,
{
    fn overlay(&mut self, other: &Self) {
        for (key, value) in other {
            self.entry(key.clone()).or_default().overlay(value);
        }
    }
}

impl Overlay for IssueMeta {
    fn overlay(&mut self, other: &Self) {
        self.volume_id.overlay(&other.volume_id);
        self.link.overlay(&other.link);
        self.magazine_title.overlay(&other.magazine_title);
        self.title.overlay(&other.title);
        self.dates.overlay(&other.dates);
        self.start_issue.overlay(&other.start_issue);
        self.end_issue.overlay(&other.end_issue);
        self.extra.overlay(&other.extra);
    }
}

/// Fill the `field` projection of every row from its nearest defined neighbor.
pub fn fill_nearest<R, T, F>(rows: &mut [R], direction: FillDirection, mut field: F)
where
    T: Overlay + Clone + Default,
    F: FnMut(&mut R) -> &mut T,
{
    let mut carry = T::default();
    let mut step = |row: &mut R| {
        let slot = field(row);
        carry.overlay(slot);
        slot.clone_from(&carry);
    };
    match direction {
        FillDirection::Forward => rows.iter_mut().for_each(&mut step),
        FillDirection::Backward => rows.iter_mut().rev().for_each(&mut step),
    }
}

/// Forward fill, then back-fill whatever leading gap remains.
pub fn fill_both<R, T, F>(rows: &mut [R], mut field: F)
where
    T: Overlay + Clone + Default,
    F: FnMut(&mut R) -> &mut T,
{
    fill_nearest(rows, FillDirection::Forward, &mut field);
    fill_nearest(rows, FillDirection::Backward, &mut field);
}
