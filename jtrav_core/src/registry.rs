//! Ordered, growable collection of the units of one batch

use crate::frontend::CompilationUnit;

/// Unit slots plus the logical length of the batch
///
/// Slots beyond `len()` are always empty. Capacity only grows, by doubling;
/// a zero capacity grows to one.
#[derive(Debug)]
pub struct BatchRegistry {
    units: Vec<Option<CompilationUnit>>,
    total_units: usize,
    collecting: bool,
}

impl BatchRegistry {
    /// Registry sized for the requested sources
    pub fn new(capacity: usize) -> Self {
        let mut units = Vec::with_capacity(capacity);
        units.resize_with(capacity, || None);
        Self {
            units,
            total_units: 0,
            collecting: true,
        }
    }

    /// Registry that ignores appends
    pub fn not_collecting() -> Self {
        Self {
            units: Vec::new(),
            total_units: 0,
            collecting: false,
        }
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Append a unit and return its ordinal, or `None` when not collecting
    pub fn add_compilation_unit(&mut self, mut unit: CompilationUnit) -> Option<usize> {
        if !self.collecting {
            return None;
        }

        if self.total_units == self.units.len() {
            let grown = if self.units.is_empty() {
                1
            } else {
                self.units.len() * 2
            };
            self.units.resize_with(grown, || None);
        }

        let ordinal = self.total_units;
        unit.set_ordinal(ordinal);
        self.units[ordinal] = Some(unit);
        self.total_units += 1;
        Some(ordinal)
    }

    /// Logical length, re-read by loops that append while iterating
    pub fn len(&self) -> usize {
        self.total_units
    }

    pub fn is_empty(&self) -> bool {
        self.total_units == 0
    }

    pub fn capacity(&self) -> usize {
        self.units.len()
    }

    pub fn get(&self, index: usize) -> Option<&CompilationUnit> {
        self.units.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut CompilationUnit> {
        self.units.get_mut(index).and_then(Option::as_mut)
    }

    /// Remove the unit from its slot, leaving the slot empty
    pub fn take(&mut self, index: usize) -> Option<CompilationUnit> {
        self.units.get_mut(index).and_then(Option::take)
    }

    /// Whether a unit with this identity is already in the batch
    pub fn contains_file(&self, file_name: &str) -> bool {
        self.iter().any(|unit| unit.file_name() == file_name)
    }

    /// Occupied slots within the logical length
    pub fn iter(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units[..self.total_units].iter().flatten()
    }

    /// Units at the given ordinals, in registry order
    ///
    /// Ordinals may come in any order; duplicates and ordinals past the
    /// logical length are ignored.
    pub fn selected_mut<'a>(
        &'a mut self,
        ordinals: &'a [usize],
    ) -> impl Iterator<Item = &'a mut CompilationUnit> + 'a {
        let mut wanted = ordinals.to_vec();
        wanted.sort_unstable();
        wanted.dedup();
        let mut wanted = wanted.into_iter().peekable();

        // Walk both sequences once; the head of `wanted` is never behind `i`
        self.units[..self.total_units]
            .iter_mut()
            .enumerate()
            .filter_map(move |(i, slot)| {
                wanted.next_if_eq(&i)?;
                slot.as_mut()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::{CompilationResult, SourceOrigin};

    fn unit(name: &str) -> CompilationUnit {
        CompilationUnit::new(
            name,
            SourceOrigin::Requested,
            CompilationResult::new(name, 0, 0, 10),
            None,
            None,
        )
    }

    #[test]
    fn test_growth_by_doubling() {
        for (initial, appends, expected) in [(0, 5, 8), (3, 7, 12), (4, 4, 4), (1, 1, 1), (2, 0, 2)]
        {
            let mut registry = BatchRegistry::new(initial);
            for i in 0..appends {
                assert_eq!(registry.add_compilation_unit(unit(&format!("U{}.java", i))), Some(i));
            }
            assert_eq!(registry.len(), appends);
            assert_eq!(registry.capacity(), expected, "initial {}", initial);
            assert!(registry.len() <= registry.capacity());
        }
    }

    #[test]
    fn test_ordinals_and_slots() {
        let mut registry = BatchRegistry::new(2);
        registry.add_compilation_unit(unit("A.java"));
        registry.add_compilation_unit(unit("B.java"));
        registry.add_compilation_unit(unit("C.java"));

        assert_eq!(registry.get(2).unwrap().ordinal(), 2);
        assert!(registry.get(3).is_none());
        assert!(registry.contains_file("B.java"));

        let taken = registry.take(1).unwrap();
        assert_eq!(taken.file_name(), "B.java");
        assert!(registry.get(1).is_none());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn test_selected_units_keep_registry_order() {
        let mut registry = BatchRegistry::new(0);
        for name in ["A.java", "B.java", "C.java", "D.java"] {
            registry.add_compilation_unit(unit(name));
        }
        let names: Vec<_> = registry
            .selected_mut(&[3, 0, 2])
            .map(|u| u.file_name().to_string())
            .collect();
        assert_eq!(names, vec!["A.java", "C.java", "D.java"]);
    }

    #[test]
    fn test_sparse_selection_skips_gaps_and_duplicates() {
        let mut registry = BatchRegistry::new(0);
        for i in 0..200 {
            registry.add_compilation_unit(unit(&format!("U{}.java", i)));
        }
        registry.take(150);

        let ordinals = [199, 7, 150, 7, 0, 512, 64];
        let picked: Vec<_> = registry
            .selected_mut(&ordinals)
            .map(|u| u.ordinal())
            .collect();
        assert_eq!(picked, vec![0, 7, 64, 199]);
    }

    #[test]
    fn test_not_collecting_ignores_appends() {
        let mut registry = BatchRegistry::not_collecting();
        assert_eq!(registry.add_compilation_unit(unit("A.java")), None);
        assert!(registry.is_empty());
        assert_eq!(registry.capacity(), 0);
    }
}
