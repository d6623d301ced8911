use crate::types::{DepartmentBoundary, DepartmentCount, Garden};
use std::collections::BTreeMap;

/// Groups gardens by department name and counts them. Departments without
/// gardens are simply absent from the map.
pub fn count_by_department(gardens: &[Garden]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for garden in gardens {
        *counts.entry(garden.department.clone()).or_insert(0) += 1;
    }
    counts
}

/// Inner-joins per-department counts onto the boundary geometries by name.
/// Gardens whose department has no boundary are dropped from the result, and
/// boundaries without gardens do not appear with a zero count. Output follows
/// boundary order, so keys stay unique as long as boundary names are.
pub fn join_counts(
    counts: &BTreeMap<String, usize>,
    boundaries: &[DepartmentBoundary],
) -> Vec<DepartmentCount> {
    boundaries
        .iter()
        .filter_map(|boundary| {
            counts.get(&boundary.name).map(|&count| DepartmentCount {
                department: boundary.name.clone(),
                count,
                geometry: boundary.geometry.clone(),
            })
        })
        .collect()
}

/// Full aggregation step: count the (already filtered) gardens and attach
/// geometry.
pub fn gardens_per_department(
    gardens: &[Garden],
    boundaries: &[DepartmentBoundary],
) -> Vec<DepartmentCount> {
    join_counts(&count_by_department(gardens), boundaries)
}
