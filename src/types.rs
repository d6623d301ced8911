use geo::MultiPolygon;

#[derive(Debug, Clone)]
pub struct Garden {
    pub name: String,
    pub description: String,
    pub department: String,
    pub region: String,
    // Raw pipe-delimited value as it appears in the CSV. The type filter
    // matches on this field by substring containment, so it is kept verbatim
    // alongside the split tags.
    pub types_field: String,
    pub type_tags: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DepartmentBoundary {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Per-department garden count joined with its boundary geometry.
/// Recomputed on every filter change; departments with no gardens (or no
/// matching boundary) are absent rather than present with a zero count.
#[derive(Debug, Clone)]
pub struct DepartmentCount {
    pub department: String,
    pub count: usize,
    pub geometry: MultiPolygon<f64>,
}
