use crate::types::Garden;
use std::collections::BTreeSet;

/// Sentinel dropdown value meaning "no filter".
pub const ALL: &str = "All";

/// Distinct garden types across the collection, "All" first, then the split
/// tags sorted and deduplicated.
pub fn distinct_types(gardens: &[Garden]) -> Vec<String> {
    let tags: BTreeSet<&str> = gardens
        .iter()
        .flat_map(|g| g.type_tags.iter().map(String::as_str))
        .collect();

    let mut out = Vec::with_capacity(tags.len() + 1);
    out.push(ALL.to_string());
    out.extend(tags.into_iter().map(str::to_string));
    out
}

/// Distinct department names, "All" first, sorted and deduplicated.
pub fn distinct_departments(gardens: &[Garden]) -> Vec<String> {
    let names: BTreeSet<&str> = gardens.iter().map(|g| g.department.as_str()).collect();

    let mut out = Vec::with_capacity(names.len() + 1);
    out.push(ALL.to_string());
    out.extend(names.into_iter().map(str::to_string));
    out
}

/// Applies the two dropdown selections to the garden collection, returning a
/// new vector and leaving the input untouched.
///
/// The type selector matches by substring containment against the raw
/// pipe-delimited type field, not by exact tag membership: a selector that is
/// a substring of another type name will match that garden too. The
/// department selector is exact equality. Both compose with AND.
pub fn filter(gardens: &[Garden], type_selector: &str, department_selector: &str) -> Vec<Garden> {
    gardens
        .iter()
        .filter(|g| type_selector == ALL || g.types_field.contains(type_selector))
        .filter(|g| department_selector == ALL || g.department == department_selector)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::split_type_tags;

    fn garden(name: &str, department: &str, types_field: &str) -> Garden {
        Garden {
            name: name.to_string(),
            description: String::new(),
            department: department.to_string(),
            region: String::new(),
            types_field: types_field.to_string(),
            type_tags: split_type_tags(types_field),
            latitude: 45.0,
            longitude: 4.0,
            link: None,
        }
    }

    fn sample() -> Vec<Garden> {
        vec![
            garden("Tête d'Or", "Rhône", "jardin public|parc"),
            garden("Parc de la Feyssine", "Rhône", "parc"),
            garden("Tuileries", "Paris", "jardin historique"),
        ]
    }

    #[test]
    fn all_all_is_identity() {
        let gardens = sample();
        let filtered = filter(&gardens, ALL, ALL);
        assert_eq!(filtered.len(), gardens.len());
        let names: Vec<&str> = filtered.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Tête d'Or", "Parc de la Feyssine", "Tuileries"]);
    }

    #[test]
    fn department_filter_is_exact() {
        let gardens = sample();
        let filtered = filter(&gardens, ALL, "Paris");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Tuileries");
    }

    #[test]
    fn type_filter_matches_substrings() {
        let gardens = sample();
        // "parc" is a full tag on two gardens...
        assert_eq!(filter(&gardens, "parc", ALL).len(), 2);
        // ...but "jardin" is only a fragment of "jardin public" and
        // "jardin historique", and still matches both.
        assert_eq!(filter(&gardens, "jardin", ALL).len(), 2);
    }

    #[test]
    fn filters_compose_with_and() {
        let gardens = sample();
        let combined = filter(&gardens, "parc", "Rhône");
        assert_eq!(combined.len(), 2);

        // Equivalent to applying each predicate independently and intersecting.
        let by_type = filter(&gardens, "parc", ALL);
        let both: Vec<&Garden> = by_type.iter().filter(|g| g.department == "Rhône").collect();
        assert_eq!(combined.len(), both.len());

        // And order-independent: filtering the department result by type
        // yields the same set.
        let by_department = filter(&gardens, ALL, "Rhône");
        let other_order = filter(&by_department, "parc", ALL);
        let names: Vec<&str> = combined.iter().map(|g| g.name.as_str()).collect();
        let other_names: Vec<&str> = other_order.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, other_names);
    }

    #[test]
    fn no_match_yields_empty() {
        let gardens = sample();
        assert!(filter(&gardens, "roseraie", ALL).is_empty());
        assert!(filter(&gardens, "parc", "Paris").is_empty());
    }

    #[test]
    fn distinct_types_starts_with_all_and_has_no_duplicates() {
        let gardens = sample();
        let types = distinct_types(&gardens);
        assert_eq!(types[0], ALL);
        assert_eq!(
            types,
            vec!["All", "jardin historique", "jardin public", "parc"]
        );
    }

    #[test]
    fn distinct_departments_starts_with_all() {
        let gardens = sample();
        let departments = distinct_departments(&gardens);
        assert_eq!(departments, vec!["All", "Paris", "Rhône"]);
    }

    #[test]
    fn distinct_lists_on_empty_collection_still_offer_all() {
        assert_eq!(distinct_types(&[]), vec!["All"]);
        assert_eq!(distinct_departments(&[]), vec!["All"]);
    }
}
