use crate::config::AppConfig;
use crate::types::{DepartmentBoundary, Garden};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use shapefile::Reader;
use std::fs::File;
use std::io;

// Raw column names of the data.gouv.fr gardens dataset. The display labels
// ("Garden's name", "Department", ...) belong to the render layer.
const COL_NAME: &str = "nom_du_jardin";
const COL_DESCRIPTION: &str = "description";
const COL_DEPARTMENT: &str = "departement";
const COL_REGION: &str = "region";
const COL_TYPES: &str = "types";
const COL_LATITUDE: &str = "latitude";
const COL_LONGITUDE: &str = "longitude";
const COL_LINK: &str = "site_internet_et_autres_liens";

pub fn load_data(config: &AppConfig) -> Result<(Vec<Garden>, Vec<DepartmentBoundary>)> {
    println!("Loading data...");

    // 1. Load Gardens CSV
    let gardens = load_gardens(config)?;
    println!("Loaded {} gardens", gardens.len());

    // 2. Load Boundary Geometry (GeoJSON or Shapefile)
    let extension = config.input.boundaries.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Boundary geometry file has no extension"))?;

    let boundaries = match extension.as_str() {
        "json" | "geojson" => load_boundaries_geojson(config)?,
        "shp" => load_boundaries_shapefile(config)?,
        _ => return Err(anyhow!("Unsupported geometry format: {}", extension)),
    };

    println!("Loaded {} department boundaries", boundaries.len());

    Ok((gardens, boundaries))
}

fn load_gardens(config: &AppConfig) -> Result<Vec<Garden>> {
    let path = &config.input.gardens_csv;
    let file = File::open(path)
        .with_context(|| format!("Failed to open gardens CSV: {:?}", path))?;
    read_gardens(file)
        .with_context(|| format!("Malformed gardens CSV: {:?}", path))
}

// The dataset is semicolon-delimited. Parsing is strict: a missing column or
// an unparseable coordinate aborts the load, there is no partial-load mode.
fn read_gardens(input: impl io::Read) -> Result<Vec<Garden>> {
    let mut rdr = ReaderBuilder::new().delimiter(b';').from_reader(input);
    let headers = rdr.headers()?.clone();

    let col = |name: &str| -> Result<usize> {
        headers.iter().position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in CSV header", name))
    };

    let name_idx = col(COL_NAME)?;
    let description_idx = col(COL_DESCRIPTION)?;
    let department_idx = col(COL_DEPARTMENT)?;
    let region_idx = col(COL_REGION)?;
    let types_idx = col(COL_TYPES)?;
    let latitude_idx = col(COL_LATITUDE)?;
    let longitude_idx = col(COL_LONGITUDE)?;
    let link_idx = col(COL_LINK)?;

    let mut gardens = Vec::new();

    for (i, result) in rdr.records().enumerate() {
        // Header is line 1, first record is line 2.
        let line = i + 2;
        let record = result.with_context(|| format!("Bad CSV record at line {}", line))?;

        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let latitude: f64 = field(latitude_idx).parse()
            .with_context(|| format!("Bad latitude at line {}", line))?;
        let longitude: f64 = field(longitude_idx).parse()
            .with_context(|| format!("Bad longitude at line {}", line))?;

        let types_field = field(types_idx);
        let type_tags = split_type_tags(&types_field);

        let link = field(link_idx);
        let link = if link.is_empty() { None } else { Some(link) };

        gardens.push(Garden {
            name: field(name_idx),
            description: field(description_idx),
            department: field(department_idx),
            region: field(region_idx),
            types_field,
            type_tags,
            latitude,
            longitude,
            link,
        });
    }

    Ok(gardens)
}

/// Splits the pipe-delimited type field into tags, dropping empty fragments.
pub fn split_type_tags(types_field: &str) -> Vec<String> {
    types_field
        .split('|')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn load_boundaries_geojson(config: &AppConfig) -> Result<Vec<DepartmentBoundary>> {
    use std::io::BufReader;
    use geojson::GeoJson;
    use std::convert::TryInto;

    let path = &config.input.boundaries;
    println!("Loading GeoJSON boundaries from {:?}...", path);
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let reader = BufReader::new(file);

    // Parse the GeoJSON. warning: this loads the whole file into memory.
    let geojson = GeoJson::from_reader(reader)
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Boundary GeoJSON must be a FeatureCollection")),
    };

    let mut boundaries = Vec::new();

    for feature in collection.features {
        // 1. Department name property
        let name_val = feature.properties.as_ref()
            .and_then(|props| props.get(&config.input.boundary_name_property));

        let name = match name_val {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => continue, // Skip unnamed features
        };

        // 2. Geometry: polygons only, single polygons wrapped
        let geometry = match feature.geometry {
            Some(geom) => {
                let valid_geo: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry for '{}': {:?}", name, e))?;

                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => continue, // Skip points/lines
                }
            }
            None => continue,
        };

        boundaries.push(DepartmentBoundary { name, geometry });
    }

    Ok(boundaries)
}

fn load_boundaries_shapefile(config: &AppConfig) -> Result<Vec<DepartmentBoundary>> {
    let path = &config.input.boundaries;
    println!("Loading Shapefile boundaries from {:?}...", path);
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open Shapefile: {:?}", path))?;

    let mut boundaries = Vec::new();

    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result?;

        let name_value = record.get(&config.input.boundary_name_property)
            .ok_or_else(|| anyhow!(
                "Field '{}' not found in Shapefile",
                config.input.boundary_name_property
            ))?;

        let name = match name_value {
            shapefile::dbase::FieldValue::Character(Some(s)) => s.clone(),
            shapefile::dbase::FieldValue::Character(None) => continue, // Skip if null
            _ => return Err(anyhow!("Shapefile name field must be a string")),
        };

        let geometry = match shape {
            shapefile::Shape::Polygon(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygon: {:?}", e))?;
                geo_polygon
            }
            shapefile::Shape::PolygonM(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonM: {:?}", e))?;
                geo_polygon
            }
            shapefile::Shape::PolygonZ(polygon) => {
                let geo_polygon: MultiPolygon<f64> = polygon.try_into()
                    .map_err(|e| anyhow!("Failed to convert polygonZ: {:?}", e))?;
                geo_polygon
            }
            _ => continue, // Skip non-polygon shapes
        };

        boundaries.push(DepartmentBoundary { name, geometry });
    }

    Ok(boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
nom_du_jardin;description;departement;region;types;latitude;longitude;site_internet_et_autres_liens
Parc de la Tête d'Or;Grand parc urbain;Rhône;Auvergne-Rhône-Alpes;jardin public|parc;45.7772;4.8558;https://example.org/tete-dor
Jardin des Tuileries;Jardin à la française;Paris;Île-de-France;jardin historique;48.8634;2.3275;
";

    #[test]
    fn reads_semicolon_delimited_rows() {
        let gardens = read_gardens(CSV.as_bytes()).unwrap();
        assert_eq!(gardens.len(), 2);
        assert_eq!(gardens[0].name, "Parc de la Tête d'Or");
        assert_eq!(gardens[0].department, "Rhône");
        assert_eq!(gardens[0].latitude, 45.7772);
        assert_eq!(gardens[0].longitude, 4.8558);
    }

    #[test]
    fn splits_pipe_delimited_types() {
        let gardens = read_gardens(CSV.as_bytes()).unwrap();
        assert_eq!(gardens[0].types_field, "jardin public|parc");
        assert_eq!(gardens[0].type_tags, vec!["jardin public", "parc"]);
        assert_eq!(gardens[1].type_tags, vec!["jardin historique"]);
    }

    #[test]
    fn empty_link_becomes_none() {
        let gardens = read_gardens(CSV.as_bytes()).unwrap();
        assert_eq!(gardens[0].link.as_deref(), Some("https://example.org/tete-dor"));
        assert_eq!(gardens[1].link, None);
    }

    #[test]
    fn bad_coordinate_is_fatal() {
        let csv = "\
nom_du_jardin;description;departement;region;types;latitude;longitude;site_internet_et_autres_liens
Broken;x;Paris;Île-de-France;parc;not-a-number;2.0;
";
        let err = read_gardens(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "nom_du_jardin;departement\nA;Paris\n";
        let err = read_gardens(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("description"));
    }

    #[test]
    fn empty_type_fragments_are_dropped() {
        assert_eq!(split_type_tags("parc||jardin public"), vec!["parc", "jardin public"]);
        assert!(split_type_tags("").is_empty());
    }
}
