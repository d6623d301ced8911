use crate::types::{DepartmentCount, Garden};
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::{json, Value as JsonValue};

/// Fallback map center for an empty selection: metropolitan France. The mean
/// position of zero gardens is undefined, so the maps fall back here instead
/// of failing.
pub const FRANCE_CENTER: (f64, f64) = (46.603354, 1.888334);

const ZOOM_START: u8 = 5;

// ColorBrewer BuPu, 6 classes, light to dark.
const BUPU: [&str; 6] = [
    "#edf8fb", "#bfd3e6", "#9ebcda", "#8c96c6", "#8856a7", "#810f7c",
];

/// Mean latitude/longitude of the filtered gardens, or [`FRANCE_CENTER`]
/// when the collection is empty.
pub fn map_center(gardens: &[Garden]) -> (f64, f64) {
    if gardens.is_empty() {
        return FRANCE_CENTER;
    }
    let n = gardens.len() as f64;
    let lat = gardens.iter().map(|g| g.latitude).sum::<f64>() / n;
    let lon = gardens.iter().map(|g| g.longitude).sum::<f64>() / n;
    (lat, lon)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn fill_color(count: usize, max_count: usize) -> &'static str {
    if max_count == 0 || count == 0 {
        return BUPU[0];
    }
    let t = count as f64 / max_count as f64;
    let idx = (t * (BUPU.len() - 1) as f64).round() as usize;
    BUPU[idx.min(BUPU.len() - 1)]
}

// Leaflet core plus the markercluster plugin, pulled from CDNs. Included once
// per page, shared by both maps.
const HEAD_LIBS: &str = r#"
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous" referrerpolicy="no-referrer" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous" referrerpolicy="no-referrer"></script>
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.css" />
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.Default.css" />
  <script src="https://unpkg.com/leaflet.markercluster@1.4.1/dist/leaflet.markercluster.js"></script>
  <style>
    .map-frame { height: 520px; width: 100%; border: 1px solid #d0d0d0; border-radius: 4px; }
    .department-tooltip {
      background-color: white; color: #333333;
      font-family: arial; font-size: 12px; padding: 5px;
    }
    .count-legend {
      background: white; padding: 8px 10px; border-radius: 4px;
      box-shadow: 0 1px 4px rgba(0,0,0,0.3); font: 12px arial;
    }
    .count-legend .swatch { display: inline-block; width: 22px; height: 12px; }
  </style>
"#;

const GARDENS_MAP_SCRIPT: &str = r#"
<div id="gardens-map" class="map-frame"></div>
<script>
(function () {
  const gardens = __GARDENS__;
  const map = L.map('gardens-map', { center: __CENTER__, zoom: __ZOOM__ });
  L.control.scale().addTo(map);
  L.tileLayer('https://tile.openstreetmap.org/{z}/{x}/{y}.png', {
    maxZoom: 19,
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);

  const clusters = L.markerClusterGroup();
  for (const g of gardens) {
    const link = g.link ? '<a href="' + g.link + '" target="_blank">' + g.link + '</a>' : 'n/a';
    const text =
      '<h6><b>Information</b></h6>' +
      '<i>Name</i>: ' + g.name + '<br>' +
      '<i>Location</i>: ' + g.region + '<br>' +
      '<i>To know more</i>: ' + link;
    L.marker([g.lat, g.lon]).bindPopup(text, { maxWidth: 400 }).addTo(clusters);
  }
  map.addLayer(clusters);
})();
</script>
"#;

const CHOROPLETH_SCRIPT: &str = r#"
<div id="departments-map" class="map-frame"></div>
<script>
(function () {
  const departments = __DEPARTMENTS__;
  const maxCount = __MAX_COUNT__;
  const map = L.map('departments-map', { center: __CENTER__, zoom: __ZOOM__ });
  L.control.scale().addTo(map);
  L.tileLayer('https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png', {
    attribution: '&copy; OpenStreetMap contributors &copy; CARTO'
  }).addTo(map);

  // Filled polygons, colored in Rust via the feature's fill property.
  const fills = L.geoJSON(departments, {
    style: function (feature) {
      return {
        fillColor: feature.properties.fill,
        fillOpacity: 0.6,
        color: '#555555',
        weight: 1,
        opacity: 0.2
      };
    }
  }).addTo(map);

  // Thin-border overlay kept in front for hover tooltips and highlighting.
  const borders = L.geoJSON(departments, {
    style: { fillColor: '#ffffff', color: '#000000', fillOpacity: 0.1, weight: 0.1 },
    onEachFeature: function (feature, layer) {
      layer.bindTooltip(
        'Department: ' + feature.properties.department +
        '<br>Number of gardens: ' + feature.properties.count,
        { sticky: true, className: 'department-tooltip' }
      );
      layer.on('mouseover', function () {
        layer.setStyle({ fillColor: '#000000', fillOpacity: 0.3 });
      });
      layer.on('mouseout', function () {
        layer.setStyle({ fillColor: '#ffffff', fillOpacity: 0.1 });
      });
    }
  }).addTo(map);
  borders.bringToFront();

  L.control.layers(null, { 'Remarkable gardens': fills }).addTo(map);

  if (maxCount > 0) {
    const legend = L.control({ position: 'bottomright' });
    legend.onAdd = function () {
      const div = L.DomUtil.create('div', 'count-legend');
      const swatches = ['#edf8fb', '#bfd3e6', '#9ebcda', '#8c96c6', '#8856a7', '#810f7c']
        .map(function (c) { return '<span class="swatch" style="background:' + c + '"></span>'; })
        .join('');
      div.innerHTML =
        'Number of gardens by department<br>' + swatches +
        '<br>1' + '&nbsp;'.repeat(30) + maxCount;
      return div;
    };
    legend.addTo(map);
  }
})();
</script>
"#;

/// Marker-cluster map of the filtered gardens as an embeddable HTML fragment.
pub fn gardens_map_fragment(gardens: &[Garden], center: (f64, f64)) -> String {
    let markers: Vec<JsonValue> = gardens
        .iter()
        .map(|g| {
            json!({
                "name": escape_html(&g.name),
                "region": escape_html(&g.region),
                "link": g.link.as_deref().map(escape_html),
                "lat": g.latitude,
                "lon": g.longitude,
            })
        })
        .collect();

    GARDENS_MAP_SCRIPT
        .replace("__GARDENS__", &JsonValue::Array(markers).to_string())
        .replace("__CENTER__", &format!("[{}, {}]", center.0, center.1))
        .replace("__ZOOM__", &ZOOM_START.to_string())
}

/// Choropleth of garden counts per department as an embeddable HTML fragment.
pub fn choropleth_fragment(counts: &[DepartmentCount], center: (f64, f64)) -> String {
    let max_count = counts.iter().map(|d| d.count).max().unwrap_or(0);

    let features: Vec<Feature> = counts
        .iter()
        .map(|d| {
            let mut props = serde_json::Map::new();
            props.insert("department".into(), JsonValue::String(escape_html(&d.department)));
            props.insert("count".into(), JsonValue::from(d.count));
            props.insert(
                "fill".into(),
                JsonValue::String(fill_color(d.count, max_count).to_string()),
            );
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&d.geometry))),
                id: None,
                properties: Some(props),
                foreign_members: None,
            }
        })
        .collect();

    let collection = GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });

    CHOROPLETH_SCRIPT
        .replace("__DEPARTMENTS__", &collection.to_string())
        .replace("__MAX_COUNT__", &max_count.to_string())
        .replace("__CENTER__", &format!("[{}, {}]", center.0, center.1))
        .replace("__ZOOM__", &ZOOM_START.to_string())
}

const MAP_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>__TITLE__</title>
__HEAD_LIBS__
  <style>html, body { height: 100%; margin: 0; } .map-frame { height: 100%; border: none; border-radius: 0; }</style>
</head>
<body>
__FRAGMENT__
</body>
</html>
"#;

/// Wraps a map fragment into a standalone full-page document.
pub fn map_page(title: &str, fragment: &str) -> String {
    MAP_PAGE
        .replace("__TITLE__", &escape_html(title))
        .replace("__HEAD_LIBS__", HEAD_LIBS)
        .replace("__FRAGMENT__", fragment)
}

const DASHBOARD_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Gardens of France</title>
__HEAD_LIBS__
  <style>
    body { margin: 0; font-family: Georgia, serif; color: #222222; }
    .layout { display: grid; grid-template-columns: 260px 1fr; min-height: 100vh; }
    .sidebar { background: #f4f2ee; padding: 24px 18px; border-right: 1px solid #ddd8cf; }
    .sidebar label { display: block; margin: 18px 0 6px; font-size: 14px; }
    .sidebar select { width: 100%; padding: 6px; font-size: 14px; }
    .content { padding: 28px 40px; max-width: 1100px; }
    h1 { margin-top: 0; }
    h2 { border-bottom: 3px solid #c9b7e4; padding-bottom: 4px; margin-top: 40px; }
    table { border-collapse: collapse; width: 100%; font-size: 14px; }
    th, td { border: 1px solid #ddd8cf; padding: 8px 10px; text-align: left; vertical-align: top; }
    th { background: #f4f2ee; }
    details summary { cursor: pointer; margin-bottom: 12px; }
    .map-blurb { margin: 16px 0 8px; }
  </style>
</head>
<body>
<div class="layout">
  <form class="sidebar" method="get" action="/">
    <label for="garden_type">What type of garden would you like to see?</label>
    <select id="garden_type" name="garden_type" onchange="this.form.submit()">
__TYPE_OPTIONS__
    </select>
    <label for="department">Which department in particular would you like to consider?</label>
    <select id="department" name="department" onchange="this.form.submit()">
__DEPARTMENT_OPTIONS__
    </select>
    <noscript><button type="submit">Apply</button></noscript>
  </form>
  <main class="content">
    <h1>Gardens of France</h1>
    <p><b>Using the maps below, discover the most remarkable gardens of France 🌳 🌲 🌴!</b></p>

    <h2>Purpose</h2>
    <p>
      This app illustrates how to visualize geospatial data with Leaflet from a
      small web service. Pick a garden type and a department in the sidebar:
      the maps and the table below are recomputed for your selection.
    </p>

    <h2>Data description</h2>
    <p>
      The data on the gardens was taken from the French gov open source platform here:
      <a href="https://www.data.gouv.fr/fr/datasets/liste-des-jardins-remarquables/">gardens</a>.
      It provides geospatial information on the most remarkable gardens of France.
    </p>
    <p>
      The geojson data for the French departments was taken from here:
      <a href="https://france-geojson.gregoiredavid.fr/">geojson</a>
      (thank you very much Grégoire for making the data available!).
    </p>

    <h2>Maps</h2>
    <p class="map-blurb">
      Below a map showing the repartition of the remarkable gardens on the French territory.
    </p>
__GARDENS_MAP__
    <p class="map-blurb">
      Below a map showing the number of gardens by department.
    </p>
__DEPARTMENTS_MAP__

    <h2>Full list of gardens</h2>
    <p>
      The descriptions of the gardens in the table below are provided in French:
      this is a good occasion for you to practice it 😉.
    </p>
    <details>
      <summary>Please click here to see the full list of the gardens, with detailed descriptions</summary>
      <table>
        <thead>
          <tr><th>Garden's name</th><th>Description</th></tr>
        </thead>
        <tbody>
__TABLE_ROWS__
        </tbody>
      </table>
    </details>
  </main>
</div>
</body>
</html>
"#;

/// Everything the dashboard page needs, already filtered and rendered.
pub struct DashboardView<'a> {
    pub types: &'a [String],
    pub departments: &'a [String],
    pub selected_type: &'a str,
    pub selected_department: &'a str,
    pub gardens: &'a [Garden],
    pub gardens_map: &'a str,
    pub departments_map: &'a str,
}

fn options_html(values: &[String], selected: &str) -> String {
    let mut out = String::new();
    for value in values {
        let escaped = escape_html(value);
        let marker = if value == selected { " selected" } else { "" };
        out.push_str(&format!(
            "      <option value=\"{escaped}\"{marker}>{escaped}</option>\n"
        ));
    }
    out
}

fn table_rows_html(gardens: &[Garden]) -> String {
    let mut out = String::new();
    for garden in gardens {
        out.push_str(&format!(
            "          <tr><td>{}</td><td>{}</td></tr>\n",
            escape_html(&garden.name),
            escape_html(&garden.description),
        ));
    }
    out
}

/// Assembles the full dashboard page: sidebar controls, text sections, both
/// maps inline, and the filtered gardens table.
pub fn dashboard_page(view: &DashboardView) -> String {
    DASHBOARD_PAGE
        .replace("__HEAD_LIBS__", HEAD_LIBS)
        .replace("__TYPE_OPTIONS__", &options_html(view.types, view.selected_type))
        .replace(
            "__DEPARTMENT_OPTIONS__",
            &options_html(view.departments, view.selected_department),
        )
        .replace("__GARDENS_MAP__", view.gardens_map)
        .replace("__DEPARTMENTS_MAP__", view.departments_map)
        .replace("__TABLE_ROWS__", &table_rows_html(view.gardens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::split_type_tags;
    use geo::{polygon, MultiPolygon};

    fn garden(name: &str, lat: f64, lon: f64) -> Garden {
        Garden {
            name: name.to_string(),
            description: "Un <b>beau</b> jardin".to_string(),
            department: "Rhône".to_string(),
            region: "Auvergne-Rhône-Alpes".to_string(),
            types_field: "parc".to_string(),
            type_tags: split_type_tags("parc"),
            latitude: lat,
            longitude: lon,
            link: None,
        }
    }

    fn count(department: &str, count: usize) -> DepartmentCount {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ];
        DepartmentCount {
            department: department.to_string(),
            count,
            geometry: MultiPolygon::new(vec![square]),
        }
    }

    #[test]
    fn center_is_mean_of_coordinates() {
        let gardens = vec![garden("A", 44.0, 2.0), garden("B", 46.0, 6.0)];
        assert_eq!(map_center(&gardens), (45.0, 4.0));
    }

    #[test]
    fn empty_selection_falls_back_to_france_center() {
        assert_eq!(map_center(&[]), FRANCE_CENTER);
    }

    #[test]
    fn empty_selection_still_renders_both_maps() {
        let markers = gardens_map_fragment(&[], FRANCE_CENTER);
        assert!(markers.contains("markerClusterGroup"));
        assert!(markers.contains("46.603354"));

        let choropleth = choropleth_fragment(&[], FRANCE_CENTER);
        assert!(choropleth.contains("\"features\":[]"));
    }

    #[test]
    fn fill_color_scales_with_count() {
        assert_eq!(fill_color(0, 10), BUPU[0]);
        assert_eq!(fill_color(10, 10), BUPU[5]);
        assert_eq!(fill_color(1, 1000), BUPU[0]);
        // Monotonic over the whole range.
        let mut last = 0;
        for c in 1..=10 {
            let idx = BUPU.iter().position(|&b| b == fill_color(c, 10)).unwrap();
            assert!(idx >= last);
            last = idx;
        }
    }

    #[test]
    fn choropleth_carries_department_and_count_properties() {
        let fragment = choropleth_fragment(&[count("Rhône", 2), count("Paris", 1)], FRANCE_CENTER);
        assert!(fragment.contains("\"department\":\"Rhône\""));
        assert!(fragment.contains("\"count\":2"));
        assert!(fragment.contains("\"fill\":\"#810f7c\""));
    }

    #[test]
    fn marker_text_is_html_escaped() {
        let mut g = garden("Château <script>", 45.0, 4.0);
        g.link = Some("https://example.org/?a=1&b=2".to_string());
        let fragment = gardens_map_fragment(&[g], FRANCE_CENTER);
        assert!(!fragment.contains("Château <script>"));
        assert!(fragment.contains("Château &lt;script&gt;"));
        assert!(fragment.contains("a=1&amp;b=2"));
    }

    #[test]
    fn dashboard_marks_the_selected_options() {
        let types = vec!["All".to_string(), "parc".to_string()];
        let departments = vec!["All".to_string(), "Rhône".to_string()];
        let gardens = vec![garden("Tête d'Or", 45.0, 4.0)];
        let page = dashboard_page(&DashboardView {
            types: &types,
            departments: &departments,
            selected_type: "parc",
            selected_department: "All",
            gardens: &gardens,
            gardens_map: "<!-- map a -->",
            departments_map: "<!-- map b -->",
        });
        assert!(page.contains("<option value=\"parc\" selected>parc</option>"));
        assert!(page.contains("<option value=\"All\" selected>All</option>"));
        assert!(page.contains("Tête d&#39;Or"));
        assert!(page.contains("&lt;b&gt;beau&lt;/b&gt;"));
        assert!(page.contains("<!-- map a -->"));
    }
}
