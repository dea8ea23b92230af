//! Boundary resolution: free-text place name → polygon boundary.
//!
//! Names are normalized (lower-cased, punctuation stripped, whitespace →
//! underscores) and looked up in a read-only gazetteer directory of GeoJSON
//! files named `<key>_boundary.geojson`. A resolved boundary is persisted to
//! the run's geojson directory under the same deterministic name, so repeated
//! resolutions within a run are served from cache. No fallback place exists:
//! an unresolvable name is a fatal `GeocodeNotFound`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::info;

use crate::error::{ExecError, Result};

/// A polygon (or multipolygon) boundary with an associated CRS.
/// Only exterior rings are kept; the clip contract does not honour holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// Normalized name the boundary is keyed by.
    pub key: String,
    pub crs: String,
    /// One closed exterior ring per polygon, (x, y) pairs.
    pub rings: Vec<Vec<(f64, f64)>>,
}

impl Boundary {
    /// (min_x, min_y, max_x, max_y) over all rings.
    pub fn bbox(&self) -> (f64, f64, f64, f64) {
        let mut b = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for ring in &self.rings {
            for &(x, y) in ring {
                b.0 = b.0.min(x);
                b.1 = b.1.min(y);
                b.2 = b.2.max(x);
                b.3 = b.3.max(y);
            }
        }
        b
    }

    /// Even-odd ray cast over all exterior rings.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            let mut j = n - 1;
            for i in 0..n {
                let (xi, yi) = ring[i];
                let (xj, yj) = ring[j];
                if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                    inside = !inside;
                }
                j = i;
            }
        }
        inside
    }
}

/// Normalize a place name into a filesystem-safe lookup key:
/// lower-case, strip punctuation, collapse whitespace to underscores.
pub fn normalize_name(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    let mut last_sep = true;
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            key.extend(ch.to_lowercase());
            last_sep = false;
        } else if ch.is_whitespace() && !last_sep {
            key.push('_');
            last_sep = true;
        }
        // other punctuation is dropped entirely
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

/// Resolves place names against a gazetteer directory, caching per run.
pub struct Gazetteer {
    /// Read-only source of boundary GeoJSON files.
    source_dir: PathBuf,
    /// Per-run persistence directory for resolved boundaries.
    cache_dir: PathBuf,
    cache: HashMap<String, Boundary>,
}

impl Gazetteer {
    pub fn new(source_dir: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            source_dir,
            cache_dir,
            cache: HashMap::new(),
        }
    }

    /// Resolve a free-text place name to a boundary polygon.
    ///
    /// Lookup order: in-memory cache → run cache directory → gazetteer
    /// source directory (persisting a copy into the run cache).
    pub fn resolve(&mut self, name: &str) -> Result<Boundary> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(ExecError::GeocodeNotFound(name.to_string()));
        }
        if let Some(b) = self.cache.get(&key) {
            return Ok(b.clone());
        }

        let file_name = format!("{key}_boundary.geojson");
        let cached_path = self.cache_dir.join(&file_name);
        let source_path = self.source_dir.join(&file_name);

        let boundary = if cached_path.exists() {
            parse_geojson_file(&cached_path, &key)?
        } else if source_path.exists() {
            let b = parse_geojson_file(&source_path, &key)?;
            fs::create_dir_all(&self.cache_dir)?;
            fs::copy(&source_path, &cached_path)?;
            info!(location = name, path = %cached_path.display(), "boundary persisted");
            b
        } else {
            return Err(ExecError::GeocodeNotFound(name.to_string()));
        };

        self.cache.insert(key, boundary.clone());
        Ok(boundary)
    }
}

/// Parse a GeoJSON file holding a Polygon or MultiPolygon, either bare, as a
/// Feature, or as the first feature of a FeatureCollection.
fn parse_geojson_file(path: &Path, key: &str) -> Result<Boundary> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    let geometry = extract_geometry(&value).ok_or_else(|| {
        ExecError::MalformedDocument(format!(
            "no Polygon/MultiPolygon geometry in {}",
            path.display()
        ))
    })?;
    let rings = geometry_rings(geometry).ok_or_else(|| {
        ExecError::MalformedDocument(format!("bad geometry coordinates in {}", path.display()))
    })?;
    Ok(Boundary {
        key: key.to_string(),
        // GeoJSON (RFC 7946) geometries are WGS 84.
        crs: "EPSG:4326".to_string(),
        rings,
    })
}

fn extract_geometry(value: &Value) -> Option<&Value> {
    match value.get("type")?.as_str()? {
        "FeatureCollection" => value.get("features")?.as_array()?.first()?.get("geometry"),
        "Feature" => value.get("geometry"),
        "Polygon" | "MultiPolygon" => Some(value),
        _ => None,
    }
}

fn geometry_rings(geometry: &Value) -> Option<Vec<Vec<(f64, f64)>>> {
    let coords = geometry.get("coordinates")?;
    match geometry.get("type")?.as_str()? {
        "Polygon" => Some(vec![parse_ring(coords.as_array()?.first()?)?]),
        "MultiPolygon" => {
            let mut rings = Vec::new();
            for polygon in coords.as_array()? {
                rings.push(parse_ring(polygon.as_array()?.first()?)?);
            }
            Some(rings)
        }
        _ => None,
    }
}

fn parse_ring(ring: &Value) -> Option<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    for pos in ring.as_array()? {
        let pos = pos.as_array()?;
        out.push((pos.first()?.as_f64()?, pos.get(1)?.as_f64()?));
    }
    if out.len() < 3 {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_geojson() -> &'static str {
        r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "Vellore, India"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[79.0, 12.8], [79.2, 12.8], [79.2, 13.0], [79.0, 13.0], [79.0, 12.8]]]
                }
            }]
        }"#
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(normalize_name("Vellore, India"), "vellore_india");
        assert_eq!(normalize_name("  Chennai  "), "chennai");
        assert_eq!(normalize_name("St. John's"), "st_johns");
    }

    #[test]
    fn contains_uses_even_odd_rule() {
        let b = Boundary {
            key: "sq".into(),
            crs: "EPSG:4326".into(),
            rings: vec![vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]],
        };
        assert!(b.contains(1.0, 1.0));
        assert!(!b.contains(3.0, 1.0));
        assert!(!b.contains(-0.5, 0.5));
    }

    #[test]
    fn resolve_from_gazetteer_persists_to_cache() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        fs::write(
            source.path().join("vellore_india_boundary.geojson"),
            square_geojson(),
        )
        .unwrap();

        let mut gaz = Gazetteer::new(source.path().to_path_buf(), cache.path().to_path_buf());
        let b = gaz.resolve("Vellore, India").unwrap();
        assert_eq!(b.rings.len(), 1);
        assert!(cache
            .path()
            .join("vellore_india_boundary.geojson")
            .exists());

        // Second resolution is served from the in-memory cache.
        let b2 = gaz.resolve("Vellore, India").unwrap();
        assert_eq!(b, b2);
    }

    #[test]
    fn unknown_location_is_fatal() {
        let source = tempfile::tempdir().unwrap();
        let cache = tempfile::tempdir().unwrap();
        let mut gaz = Gazetteer::new(source.path().to_path_buf(), cache.path().to_path_buf());
        match gaz.resolve("Atlantis") {
            Err(ExecError::GeocodeNotFound(name)) => assert_eq!(name, "Atlantis"),
            other => panic!("expected GeocodeNotFound, got {other:?}"),
        }
    }
}
