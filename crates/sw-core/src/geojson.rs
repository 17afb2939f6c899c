//! Minimal GeoJSON reader for road and building layers.
//!
//! Only the shapes the simulation consumes are extracted:
//!
//! | Geometry          | Result                                   |
//! |-------------------|------------------------------------------|
//! | `LineString`      | one [`LineFeature`]                      |
//! | `MultiLineString` | one [`LineFeature`] per part             |
//! | `Polygon`         | one [`PolygonFeature`] (outer ring)      |
//! | `MultiPolygon`    | one [`PolygonFeature`] per polygon       |
//!
//! Other geometry types and features without geometry are counted in
//! `skipped` and otherwise ignored.  Coordinates go through
//! [`GeoPoint::from_raw`], so lon/lat and Web-Mercator input are both
//! accepted, and a third (altitude) component is dropped.

use std::path::Path;

use serde_json::Value;

use crate::{GeoPoint, SwError, SwResult};

/// A feature's `properties` object.
pub type Properties = serde_json::Map<String, Value>;

/// A single polyline with the properties of the feature it came from.
#[derive(Clone, Debug)]
pub struct LineFeature {
    pub coords:     Vec<GeoPoint>,
    pub properties: Properties,
}

/// The outer ring of a polygon with its feature's properties.
#[derive(Clone, Debug)]
pub struct PolygonFeature {
    pub ring:       Vec<GeoPoint>,
    pub properties: Properties,
}

/// Lines and polygons extracted from one `FeatureCollection`.
#[derive(Clone, Debug, Default)]
pub struct FeatureCollection {
    pub lines:    Vec<LineFeature>,
    pub polygons: Vec<PolygonFeature>,
    /// Features whose geometry was missing or unsupported.
    pub skipped:  usize,
}

impl FeatureCollection {
    /// Read and parse a GeoJSON file.
    pub fn read(path: &Path) -> SwResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> SwResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Extract features from an already-parsed document.
    ///
    /// The root may be a `FeatureCollection` or a single `Feature`.
    pub fn from_value(root: &Value) -> SwResult<Self> {
        let mut out = Self::default();
        match root.get("type").and_then(Value::as_str) {
            Some("FeatureCollection") => {
                let features = root
                    .get("features")
                    .and_then(Value::as_array)
                    .ok_or_else(|| SwError::GeoJson("FeatureCollection without `features` array".into()))?;
                for feature in features {
                    out.push_feature(feature);
                }
            }
            Some("Feature") => out.push_feature(root),
            Some(other) => {
                return Err(SwError::GeoJson(format!("unsupported root type `{other}`")));
            }
            None => return Err(SwError::GeoJson("root object has no `type`".into())),
        }
        Ok(out)
    }

    /// Every coordinate of every extracted line and ring.
    pub fn all_points(&self) -> impl Iterator<Item = GeoPoint> + '_ {
        self.lines
            .iter()
            .flat_map(|l| l.coords.iter().copied())
            .chain(self.polygons.iter().flat_map(|p| p.ring.iter().copied()))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.polygons.is_empty()
    }

    fn push_feature(&mut self, feature: &Value) {
        let properties = feature
            .get("properties")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let Some(geometry) = feature.get("geometry").filter(|g| !g.is_null()) else {
            self.skipped += 1;
            return;
        };
        let coords = geometry.get("coordinates");
        match (geometry.get("type").and_then(Value::as_str), coords) {
            (Some("LineString"), Some(c)) => {
                self.lines.push(LineFeature { coords: position_list(c), properties });
            }
            (Some("MultiLineString"), Some(Value::Array(parts))) => {
                for part in parts {
                    self.lines.push(LineFeature { coords: position_list(part), properties: properties.clone() });
                }
            }
            (Some("Polygon"), Some(Value::Array(rings))) => {
                if let Some(outer) = rings.first() {
                    self.polygons.push(PolygonFeature { ring: position_list(outer), properties });
                }
            }
            (Some("MultiPolygon"), Some(Value::Array(polys))) => {
                for poly in polys {
                    if let Some(outer) = poly.as_array().and_then(|rings| rings.first()) {
                        self.polygons.push(PolygonFeature { ring: position_list(outer), properties: properties.clone() });
                    }
                }
            }
            _ => self.skipped += 1,
        }
    }
}

/// Convert a GeoJSON position array, dropping malformed positions.
fn position_list(value: &Value) -> Vec<GeoPoint> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|pos| {
            let pos = pos.as_array()?;
            let x = pos.first()?.as_f64()?;
            let y = pos.get(1)?.as_f64()?;
            GeoPoint::from_raw(x, y)
        })
        .collect()
}

/// Look up the first numeric property among `keys` (case-insensitive).
///
/// Numeric strings such as `"12.5"` are accepted; shapefile exports often
/// store attributes as text.
pub fn number_prop(props: &Properties, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let value = props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)?;
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|v| v.is_finite())
    })
}
