use super::{FieldType, BASE};
use crate::constraints::ConstraintKind;
use crate::error::{Result, TableError};
use crate::field::Field;
use crate::value::Value;
use serde_json::{json, Value as JsonValue};

const GEOMETRY_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeoPointFormat {
    /// `"lon,lat"`
    Default,
    /// `[lon, lat]`
    Array,
    /// `{"lon": .., "lat": ..}`
    Object,
}

/// Longitude/latitude pairs.
#[derive(Debug, Clone)]
pub struct GeoPointType {
    format: GeoPointFormat,
}

impl GeoPointType {
    pub fn from_field(field: &Field) -> Result<Self> {
        let format = match field.format.as_str() {
            "" | "default" => GeoPointFormat::Default,
            "array" => GeoPointFormat::Array,
            "object" => GeoPointFormat::Object,
            other => {
                return Err(TableError::field(format!(
                    "field \"{}\" has unsupported geopoint format \"{other}\"",
                    field.name
                )));
            }
        };
        Ok(Self { format })
    }

    fn coordinates(&self, cell: &Value) -> Option<(f64, f64)> {
        if let Value::GeoPoint { lon, lat } = cell {
            return Some((*lon, *lat));
        }
        match self.format {
            GeoPointFormat::Default => {
                let (lon, lat) = cell.as_str()?.split_once(',')?;
                Some((lon.trim().parse().ok()?, lat.trim().parse().ok()?))
            }
            GeoPointFormat::Array => {
                let json = json_cell(cell)?;
                match json.as_array()?.as_slice() {
                    [lon, lat] => Some((lon.as_f64()?, lat.as_f64()?)),
                    _ => None,
                }
            }
            GeoPointFormat::Object => {
                let json = json_cell(cell)?;
                let map = json.as_object()?;
                if map.len() != 2 {
                    return None;
                }
                Some((map.get("lon")?.as_f64()?, map.get("lat")?.as_f64()?))
            }
        }
    }
}

impl FieldType for GeoPointType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let (lon, lat) = self.coordinates(cell)?;
        let in_range = (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat);
        in_range.then_some(Value::GeoPoint { lon, lat })
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        let Value::GeoPoint { lon, lat } = value else {
            return None;
        };
        Some(match self.format {
            GeoPointFormat::Default => format!("{lon},{lat}"),
            GeoPointFormat::Array => json!([lon, lat]).to_string(),
            GeoPointFormat::Object => json!({"lon": lon, "lat": lat}).to_string(),
        })
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        BASE
    }
}

/// GeoJSON objects, or TopoJSON topologies with the `topojson` format.
#[derive(Debug, Clone)]
pub struct GeoJsonType {
    topojson: bool,
}

impl GeoJsonType {
    pub fn from_field(field: &Field) -> Result<Self> {
        match field.format.as_str() {
            "" | "default" => Ok(Self { topojson: false }),
            "topojson" => Ok(Self { topojson: true }),
            other => Err(TableError::field(format!(
                "field \"{}\" has unsupported geojson format \"{other}\"",
                field.name
            ))),
        }
    }
}

fn is_geometry(json: &JsonValue) -> bool {
    let Some(kind) = json.get("type").and_then(JsonValue::as_str) else {
        return false;
    };
    if kind == "GeometryCollection" {
        return json
            .get("geometries")
            .and_then(JsonValue::as_array)
            .is_some_and(|items| items.iter().all(is_geometry));
    }
    GEOMETRY_TYPES.contains(&kind) && json.get("coordinates").is_some_and(JsonValue::is_array)
}

fn is_geojson(json: &JsonValue) -> bool {
    match json.get("type").and_then(JsonValue::as_str) {
        Some("Feature") => json
            .get("geometry")
            .is_some_and(|geometry| geometry.is_null() || is_geometry(geometry)),
        Some("FeatureCollection") => json
            .get("features")
            .and_then(JsonValue::as_array)
            .is_some_and(|features| features.iter().all(is_geojson)),
        _ => is_geometry(json),
    }
}

impl FieldType for GeoJsonType {
    fn read_value(&self, cell: &Value) -> Option<Value> {
        let json = json_cell(cell)?;
        if !json.is_object() {
            return None;
        }
        let valid = if self.topojson {
            json.get("type").and_then(JsonValue::as_str) == Some("Topology")
                && json.get("objects").is_some_and(JsonValue::is_object)
        } else {
            is_geojson(&json)
        };
        valid.then_some(Value::Json(json))
    }

    fn write_value(&self, value: &Value) -> Option<String> {
        match value {
            Value::Json(json) => Some(json.to_string()),
            _ => None,
        }
    }

    fn supported_constraints(&self) -> &'static [ConstraintKind] {
        BASE
    }
}

/// JSON payload of a cell: native JSON or a string holding JSON text.
pub(super) fn json_cell(cell: &Value) -> Option<JsonValue> {
    match cell {
        Value::Json(json) => Some(json.clone()),
        Value::String(text) => serde_json::from_str(text).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geopoint(format: &str) -> GeoPointType {
        let mut field = Field::new("location", "geopoint");
        field.format = format.to_string();
        GeoPointType::from_field(&field).unwrap()
    }

    #[test]
    fn test_geopoint_formats() {
        let expected = Some(Value::GeoPoint { lon: 90.0, lat: 45.0 });
        assert_eq!(geopoint("default").read_value(&Value::from("90, 45")), expected);
        assert_eq!(geopoint("array").read_value(&Value::from("[90, 45]")), expected);
        assert_eq!(
            geopoint("object").read_value(&Value::from(r#"{"lon": 90, "lat": 45}"#)),
            expected
        );
        assert_eq!(geopoint("default").read_value(&Value::from("200,45")), None);
        assert_eq!(geopoint("array").read_value(&Value::from("[1, 2, 3]")), None);
    }

    #[test]
    fn test_geopoint_unknown_format() {
        let mut field = Field::new("location", "geopoint");
        field.format = "wkt".to_string();
        assert!(GeoPointType::from_field(&field).is_err());
    }

    #[test]
    fn test_geojson() {
        let ty = GeoJsonType::from_field(&Field::new("shape", "geojson")).unwrap();
        let point = Value::from(r#"{"type": "Point", "coordinates": [1, 2]}"#);
        assert!(ty.read_value(&point).is_some());
        let feature = Value::from(r#"{"type": "Feature", "geometry": null, "properties": {}}"#);
        assert!(ty.read_value(&feature).is_some());
        assert!(ty.read_value(&Value::from(r#"{"type": "Circle"}"#)).is_none());
        assert!(ty.read_value(&Value::from("not json")).is_none());
    }
}
