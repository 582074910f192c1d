//! GeoJSON point collection.
//!
//! GeoJSON positions are `[longitude, latitude]`, the reverse of the
//! record's field order.

use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, Strain};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: FeatureProperties,
    pub geometry: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub id: String,
    pub strain: Strain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`
    pub coordinates: [f64; 2],
}

impl From<&PatientRecord> for Feature {
    fn from(record: &PatientRecord) -> Self {
        Feature {
            kind: "Feature".to_string(),
            properties: FeatureProperties {
                id: record.id.clone(),
                strain: record.strain,
            },
            geometry: Point {
                kind: "Point".to_string(),
                coordinates: [record.longitude, record.latitude],
            },
        }
    }
}

/// One point feature per record, in record order.
pub fn to_feature_collection(records: &[PatientRecord]) -> FeatureCollection {
    FeatureCollection {
        kind: "FeatureCollection".to_string(),
        features: records.iter().map(Feature::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, latitude: f64, longitude: f64, strain: Strain) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            latitude,
            longitude,
            strain,
        }
    }

    #[test]
    fn test_coordinates_are_lon_lat() {
        let collection = to_feature_collection(&[record("P1", 22.2, 113.5, Strain::Mrsa)]);
        let feature = &collection.features[0];

        assert_eq!(feature.geometry.coordinates, [113.5, 22.2]);
    }

    #[test]
    fn test_feature_json_shape() {
        let collection = to_feature_collection(&[record("张三", 22.27, 113.57, Strain::Cro)]);
        let value = serde_json::to_value(&collection).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": { "id": "张三", "strain": "CRO" },
                    "geometry": { "type": "Point", "coordinates": [113.57, 22.27] }
                }]
            })
        );
    }

    #[test]
    fn test_preserves_record_order() {
        let collection = to_feature_collection(&[
            record("B", 22.0, 113.0, Strain::Other),
            record("A", 23.0, 114.0, Strain::Esble),
        ]);
        let ids: Vec<_> = collection.features.iter().map(|f| f.properties.id.as_str()).collect();

        assert_eq!(ids, ["B", "A"]);
    }
}
