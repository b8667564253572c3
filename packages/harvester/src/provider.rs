//! Wire shapes of the provider's JSON responses.
//!
//! Every response wraps its payload in `{"data": ..., "metadata": {...}}`.
//! Index payloads are either flat row lists or GeoJSON feature collections.

use serde::Deserialize;

/// Response envelope shared by all endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl<T> Envelope<T> {
    /// Dataset version carried in the metadata block, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.version.as_deref())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Metadata block of a response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub version: Option<String>,
}

/// GeoJSON feature collection.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection<P> {
    #[serde(default = "Vec::new")]
    pub features: Vec<Feature<P>>,
}

/// One GeoJSON feature with typed properties and an opaque geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature<P> {
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
    pub properties: P,
}

/// A named numeric fact about an entity (area, shelf area, ...).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Metric {
    pub title: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub units: Option<String>,
}

/// One labelled time series of a catch response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatchSeries {
    pub key: String,
    #[serde(default)]
    pub values: Vec<(i32, f64)>,
}

/// Catch time-series response; `data` is null or missing when the provider
/// has nothing for the requested measure and dimension.
#[derive(Debug, Clone, Deserialize)]
pub struct CatchResponse {
    #[serde(default)]
    pub data: Option<Vec<CatchSeries>>,
}

impl CatchResponse {
    /// Series carrying at least one value, or `None` for the no-data signal.
    #[must_use]
    pub fn into_series(self) -> Option<Vec<CatchSeries>> {
        let series: Vec<CatchSeries> = self
            .data?
            .into_iter()
            .filter(|s| !s.values.is_empty())
            .collect();
        (!series.is_empty()).then_some(series)
    }
}

/// Row of an id → name lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupRow {
    pub id: i64,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_version() {
        let envelope: Envelope<Vec<LookupRow>> = serde_json::from_value(json!({
            "data": [],
            "metadata": {"version": " 50.1 "}
        }))
        .unwrap();
        assert_eq!(envelope.version(), Some("50.1"));
    }

    #[test]
    fn test_envelope_without_metadata() {
        let envelope: Envelope<Vec<LookupRow>> =
            serde_json::from_value(json!({"data": [{"id": 1, "name": "Species"}]})).unwrap();
        assert!(envelope.version().is_none());
        assert_eq!(envelope.data[0].name, "Species");
    }

    #[test]
    fn test_blank_version_is_absent() {
        let envelope: Envelope<Vec<LookupRow>> =
            serde_json::from_value(json!({"data": [], "metadata": {"version": ""}})).unwrap();
        assert!(envelope.version().is_none());
    }

    #[test]
    fn test_feature_without_geometry() {
        #[derive(Debug, Deserialize)]
        struct Props {
            region_id: i64,
        }

        let collection: FeatureCollection<Props> = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null, "properties": {"region_id": 8}},
                {"type": "Feature", "properties": {"region_id": 9}}
            ]
        }))
        .unwrap();

        assert_eq!(collection.features.len(), 2);
        assert!(collection.features[0].geometry.is_none());
        assert_eq!(collection.features[1].properties.region_id, 9);
    }

    #[test]
    fn test_catch_response_no_data_signals() {
        let null: CatchResponse = serde_json::from_value(json!({"data": null})).unwrap();
        assert!(null.into_series().is_none());

        let missing: CatchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(missing.into_series().is_none());

        let empty: CatchResponse = serde_json::from_value(json!({"data": []})).unwrap();
        assert!(empty.into_series().is_none());

        let hollow: CatchResponse =
            serde_json::from_value(json!({"data": [{"key": "Others", "values": []}]})).unwrap();
        assert!(hollow.into_series().is_none());
    }

    #[test]
    fn test_catch_response_with_values() {
        let response: CatchResponse = serde_json::from_value(json!({
            "data": [
                {"key": "Sardina pilchardus", "values": [[1950, 12.5], [1951, 13.0]]},
                {"key": "Others", "values": []}
            ]
        }))
        .unwrap();

        let series = response.into_series().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].values, vec![(1950, 12.5), (1951, 13.0)]);
    }

    #[test]
    fn test_metric_defaults() {
        let metric: Metric = serde_json::from_value(json!({"title": "Seamounts"})).unwrap();
        assert_eq!(metric.value, 0.0);
        assert!(metric.units.is_none());
    }
}
