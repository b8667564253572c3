//! Normalized catalog documents and the transformer capability.
//!
//! Documents are assembled once through [`DocumentBuilder`] and never
//! touched again. The builder enforces the omission rules: blank values are
//! dropped, absent optional values are skipped, and empty lists are left out
//! of the serialized form entirely.

use serde::Serialize;

use crate::extract::{RawEntity, VersionToken};
use crate::provider::Metric;

/// Publisher of every harvested record.
pub const PUBLISHER: &str = "Sea Around Us";

/// Creators credited on every harvested record.
pub const CREATORS: &[&str] = &[
    "Sea Around Us",
    "Institute for the Oceans and Fisheries, University of British Columbia",
];

/// Rights statement of the provider's data.
pub const RIGHTS: &str =
    "Creative Commons Attribution-NonCommercial 4.0 International (CC BY-NC 4.0)";

/// Formats in which the provider serves its data.
pub const FORMATS: &[&str] = &["application/json", "text/csv"];

/// Resource type of every harvested record.
pub const RESOURCE_TYPE: &str = "Dataset";

/// Language of the harvested metadata.
pub const LANGUAGE: &str = "en";

/// Transformer capability of one category: a pure mapping from an extracted
/// entity to its documents, with no I/O.
pub trait DocumentTransformer {
    type Entity;

    /// Documents for `entity`, in emission order.
    fn transform(&self, entity: &RawEntity<Self::Entity>) -> Vec<CatalogDocument>;
}

/// Kind of a non-primary title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TitleType {
    AlternativeTitle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Title {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_type: Option<TitleType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DescriptionType {
    Abstract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub value: String,
    pub description_type: DescriptionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WebLinkType {
    ViewUrl,
    SourceUrl,
    Related,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebLink {
    pub name: String,
    pub url: String,
    pub link_type: WebLinkType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadableResource {
    pub label: String,
    pub url: String,
    pub format: String,
}

/// Bounding box in WGS 84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoBox {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl GeoBox {
    /// Bounding box of every position in a GeoJSON geometry.
    ///
    /// Returns `None` when the geometry carries no usable position.
    #[must_use]
    pub fn from_geometry(geometry: &serde_json::Value) -> Option<Self> {
        let mut positions = Vec::new();
        collect_positions(geometry, &mut positions);

        let (&(lon, lat), rest) = positions.split_first()?;
        let init = Self {
            west: lon,
            east: lon,
            south: lat,
            north: lat,
        };
        Some(rest.iter().fold(init, |b, &(lon, lat)| Self {
            west: b.west.min(lon),
            east: b.east.max(lon),
            south: b.south.min(lat),
            north: b.north.max(lat),
        }))
    }
}

fn collect_positions(value: &serde_json::Value, out: &mut Vec<(f64, f64)>) {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            if let Some(coordinates) = map.get("coordinates") {
                collect_positions(coordinates, out);
            }
            if let Some(Value::Array(geometries)) = map.get("geometries") {
                for geometry in geometries {
                    collect_positions(geometry, out);
                }
            }
        }
        Value::Array(items) => match (items.first(), items.get(1)) {
            (Some(Value::Number(lon)), Some(Value::Number(lat))) => {
                if let (Some(lon), Some(lat)) = (lon.as_f64(), lat.as_f64()) {
                    out.push((lon, lat));
                }
            }
            _ => {
                for item in items {
                    collect_positions(item, out);
                }
            }
        },
        _ => {}
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    #[serde(rename = "box")]
    pub bbox: GeoBox,
}

impl GeoLocation {
    /// Geolocation for an optional geometry; `None` when the geometry is
    /// absent or has no positions.
    #[must_use]
    pub fn from_geometry(
        place: Option<&str>,
        geometry: Option<&serde_json::Value>,
    ) -> Option<Self> {
        let bbox = GeoBox::from_geometry(geometry?)?;
        Some(Self {
            place: non_blank(place),
            bbox,
        })
    }
}

/// One emitted output record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub identity: String,
    pub version: VersionToken,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub titles: Vec<Title>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub descriptions: Vec<Description>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weblinks: Vec<WebLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub downloadable_resources: Vec<DownloadableResource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub geolocations: Vec<GeoLocation>,
    pub publisher: &'static str,
    pub creators: &'static [&'static str],
    pub rights: &'static str,
    pub formats: &'static [&'static str],
    pub resource_type: &'static str,
    pub language: &'static str,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Builds a [`CatalogDocument`] while enforcing the omission rules.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
    document: CatalogDocument,
}

impl DocumentBuilder {
    pub fn new(identity: impl Into<String>, version: &VersionToken) -> Self {
        Self {
            document: CatalogDocument {
                identity: identity.into(),
                version: version.clone(),
                titles: Vec::new(),
                descriptions: Vec::new(),
                subjects: Vec::new(),
                weblinks: Vec::new(),
                downloadable_resources: Vec::new(),
                geolocations: Vec::new(),
                publisher: PUBLISHER,
                creators: CREATORS,
                rights: RIGHTS,
                formats: FORMATS,
                resource_type: RESOURCE_TYPE,
                language: LANGUAGE,
            },
        }
    }

    fn has_title(&self, value: &str) -> bool {
        self.document.titles.iter().any(|t| t.value == value)
    }

    /// Titles from a long and a short name.
    ///
    /// The long form is the main title and the short form an alternative;
    /// a lone short form becomes the main title.
    #[must_use]
    pub fn names(self, long: Option<&str>, short: Option<&str>) -> Self {
        match (non_blank(long), non_blank(short)) {
            (Some(long), short) => {
                let builder = self.title(&long);
                match short {
                    Some(short) => builder.alternative_title(&short),
                    None => builder,
                }
            }
            (None, Some(short)) => self.title(&short),
            (None, None) => self,
        }
    }

    /// Main title, unless blank or already present.
    #[must_use]
    pub fn title(mut self, value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() && !self.has_title(value) {
            self.document.titles.push(Title {
                value: value.to_string(),
                title_type: None,
            });
        }
        self
    }

    /// Alternative title, unless blank or already present.
    #[must_use]
    pub fn alternative_title(mut self, value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() && !self.has_title(value) {
            self.document.titles.push(Title {
                value: value.to_string(),
                title_type: Some(TitleType::AlternativeTitle),
            });
        }
        self
    }

    #[must_use]
    pub fn description(mut self, value: Option<&str>, description_type: DescriptionType) -> Self {
        if let Some(value) = non_blank(value) {
            self.document.descriptions.push(Description {
                value,
                description_type,
            });
        }
        self
    }

    /// Subject keyword, unless blank or a duplicate.
    #[must_use]
    pub fn subject(mut self, value: Option<&str>) -> Self {
        if let Some(value) = non_blank(value) {
            if !self.document.subjects.contains(&value) {
                self.document.subjects.push(value);
            }
        }
        self
    }

    #[must_use]
    pub fn subjects<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .fold(self, |builder, value| builder.subject(Some(value.as_ref())))
    }

    /// Web link; skipped when the URL is absent or blank.
    #[must_use]
    pub fn weblink(mut self, name: &str, url: Option<&str>, link_type: WebLinkType) -> Self {
        if let Some(url) = non_blank(url) {
            self.document.weblinks.push(WebLink {
                name: name.to_string(),
                url,
                link_type,
            });
        }
        self
    }

    #[must_use]
    pub fn downloadable(
        mut self,
        label: impl Into<String>,
        url: impl Into<String>,
        format: &str,
    ) -> Self {
        self.document.downloadable_resources.push(DownloadableResource {
            label: label.into(),
            url: url.into(),
            format: format.to_string(),
        });
        self
    }

    /// Geolocation; skipped when absent.
    #[must_use]
    pub fn geolocation(mut self, location: Option<GeoLocation>) -> Self {
        if let Some(location) = location {
            self.document.geolocations.push(location);
        }
        self
    }

    #[must_use]
    pub fn build(self) -> CatalogDocument {
        self.document
    }
}

/// Subject strings for the metrics with a non-zero value.
pub fn metric_subjects(metrics: &[Metric]) -> impl Iterator<Item = String> + '_ {
    metrics
        .iter()
        .filter(|m| m.value != 0.0 && m.value.is_finite())
        .filter(|m| !m.title.trim().is_empty())
        .map(|m| match m.units.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(units) => format!("{}: {} {units}", m.title.trim(), m.value),
            None => format!("{}: {}", m.title.trim(), m.value),
        })
}
