//! Countries. The index lists one feature per territory, so several rows
//! share a country number and are merged into a single entity.

use serde::Deserialize;
use serde_json::Value;

use super::profile_links;
use crate::config::HarvesterConfig;
use crate::document::{
    CatalogDocument, DescriptionType, DocumentBuilder, DocumentTransformer, GeoLocation,
    WebLinkType,
};
use crate::error::Result;
use crate::extract::{EntitySource, HarvestContext, IndexListing, RawEntity};
use crate::grouping::EntityGroup;
use crate::provider::{Envelope, Feature, FeatureCollection};

const PATH: &str = "country";

/// Territory codes the provider uses for "unknown".
const UNKNOWN_TERRITORY_CODES: &[&str] = &["UNK", "XXX"];

#[derive(Debug, Clone, Deserialize)]
pub struct CountryProperties {
    pub c_number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ter_code: Option<String>,
    #[serde(default)]
    pub territory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CountryDetail {
    pub c_number: i64,
    #[serde(default)]
    pub count_code: Option<String>,
    pub country: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub url_gov: Option<String>,
    #[serde(default)]
    pub url_fao_profile: Option<String>,
    #[serde(default)]
    pub fish_mgt_plan: Option<String>,
}

/// One territory row of a country.
#[derive(Debug, Clone, PartialEq)]
pub struct Territory {
    pub title: Option<String>,
    pub ter_code: Option<String>,
    pub name: Option<String>,
    pub geometry: Option<Value>,
}

impl Territory {
    fn is_known(&self) -> bool {
        self.ter_code
            .as_deref()
            .map(str::trim)
            .is_none_or(|code| !UNKNOWN_TERRITORY_CODES.contains(&code))
    }
}

impl From<Feature<CountryProperties>> for Territory {
    fn from(feature: Feature<CountryProperties>) -> Self {
        Self {
            title: feature.properties.title,
            ter_code: feature.properties.ter_code,
            name: feature.properties.territory,
            geometry: feature.geometry,
        }
    }
}

/// A country together with all of its territory rows, in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct Country {
    pub detail: CountryDetail,
    pub territories: Vec<Territory>,
}

pub struct CountryCategory<'a> {
    config: &'a HarvesterConfig,
}

impl<'a> CountryCategory<'a> {
    pub fn new(config: &'a HarvesterConfig) -> Self {
        Self { config }
    }
}

impl EntitySource for CountryCategory<'_> {
    type Row = Feature<CountryProperties>;
    type Key = i64;
    type Tables = ();
    type Entity = Country;

    fn category(&self) -> &str {
        PATH
    }

    fn discover(&self, ctx: &HarvestContext<'_>) -> Result<IndexListing<Self::Row, ()>> {
        let url = ctx.urls().index(PATH, true);
        let (collection, version) = ctx.fetch_index::<FeatureCollection<CountryProperties>>(&url)?;
        Ok(IndexListing {
            rows: collection.features,
            version,
            tables: (),
        })
    }

    fn natural_key(&self, row: &Self::Row) -> i64 {
        row.properties.c_number
    }

    /// One detail fetch per group, keyed by the first member's country number.
    fn fetch_entity(
        &self,
        ctx: &HarvestContext<'_>,
        group: EntityGroup<i64, Self::Row>,
        _tables: &(),
    ) -> Result<Country> {
        let c_number = group.representative().properties.c_number;
        let detail: Envelope<CountryDetail> = ctx.fetch(&ctx.urls().detail(PATH, c_number))?;

        Ok(Country {
            detail: detail.data,
            territories: group
                .into_members()
                .into_iter()
                .map(Territory::from)
                .collect(),
        })
    }
}

impl DocumentTransformer for CountryCategory<'_> {
    type Entity = Country;

    fn transform(&self, entity: &RawEntity<Country>) -> Vec<CatalogDocument> {
        let country = &entity.payload;
        let detail = &country.detail;
        let abstract_text = format!("Fisheries profile of {}.", detail.country.trim());

        let mut builder = DocumentBuilder::new(&entity.identity, &entity.version)
            .names(detail.long_name.as_deref(), Some(detail.country.as_str()))
            .description(Some(abstract_text.as_str()), DescriptionType::Abstract)
            .subject(detail.count_code.as_deref());

        for territory in &country.territories {
            if let Some(title) = territory.title.as_deref() {
                builder = builder.alternative_title(title);
            }
        }
        for territory in country.territories.iter().filter(|t| t.is_known()) {
            builder = builder.subject(territory.name.as_deref());
        }

        builder = profile_links(builder, self.config.urls(), PATH, PATH, detail.c_number)
            .weblink(
                "Government fisheries agency",
                detail.url_gov.as_deref(),
                WebLinkType::Related,
            )
            .weblink(
                "FAO country profile",
                detail.url_fao_profile.as_deref(),
                WebLinkType::Related,
            )
            .weblink(
                "Fisheries management plan",
                detail.fish_mgt_plan.as_deref(),
                WebLinkType::Related,
            );

        for territory in &country.territories {
            let place = territory.title.as_deref().or(territory.name.as_deref());
            builder = builder.geolocation(GeoLocation::from_geometry(
                place,
                territory.geometry.as_ref(),
            ));
        }

        vec![builder.build()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TitleType;
    use crate::extract::{EntityExtractor, VersionToken};
    use crate::transport::MemoryTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn territory(
        title: &str,
        code: Option<&str>,
        name: &str,
        geometry: Option<Value>,
    ) -> Territory {
        Territory {
            title: Some(title.into()),
            ter_code: code.map(Into::into),
            name: Some(name.into()),
            geometry,
        }
    }

    fn france() -> RawEntity<Country> {
        RawEntity {
            identity: "country-250".into(),
            version: VersionToken::new("v1"),
            payload: Country {
                detail: CountryDetail {
                    c_number: 250,
                    count_code: Some("FRA".into()),
                    country: "France".into(),
                    long_name: Some("French Republic".into()),
                    url_gov: Some("https://agriculture.gouv.fr".into()),
                    url_fao_profile: None,
                    fish_mgt_plan: Some(" ".into()),
                },
                territories: vec![
                    territory(
                        "France",
                        Some("FRA"),
                        "Metropolitan France",
                        Some(json!({"type": "Point", "coordinates": [2.0, 46.0]})),
                    ),
                    territory("Réunion", Some("REU"), "Réunion", None),
                    territory("Clipperton", Some("UNK"), "Clipperton Island", None),
                    territory(
                        "Mayotte",
                        Some("XXX"),
                        "Mayotte",
                        Some(json!({"type": "Point", "coordinates": [45.1, -12.8]})),
                    ),
                ],
            },
        }
    }

    #[test]
    fn test_unknown_territory_codes() {
        assert!(territory("a", None, "a", None).is_known());
        assert!(territory("a", Some("REU"), "a", None).is_known());
        assert!(!territory("a", Some("UNK"), "a", None).is_known());
        assert!(!territory("a", Some("XXX"), "a", None).is_known());
    }

    #[test]
    fn test_transform_merges_territories() {
        let config = HarvesterConfig::new();
        let docs = CountryCategory::new(&config).transform(&france());

        assert_eq!(docs.len(), 1);
        let doc = &docs[0];

        let titles: Vec<(&str, Option<TitleType>)> = doc
            .titles
            .iter()
            .map(|t| (t.value.as_str(), t.title_type))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("French Republic", None),
                ("France", Some(TitleType::AlternativeTitle)),
                ("Réunion", Some(TitleType::AlternativeTitle)),
                ("Clipperton", Some(TitleType::AlternativeTitle)),
                ("Mayotte", Some(TitleType::AlternativeTitle)),
            ]
        );
        assert_eq!(doc.subjects, vec!["FRA", "Metropolitan France", "Réunion"]);
        assert_eq!(doc.geolocations.len(), 2);
        assert_eq!(doc.geolocations[1].place.as_deref(), Some("Mayotte"));

        let links: Vec<&str> = doc.weblinks.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            links,
            vec!["Sea Around Us web page", "Sea Around Us API", "Government fisheries agency"]
        );
    }

    #[test]
    fn test_grouped_index_yields_one_entity_per_country() {
        let config = HarvesterConfig::new();
        let urls = config.urls();
        let category = CountryCategory::new(&config);

        let mut transport = MemoryTransport::new();
        transport.insert_json(
            urls.index(PATH, true),
            &json!({
                "data": {"type": "FeatureCollection", "features": [
                    {"type": "Feature", "geometry": null, "properties": {"c_number": 5, "title": "A"}},
                    {"type": "Feature", "geometry": null, "properties": {"c_number": 5, "title": "B"}},
                    {"type": "Feature", "geometry": null, "properties": {"c_number": 7, "title": "C"}}
                ]},
                "metadata": {"version": "v1"}
            }),
        );
        transport.insert_json(
            urls.detail(PATH, 5),
            &json!({"data": {"c_number": 5, "country": "Five"}}),
        );
        transport.insert_json(
            urls.detail(PATH, 7),
            &json!({"data": {"c_number": 7, "country": "Seven"}}),
        );

        let mut extractor =
            EntityExtractor::new(&category, HarvestContext::new(&transport, &config));
        extractor.init().unwrap();
        assert_eq!(extractor.size().unwrap(), 2);

        let entities: Vec<_> = extractor
            .extract_all()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(entities[0].identity, "country-5");
        assert_eq!(entities[0].payload.territories.len(), 2);
        assert_eq!(entities[1].identity, "country-7");
        assert_eq!(transport.count_with_prefix(&urls.detail(PATH, 5)), 1);
    }
}
