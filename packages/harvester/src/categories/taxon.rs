//! Fished taxa, enriched with taxon level and taxon group names.

use serde::Deserialize;

use super::profile_links;
use crate::config::HarvesterConfig;
use crate::document::{CatalogDocument, DocumentBuilder, DocumentTransformer, GeoBox, GeoLocation};
use crate::enrichment::EnrichmentTable;
use crate::error::Result;
use crate::extract::{EntitySource, HarvestContext, IndexListing, RawEntity};
use crate::grouping::EntityGroup;
use crate::provider::Envelope;

const INDEX_PATH: &str = "taxa";
const SITE_PATH: &str = "taxon";
const LEVEL_PATH: &str = "taxon-level";
const GROUP_PATH: &str = "taxon-group";

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonRow {
    pub taxon_key: i64,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub common_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxonDetail {
    pub taxon_key: i64,
    pub scientific_name: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub taxon_level_id: Option<i64>,
    #[serde(default)]
    pub taxon_group_id: Option<i64>,
    #[serde(default)]
    pub lat_north: Option<f64>,
    #[serde(default)]
    pub lat_south: Option<f64>,
    #[serde(default)]
    pub min_depth: Option<f64>,
    #[serde(default)]
    pub max_depth: Option<f64>,
}

/// Lookup tables fetched once per run.
#[derive(Debug, Clone, Default)]
pub struct TaxonTables {
    pub levels: EnrichmentTable,
    pub groups: EnrichmentTable,
}

/// A taxon with its level and group names resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Taxon {
    pub detail: TaxonDetail,
    pub level: Option<String>,
    pub group: Option<String>,
}

impl Taxon {
    /// Latitude band spanning all longitudes, when both bounds are known.
    #[must_use]
    pub fn latitude_band(&self) -> Option<GeoLocation> {
        let (north, south) = (self.detail.lat_north?, self.detail.lat_south?);
        Some(GeoLocation {
            place: None,
            bbox: GeoBox {
                west: -180.0,
                east: 180.0,
                south,
                north,
            },
        })
    }

    #[must_use]
    pub fn depth_range(&self) -> Option<String> {
        let (min, max) = (self.detail.min_depth?, self.detail.max_depth?);
        Some(format!("Depth: {min}-{max} m"))
    }
}

pub struct TaxonCategory<'a> {
    config: &'a HarvesterConfig,
}

impl<'a> TaxonCategory<'a> {
    pub fn new(config: &'a HarvesterConfig) -> Self {
        Self { config }
    }
}

impl EntitySource for TaxonCategory<'_> {
    type Row = TaxonRow;
    type Key = i64;
    type Tables = TaxonTables;
    type Entity = Taxon;

    fn category(&self) -> &str {
        SITE_PATH
    }

    fn discover(&self, ctx: &HarvestContext<'_>) -> Result<IndexListing<TaxonRow, TaxonTables>> {
        let urls = ctx.urls();
        let (rows, version) = ctx.fetch_index::<Vec<TaxonRow>>(&urls.index(INDEX_PATH, false))?;
        let tables = TaxonTables {
            levels: EnrichmentTable::fetch(ctx, LEVEL_PATH, &urls.index(LEVEL_PATH, false))?,
            groups: EnrichmentTable::fetch(ctx, GROUP_PATH, &urls.index(GROUP_PATH, false))?,
        };
        Ok(IndexListing { rows, version, tables })
    }

    fn natural_key(&self, row: &TaxonRow) -> i64 {
        row.taxon_key
    }

    fn fetch_entity(
        &self,
        ctx: &HarvestContext<'_>,
        group: EntityGroup<i64, TaxonRow>,
        tables: &TaxonTables,
    ) -> Result<Taxon> {
        let detail: Envelope<TaxonDetail> =
            ctx.fetch(&ctx.urls().detail(INDEX_PATH, *group.key()))?;
        let detail = detail.data;

        let level = tables.levels.resolve(detail.taxon_level_id);
        let group = tables.groups.resolve(detail.taxon_group_id);
        if detail.taxon_level_id.is_some() && level.is_none() {
            tracing::debug!(
                taxon_key = detail.taxon_key,
                "Taxon level not in lookup table"
            );
        }

        Ok(Taxon { detail, level, group })
    }
}

impl DocumentTransformer for TaxonCategory<'_> {
    type Entity = Taxon;

    fn transform(&self, entity: &RawEntity<Taxon>) -> Vec<CatalogDocument> {
        let taxon = &entity.payload;
        let detail = &taxon.detail;

        let builder = DocumentBuilder::new(&entity.identity, &entity.version)
            .names(
                detail.common_name.as_deref(),
                Some(detail.scientific_name.as_str()),
            )
            .subject(Some(detail.scientific_name.as_str()))
            .subject(taxon.level.as_deref())
            .subject(taxon.group.as_deref())
            .subject(taxon.depth_range().as_deref())
            .geolocation(taxon.latitude_band());

        vec![profile_links(
            builder,
            self.config.urls(),
            SITE_PATH,
            INDEX_PATH,
            detail.taxon_key,
        )
        .build()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{EntityExtractor, VersionToken};
    use crate::transport::MemoryTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn detail() -> TaxonDetail {
        TaxonDetail {
            taxon_key: 600143,
            scientific_name: "Sardina pilchardus".into(),
            common_name: Some("European pilchard".into()),
            taxon_level_id: Some(6),
            taxon_group_id: Some(3),
            lat_north: Some(68.0),
            lat_south: Some(14.0),
            min_depth: Some(10.0),
            max_depth: Some(100.0),
        }
    }

    fn entity(taxon: Taxon) -> RawEntity<Taxon> {
        RawEntity {
            identity: "taxon-600143".into(),
            version: VersionToken::new("v1"),
            payload: taxon,
        }
    }

    #[test]
    fn test_transform_full_taxon() {
        let config = HarvesterConfig::new();
        let doc = &TaxonCategory::new(&config).transform(&entity(Taxon {
            detail: detail(),
            level: Some("Species".into()),
            group: Some("Herring-likes".into()),
        }))[0];

        assert_eq!(doc.titles[0].value, "European pilchard");
        assert_eq!(doc.titles[1].value, "Sardina pilchardus");
        assert_eq!(
            doc.subjects,
            vec!["Sardina pilchardus", "Species", "Herring-likes", "Depth: 10-100 m"]
        );
        assert_eq!(
            doc.geolocations[0].bbox,
            GeoBox {
                west: -180.0,
                east: 180.0,
                south: 14.0,
                north: 68.0,
            }
        );
        assert_eq!(
            doc.weblinks[0].url,
            "https://www.seaaroundus.org/data/#/taxon/600143"
        );
        assert_eq!(
            doc.weblinks[1].url,
            "https://api.seaaroundus.org/api/v1/taxa/600143"
        );
    }

    #[test]
    fn test_transform_omits_partial_bounds() {
        let config = HarvesterConfig::new();
        let mut detail = detail();
        detail.common_name = None;
        detail.lat_south = None;
        detail.max_depth = None;

        let doc = &TaxonCategory::new(&config).transform(&entity(Taxon {
            detail,
            level: None,
            group: None,
        }))[0];

        assert_eq!(doc.titles.len(), 1);
        assert_eq!(doc.titles[0].value, "Sardina pilchardus");
        assert_eq!(doc.subjects, vec!["Sardina pilchardus"]);
        assert!(doc.geolocations.is_empty());
    }

    #[test]
    fn test_tables_fetched_once_and_resolved() {
        let config = HarvesterConfig::new();
        let urls = config.urls();
        let category = TaxonCategory::new(&config);

        let mut transport = MemoryTransport::new();
        transport.insert_json(
            urls.index(INDEX_PATH, false),
            &json!({
                "data": [
                    {"taxon_key": 1, "scientific_name": "A"},
                    {"taxon_key": 2, "scientific_name": "B"}
                ],
                "metadata": {"version": "v3"}
            }),
        );
        transport.insert_json(
            urls.index(LEVEL_PATH, false),
            &json!({"data": [{"id": 6, "name": "Species"}]}),
        );
        transport.insert_json(urls.index(GROUP_PATH, false), &json!({"data": []}));
        transport.insert_json(
            urls.detail(INDEX_PATH, 1),
            &json!({"data": {"taxon_key": 1, "scientific_name": "A", "taxon_level_id": 6, "taxon_group_id": 9}}),
        );
        transport.insert_json(
            urls.detail(INDEX_PATH, 2),
            &json!({"data": {"taxon_key": 2, "scientific_name": "B", "taxon_level_id": 7}}),
        );

        let mut extractor =
            EntityExtractor::new(&category, HarvestContext::new(&transport, &config));
        extractor.init().unwrap();
        let entities: Vec<_> = extractor
            .extract_all()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(entities[0].payload.level.as_deref(), Some("Species"));
        assert_eq!(entities[0].payload.group, None);
        assert_eq!(entities[1].payload.level, None);
        assert_eq!(
            transport.count_with_prefix(&urls.index(LEVEL_PATH, false)),
            1
        );
        assert_eq!(
            transport.count_with_prefix(&urls.index(GROUP_PATH, false)),
            1
        );
    }
}
