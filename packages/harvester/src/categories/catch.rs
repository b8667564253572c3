//! Catch time-series documents shared by region-like categories.

use crate::config::UrlBuilder;
use crate::document::{CatalogDocument, DescriptionType, DocumentBuilder, WebLinkType};
use crate::enrichment::CatchData;
use crate::extract::VersionToken;

/// Entity a set of catch series belongs to.
pub(crate) struct CatchParent<'a> {
    pub identity: &'a str,
    pub title: Option<&'a str>,
    /// Provider path segment, e.g. `eez`.
    pub path: &'a str,
    pub id: i64,
}

/// One document per measure × dimension pair that has data, in the order
/// the pairs were fetched.
pub(crate) fn catch_documents(
    urls: UrlBuilder<'_>,
    parent: &CatchParent<'_>,
    version: &VersionToken,
    catches: &[CatchData],
) -> Vec<CatalogDocument> {
    catches
        .iter()
        .map(|catch| catch_document(urls, parent, version, catch))
        .collect()
}

fn catch_document(
    urls: UrlBuilder<'_>,
    parent: &CatchParent<'_>,
    version: &VersionToken,
    catch: &CatchData,
) -> CatalogDocument {
    let measure = catch.measure.as_str();
    let dimension = catch.dimension.as_str();
    let identity = format!("{}-catch-{measure}-{dimension}", parent.identity);

    let heading = format!("{} by {}", catch.measure.label(), catch.dimension.label());
    let title = match parent.title {
        Some(title) => format!("{heading}: {title}"),
        None => heading,
    };

    let period = catch
        .year_range()
        .map(|(first, last)| format!(", {first}-{last}"))
        .unwrap_or_default();
    let description = match parent.title {
        Some(title) => format!(
            "{} in {title} broken down by {}{period}.",
            catch.measure.label(),
            catch.dimension.label()
        ),
        None => format!(
            "{} broken down by {}{period}.",
            catch.measure.label(),
            catch.dimension.label()
        ),
    };

    let chart = urls.catch_chart(parent.path, parent.id, measure, dimension);

    DocumentBuilder::new(identity, version)
        .title(&title)
        .description(Some(description.as_str()), DescriptionType::Abstract)
        .subject(Some(catch.measure.label()))
        .subjects(catch.keys())
        .weblink("Catch chart", Some(chart.as_str()), WebLinkType::ViewUrl)
        .weblink(
            "Parent record",
            Some(urls.site(parent.path, parent.id).as_str()),
            WebLinkType::Related,
        )
        .downloadable(
            "Catch data (JSON)",
            urls.catch(parent.path, measure, dimension, parent.id, "json"),
            "application/json",
        )
        .downloadable(
            "Catch data (CSV)",
            urls.catch(parent.path, measure, dimension, parent.id, "csv"),
            "text/csv",
        )
        .build()
}
