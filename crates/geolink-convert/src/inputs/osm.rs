//! OpenStreetMap links: marker parameters, `#map=` fragments, `/go/`
//! short-link hashes (decoded locally, no network hop), and element pages
//! via the HTML fallback.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, HtmlPattern, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::Input;

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.)?(?:openstreetmap\.org|osm\.org)/",
        vec![
            Rule::new(
                UriPart::JoinedParams(&["mlat", "mlon"]),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Path,
                r"/go/(?P<hash>[A-Za-z0-9_~@=-]+)",
                Extract::OsmShortLink,
            ),
            Rule::new(
                UriPart::Fragment,
                &format!(r"map=(?P<zoom>{ZOOM})/(?P<lat>{LAT})/(?P<lon>{LON})"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("query"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
        ],
    );
    // Node/way/relation pages embed their coordinates in data attributes.
    let html_pattern = HtmlPattern::new(vec![
        Rule::new(
            UriPart::Full,
            &format!(r#"data-lat="(?P<lat>{LAT})" data-lon="(?P<lon>{LON})""#),
            Extract::Point,
        ),
        Rule::new(
            UriPart::Full,
            &format!(r#"lat="(?P<lat>{LAT})" lon="(?P<lon>{LON})""#),
            Extract::Point,
        ),
    ]);
    Input::new(
        "openstreetmap",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to OpenStreetMap to read this element?",
        "Reading OpenStreetMap element",
    )
    .with_html(html_pattern)
}
