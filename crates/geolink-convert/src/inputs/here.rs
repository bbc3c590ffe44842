//! HERE WeGo links.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::Input;

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:wego\.here\.com|share\.here\.com|www\.here\.com)/",
        vec![
            Rule::new(
                UriPart::Path,
                &format!(r"/l/(?P<lat>{LAT}),(?P<lon>{LON})"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("map"),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})(?:,(?P<zoom>{ZOOM}))?"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("q"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
        ],
    );
    Input::new(
        "here",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to HERE to resolve this link?",
        "Resolving HERE WeGo link",
    )
}
