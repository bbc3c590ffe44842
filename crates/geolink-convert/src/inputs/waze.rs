//! Waze live-map links, including the base-32 geohash form which
//! resolves locally without a network hop.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::Input;

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.|ul\.)?waze\.com/|(?i)^waze://",
        vec![
            Rule::new(
                UriPart::Query("ll"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("latlng"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("to"),
                &format!(r"^ll\.(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Path,
                r"/h/?(?P<hash>[0-9bcdefghjkmnpqrstuvwxyz]{4,})$",
                Extract::WazeGeoHash,
            ),
            Rule::new(UriPart::Query("q"), r"^(?P<q>.+)$", Extract::Query),
            Rule::new(
                UriPart::Query("z"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
        ],
    );
    Input::new(
        "waze",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Waze to resolve this link?",
        "Resolving Waze link",
    )
}
