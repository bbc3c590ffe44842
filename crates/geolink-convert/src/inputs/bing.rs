//! Bing Maps links: `cp` viewport centers and `sp=point.…` pins.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::Input;

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.)?bing\.com/maps",
        vec![
            Rule::new(
                UriPart::Query("sp"),
                &format!(r"^point\.(?P<lat>{LAT})_(?P<lon>{LON})(?:_(?P<name>[^_]+))?"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("cp"),
                &format!(r"^(?P<lat>{LAT})~(?P<lon>{LON})$"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("lvl"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
            Rule::new(UriPart::Query("where1"), r"^(?P<q>.+)$", Extract::Query),
            Rule::new(UriPart::Query("q"), r"^(?P<q>.+)$", Extract::Query),
        ],
    );
    Input::new(
        "bing",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Bing to resolve this link?",
        "Resolving Bing Maps link",
    )
}
