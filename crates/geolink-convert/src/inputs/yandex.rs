//! Yandex Maps links. Coordinates are longitude-first in `ll`/`pt`,
//! latitude-first in `rtext` route waypoints.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::Input;

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.)?(?:maps\.yandex\.(?:ru|com|by|kz|ua)|yandex\.(?:ru|com|by|kz|ua)/maps)",
        vec![
            Rule::new(
                UriPart::Query("pt"),
                &format!(r"^(?P<lon>{LON}),(?P<lat>{LAT})"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("whatshere[point]"),
                &format!(r"^(?P<lon>{LON}),(?P<lat>{LAT})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("rtext"),
                &format!(r"(?P<lat>{LAT}),(?P<lon>{LON})"),
                Extract::Points,
            ),
            Rule::new(
                UriPart::Query("ll"),
                &format!(r"^(?P<lon>{LON}),(?P<lat>{LAT})$"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("z"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
            Rule::new(UriPart::Query("text"), r"^(?P<q>.+)$", Extract::Query),
        ],
    );
    Input::new(
        "yandex",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Yandex to resolve this link?",
        "Resolving Yandex Maps link",
    )
}
