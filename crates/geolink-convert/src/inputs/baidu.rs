//! Baidu Maps links. Coordinates are BD09 Mercator meters; consumers
//! convert through the geodesy tables when they need WGS84.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, MERCATOR, ZOOM};

use super::{Input, ShortUriMethod};

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:map|api)\.baidu\.com/|(?i)^(?:https?://)?j\.map\.baidu\.com/",
        vec![
            Rule::new(
                UriPart::JoinedParams(&["y", "x"]),
                &format!(r"^(?P<lat>{MERCATOR}),(?P<lon>{MERCATOR})$"),
                Extract::Point,
            ),
            // `center` is x,y (longitude first).
            Rule::new(
                UriPart::Query("center"),
                &format!(r"^(?P<lon>{MERCATOR}),(?P<lat>{MERCATOR})$"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("zoom"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
            Rule::new(UriPart::Query("wd"), r"^(?P<q>.+)$", Extract::Query),
        ],
    );
    Input::new(
        "baidu",
        ReferenceSystem::Bd09Mc,
        uri_pattern,
        "Connect to Baidu to resolve this link?",
        "Resolving Baidu Maps link",
    )
    .with_short(
        r"(?i)^(?:https?://)?j\.map\.baidu\.com/",
        ShortUriMethod::Get,
    )
}
