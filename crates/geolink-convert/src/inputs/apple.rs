//! Apple Maps links, including the `maps.apple/p/` short form and the
//! place-page HTML fallback.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, HtmlPattern, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::{Input, ShortUriMethod};

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?maps\.apple(?:\.com)?[/?]",
        vec![
            Rule::new(
                UriPart::Query("coordinate"),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("ll"),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("daddr"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
            Rule::new(
                UriPart::Query("q"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
            Rule::new(UriPart::Query("address"), r"^(?P<q>.+)$", Extract::Query),
            Rule::new(UriPart::Query("name"), r"^(?P<name>.+)$", Extract::Name),
            Rule::new(
                UriPart::Query("z"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
        ],
    );
    let html_pattern = HtmlPattern::new(vec![Rule::new(
        UriPart::Full,
        &format!(r#""latitude"\s*:\s*(?P<lat>{LAT})\s*,\s*"longitude"\s*:\s*(?P<lon>{LON})"#),
        Extract::Point,
    )]);
    Input::new(
        "apple",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Apple to resolve this link?",
        "Resolving Apple Maps link",
    )
    .with_short(
        r"(?i)^(?:https?://)?maps\.apple(?:\.com)?/p/",
        ShortUriMethod::Get,
    )
    .with_html(html_pattern)
}
