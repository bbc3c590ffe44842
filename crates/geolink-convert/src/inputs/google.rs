//! Google Maps links, including `maps.app.goo.gl` short links and the
//! HTML/web fallbacks short links sometimes require.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, HtmlPattern, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::{Input, ShortUriMethod};

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.|maps\.|local\.|ditu\.)?google(?:\.[a-z]{2,3}){1,2}[/?]|(?i)^(?:https?://)?(?:maps\.app\.goo\.gl|goo\.gl)/|(?i)^comgooglemaps://",
        vec![
            // Place data blobs carry the pin itself.
            Rule::new(
                UriPart::Path,
                &format!(r"!3d(?P<lat>{LAT})!4d(?P<lon>{LON})"),
                Extract::Point,
            ),
            // Directions waypoints and coordinate place segments.
            Rule::new(
                UriPart::Path,
                &format!(r"/(?P<lat>{LAT}),[+ ]?(?P<lon>{LON})"),
                Extract::Points,
            ),
            Rule::new(
                UriPart::Path,
                &format!(r"@(?P<lat>{LAT}),(?P<lon>{LON})(?:,(?P<zoom>{ZOOM})z)?"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("ll"),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("q"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
            Rule::new(
                UriPart::Query("query"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
            Rule::new(
                UriPart::Query("daddr"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
            Rule::new(
                UriPart::Query("destination"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
            // Place names carry at least one letter, which keeps plain
            // coordinate segments out of this rule.
            Rule::new(
                UriPart::Path,
                r"/maps/place/(?P<name>[^/]*[a-zA-Z][^/]*)",
                Extract::Name,
            ),
            Rule::new(UriPart::Query("z"), &format!(r"^(?P<zoom>{ZOOM})$"), Extract::Zoom),
            Rule::new(
                UriPart::Query("zoom"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
        ],
    );
    let html_pattern = HtmlPattern::new(vec![
        Rule::new(
            UriPart::Full,
            &format!(r"@(?P<lat>{LAT}),(?P<lon>{LON}),(?P<zoom>{ZOOM})z"),
            Extract::Point,
        ),
        Rule::new(
            UriPart::Full,
            &format!(r"\[null,null,(?P<lat>{LAT}),(?P<lon>{LON})\]"),
            Extract::Point,
        ),
        Rule::new(
            UriPart::Full,
            r#"content="0;\s*url=(?P<url>https?://[^"]+)""#,
            Extract::Url,
        ),
    ]);
    Input::new(
        "google",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Google to resolve this link?",
        "Resolving Google Maps link",
    )
    .with_short(
        r"(?i)^(?:https?://)?(?:maps\.app\.goo\.gl|goo\.gl)/",
        ShortUriMethod::Get,
    )
    .with_html(html_pattern)
    .with_web_parse()
}
