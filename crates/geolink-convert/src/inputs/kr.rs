//! Korean services: Kakao Map and Naver Map. Both lean on client-side
//! rendering, so the browser-driven fallback stays available.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::{Input, ShortUriMethod};

pub(super) fn kakao() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?map\.kakao\.com/",
        vec![
            Rule::new(
                UriPart::Path,
                &format!(r"/link/(?:map|to)/(?P<name>[^/,]+),(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Path,
                &format!(r"/link/(?:map|to)/(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(UriPart::Query("q"), r"^(?P<q>.+)$", Extract::Query),
        ],
    );
    Input::new(
        "kakao",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Kakao to resolve this link?",
        "Resolving Kakao Map link",
    )
    .with_web_parse()
}

pub(super) fn naver() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:map\.naver\.com|naver\.me)/",
        vec![
            Rule::new(
                UriPart::Query("c"),
                &format!(r"^(?P<lon>{LON}),(?P<lat>{LAT}),(?P<zoom>{ZOOM})"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::JoinedParams(&["lat", "lng"]),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(UriPart::Query("query"), r"^(?P<q>.+)$", Extract::Query),
        ],
    );
    Input::new(
        "naver",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Naver to resolve this link?",
        "Resolving Naver Map link",
    )
    .with_short(r"(?i)^(?:https?://)?naver\.me/", ShortUriMethod::Get)
    .with_web_parse()
}

#[cfg(test)]
mod tests {
    use crate::pattern::UriParse;
    use crate::uri::Uri;

    use super::*;

    fn parse(input: &Input, raw: &str) -> UriParse {
        input.uri_pattern.parse(&Uri::parse(raw), input.system)
    }

    #[test]
    fn kakao_named_map_link() {
        let result = parse(&kakao(), "https://map.kakao.com/link/map/Uncle Ryan,37.5203,127.0292");
        let point = &result.position.points[0];
        assert_eq!(point.lat, Some(37.5203));
        assert_eq!(point.name.as_deref(), Some("Uncle Ryan"));
    }

    #[test]
    fn kakao_bare_coordinate_link() {
        let result = parse(&kakao(), "https://map.kakao.com/link/to/37.4979,127.0276");
        assert_eq!(result.position.points[0].lat, Some(37.4979));
        assert!(result.position.points[0].name.is_none());
    }

    #[test]
    fn naver_center_with_zoom() {
        let result = parse(&naver(), "https://map.naver.com/p?c=127.1054221,37.3591614,15");
        assert_eq!(result.position.points[0].lat, Some(37.3591614));
        assert_eq!(result.position.zoom, Some(15.0));
    }

    #[test]
    fn naver_short_links_hit_the_network() {
        let input = naver();
        assert!(input
            .short_uri_pattern
            .as_ref()
            .unwrap()
            .is_match("https://naver.me/GtM2wWeL"));
    }
}
