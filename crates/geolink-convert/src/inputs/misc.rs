//! Smaller providers: 2GIS, Magic Earth, Mapy.cz, Moovit, Petal Maps,
//! Citymapper, Sygic.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::{Input, ShortUriMethod};

pub(super) fn two_gis() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.)?2gis\.(?:ru|com(?:\.[a-z]{2})?)/",
        vec![
            Rule::new(
                UriPart::Path,
                &format!(r"/geo/(?P<lon>{LON}),(?P<lat>{LAT})"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("m"),
                &format!(r"^(?P<lon>{LON}),(?P<lat>{LAT})(?:/(?P<zoom>{ZOOM}))?"),
                Extract::CenterPoint,
            ),
        ],
    );
    Input::new(
        "2gis",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to 2GIS to resolve this link?",
        "Resolving 2GIS link",
    )
}

pub(super) fn magic_earth() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^magicearth://|(?i)^(?:https?://)?(?:www\.)?magicearth\.com/",
        vec![
            Rule::new(
                UriPart::JoinedParams(&["lat", "lon"]),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(UriPart::Query("name"), r"^(?P<name>.+)$", Extract::Name),
            Rule::new(UriPart::Query("q"), r"^(?P<q>.+)$", Extract::Query),
            Rule::new(
                UriPart::Query("zoom"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
        ],
    );
    Input::new(
        "magicearth",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Magic Earth to resolve this link?",
        "Resolving Magic Earth link",
    )
}

pub(super) fn mapy_cz() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:[a-z]{2}\.)?mapy\.(?:cz|com)/",
        vec![
            Rule::new(
                UriPart::JoinedParams(&["y", "x"]),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::CenterPoint,
            ),
            Rule::new(
                UriPart::Query("z"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
            Rule::new(
                UriPart::Query("q"),
                &format!(r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})$|^(?P<q>.+)$"),
                Extract::Query,
            ),
        ],
    );
    Input::new(
        "mapy.cz",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Mapy.cz to resolve this link?",
        "Resolving Mapy.cz link",
    )
    // The shortener answers with a plain redirect, so a HEAD for the
    // Location header is enough.
    .with_short(
        r"(?i)^(?:https?://)?(?:[a-z]{2}\.)?mapy\.(?:cz|com)/s/",
        ShortUriMethod::Head,
    )
}

pub(super) fn moovit() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.)?moovit(?:app)?\.com/",
        vec![
            Rule::new(
                UriPart::JoinedParams(&["to_lat", "to_lon"]),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("tll"),
                &format!(r"^(?P<lat>{LAT})[,_](?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(UriPart::Query("to_name"), r"^(?P<name>.+)$", Extract::Name),
        ],
    );
    Input::new(
        "moovit",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Moovit to resolve this link?",
        "Resolving Moovit link",
    )
}

pub(super) fn petal() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.)?petalmaps\.com/",
        vec![
            Rule::new(
                UriPart::Query("marker"),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::JoinedParams(&["lat", "lng"]),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::Query("z"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
            Rule::new(UriPart::Query("text"), r"^(?P<name>.+)$", Extract::Name),
        ],
    );
    Input::new(
        "petal",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Petal Maps to resolve this link?",
        "Resolving Petal Maps link",
    )
}

pub(super) fn citymapper() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?citymapper\.com/",
        vec![
            Rule::new(
                UriPart::Query("endcoord"),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(UriPart::Query("endname"), r"^(?P<name>.+)$", Extract::Name),
            Rule::new(UriPart::Query("endaddress"), r"^(?P<q>.+)$", Extract::Query),
        ],
    );
    Input::new(
        "citymapper",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Citymapper to resolve this link?",
        "Resolving Citymapper link",
    )
}

pub(super) fn sygic() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^com\.sygic|(?i)^(?:https?://)?go\.sygic\.com/",
        vec![Rule::new(
            UriPart::Full,
            &format!(r"coordinate[|/](?P<lon>{LON})[|/](?P<lat>{LAT})"),
            Extract::Point,
        )],
    );
    Input::new(
        "sygic",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Connect to Sygic to resolve this link?",
        "Resolving Sygic link",
    )
}
