//! Organic Maps sharing links: the `ge0://` scheme and its `omaps.app`
//! web mirror. Both carry a base-64 point code decoded locally.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern};

use super::Input;

const HASH: &str = r"[A-Za-z0-9_-]{2,}";

pub(super) fn ge0() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:ge0|om)://",
        vec![
            // The hash sits in the authority position; match the raw text
            // to keep its case untouched.
            Rule::new(
                UriPart::Full,
                &format!(r"(?i)^(?:ge0|om)://(?P<hash>{HASH})"),
                Extract::Ge0Hash,
            ),
            Rule::new(UriPart::PathSegment(0), r"^(?P<name>.+)$", Extract::Name),
        ],
    );
    Input::new(
        "organicmaps",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Convert this Organic Maps link?",
        "Reading Organic Maps link",
    )
}

pub(super) fn omaps() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?omaps\.app/",
        vec![
            Rule::new(
                UriPart::PathSegment(0),
                &format!(r"^(?P<hash>{HASH})$"),
                Extract::Ge0Hash,
            ),
            Rule::new(UriPart::PathSegment(1), r"^(?P<name>.+)$", Extract::Name),
        ],
    );
    Input::new(
        "omaps.app",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Convert this Organic Maps link?",
        "Reading Organic Maps link",
    )
}
