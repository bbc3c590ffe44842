use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use super::*;
use crate::inputs::registry;
use crate::net::{NetworkAccess, NetworkError, MAX_RETRY_COUNT};
use crate::permission::MemoryPermissionStore;

/// Scriptable network stand-in. Counts every call so tests can assert a
/// conversion stayed offline. Honors the retry-exhaustion contract the
/// production implementation enforces.
#[derive(Default)]
struct MockNetwork {
    calls: AtomicU32,
    head_location: Option<String>,
    effective_url: Option<String>,
    body: Option<String>,
    /// Recoverable timeouts served before any real answer.
    fail_first: AtomicU32,
}

impl MockNetwork {
    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn failing(fail_first: u32, effective_url: &str) -> Self {
        Self {
            effective_url: Some(effective_url.to_owned()),
            fail_first: AtomicU32::new(fail_first),
            ..Self::default()
        }
    }

    fn should_fail(&self) -> bool {
        self.fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn answer(&self, retry: Retry, response: &Option<String>, what: &str) -> Result<String, NetworkError> {
        if retry.exhausted() {
            return Err(NetworkError::RetriesExhausted {
                attempts: retry.count,
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail() {
            return Err(NetworkError::Timeout);
        }
        Ok(response
            .clone()
            .unwrap_or_else(|| panic!("unexpected {what} call")))
    }
}

impl NetworkAccess for MockNetwork {
    async fn head_location(&self, _url: &str, retry: Retry) -> Result<String, NetworkError> {
        self.answer(retry, &self.head_location, "head_location")
    }

    async fn get_effective_url(&self, _url: &str, retry: Retry) -> Result<String, NetworkError> {
        self.answer(retry, &self.effective_url, "get_effective_url")
    }

    async fn get_body(&self, _url: &str, retry: Retry) -> Result<String, NetworkError> {
        self.answer(retry, &self.body, "get_body")
    }
}

fn converter(
    network: Arc<MockNetwork>,
    permission: Permission,
) -> (
    Converter<Arc<MockNetwork>, Arc<MemoryPermissionStore>>,
    Arc<MemoryPermissionStore>,
) {
    let store = Arc::new(MemoryPermissionStore::new(permission));
    (
        Converter::new(registry(), network, Arc::clone(&store)),
        store,
    )
}

fn input_index(name: &str) -> usize {
    registry()
        .iter()
        .position(|i| i.name == name)
        .unwrap_or_else(|| panic!("no input named {name}"))
}

#[tokio::test]
async fn empty_input_fails_with_missing_input() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(Arc::clone(&network), Permission::Ask);
    for text in ["", "   \n"] {
        let state = converter.submit(text).await;
        assert!(
            matches!(
                &state,
                ConversionState::ConversionFailed {
                    error: ConversionError::MissingInput,
                    ..
                }
            ),
            "got {state:?}"
        );
    }
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn bare_coordinates_succeed_without_network() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(Arc::clone(&network), Permission::Never);
    let state = converter.submit("N-68.648556,E-152.775879").await;
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(position.points.len(), 1);
    assert_eq!(position.points[0].lat, Some(-68.648556));
    assert_eq!(position.points[0].lon, Some(-152.775879));
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn geo_uri_succeeds_with_query_and_zoom() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(network, Permission::Ask);
    let state = converter
        .submit("geo:50.123456,-11.123456?q=foo%20bar&z=3.4")
        .await;
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(position.points[0].lat, Some(50.123456));
    assert_eq!(position.points[0].lon, Some(-11.123456));
    assert_eq!(position.query.as_deref(), Some("foo bar"));
    assert_eq!(position.zoom, Some(3.4));
}

#[tokio::test]
async fn unrecognized_text_is_an_unsupported_service() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(network, Permission::Always);
    let state = converter.submit("the weather is nice today").await;
    assert!(matches!(
        state,
        ConversionState::ConversionFailed {
            error: ConversionError::UnsupportedService,
            ..
        }
    ));
}

#[tokio::test]
async fn link_is_extracted_from_surrounding_text() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(network, Permission::Never);
    let state = converter
        .submit("Check this out: https://www.waze.com/ul?ll=45.69,-120.81&navigate=yes, see you there!")
        .await;
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(position.points[0].lat, Some(45.69));
}

#[tokio::test]
async fn short_link_with_never_permission_stays_offline() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(Arc::clone(&network), Permission::Never);
    let state = converter.submit("https://maps.app.goo.gl/foo12").await;
    assert!(
        matches!(
            &state,
            ConversionState::ConversionFailed {
                error: ConversionError::PermissionDenied,
                ..
            }
        ),
        "got {state:?}"
    );
    assert_eq!(network.calls(), 0, "no network call may be attempted");
}

#[tokio::test]
async fn short_link_with_ask_waits_then_deny_persists() {
    let network = Arc::new(MockNetwork::default());
    let (converter, store) = converter(Arc::clone(&network), Permission::Ask);
    let state = converter.submit("https://maps.app.goo.gl/foo12").await;
    assert!(
        matches!(&state, ConversionState::RequestedUnshortenPermission { .. }),
        "got {state:?}"
    );

    let state = converter.deny(state, true).await;
    assert!(matches!(
        state,
        ConversionState::ConversionFailed {
            error: ConversionError::PermissionDenied,
            ..
        }
    ));
    assert_eq!(store.get_connection_permission(), Permission::Never);
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn short_link_grant_unshortens_and_succeeds() {
    let network = Arc::new(MockNetwork {
        effective_url: Some("https://www.google.com/maps/@52.5,13.4,11z".to_owned()),
        ..MockNetwork::default()
    });
    let (converter, store) = converter(Arc::clone(&network), Permission::Ask);
    let state = converter.submit("https://maps.app.goo.gl/foo12").await;
    assert!(state.awaits_permission());

    let state = converter.grant(state, false).await;
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(position.points[0].lat, Some(52.5));
    assert_eq!(position.zoom, Some(11.0));
    assert_eq!(network.calls(), 1);
    // grant(_, false) must not persist anything.
    assert_eq!(store.get_connection_permission(), Permission::Ask);
}

#[tokio::test]
async fn recoverable_failures_are_retried_with_incrementing_counters() {
    let network = Arc::new(MockNetwork::failing(
        2,
        "https://www.google.com/maps/@52.5,13.4,11z",
    ));
    let (converter, _) = converter(Arc::clone(&network), Permission::Always);
    let state = converter.submit("https://maps.app.goo.gl/foo12").await;
    assert!(matches!(
        state,
        ConversionState::ConversionSucceeded { .. }
    ));
    assert_eq!(network.calls(), 3, "two timeouts plus the success");
}

#[tokio::test]
async fn exhausted_retries_become_a_connection_error() {
    let network = Arc::new(MockNetwork::failing(u32::MAX, "unused"));
    let (converter, _) = converter(Arc::clone(&network), Permission::Always);
    let state = converter.submit("https://maps.app.goo.gl/foo12").await;
    assert!(
        matches!(
            &state,
            ConversionState::ConversionFailed {
                error: ConversionError::UnshortenConnection,
                ..
            }
        ),
        "got {state:?}"
    );
    // Attempts 0..=MAX_RETRY_COUNT reach the wire, the next one is
    // rejected by the retry contract without a call.
    assert_eq!(network.calls(), MAX_RETRY_COUNT + 1);
}

#[tokio::test]
async fn html_fallback_enriches_a_query_only_link() {
    let network = Arc::new(MockNetwork {
        body: Some(
            "<html><a href=\"/maps/place/Spot/@48.85,2.29,16z/data\">map</a></html>".to_owned(),
        ),
        ..MockNetwork::default()
    });
    let (converter, _) = converter(Arc::clone(&network), Permission::Always);
    let state = converter.submit("https://maps.google.com/?q=Somewhere+Nice").await;
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(position.points[0].lat, Some(48.85));
    assert_eq!(position.zoom, Some(16.0));
    // The query extracted from the URI survives the merge.
    assert_eq!(position.query.as_deref(), Some("Somewhere Nice"));
    assert_eq!(network.calls(), 1);
}

#[tokio::test]
async fn denied_html_fetch_salvages_what_the_uri_gave() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(Arc::clone(&network), Permission::Never);
    let state = converter.submit("https://maps.google.com/?q=Somewhere+Nice").await;
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected salvage, got {state:?}");
    };
    assert_eq!(position.query.as_deref(), Some("Somewhere Nice"));
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn granted_permission_is_pinned_for_the_whole_conversion() {
    // Store says Ask, but after the explicit grant the follow-up HTML
    // step must proceed without asking again.
    let network = Arc::new(MockNetwork {
        effective_url: Some("https://maps.google.com/?q=enrich+me".to_owned()),
        body: Some("x /maps/place/Spot/@48.85,2.29,16z/ x".to_owned()),
        ..MockNetwork::default()
    });
    let (converter, store) = converter(Arc::clone(&network), Permission::Ask);
    let state = converter.submit("https://maps.app.goo.gl/foo12").await;
    let state = converter.grant(state, false).await;
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(position.points[0].lat, Some(48.85));
    assert_eq!(network.calls(), 2, "unshorten plus page download");
    assert_eq!(store.get_connection_permission(), Permission::Ask);
}

#[tokio::test]
#[should_panic(expected = "exceeded")]
async fn cyclic_html_redirects_hit_the_transition_cap() {
    let network = Arc::new(MockNetwork {
        body: Some(
            "<meta content=\"0;url=https://maps.google.com/?q=looping+around\">".to_owned(),
        ),
        ..MockNetwork::default()
    });
    let (converter, _) = converter(network, Permission::Always);
    converter.submit("https://maps.google.com/?q=looping+around").await;
}

#[tokio::test]
async fn web_parse_consumes_the_latest_reported_url() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(network, Permission::Always);
    let waiting = ConversionState::GrantedParseWebPermission {
        input: input_index("google"),
        uri: "https://maps.app.goo.gl/consent".to_owned(),
        position: Position::default(),
    };
    let (state, ()) = tokio::join!(converter.run(waiting), async {
        // First a useless consent URL, then the real one.
        converter.on_url_change("https://consent.google.com/m?continue=maps");
        converter.on_url_change("https://www.google.com/maps/@52.5,13.4,11z");
    });
    let ConversionState::ConversionSucceeded { position } = state else {
        panic!("expected success, got {state:?}");
    };
    assert_eq!(position.points[0].lat, Some(52.5));
}

#[tokio::test(start_paused = true)]
async fn web_parse_times_out_into_a_parse_failure() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(network, Permission::Always);
    let waiting = ConversionState::GrantedParseWebPermission {
        input: input_index("google"),
        uri: "https://maps.app.goo.gl/consent".to_owned(),
        position: Position::default(),
    };
    let state = converter.run(waiting).await;
    assert!(
        matches!(
            &state,
            ConversionState::ConversionFailed {
                error: ConversionError::ParseHtml,
                ..
            }
        ),
        "got {state:?}"
    );
}

#[tokio::test]
async fn cancellation_short_circuits_a_network_step() {
    let network = Arc::new(MockNetwork {
        effective_url: Some("https://www.google.com/maps/@52.5,13.4,11z".to_owned()),
        ..MockNetwork::default()
    });
    let (converter, _) = converter(Arc::clone(&network), Permission::Always);
    converter.cancel();
    let state = converter.submit("https://maps.app.goo.gl/foo12").await;
    assert!(
        matches!(
            &state,
            ConversionState::ConversionFailed {
                error: ConversionError::Cancelled,
                ..
            }
        ),
        "got {state:?}"
    );
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn observer_sees_every_state_in_order() {
    struct Recorder(Mutex<Vec<&'static str>>);
    impl StateObserver for Recorder {
        fn on_state(&self, state: &ConversionState) {
            self.0.lock().unwrap().push(state.name());
        }
    }

    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));
    let network = Arc::new(MockNetwork::default());
    let store = Arc::new(MemoryPermissionStore::new(Permission::Ask));
    let converter = Converter::new(registry(), network, store)
        .with_observer(Box::new(Arc::clone(&recorder)));

    converter.submit("geo:48.2082,16.3738").await;
    let seen = recorder.0.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            "received_uri_string",
            "received_uri",
            "unshortened_url",
            "conversion_succeeded"
        ]
    );
}

#[tokio::test]
async fn initial_state_has_no_transition() {
    let network = Arc::new(MockNetwork::default());
    let (converter, _) = converter(network, Permission::Ask);
    assert!(converter.transition(&ConversionState::Initial).await.is_none());
}
