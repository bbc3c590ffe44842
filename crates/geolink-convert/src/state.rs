//! The conversion state machine: raw shared text in, position or typed
//! failure out.
//!
//! Every step is an immutable [`ConversionState`] value carrying exactly
//! the data its transition needs. The driver loop replaces the current
//! state with `transition(current)` until a state has no successor, so
//! each intermediate step is observable, replayable, and testable on its
//! own. Permission prompts are modeled as terminal-for-the-driver states;
//! the embedding UI resumes the machine through [`Converter::grant`] /
//! [`Converter::deny`].

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::sync::watch;

use geolink_core::position::Position;

use crate::error::ConversionError;
use crate::inputs::{Input, ShortUriMethod};
use crate::net::{NetworkAccess, Retry};
use crate::pattern::HtmlOutcome;
use crate::permission::{Permission, PermissionStore};
use crate::uri::{resolve_reference, Uri};

/// Transition budget per conversion. A well-formed input chain terminates
/// in a handful of steps; hitting this cap means a cyclic redirect in the
/// registry, which is a defect, not a user error.
pub const MAX_TRANSITIONS: usize = 30;

/// How long to wait for the embedded browser to report a usable URL.
pub const WEB_PARSE_TIMEOUT: Duration = Duration::from_secs(30);

/// One step of a conversion. `input` fields index into the registry the
/// converter was built with.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionState {
    Initial,
    ReceivedUriString {
        text: String,
    },
    ReceivedUri {
        input: usize,
        uri: String,
        /// Set to `Always` once the user granted access earlier in this
        /// same conversion; overrides the stored preference.
        permission: Option<Permission>,
    },
    RequestedUnshortenPermission {
        input: usize,
        uri: String,
    },
    GrantedUnshortenPermission {
        input: usize,
        uri: String,
        retry: Retry,
    },
    DeniedConnectionPermission {
        text: String,
    },
    UnshortenedUrl {
        input: usize,
        uri: String,
        permission: Option<Permission>,
    },
    RequestedParseHtmlPermission {
        input: usize,
        uri: String,
        position: Position,
    },
    GrantedParseHtmlPermission {
        input: usize,
        uri: String,
        position: Position,
        retry: Retry,
    },
    DeniedParseHtmlPermission {
        uri: String,
        position: Position,
    },
    RequestedParseWebPermission {
        input: usize,
        uri: String,
        position: Position,
    },
    GrantedParseWebPermission {
        input: usize,
        uri: String,
        position: Position,
    },
    DeniedParseWebPermission {
        uri: String,
        position: Position,
    },
    ConversionSucceeded {
        position: Position,
    },
    ConversionFailed {
        error: ConversionError,
        text: String,
    },
}

impl ConversionState {
    /// Short tag for logs and observers.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ConversionState::Initial => "initial",
            ConversionState::ReceivedUriString { .. } => "received_uri_string",
            ConversionState::ReceivedUri { .. } => "received_uri",
            ConversionState::RequestedUnshortenPermission { .. } => "requested_unshorten_permission",
            ConversionState::GrantedUnshortenPermission { .. } => "granted_unshorten_permission",
            ConversionState::DeniedConnectionPermission { .. } => "denied_connection_permission",
            ConversionState::UnshortenedUrl { .. } => "unshortened_url",
            ConversionState::RequestedParseHtmlPermission { .. } => "requested_parse_html_permission",
            ConversionState::GrantedParseHtmlPermission { .. } => "granted_parse_html_permission",
            ConversionState::DeniedParseHtmlPermission { .. } => "denied_parse_html_permission",
            ConversionState::RequestedParseWebPermission { .. } => "requested_parse_web_permission",
            ConversionState::GrantedParseWebPermission { .. } => "granted_parse_web_permission",
            ConversionState::DeniedParseWebPermission { .. } => "denied_parse_web_permission",
            ConversionState::ConversionSucceeded { .. } => "conversion_succeeded",
            ConversionState::ConversionFailed { .. } => "conversion_failed",
        }
    }

    /// States waiting on a user decision rather than a computable step.
    #[must_use]
    pub fn awaits_permission(&self) -> bool {
        matches!(
            self,
            ConversionState::RequestedUnshortenPermission { .. }
                | ConversionState::RequestedParseHtmlPermission { .. }
                | ConversionState::RequestedParseWebPermission { .. }
        )
    }
}

/// Receives every state the driver publishes, in transition order.
pub trait StateObserver: Send + Sync {
    fn on_state(&self, state: &ConversionState);
}

impl<T: StateObserver + ?Sized> StateObserver for std::sync::Arc<T> {
    fn on_state(&self, state: &ConversionState) {
        self.as_ref().on_state(state);
    }
}

/// Observer that drops everything.
pub struct NoopObserver;

impl StateObserver for NoopObserver {
    fn on_state(&self, _state: &ConversionState) {}
}

/// Drives one conversion against the injected collaborators.
///
/// Independent conversions are independent `Converter` values; the only
/// shared state is whatever the collaborators share internally.
pub struct Converter<N, P> {
    registry: &'static [Input],
    network: N,
    permissions: P,
    observer: Box<dyn StateObserver>,
    cancel: watch::Sender<bool>,
    web_url: watch::Sender<Option<String>>,
}

impl<N: NetworkAccess, P: PermissionStore> Converter<N, P> {
    #[must_use]
    pub fn new(registry: &'static [Input], network: N, permissions: P) -> Self {
        Self {
            registry,
            network,
            permissions,
            observer: Box::new(NoopObserver),
            cancel: watch::Sender::new(false),
            web_url: watch::Sender::new(None),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn StateObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Starts a conversion from raw shared text and drives it as far as
    /// it can go without user input.
    pub async fn submit(&self, text: impl Into<String>) -> ConversionState {
        self.run(ConversionState::ReceivedUriString { text: text.into() })
            .await
    }

    /// Resumes a permission-waiting state with a positive answer.
    /// `remember` persists the choice as `Always`.
    pub async fn grant(&self, state: ConversionState, remember: bool) -> ConversionState {
        if remember && state.awaits_permission() {
            self.permissions.set_connection_permission(Permission::Always);
        }
        let next = match state {
            ConversionState::RequestedUnshortenPermission { input, uri } => {
                ConversionState::GrantedUnshortenPermission {
                    input,
                    uri,
                    retry: Retry::default(),
                }
            }
            ConversionState::RequestedParseHtmlPermission { input, uri, position } => {
                ConversionState::GrantedParseHtmlPermission {
                    input,
                    uri,
                    position,
                    retry: Retry::default(),
                }
            }
            ConversionState::RequestedParseWebPermission { input, uri, position } => {
                ConversionState::GrantedParseWebPermission { input, uri, position }
            }
            other => {
                tracing::warn!(state = other.name(), "grant() on a non-waiting state");
                return other;
            }
        };
        self.run(next).await
    }

    /// Resumes a permission-waiting state with a refusal. `remember`
    /// persists the choice as `Never`.
    pub async fn deny(&self, state: ConversionState, remember: bool) -> ConversionState {
        if remember && state.awaits_permission() {
            self.permissions.set_connection_permission(Permission::Never);
        }
        let next = match state {
            ConversionState::RequestedUnshortenPermission { uri, .. } => {
                ConversionState::DeniedConnectionPermission { text: uri }
            }
            ConversionState::RequestedParseHtmlPermission { uri, position, .. } => {
                ConversionState::DeniedParseHtmlPermission { uri, position }
            }
            ConversionState::RequestedParseWebPermission { uri, position, .. } => {
                ConversionState::DeniedParseWebPermission { uri, position }
            }
            other => {
                tracing::warn!(state = other.name(), "deny() on a non-waiting state");
                return other;
            }
        };
        self.run(next).await
    }

    /// Reports the embedded browser's latest visible URL. Only the most
    /// recent value is ever consumed.
    pub fn on_url_change(&self, url: impl Into<String>) {
        self.web_url.send_replace(Some(url.into()));
    }

    /// Aborts the conversion: any in-flight or future suspension resolves
    /// to a cancelled failure.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Drives `state` until a state without a successor, publishing every
    /// state to the observer.
    ///
    /// # Panics
    ///
    /// Panics after [`MAX_TRANSITIONS`] transitions; see the constant.
    pub async fn run(&self, state: ConversionState) -> ConversionState {
        let mut state = state;
        let mut steps = 0usize;
        loop {
            self.observer.on_state(&state);
            tracing::debug!(state = state.name(), "conversion state");
            let Some(next) = self.transition(&state).await else {
                return state;
            };
            state = next;
            steps += 1;
            if steps > MAX_TRANSITIONS {
                tracing::error!(state = state.name(), "conversion transition cap hit");
                panic!(
                    "conversion exceeded {MAX_TRANSITIONS} transitions; \
                     cyclic redirect in the input registry"
                );
            }
        }
    }

    /// Computes the successor of `state`, or `None` for states that wait
    /// on external events (or are terminal).
    #[allow(clippy::too_many_lines)]
    pub async fn transition(&self, state: &ConversionState) -> Option<ConversionState> {
        match state {
            ConversionState::Initial
            | ConversionState::RequestedUnshortenPermission { .. }
            | ConversionState::RequestedParseHtmlPermission { .. }
            | ConversionState::RequestedParseWebPermission { .. }
            | ConversionState::ConversionSucceeded { .. }
            | ConversionState::ConversionFailed { .. } => None,

            ConversionState::ReceivedUriString { text } => {
                Some(self.scan_registry(text))
            }

            ConversionState::ReceivedUri { input, uri, permission } => {
                let inp = &self.registry[*input];
                let is_short = inp
                    .short_uri_pattern
                    .as_ref()
                    .is_some_and(|re| re.is_match(uri));
                if !is_short {
                    return Some(ConversionState::UnshortenedUrl {
                        input: *input,
                        uri: uri.clone(),
                        permission: *permission,
                    });
                }
                Some(match self.effective_permission(*permission) {
                    Permission::Always => ConversionState::GrantedUnshortenPermission {
                        input: *input,
                        uri: uri.clone(),
                        retry: Retry::default(),
                    },
                    Permission::Ask => ConversionState::RequestedUnshortenPermission {
                        input: *input,
                        uri: uri.clone(),
                    },
                    Permission::Never => ConversionState::DeniedConnectionPermission {
                        text: uri.clone(),
                    },
                })
            }

            ConversionState::DeniedConnectionPermission { text } => {
                Some(ConversionState::ConversionFailed {
                    error: ConversionError::PermissionDenied,
                    text: text.clone(),
                })
            }

            ConversionState::GrantedUnshortenPermission { input, uri, retry } => {
                let inp = &self.registry[*input];
                tracing::debug!(input = inp.name, uri = %uri, attempt = retry.count, "unshortening");
                let result = match inp.short_uri_method {
                    ShortUriMethod::Head => {
                        self.cancellable(self.network.head_location(uri, *retry)).await
                    }
                    ShortUriMethod::Get => {
                        self.cancellable(self.network.get_effective_url(uri, *retry)).await
                    }
                };
                Some(match result {
                    None => ConversionState::ConversionFailed {
                        error: ConversionError::Cancelled,
                        text: uri.clone(),
                    },
                    Some(Ok(resolved)) => ConversionState::UnshortenedUrl {
                        input: *input,
                        uri: resolve_reference(uri, &resolved),
                        permission: Some(Permission::Always),
                    },
                    Some(Err(e)) if e.is_recoverable() => {
                        tracing::warn!(error = %e, "unshorten failed; scheduling retry");
                        ConversionState::GrantedUnshortenPermission {
                            input: *input,
                            uri: uri.clone(),
                            retry: retry.next(),
                        }
                    }
                    Some(Err(e)) => ConversionState::ConversionFailed {
                        error: if e.is_connectivity() {
                            ConversionError::UnshortenConnection
                        } else {
                            ConversionError::Unshorten
                        },
                        text: uri.clone(),
                    },
                })
            }

            ConversionState::UnshortenedUrl { input, uri, permission } => {
                let inp = &self.registry[*input];
                let parsed = inp.uri_pattern.parse(&Uri::parse(uri), inp.system);
                if !parsed.matched {
                    return Some(ConversionState::ConversionFailed {
                        error: ConversionError::ParseUrl,
                        text: uri.clone(),
                    });
                }
                let position = parsed.position;
                if position.has_coordinates_or_name() {
                    return Some(ConversionState::ConversionSucceeded { position });
                }
                if inp.html_pattern.is_some() {
                    let fetch_uri = parsed.html_url.unwrap_or_else(|| uri.clone());
                    return Some(match self.effective_permission(*permission) {
                        Permission::Always => ConversionState::GrantedParseHtmlPermission {
                            input: *input,
                            uri: fetch_uri,
                            position,
                            retry: Retry::default(),
                        },
                        Permission::Ask => ConversionState::RequestedParseHtmlPermission {
                            input: *input,
                            uri: fetch_uri,
                            position,
                        },
                        Permission::Never => ConversionState::DeniedParseHtmlPermission {
                            uri: uri.clone(),
                            position,
                        },
                    });
                }
                if inp.web_parse {
                    return Some(match self.effective_permission(*permission) {
                        Permission::Always => ConversionState::GrantedParseWebPermission {
                            input: *input,
                            uri: uri.clone(),
                            position,
                        },
                        Permission::Ask => ConversionState::RequestedParseWebPermission {
                            input: *input,
                            uri: uri.clone(),
                            position,
                        },
                        Permission::Never => ConversionState::DeniedParseWebPermission {
                            uri: uri.clone(),
                            position,
                        },
                    });
                }
                if position.query.is_some() {
                    return Some(ConversionState::ConversionSucceeded { position });
                }
                Some(ConversionState::ConversionFailed {
                    error: ConversionError::ParseUrl,
                    text: uri.clone(),
                })
            }

            ConversionState::GrantedParseHtmlPermission { input, uri, position, retry } => {
                let inp = &self.registry[*input];
                tracing::debug!(input = inp.name, uri = %uri, attempt = retry.count, "downloading page");
                Some(match self.cancellable(self.network.get_body(uri, *retry)).await {
                    None => ConversionState::ConversionFailed {
                        error: ConversionError::Cancelled,
                        text: uri.clone(),
                    },
                    Some(Err(e)) if e.is_recoverable() => {
                        tracing::warn!(error = %e, "page download failed; scheduling retry");
                        ConversionState::GrantedParseHtmlPermission {
                            input: *input,
                            uri: uri.clone(),
                            position: position.clone(),
                            retry: retry.next(),
                        }
                    }
                    Some(Err(e)) => ConversionState::ConversionFailed {
                        error: if e.is_connectivity() {
                            ConversionError::ParseHtmlConnection
                        } else {
                            ConversionError::ParseHtml
                        },
                        text: uri.clone(),
                    },
                    Some(Ok(body)) => {
                        let html_pattern = inp
                            .html_pattern
                            .as_ref()
                            .expect("html state only entered for inputs with an html pattern");
                        match html_pattern.parse(&body) {
                            HtmlOutcome::Parsed(html_position) => {
                                ConversionState::ConversionSucceeded {
                                    position: merge_positions(html_position, position.clone()),
                                }
                            }
                            HtmlOutcome::Redirect(target) => ConversionState::ReceivedUri {
                                input: *input,
                                uri: resolve_reference(uri, &target),
                                permission: Some(Permission::Always),
                            },
                            HtmlOutcome::NoMatch if inp.web_parse => {
                                ConversionState::GrantedParseWebPermission {
                                    input: *input,
                                    uri: uri.clone(),
                                    position: position.clone(),
                                }
                            }
                            HtmlOutcome::NoMatch if salvageable(position) => {
                                ConversionState::ConversionSucceeded {
                                    position: position.clone(),
                                }
                            }
                            HtmlOutcome::NoMatch => ConversionState::ConversionFailed {
                                error: ConversionError::ParseHtml,
                                text: uri.clone(),
                            },
                        }
                    }
                })
            }

            ConversionState::DeniedParseHtmlPermission { uri, position }
            | ConversionState::DeniedParseWebPermission { uri, position } => {
                Some(if salvageable(position) {
                    ConversionState::ConversionSucceeded {
                        position: position.clone(),
                    }
                } else {
                    ConversionState::ConversionFailed {
                        error: ConversionError::PermissionDenied,
                        text: uri.clone(),
                    }
                })
            }

            ConversionState::GrantedParseWebPermission { input, uri, position } => {
                Some(self.await_web_url(*input, uri, position).await)
            }
        }
    }

    fn scan_registry(&self, text: &str) -> ConversionState {
        if text.trim().is_empty() {
            return ConversionState::ConversionFailed {
                error: ConversionError::MissingInput,
                text: text.to_owned(),
            };
        }
        let candidate = extract_candidate(text);
        for (index, input) in self.registry.iter().enumerate() {
            if input.uri_pattern.matches(&candidate) {
                tracing::debug!(input = input.name, uri = %candidate, "input matched");
                return ConversionState::ReceivedUri {
                    input: index,
                    uri: candidate,
                    permission: None,
                };
            }
        }
        ConversionState::ConversionFailed {
            error: ConversionError::UnsupportedService,
            text: text.to_owned(),
        }
    }

    async fn await_web_url(
        &self,
        input: usize,
        uri: &str,
        position: &Position,
    ) -> ConversionState {
        let inp = &self.registry[input];
        let mut rx = self.web_url.subscribe();
        let deadline = tokio::time::Instant::now() + WEB_PARSE_TIMEOUT;
        loop {
            match self
                .cancellable(tokio::time::timeout_at(deadline, rx.changed()))
                .await
            {
                None => {
                    return ConversionState::ConversionFailed {
                        error: ConversionError::Cancelled,
                        text: uri.to_owned(),
                    }
                }
                Some(Err(_) | Ok(Err(_))) => {
                    // Timeout, or the converter itself went away.
                    return ConversionState::ConversionFailed {
                        error: ConversionError::ParseHtml,
                        text: uri.to_owned(),
                    };
                }
                Some(Ok(Ok(()))) => {
                    let Some(reported) = rx.borrow_and_update().clone() else {
                        continue;
                    };
                    tracing::debug!(url = %reported, "web view reported a url");
                    let parsed = inp.uri_pattern.parse(&Uri::parse(&reported), inp.system);
                    if parsed.matched {
                        let merged = merge_positions(parsed.position, position.clone());
                        if salvageable(&merged) {
                            return ConversionState::ConversionSucceeded { position: merged };
                        }
                    }
                    // Not useful yet; keep consuming newer URLs until the
                    // deadline.
                }
            }
        }
    }

    fn effective_permission(&self, pinned: Option<Permission>) -> Permission {
        pinned.unwrap_or_else(|| self.permissions.get_connection_permission())
    }

    /// Races `fut` against cancellation; `None` means cancelled.
    async fn cancellable<T>(&self, fut: impl std::future::Future<Output = T>) -> Option<T> {
        let mut rx = self.cancel.subscribe();
        if *rx.borrow() {
            return None;
        }
        tokio::select! {
            _ = rx.wait_for(|cancelled| *cancelled) => None,
            value = fut => Some(value),
        }
    }
}

fn salvageable(position: &Position) -> bool {
    position.has_coordinates_or_name() || position.query.is_some()
}

/// Fields found later win only where the earlier pass found nothing.
fn merge_positions(primary: Position, fallback: Position) -> Position {
    Position {
        points: if primary.points.is_empty() {
            fallback.points
        } else {
            primary.points
        },
        query: primary.query.or(fallback.query),
        zoom: primary.zoom.or(fallback.zoom),
    }
}

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z][a-z0-9+.-]*://\S+|\bgeo:\S+|\b(?:[a-z0-9-]+\.)+[a-z]{2,}(?:/\S*)?")
        .expect("valid regex")
});

/// Picks the link out of surrounding share text, or falls back to the
/// whole trimmed text for bare coordinates.
fn extract_candidate(text: &str) -> String {
    URL_RE.find(text).map_or_else(
        || text.trim().to_owned(),
        |m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '"', '\''])
                .to_owned()
        },
    )
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
