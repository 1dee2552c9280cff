use url::Url;

use super::uri::is_path_rooted;
use crate::data::ResponseHead;
use crate::error::{Error, Result};

/// Returns `true` if the HTTP status code is in the followed redirect range.
///
/// Every code from 301 through 308 counts. A redirect is only followed when
/// the response also carries a `Location` header.
///
/// # Examples
///
/// ```
/// use tinyhttp::core::is_redirect;
///
/// assert!(is_redirect(301));
/// assert!(is_redirect(308));
/// assert!(!is_redirect(300));
/// assert!(!is_redirect(200));
/// ```
pub fn is_redirect(status: u16) -> bool { (301..=308).contains(&status) }

/// Redirect bookkeeping for one top-level call.
///
/// A fresh state is built per call and replaced, never mutated, on every
/// hop: [`RedirectState::followed`] consumes the state and returns the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectState {
    current_redirects: u32,
    max_redirects: u32,
    history: Vec<ResponseHead>,
}

impl RedirectState {
    pub fn new(max_redirects: u32) -> Self {
        Self {
            current_redirects: 0,
            max_redirects,
            history: Vec::new(),
        }
    }

    pub fn current_redirects(&self) -> u32 { self.current_redirects }

    pub fn max_redirects(&self) -> u32 { self.max_redirects }

    /// Redirect responses followed so far, oldest first.
    pub fn history(&self) -> &[ResponseHead] { &self.history }

    pub fn into_history(self) -> Vec<ResponseHead> { self.history }

    /// State after following the redirect carried by `head`.
    #[must_use]
    pub fn followed(mut self, head: ResponseHead) -> Self {
        self.current_redirects += 1;
        self.history.push(head);
        self
    }

    fn can_follow(&self) -> bool { self.current_redirects < self.max_redirects }
}

/// Which client a redirect hop is dispatched through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Path-rooted location: reuse the client that issued the request.
    SameClient,
    /// Any other location: use the caller's default client.
    DefaultClient,
}

/// Outcome of inspecting one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Re-dispatch against `target`; the chain stays in the following state.
    Follow { target: Url, route: Route },
    /// Hand the response to the accumulator.
    Finalize,
}

/// Decide what to do with a response given the chain so far.
///
/// Fails with [`Error::TooManyRedirects`] when following the response would
/// exceed the limit, so no further request is issued. Relative locations
/// resolve against `head.url`, the URL that produced this response.
pub fn decide(state: &RedirectState, head: &ResponseHead) -> Result<Decision> {
    let Some(location) = head.location().filter(|_| is_redirect(head.status)) else {
        return Ok(Decision::Finalize);
    };

    if !state.can_follow() {
        return Err(Error::TooManyRedirects { max: state.max_redirects });
    }

    let target = head
        .url
        .join(location)
        .map_err(|e| Error::InvalidUrl(format!("redirect location '{location}': {e}")))?;
    let route = if is_path_rooted(location) { Route::SameClient } else { Route::DefaultClient };

    Ok(Decision::Follow { target, route })
}
