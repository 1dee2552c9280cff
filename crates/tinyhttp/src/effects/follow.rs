use tracing::debug;
use url::Url;

use super::accumulate::{buffered, streaming};
use super::client::Client;
use super::dispatch::dispatch;
use super::response::Response;
use super::transport::Transport;
use crate::core::{Decision, RedirectState, Route, decide};
use crate::data::{Completion, HeaderMap, Method, RequestOptions};
use crate::error::Result;

/// Run one redirect chain to its terminal response.
///
/// `client` is the client the top-level call was made on. Each hop is
/// issued through the client chosen by the previous hop's [`Route`], and
/// every hop replays the same method, headers and payload.
pub(crate) async fn run_chain<T: Transport>(
    client: &Client<T>,
    method: Method,
    url: Url,
    headers: &HeaderMap,
    options: &RequestOptions,
) -> Result<Response> {
    let mut state = RedirectState::new(options.max_redirects);
    let mut issuer = client;
    let mut url = url;

    loop {
        let exchange = dispatch(issuer.transport(), method, url, headers, options).await?;

        match decide(&state, &exchange.head)? {
            Decision::Follow { target, route } => {
                debug!(
                    status = exchange.head.status,
                    from = %exchange.head.url,
                    to = %target,
                    ?route,
                    hop = state.current_redirects() + 1,
                    "Following redirect"
                );
                // The body of a redirect is never read.
                exchange.cancel.cancel();

                issuer = match route {
                    Route::SameClient => issuer,
                    Route::DefaultClient => client.redirect_client(),
                };
                state = state.followed(exchange.head);
                url = target;
            }
            Decision::Finalize => {
                let redirects = state.into_history();
                return match options.completion() {
                    Completion::Buffered => buffered(exchange, options, redirects).await,
                    Completion::Streaming => Ok(streaming(exchange, options, redirects)),
                };
            }
        }
    }
}
