/*
[INPUT]:  Stream kind configuration (symbols or private topics)
[OUTPUT]: Topic lists, token scope, and subscribe frames per (re)connect
[POS]:    WebSocket layer - subscription manager
[UPDATE]: When adding stream kinds or changing topic templates
*/

use crate::http::TokenScope;
use crate::ws::message::SubscribeFrame;

/// Default topic for private account/order event streams
const PRIVATE_ORDERS_TOPIC: &str = "/spotMarket/tradeOrdersV2";

/// The kind of stream a session carries.
///
/// Each variant supplies its topic templates and the token scope it
/// requires; subscription state is not persisted and is replayed in full
/// after every reconnect.
#[derive(Debug, Clone)]
pub enum StreamKind {
    /// Best bid/ask ticker feed for a set of symbols
    PublicTicker { symbols: Vec<String> },
    /// Private account and order update events
    PrivateAccountEvents { topics: Vec<String> },
}

impl StreamKind {
    /// Ticker stream over the given symbols
    pub fn public_ticker<S: Into<String>>(symbols: impl IntoIterator<Item = S>) -> Self {
        StreamKind::PublicTicker {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    /// Account event stream over the default order-update topic
    pub fn private_account_events() -> Self {
        StreamKind::PrivateAccountEvents {
            topics: vec![PRIVATE_ORDERS_TOPIC.to_string()],
        }
    }

    /// Token scope this kind requires
    pub fn scope(&self) -> TokenScope {
        match self {
            StreamKind::PublicTicker { .. } => TokenScope::Public,
            StreamKind::PrivateAccountEvents { .. } => TokenScope::Private,
        }
    }

    pub fn is_private(&self) -> bool {
        self.scope() == TokenScope::Private
    }

    /// Topics this kind subscribes to
    pub fn topics(&self) -> Vec<String> {
        match self {
            StreamKind::PublicTicker { symbols } => symbols
                .iter()
                .map(|symbol| format!("/market/ticker:{symbol}"))
                .collect(),
            StreamKind::PrivateAccountEvents { topics } => topics.clone(),
        }
    }

    /// Build one subscribe frame per topic, each with a fresh id.
    ///
    /// Safe to call again after a reconnect; the exchange tolerates
    /// duplicate subscriptions.
    pub fn subscribe_frames(&self) -> Vec<SubscribeFrame> {
        let private = self.is_private();
        self.topics()
            .into_iter()
            .map(|topic| SubscribeFrame::new(topic, private))
            .collect()
    }
}
