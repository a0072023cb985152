/*
[INPUT]:  Stream configuration and subscription topics
[OUTPUT]: Supervised real-time data streams with ordered delivery
[POS]:    WebSocket layer - streaming client wiring
[UPDATE]: When adding stream kinds or changing lifecycle surface
*/

pub mod message;
pub mod queue;
pub mod state;
pub mod stream;
pub mod subscription;

mod backoff;
mod session;

pub use message::{PingFrame, SubscribeFrame};
pub use queue::InboundFrame;
pub use state::RunState;
pub use stream::{
    CallbackResult, KucoinStream, MessageCallback, ReconnectConfig, StreamConfig,
    message_callback,
};
pub use subscription::StreamKind;
