/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public KuCoin stream adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod error;
pub mod http;
pub mod ws;

// Re-export the error types
pub use error::{KucoinError, Result};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    Credentials,
    KucoinClient,
    OrderSide,
    TokenScope,
    WsEndpoint,
};

// Re-export commonly used types from ws
pub use ws::{
    CallbackResult,
    InboundFrame,
    KucoinStream,
    MessageCallback,
    ReconnectConfig,
    RunState,
    StreamConfig,
    StreamKind,
    message_callback,
};
