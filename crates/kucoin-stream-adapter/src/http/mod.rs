/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST collaborator (token provider, order helpers)
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod signature;
pub mod token;
pub mod trade;

pub use client::{ClientConfig, Credentials, KucoinClient};
pub use signature::RequestSigner;
pub use token::{TokenScope, WsEndpoint};
pub use trade::OrderSide;
