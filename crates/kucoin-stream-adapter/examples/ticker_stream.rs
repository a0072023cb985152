/*
[INPUT]:  Symbols to stream from the public ticker feed
[OUTPUT]: Live ticker messages printed to stdout
[POS]:    Examples - public market data streaming
[UPDATE]: When the stream lifecycle API changes
*/

use kucoin_stream_adapter::{
    KucoinClient, KucoinStream, StreamConfig, StreamKind, message_callback,
};
use tokio::runtime::Handle;
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;

/// Example: stream the public ticker for BTC-USDT for 30 seconds
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = KucoinClient::new()?;
    let config = StreamConfig::new(StreamKind::public_ticker(["BTC-USDT"]));
    let stream = KucoinStream::new(client, config, Handle::current());

    stream.start(message_callback(|message| async move {
        println!("ticker: {message}");
        Ok(())
    }))?;

    sleep(Duration::from_secs(30)).await;

    stream.stop();
    stream.wait_stopped().await;

    if let Some(error) = stream.last_error() {
        println!("stream ended with error: {error}");
    } else {
        println!("stream stopped cleanly");
    }
    Ok(())
}
