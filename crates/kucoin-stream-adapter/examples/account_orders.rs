/*
[INPUT]:  KuCoin API credentials (environment of the example, not the core)
[OUTPUT]: Live private order-update events printed to stdout
[POS]:    Examples - private account event streaming + order helper
[UPDATE]: When the private stream or order helper API changes
*/

use kucoin_stream_adapter::{
    Credentials, KucoinClient, KucoinStream, StreamConfig, StreamKind, message_callback,
};
use tokio::runtime::Handle;
use tokio::time::{Duration, sleep};
use tracing_subscriber::EnvFilter;

/// Example: stream private order updates for 60 seconds.
///
/// The adapter itself takes credentials as an explicit value; this example
/// is the caller that chooses to read them from the environment.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let credentials = Credentials {
        api_key: std::env::var("KUCOIN_API_KEY")?,
        api_secret: std::env::var("KUCOIN_API_SECRET")?,
        api_passphrase: std::env::var("KUCOIN_API_PASSPHRASE")?,
    };

    let mut client = KucoinClient::new()?;
    client.set_credentials(credentials);

    let config = StreamConfig::new(StreamKind::private_account_events());
    let stream = KucoinStream::new(client, config, Handle::current());

    stream.start(message_callback(|message| async move {
        println!("order update: {message}");
        Ok(())
    }))?;

    // To place a validate-only order while streaming:
    // stream.submit_test_market_order("BTC-USDT", OrderSide::Buy, "0.001".parse()?).await?;

    sleep(Duration::from_secs(60)).await;

    stream.stop();
    stream.wait_stopped().await;
    Ok(())
}
