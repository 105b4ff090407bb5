//! Prints the live feed to stdout as JSON lines.
use arena_runtime::Subscription;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

/// Forward every feed item until the distributor goes away or stdout closes.
pub async fn print_feed(mut subscription: Subscription) {
    let mut out = BufWriter::new(tokio::io::stdout());

    while let Some(item) = subscription.next().await {
        let line = match serde_json::to_string(&item) {
            Ok(line) => line,
            Err(error) => {
                warn!(target: "arena::node", %error, "failed to encode feed item");
                continue;
            }
        };
        let written = async {
            out.write_all(line.as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await
        };
        if let Err(error) = written.await {
            debug!(target: "arena::node", %error, "stdout closed, feed printer stopping");
            break;
        }
    }
}
