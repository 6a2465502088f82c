// Event Dispatch - einziger Consumer der Event-Queue
use ots_core::{Dispatcher, EventReceiver};

/// Verteilt Events in FIFO-Reihenfolge an die registrierten Handler
///
/// Handler laufen in dieser Schleife, daher dürfen sie nicht blockieren.
pub async fn event_dispatch_loop(dispatcher: &Dispatcher<'_>, receiver: EventReceiver<'_>) {
    dispatcher.run(receiver).await;
}
