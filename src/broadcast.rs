//! Broadcaster
//!
//! Fans a line out to every registered peer. A full queue is waited on,
//! which pushes back on the sender; a peer whose writer is gone or stays
//! stuck past the stall timeout is pruned from the registry like a
//! disconnect. The others still get the line.

use std::time::Duration;

use tracing::{debug, warn};

use crate::message::user_list_line;
use crate::peer::Peer;
use crate::registry::Registry;

/// Deliver one chat line to every registered peer.
///
/// Returns the peers pruned along the way, including any pruned by the
/// roster announcements that follow a prune. Dropping them closes their
/// outbound queues.
pub async fn broadcast_message(
    registry: &mut Registry,
    line: &str,
    stall: Duration,
) -> Vec<Peer> {
    let mut pruned = fan_out(registry, line, stall).await;
    if !pruned.is_empty() {
        pruned.extend(broadcast_user_list(registry, stall).await);
    }
    pruned
}

/// Announce the current roster to every registered peer.
///
/// Repeats while announcing prunes someone, so the last roster line each
/// survivor sees matches the registry.
pub async fn broadcast_user_list(registry: &mut Registry, stall: Duration) -> Vec<Peer> {
    let mut pruned = Vec::new();
    loop {
        let line = user_list_line(registry.usernames());
        debug!("Announcing roster to {} peers: {}", registry.len(), line);
        let dropped = fan_out(registry, &line, stall).await;
        if dropped.is_empty() {
            return pruned;
        }
        pruned.extend(dropped);
    }
}

/// Offer `line` to every peer in a snapshot, then prune the failures.
async fn fan_out(registry: &mut Registry, line: &str, stall: Duration) -> Vec<Peer> {
    let mut failed = Vec::new();
    for peer in registry.snapshot() {
        if let Err(e) = peer.send(line, stall).await {
            warn!(
                "Write to {} ({}) failed: {}; dropping peer",
                peer.display_name(),
                peer.id,
                e
            );
            failed.push(peer.id);
        }
    }

    failed
        .into_iter()
        .filter_map(|id| registry.remove(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::types::{SessionId, Username};

    const STALL: Duration = Duration::from_millis(50);

    fn join(
        registry: &mut Registry,
        name: &str,
        capacity: usize,
    ) -> (SessionId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        let id = SessionId::new();
        registry.add(Peer::new(id, Username::parse(name).unwrap(), tx));
        (id, rx)
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[tokio::test]
    async fn test_broadcast_reaches_everyone() {
        let mut registry = Registry::new();
        let (_, mut alice) = join(&mut registry, "alice", 8);
        let (_, mut bob) = join(&mut registry, "bob", 8);

        let pruned = broadcast_message(&mut registry, "[10:00:00] alice: hi", STALL).await;

        assert!(pruned.is_empty());
        assert_eq!(drain(&mut alice), vec!["[10:00:00] alice: hi"]);
        assert_eq!(drain(&mut bob), vec!["[10:00:00] alice: hi"]);
    }

    #[tokio::test]
    async fn test_user_list_contents() {
        let mut registry = Registry::new();
        let (_, mut alice) = join(&mut registry, "alice", 8);
        let (_, mut bob) = join(&mut registry, "bob", 8);

        broadcast_user_list(&mut registry, STALL).await;

        assert_eq!(drain(&mut alice), vec!["USERLIST:alice, bob"]);
        assert_eq!(drain(&mut bob), vec!["USERLIST:alice, bob"]);
    }

    #[tokio::test]
    async fn test_failed_peer_is_pruned_and_others_still_served() {
        let mut registry = Registry::new();
        let (_, mut alice) = join(&mut registry, "alice", 8);
        let (bob_id, bob) = join(&mut registry, "bob", 8);
        let (_, mut carol) = join(&mut registry, "carol", 8);
        drop(bob);

        let pruned = broadcast_message(&mut registry, "[10:00:00] alice: hi", STALL).await;

        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, bob_id);
        assert!(!registry.contains(bob_id));
        assert_eq!(
            drain(&mut alice),
            vec!["[10:00:00] alice: hi", "USERLIST:alice, carol"]
        );
        assert_eq!(
            drain(&mut carol),
            vec!["[10:00:00] alice: hi", "USERLIST:alice, carol"]
        );
    }

    #[tokio::test]
    async fn test_burst_larger_than_queue_reaches_draining_peers() {
        let mut registry = Registry::new();
        let (_, alice) = join(&mut registry, "alice", 4);
        let (_, bob) = join(&mut registry, "bob", 4);

        // Writers that keep draining, slower than the relay fills
        let collect = |mut rx: mpsc::Receiver<String>| {
            tokio::spawn(async move {
                let mut lines = Vec::new();
                while let Some(line) = rx.recv().await {
                    lines.push(line);
                }
                lines
            })
        };
        let alice_lines = collect(alice);
        let bob_lines = collect(bob);

        for i in 0..1000 {
            let pruned = broadcast_message(&mut registry, &format!("line {i}"), STALL).await;
            assert!(pruned.is_empty(), "pruned at line {i}");
        }
        assert_eq!(registry.len(), 2);
        drop(registry);

        for lines in [alice_lines.await.unwrap(), bob_lines.await.unwrap()] {
            assert_eq!(lines.len(), 1000);
            assert_eq!(lines[0], "line 0");
            assert_eq!(lines[999], "line 999");
        }
    }

    #[tokio::test]
    async fn test_stalled_peer_is_pruned() {
        let mut registry = Registry::new();
        let (_, mut alice) = join(&mut registry, "alice", 8);
        let (stuck_id, _stuck) = join(&mut registry, "stuck", 1);

        broadcast_message(&mut registry, "one", STALL).await;
        assert!(registry.contains(stuck_id));

        let pruned = broadcast_message(&mut registry, "two", STALL).await;
        assert_eq!(pruned.len(), 1);
        assert!(!registry.contains(stuck_id));
        assert_eq!(drain(&mut alice), vec!["one", "two", "USERLIST:alice"]);
    }

    #[tokio::test]
    async fn test_roster_announcement_repeats_until_settled() {
        let mut registry = Registry::new();
        let (_, mut alice) = join(&mut registry, "alice", 8);
        // Room for exactly one line, never drained
        let (_, mut bob) = join(&mut registry, "bob", 1);
        let (carol_id, carol) = join(&mut registry, "carol", 8);
        drop(carol);

        // Carol fails on the message; bob fills up on it and then stalls
        // on the first roster line.
        let pruned = broadcast_message(&mut registry, "msg", STALL).await;

        assert_eq!(pruned.len(), 2);
        assert!(!registry.contains(carol_id));
        assert_eq!(registry.usernames(), vec!["alice"]);
        assert_eq!(
            drain(&mut alice),
            vec!["msg", "USERLIST:alice, bob", "USERLIST:alice"]
        );
        assert_eq!(drain(&mut bob), vec!["msg"]);
    }

    #[tokio::test]
    async fn test_broadcast_to_empty_registry() {
        let mut registry = Registry::new();
        assert!(broadcast_message(&mut registry, "nobody home", STALL)
            .await
            .is_empty());
        assert!(broadcast_user_list(&mut registry, STALL).await.is_empty());
    }
}
