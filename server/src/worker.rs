//! Bounded worker pool draining the ingress queue.
//!
//! Readers push decoded frames into one bounded queue; a small fixed set of
//! workers drains it. Each worker takes the single game lock, applies the
//! frame, resolves the resulting outbound frames to channel handles, and
//! only then (lock released) pushes them to the per-connection writers.
//! The game lock makes every frame apply atomically whatever the worker
//! count; with a single worker, queue order is preserved exactly.

use std::sync::Arc;

use log::{debug, trace};
use shared::Frame;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::game::Game;

/// One unit of ingress work: a decoded frame tagged with its source
/// connection.
#[derive(Debug)]
pub struct Task {
    pub conn_id: u64,
    pub frame: Frame,
}

/// Spawns `count` workers sharing one receiving end of the ingress queue.
pub fn spawn_workers(
    count: usize,
    game: Arc<Mutex<Game>>,
    queue: mpsc::Receiver<Task>,
) -> Vec<JoinHandle<()>> {
    let queue = Arc::new(Mutex::new(queue));
    (0..count)
        .map(|worker_id| {
            let game = Arc::clone(&game);
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                debug!("worker {} started", worker_id);
                loop {
                    // Hold the queue lock only across the recv so the other
                    // workers can take the next task while this one runs.
                    let task = { queue.lock().await.recv().await };
                    let Some(task) = task else {
                        break;
                    };
                    trace!(
                        "worker {} dispatching kind 0x{:02x} from connection {}",
                        worker_id,
                        task.frame.kind(),
                        task.conn_id
                    );

                    let deliveries = {
                        let mut game = game.lock().await;
                        let outbound = game.handle_frame(task.conn_id, task.frame);
                        game.resolve(outbound)
                    };
                    for (sender, frame) in deliveries {
                        // A send failure means the writer task is gone; the
                        // reader-side cleanup handles the rest.
                        let _ = sender.send(frame);
                    }
                }
                debug!("worker {} stopped", worker_id);
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error_code;
    use std::net::SocketAddr;
    use tokio::sync::Notify;
    use tokio::time::{timeout, Duration};

    fn test_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{}", port).parse().unwrap()
    }

    async fn seated_game() -> (Arc<Mutex<Game>>, Vec<mpsc::UnboundedReceiver<Frame>>) {
        let game = Arc::new(Mutex::new(Game::new(32000)));
        let mut receivers = Vec::new();
        {
            let mut game = game.lock().await;
            for i in 1..=4u64 {
                let (tx, rx) = mpsc::unbounded_channel();
                game.registry_mut()
                    .insert_conn(i, test_addr(40000 + i as u16), tx, Arc::new(Notify::new()));
                receivers.push(rx);
                let out = game.handle_frame(
                    i,
                    Frame::Connect {
                        ip: "127.0.0.1".to_string(),
                        port: 0,
                        name: format!("p{}", i),
                    },
                );
                let deliveries = game.resolve(out);
                for (sender, frame) in deliveries {
                    let _ = sender.send(frame);
                }
            }
        }
        // Drop the lobby traffic so tests only see gameplay frames.
        for rx in receivers.iter_mut() {
            while rx.try_recv().is_ok() {}
        }
        (game, receivers)
    }

    async fn recv_until(rx: &mut mpsc::UnboundedReceiver<Frame>, want: fn(&Frame) -> bool) -> Frame {
        loop {
            let frame = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("timed out")
                .expect("channel closed");
            if want(&frame) {
                return frame;
            }
        }
    }

    #[tokio::test]
    async fn test_workers_apply_tasks_and_deliver() {
        let (game, mut receivers) = seated_game().await;
        let (queue_tx, queue_rx) = mpsc::channel(16);
        let handles = spawn_workers(2, Arc::clone(&game), queue_rx);

        queue_tx
            .send(Task {
                conn_id: 1,
                frame: Frame::AskObject {
                    asking_player_id: 0,
                    object_id: 0,
                },
            })
            .await
            .unwrap();

        // Every connection sees the VERIFY broadcast and the next TURN.
        for rx in receivers.iter_mut() {
            let verify = recv_until(rx, |f| matches!(f, Frame::Verify { .. })).await;
            assert!(matches!(verify, Frame::Verify { object_id: 0, .. }));
            let turn = recv_until(rx, |f| matches!(f, Frame::Turn { .. })).await;
            assert_eq!(turn, Frame::Turn { player_id: 1 });
        }

        drop(queue_tx);
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_rejection_goes_only_to_sender() {
        let (game, mut receivers) = seated_game().await;
        let (queue_tx, queue_rx) = mpsc::channel(16);
        let _handles = spawn_workers(1, Arc::clone(&game), queue_rx);

        // Connection 2 (seat 1) acts out of turn.
        queue_tx
            .send(Task {
                conn_id: 2,
                frame: Frame::AskObject {
                    asking_player_id: 1,
                    object_id: 0,
                },
            })
            .await
            .unwrap();

        let err = recv_until(&mut receivers[1], |f| matches!(f, Frame::Error { .. })).await;
        assert!(matches!(
            err,
            Frame::Error {
                code: error_code::WRONG_TURN,
                ..
            }
        ));

        // Seat 0 got nothing out of it.
        let game = game.lock().await;
        assert_eq!(game.current_turn(), 0);
        drop(game);
        assert!(receivers[0].try_recv().is_err());
    }

    #[tokio::test]
    async fn test_single_worker_preserves_queue_order() {
        let (game, mut receivers) = seated_game().await;
        let (queue_tx, queue_rx) = mpsc::channel(16);
        let _handles = spawn_workers(1, Arc::clone(&game), queue_rx);

        // Two valid actions back to back: seat 0 then seat 1.
        queue_tx
            .send(Task {
                conn_id: 1,
                frame: Frame::AskObject {
                    asking_player_id: 0,
                    object_id: 1,
                },
            })
            .await
            .unwrap();
        queue_tx
            .send(Task {
                conn_id: 2,
                frame: Frame::AskObject {
                    asking_player_id: 1,
                    object_id: 2,
                },
            })
            .await
            .unwrap();

        // Seat 2 observes both VERIFYs in submission order.
        let rx = &mut receivers[2];
        let first = recv_until(rx, |f| matches!(f, Frame::Verify { .. })).await;
        assert!(matches!(first, Frame::Verify { object_id: 1, .. }));
        let second = recv_until(rx, |f| matches!(f, Frame::Verify { .. })).await;
        assert!(matches!(second, Frame::Verify { object_id: 2, .. }));

        let game = game.lock().await;
        assert_eq!(game.current_turn(), 2);
    }
}
