//! TCP front end: accept loop, per-connection reader and writer tasks.
//!
//! Each accepted socket gets a numeric connection id, a writer task that
//! drains the connection's outbound channel, and a reader task that decodes
//! frames and pushes them onto the bounded ingress queue. Readers and
//! writers never touch game state directly; everything flows through the
//! queue and the worker pool.

use std::io;
use std::sync::Arc;

use log::{info, warn};
use shared::{read_frame, write_frame, Frame, FrameError};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, Notify};

use crate::game::Game;
use crate::worker::{spawn_workers, Task};

pub struct Server {
    listener: TcpListener,
    game: Arc<Mutex<Game>>,
    queue_tx: mpsc::Sender<Task>,
}

impl Server {
    /// Binds the listener and starts the worker pool. The server is not
    /// accepting yet; call [`Server::run`].
    pub async fn bind(addr: &str, workers: usize, queue_depth: usize) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        info!(
            "listening on {} ({} workers, queue depth {})",
            local, workers, queue_depth
        );

        let game = Arc::new(Mutex::new(Game::new(local.port())));
        let (queue_tx, queue_rx) = mpsc::channel(queue_depth);
        spawn_workers(workers, Arc::clone(&game), queue_rx);

        Ok(Self {
            listener,
            game,
            queue_tx,
        })
    }

    /// The bound address, useful when binding to port 0.
    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    pub async fn run(self) -> io::Result<()> {
        let mut next_conn_id: u64 = 1;
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let conn_id = next_conn_id;
            next_conn_id += 1;

            let (writer_tx, writer_rx) = mpsc::unbounded_channel();
            let shutdown = Arc::new(Notify::new());
            {
                let mut game = self.game.lock().await;
                game.registry_mut()
                    .insert_conn(conn_id, addr, writer_tx, Arc::clone(&shutdown));
            }
            spawn_connection(
                conn_id,
                stream,
                writer_rx,
                shutdown,
                Arc::clone(&self.game),
                self.queue_tx.clone(),
            );
        }
    }
}

/// Splits the stream and spawns the connection's reader and writer tasks.
fn spawn_connection(
    conn_id: u64,
    stream: TcpStream,
    writer_rx: mpsc::UnboundedReceiver<Frame>,
    shutdown: Arc<Notify>,
    game: Arc<Mutex<Game>>,
    queue_tx: mpsc::Sender<Task>,
) {
    let (read_half, write_half) = stream.into_split();
    tokio::spawn(write_loop(conn_id, write_half, writer_rx));
    tokio::spawn(read_loop(conn_id, read_half, shutdown, game, queue_tx));
}

/// Drains the connection's outbound channel onto the socket. Exits when the
/// channel closes (all senders dropped, buffered frames already written) or
/// the socket fails.
async fn write_loop(
    conn_id: u64,
    mut write_half: OwnedWriteHalf,
    mut writer_rx: mpsc::UnboundedReceiver<Frame>,
) {
    while let Some(frame) = writer_rx.recv().await {
        if let Err(e) = write_frame(&mut write_half, &frame).await {
            warn!("connection {}: write failed: {}", conn_id, e);
            break;
        }
    }
    // Dropping the write half sends FIN.
}

/// Decodes frames off the socket into the ingress queue until the peer
/// closes, a protocol error occurs, or the registry asks us to shut down.
async fn read_loop(
    conn_id: u64,
    mut read_half: OwnedReadHalf,
    shutdown: Arc<Notify>,
    game: Arc<Mutex<Game>>,
    queue_tx: mpsc::Sender<Task>,
) {
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!("connection {}: closed by server", conn_id);
                break;
            }
            result = read_frame(&mut read_half) => match result {
                Ok(frame) => {
                    // Backpressure: the reader stalls when the queue is full.
                    if queue_tx
                        .send(Task { conn_id, frame })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(FrameError::ConnectionClosed) => {
                    info!("connection {}: peer closed", conn_id);
                    break;
                }
                Err(e) => {
                    warn!("connection {}: dropping after protocol error: {}", conn_id, e);
                    break;
                }
            }
        }
    }

    let mut game = game.lock().await;
    game.registry_mut().remove_conn(conn_id);
}
