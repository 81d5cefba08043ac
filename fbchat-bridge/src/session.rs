//! The session event loop.
//!
//! One task owns the `Terminal` and applies events from a single ordered
//! channel. Producers never touch the terminal:
//!
//! - the keyboard forwarder relays reports from the keyboard thread
//! - the receive task reads the chat server
//! - the blink task ticks the cursor
//!
//! Messages to the server are written by the loop itself.

use anyhow::Result;
use fbchat_core::{TermEvent, Terminal};
use fbchat_io::KeyboardEvent;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const EVENT_QUEUE: usize = 256;

pub struct Session<M> {
    terminal: Terminal<M>,
    blink_interval: Duration,
    recv_size: usize,
    events_tx: mpsc::Sender<TermEvent>,
    events_rx: mpsc::Receiver<TermEvent>,
}

impl<M> std::fmt::Debug for Session<M>
where
    M: AsRef<[u8]>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("terminal", &self.terminal)
            .field("blink_interval", &self.blink_interval)
            .field("recv_size", &self.recv_size)
            .finish()
    }
}

impl<M> Session<M>
where
    M: AsRef<[u8]> + AsMut<[u8]>,
{
    /// `recv_size` is the inbound transfer size; each read takes at most
    /// `recv_size - 1` bytes.
    pub fn new(terminal: Terminal<M>, blink_interval: Duration, recv_size: usize) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE);
        Self {
            terminal,
            blink_interval,
            recv_size,
            events_tx,
            events_rx,
        }
    }

    /// Another producer for the event queue.
    pub fn sender(&self) -> mpsc::Sender<TermEvent> {
        self.events_tx.clone()
    }

    /// Runs until escape is pressed or the keyboard goes away, then stops
    /// the background tasks and hands the terminal back.
    pub async fn run<S>(self, stream: S, keyboard: mpsc::Receiver<KeyboardEvent>) -> Result<Terminal<M>>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let Session {
            mut terminal,
            blink_interval,
            recv_size,
            events_tx,
            mut events_rx,
        } = self;

        let (reader, mut writer) = tokio::io::split(stream);
        let tasks = [
            spawn_keyboard_forwarder(keyboard, events_tx.clone()),
            spawn_receiver(reader, recv_size, events_tx.clone()),
            spawn_blinker(blink_interval, events_tx.clone()),
        ];
        drop(events_tx);
        info!("session started");

        let result = loop {
            let Some(event) = events_rx.recv().await else {
                break Ok(());
            };
            let reaction = match terminal.handle(event) {
                Ok(reaction) => reaction,
                Err(e) => break Err(anyhow::Error::new(e).context("terminal drawing failed")),
            };
            if let Some(message) = reaction.outbound {
                match send(&mut writer, &message).await {
                    Ok(()) => debug!(len = message.len(), "message sent"),
                    Err(e) => warn!(error = %e, "failed to send message"),
                }
            }
            if reaction.quit {
                break Ok(());
            }
        };

        for task in &tasks {
            task.abort();
        }
        for task in tasks {
            let _ = task.await;
        }
        info!("session ended");
        result.map(|()| terminal)
    }
}

async fn send<W>(writer: &mut W, message: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(message).await?;
    writer.flush().await
}

fn spawn_keyboard_forwarder(
    mut keyboard: mpsc::Receiver<KeyboardEvent>,
    tx: mpsc::Sender<TermEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = keyboard.recv().await {
            let lost = matches!(event, KeyboardEvent::Disconnected(_));
            let event = match event {
                KeyboardEvent::Report(bytes) => TermEvent::Report(bytes),
                KeyboardEvent::Disconnected(reason) => TermEvent::KeyboardLost(reason),
            };
            if tx.send(event).await.is_err() || lost {
                return;
            }
        }
        let _ = tx
            .send(TermEvent::KeyboardLost("keyboard channel closed".to_string()))
            .await;
    })
}

fn spawn_receiver<R>(mut reader: R, recv_size: usize, tx: mpsc::Sender<TermEvent>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; recv_size.saturating_sub(1).max(1)];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(TermEvent::Inbound(buf[..n].to_vec())).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "chat server read failed");
                    break;
                }
            }
        }
        let _ = tx.send(TermEvent::NetworkClosed).await;
    })
}

fn spawn_blinker(period: Duration, tx: mpsc::Sender<TermEvent>) -> JoinHandle<()> {
    let period = period.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
        loop {
            ticks.tick().await;
            if tx.send(TermEvent::BlinkTick).await.is_err() {
                return;
            }
        }
    })
}
