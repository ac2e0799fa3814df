//! Single-writer connectivity cell.
//!
//! The connection supervisor owns the [`ConnectivityWriter`]; everyone else
//! (relay, dispatcher, status surface) holds a cloneable
//! [`ConnectivityReader`] and only ever sees whole snapshots.

use std::sync::Arc;

use tokio::sync::watch;

use crate::ports::PairingCallback;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Connectivity {
    pub connected: bool,
    /// Latest pairing challenge, cleared once the session is up.
    pub pairing: Option<String>,
    /// Connection attempts made so far.
    pub attempts: u64,
    pub last_error: Option<String>,
}

pub struct ConnectivityWriter {
    tx: Arc<watch::Sender<Connectivity>>,
}

#[derive(Clone)]
pub struct ConnectivityReader {
    rx: watch::Receiver<Connectivity>,
}

pub fn channel() -> (ConnectivityWriter, ConnectivityReader) {
    let (tx, rx) = watch::channel(Connectivity::default());
    (
        ConnectivityWriter { tx: Arc::new(tx) },
        ConnectivityReader { rx },
    )
}

impl ConnectivityWriter {
    pub fn begin_attempt(&self) -> u64 {
        let mut n = 0;
        self.tx.send_modify(|c| {
            c.attempts += 1;
            n = c.attempts;
        });
        n
    }

    pub fn mark_connected(&self) {
        self.tx.send_modify(|c| {
            c.connected = true;
            c.pairing = None;
            c.last_error = None;
        });
    }

    pub fn mark_disconnected(&self, error: Option<String>) {
        self.tx.send_modify(|c| {
            c.connected = false;
            if error.is_some() {
                c.last_error = error;
            }
        });
    }

    /// Pairing callback handed to the destination client. It writes through
    /// this writer, so the supervisor stays the only writer.
    pub fn pairing_sink(&self) -> PairingCallback {
        let tx = Arc::clone(&self.tx);
        Arc::new(move |qr: String| {
            tx.send_modify(|c| c.pairing = Some(qr));
        })
    }
}

impl ConnectivityReader {
    pub fn snapshot(&self) -> Connectivity {
        self.rx.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.rx.borrow().connected
    }
}
