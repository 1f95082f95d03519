//! Driving a hunt from a stream of scanned codes.
//!
//! A [`ScanSource`] pushes codes into a channel; the [`HuntSession`] feeds
//! them to a [`HuntGame`] and reports each outcome as a [`HuntEvent`] with the
//! clue image looked up in the [`HuntStore`].

use rand::Rng;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;

use super::game::{HuntGame, ScanOutcome};
use super::store::HuntStore;
use super::HuntMode;

/// Codes buffered between a source and the session.
const SCAN_CHANNEL_CAPACITY: usize = 16;

/// Something that produces scanned QR codes.
#[async_trait::async_trait]
pub trait ScanSource: Send {
    /// Send codes through `tx` until the source is exhausted or the receiver
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if reading from the underlying device fails.
    async fn run(&mut self, tx: mpsc::Sender<String>) -> Result<()>;
}

/// Reads one code per line; blank lines are skipped.
#[derive(Debug)]
pub struct LineScanSource<R> {
    reader: BufReader<R>,
}

/// Codes typed (or piped) on standard input.
pub type StdinScanSource = LineScanSource<tokio::io::Stdin>;

impl<R: AsyncRead + Unpin + Send> LineScanSource<R> {
    /// Read codes from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
        }
    }
}

impl StdinScanSource {
    /// Read codes from standard input.
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> ScanSource for LineScanSource<R> {
    async fn run(&mut self, tx: mpsc::Sender<String>) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let code = line.trim();
            if code.is_empty() {
                continue;
            }
            if tx.send(code.to_string()).await.is_err() {
                return Ok(());
            }
        }
    }
}

/// What the player should see after a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuntEvent {
    /// Show the picture of where the next code is hidden.
    Clue {
        /// Current step, 1-based.
        step: usize,
        /// Code the picture belongs to.
        code: String,
        /// Picture bytes, if the step still exists in the store.
        image: Option<Vec<u8>>,
    },
    /// The scan did not advance the hunt.
    Ignored {
        /// The code that was scanned.
        code: String,
    },
    /// Show the picture of the treasure.
    Treasure {
        /// Code the picture belongs to.
        code: String,
        /// Picture bytes, if the step still exists in the store.
        image: Option<Vec<u8>>,
    },
}

/// A hunt being played against a step store.
#[derive(Debug)]
pub struct HuntSession<'a> {
    store: &'a HuntStore,
    game: HuntGame,
}

impl<'a> HuntSession<'a> {
    /// Prepare a session with the store's current steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the steps cannot be read.
    pub fn new(store: &'a HuntStore) -> Result<Self> {
        Ok(Self {
            store,
            game: HuntGame::new(store.sequence()?),
        })
    }

    /// The underlying game.
    #[must_use]
    pub fn game(&self) -> &HuntGame {
        &self.game
    }

    /// Start the hunt and return the first clue.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HuntEmpty`](crate::Error::HuntEmpty) if the store has no
    /// steps, or an error if the clue image cannot be read.
    pub fn start<R: Rng + ?Sized>(&mut self, mode: HuntMode, rng: &mut R) -> Result<HuntEvent> {
        let code = self.game.start(mode, rng)?;
        Ok(HuntEvent::Clue {
            step: self.game.current_step(),
            image: self.store.image_for(&code)?,
            code,
        })
    }

    /// Feed one scanned code.
    ///
    /// # Errors
    ///
    /// Returns an error if the clue image cannot be read.
    pub fn scan(&mut self, code: &str) -> Result<HuntEvent> {
        let event = match self.game.scan(code) {
            ScanOutcome::Ignored => HuntEvent::Ignored {
                code: code.to_string(),
            },
            ScanOutcome::Advanced { step, clue } => HuntEvent::Clue {
                step,
                image: self.store.image_for(&clue)?,
                code: clue,
            },
            ScanOutcome::Completed { treasure } => HuntEvent::Treasure {
                image: self.store.image_for(&treasure)?,
                code: treasure,
            },
        };
        Ok(event)
    }

    /// Consume codes from `source` until the treasure is found or the source
    /// runs dry.
    ///
    /// Returns `true` if the hunt was completed. The session must have been
    /// started.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or an image cannot be read.
    pub async fn run<S, F>(&mut self, source: &mut S, mut on_event: F) -> Result<bool>
    where
        S: ScanSource + ?Sized,
        F: FnMut(&HuntEvent),
    {
        let (tx, mut rx) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
        let producer = source.run(tx);
        tokio::pin!(producer);
        let mut producer_done = false;

        loop {
            tokio::select! {
                result = &mut producer, if !producer_done => {
                    producer_done = true;
                    if let Err(e) = result {
                        warn!(error = %e, "Scan source failed");
                        return Err(e);
                    }
                    debug!("Scan source finished");
                }
                code = rx.recv() => {
                    let Some(code) = code else {
                        return Ok(self.game.is_complete());
                    };
                    let event = self.scan(&code)?;
                    on_event(&event);
                    if self.game.is_complete() {
                        return Ok(true);
                    }
                }
            }
        }
    }
}
