//! # Pipeline Driver
//!
//! Runs the stream-to-archive loop:
//!
//! ```text
//! Idle ─> Syncing ─> Streaming ─> (Rotating ⇄ Streaming)* ─> Stopped
//! ```
//!
//! The stream is synchronized once. Each iteration then checks for a
//! shutdown request, decodes one reading, appends it to the open archive and
//! checks whether the hour bucket is over. Shutdown is only observed between
//! readings and is the only path that closes the archive cleanly; every
//! error is returned to the caller as is.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::archive::ArchiveWriter;
use crate::clock::Clock;
use crate::error::Result;
use crate::protocol::decoder::read_reading;
use crate::protocol::sync::synchronize;
use crate::reading::SensorReading;
use crate::rotation::RotationScheduler;
use crate::serial::port_trait::ByteSource;

/// Cooperative shutdown flag shared with the signal handler
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    /// Create a flag that is not yet triggered
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the pipeline to stop after the current reading
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pipeline lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Constructed, [`Pipeline::run`] not called yet
    Idle,
    /// Looking for the sync marker
    Syncing,
    /// Decoding and archiving readings
    Streaming,
    /// Swapping to a new archive
    Rotating,
    /// Shut down, archive closed
    Stopped,
}

/// Totals reported when the pipeline stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Readings written across all archives
    pub readings: u64,
    /// Archives opened, including the last one
    pub archives: u64,
}

/// Stream-to-archive pipeline
pub struct Pipeline<S, C> {
    source: S,
    clock: C,
    root: PathBuf,
    shutdown: Shutdown,
    echo: bool,
    state: PipelineState,
}

impl<S: ByteSource, C: Clock> Pipeline<S, C> {
    /// Create a pipeline writing archives under `root`
    pub fn new(source: S, clock: C, root: impl Into<PathBuf>, shutdown: Shutdown) -> Self {
        Self {
            source,
            clock,
            root: root.into(),
            shutdown,
            echo: false,
            state: PipelineState::Idle,
        }
    }

    /// Print every reading as a JSON line on stdout
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Current lifecycle state
    ///
    /// After `run` returns an error this is the state the error occurred in.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run until shutdown is requested or an error occurs
    ///
    /// # Returns
    ///
    /// * `Result<PipelineSummary>` - Totals, once the last archive is closed
    ///
    /// # Errors
    ///
    /// Sync, decode and archive errors are returned immediately; the open
    /// archive is then finalized on drop on a best-effort basis.
    pub async fn run(&mut self) -> Result<PipelineSummary> {
        self.transition(PipelineState::Syncing);
        synchronize(&mut self.source).await?;

        let started = self.clock.now();
        let mut archive = ArchiveWriter::create(&self.root, started)?;
        let mut scheduler = RotationScheduler::starting_at(started);
        let mut summary = PipelineSummary {
            readings: 0,
            archives: 1,
        };

        self.transition(PipelineState::Streaming);
        debug!("Next rotation at {}", scheduler.checkpoint());

        while !self.shutdown.is_triggered() {
            let reading = read_reading(&mut self.source, &self.clock).await?;
            archive.append(&reading)?;
            summary.readings += 1;

            if self.echo {
                echo_reading(&reading)?;
            }

            if scheduler.should_rotate(self.clock.now()) {
                self.transition(PipelineState::Rotating);

                let rows = archive.rows();
                let closed = archive.close()?;
                info!("Rotated {} ({} readings)", closed.display(), rows);

                scheduler.advance();
                archive = ArchiveWriter::create(&self.root, self.clock.now())?;
                summary.archives += 1;

                self.transition(PipelineState::Streaming);
                debug!("Next rotation at {}", scheduler.checkpoint());
            }
        }

        let rows = archive.rows();
        let closed = archive.close()?;
        info!("Closed {} ({} readings)", closed.display(), rows);
        self.transition(PipelineState::Stopped);

        Ok(summary)
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

fn echo_reading(reading: &SensorReading) -> Result<()> {
    println!("{}", serde_json::to_string(reading)?);
    Ok(())
}
