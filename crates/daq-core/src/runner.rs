//! The emission loop.
//!
//! [`Injector`] drives the state machine
//!
//! ```text
//! INIT --> READY --> EMIT --> WAIT --+
//!                     ^              |
//!                     +--------------+
//! ```
//!
//! Exactly one EMIT is in flight at a time. Each EMIT runs upload, presign,
//! data publish, ledger append, and info publish in that order; the steps
//! are not atomic, so a failure part-way leaves the earlier effects in
//! place. Any error ends the loop.

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use daq_dataset::{DatasetCache, SourceCatalog};
use daq_db::TruthLedger;
use daq_imaging::ImagePipeline;
use daq_types::{Category, DataMessage, EventDescriptor, TruthRecord};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom as _;
use rand::{Rng as _, SeedableRng};
use tracing::{debug, info};

use crate::clock::SimulationClock;
use crate::collaborators::{MessageBus, ObjectStore};
use crate::config::InjectorConfig;
use crate::error::InjectorError;
use crate::sampler::EventSampler;

/// MIME type of rendered events.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Status line published once the injector is ready to emit.
pub const READY_MESSAGE: &str = "DAQ injector ready.";

/// Position in the emission state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Connecting collaborators and preparing the dataset.
    Init,
    /// Bucket and dataset available; no event emitted yet.
    Ready,
    /// Rendering and publishing an event.
    Emit,
    /// Sleeping until the next event.
    Wait,
}

impl LoopState {
    /// Whether the loop may move from `self` to `next`.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Ready)
                | (Self::Ready | Self::Wait, Self::Emit)
                | (Self::Emit, Self::Wait)
        )
    }
}

/// Outcome of one EMIT.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Wall-clock time recorded in the descriptor and the ledger.
    pub timestamp: DateTime<Utc>,
    /// Hours since the simulation epoch at emission.
    pub elapsed_hours: f64,
    /// Signal probability in effect.
    pub signal_probability: f64,
    /// Drawn category.
    pub category: Category,
    /// Source image the event was rendered from.
    pub source_path: PathBuf,
    /// Object name in the store.
    pub object_name: String,
    /// Presigned retrieval URL published on the data topic.
    pub url: String,
}

/// Destinations taken from configuration.
#[derive(Debug, Clone)]
struct Targets {
    bucket: String,
    data_topic: String,
    info_topic: String,
    presign_ttl: Duration,
}

/// The DAQ injector: owns the collaborators and runs the emission loop.
pub struct Injector<B, S> {
    bus: B,
    store: S,
    ledger: TruthLedger,
    targets: Targets,
    clock: SimulationClock,
    sampler: EventSampler,
    pipeline: Arc<ImagePipeline>,
    catalog: Option<SourceCatalog>,
    state: LoopState,
    rng: StdRng,
    emitted: u64,
}

impl<B: MessageBus, S: ObjectStore> Injector<B, S> {
    /// Assemble an injector from configuration and connected collaborators.
    ///
    /// The random source is seeded from the operating system; use
    /// [`Injector::with_rng`] for reproducible runs.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError`] if the sampling or imaging parameters are
    /// invalid.
    pub fn new(
        config: &InjectorConfig,
        bus: B,
        store: S,
        ledger: TruthLedger,
    ) -> Result<Self, InjectorError> {
        let sampler = EventSampler::new(&config.sampling)?;
        let pipeline = ImagePipeline::new(&config.imaging)?;
        Ok(Self {
            bus,
            store,
            ledger,
            targets: Targets {
                bucket: config.object_store.bucket.clone(),
                data_topic: config.message_bus.data_topic.clone(),
                info_topic: config.message_bus.info_topic.clone(),
                presign_ttl: config.object_store.presign_ttl(),
            },
            clock: SimulationClock::new(config.sampling.epoch),
            sampler,
            pipeline: Arc::new(pipeline),
            catalog: None,
            state: LoopState::Init,
            rng: StdRng::from_os_rng(),
            emitted: 0,
        })
    }

    /// Replace the random source driving category, image, noise, and delay
    /// draws.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Current state.
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Number of completed emissions.
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// The message bus.
    pub const fn bus(&self) -> &B {
        &self.bus
    }

    /// The object store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The dataset catalog, once INIT has completed.
    pub const fn catalog(&self) -> Option<&SourceCatalog> {
        self.catalog.as_ref()
    }

    /// INIT: ensure the bucket exists, make the dataset available, and
    /// announce readiness.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError`] if called twice, if the store or bus fail,
    /// or if the dataset cannot be made available.
    pub async fn init(&mut self, dataset: &DatasetCache) -> Result<(), InjectorError> {
        self.check_transition(LoopState::Ready)?;

        let bucket = self.targets.bucket.clone();
        if self.store.bucket_exists(&bucket).await? {
            debug!(bucket = %bucket, "Target bucket already present");
        } else {
            info!(bucket = %bucket, "Creating target bucket");
            self.store.create_bucket(&bucket).await?;
        }
        self.info(&format!("Target bucket {bucket} exists.")).await?;

        let catalog = dataset.ensure().await?;
        self.info(&format!(
            "Local dataset is now available: {} signal and {} background images.",
            catalog.images(Category::Signal).len(),
            catalog.images(Category::Background).len(),
        ))
        .await?;
        self.catalog = Some(catalog);

        self.transition(LoopState::Ready)?;
        self.info(READY_MESSAGE).await
    }

    /// EMIT: render, store, announce, and record one event.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError`] if called before INIT or twice without an
    /// intervening wait, or if any step fails. Steps completed before the
    /// failure are not rolled back.
    pub async fn emit(&mut self) -> Result<Emission, InjectorError> {
        self.transition(LoopState::Emit)?;
        let catalog = self.catalog.as_ref().ok_or(InjectorError::InvalidTransition {
            from: LoopState::Init,
            to: LoopState::Emit,
        })?;

        let elapsed_hours = self.clock.elapsed_hours();
        let signal_probability = self.sampler.signal_probability(elapsed_hours);
        let category = EventSampler::draw_category(signal_probability, &mut self.rng);
        let source_path = catalog
            .images(category)
            .choose(&mut self.rng)
            .cloned()
            .ok_or(InjectorError::EmptyCategory { category })?;

        let seed: u64 = self.rng.random();
        let pipeline = Arc::clone(&self.pipeline);
        let path = source_path.clone();
        let rendered = tokio::task::spawn_blocking(move || {
            pipeline.render(&path, &mut StdRng::seed_from_u64(seed))
        })
        .await
        .map_err(|e| InjectorError::Task(e.to_string()))??;
        let object_name = rendered.object_name;

        let targets = &self.targets;
        self.store
            .put(
                &targets.bucket,
                &object_name,
                &rendered.payload,
                JPEG_CONTENT_TYPE,
            )
            .await?;
        let url = self
            .store
            .presigned_get(&targets.bucket, &object_name, targets.presign_ttl)
            .await?;

        let timestamp = Utc::now();
        let message = DataMessage::current(EventDescriptor {
            url: url.clone(),
            time: timestamp.to_rfc3339(),
            filename: object_name.clone(),
        });
        self.bus
            .publish(&targets.data_topic, message.to_payload()?)
            .await?;

        self.ledger
            .record(&TruthRecord {
                timestamp,
                source_path: source_path.clone(),
                object_name: object_name.clone(),
                is_signal: category.is_signal(),
            })
            .await?;

        self.emitted = self.emitted.saturating_add(1);
        info!(
            event = self.emitted,
            object = %object_name,
            category = %category,
            p_signal = signal_probability,
            bytes = rendered.payload.len(),
            "Event emitted"
        );
        self.info(&format!(
            "Event {object_name} uploaded to {} and submitted to '{}'",
            self.targets.bucket, self.targets.data_topic
        ))
        .await?;

        Ok(Emission {
            timestamp,
            elapsed_hours,
            signal_probability,
            category,
            source_path,
            object_name,
            url,
        })
    }

    /// EMIT to WAIT: draw the delay until the next event and announce when
    /// it is due.
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError`] if called outside EMIT, if the delay is not
    /// representable, or if the announcement fails.
    pub async fn schedule_next(&mut self) -> Result<Duration, InjectorError> {
        self.transition(LoopState::Wait)?;
        let delay = self.sampler.draw_delay(&mut self.rng)?;
        let due = TimeDelta::from_std(delay)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        match due {
            Some(due) => self.info(&format!("Next event at {}", due.to_rfc3339())).await?,
            None => self.info("Next event at an unrepresentable time").await?,
        }
        Ok(delay)
    }

    /// Run INIT and then emit forever.
    ///
    /// Returns only on failure; the error is the first one encountered.
    ///
    /// # Errors
    ///
    /// Returns the [`InjectorError`] that terminated the loop.
    pub async fn run(mut self, dataset: &DatasetCache) -> Result<Infallible, InjectorError> {
        self.init(dataset).await?;
        loop {
            self.emit().await?;
            let delay = self.schedule_next().await?;
            debug!(delay_ms = delay.as_millis(), "Waiting for next event");
            tokio::time::sleep(delay).await;
        }
    }

    /// Publish a status line on the info topic and log it.
    async fn info(&self, line: &str) -> Result<(), InjectorError> {
        info!(topic = %self.targets.info_topic, "{line}");
        self.bus
            .publish(&self.targets.info_topic, line.as_bytes().to_vec())
            .await?;
        Ok(())
    }

    fn check_transition(&self, next: LoopState) -> Result<(), InjectorError> {
        if self.state.can_transition_to(next) {
            Ok(())
        } else {
            Err(InjectorError::InvalidTransition {
                from: self.state,
                to: next,
            })
        }
    }

    fn transition(&mut self, next: LoopState) -> Result<(), InjectorError> {
        self.check_transition(next)?;
        debug!(from = ?self.state, to = ?next, "State transition");
        self.state = next;
        Ok(())
    }
}
