//! The chef action generation driver.
//!
//! ## Metrics
//!
//! `actions_generated`: Total number of actions built
//! `actions_submitted`: Actions queued for transmission
//! `actions_failed`: Actions that could not be queued
//!
//! The driver is sequential; the dispatch channel it feeds is the only
//! concurrency boundary between it and the transmission worker.

use metrics::counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use chef_load_payload::{ActionEvent, ChefAction, Generator as _};

use crate::config::Config;

/// Errors produced by [`ChefActions`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// See [`chef_load_payload::Error`] for details.
    #[error("Payload error: {0}")]
    Payload(#[from] chef_load_payload::Error),
}

/// Outcome of a generation run. Per-event queueing failures are counted
/// here, not raised; only setup problems abort a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// Events built
    pub generated: u64,
    /// Events handed to the dispatch channel
    pub submitted: u64,
    /// Events the dispatch channel refused
    pub failed: u64,
}

/// The chef actions generator.
///
/// Builds the requested number of events and submits each to the dispatch
/// channel, blocking on a full channel so that generation rate is coupled to
/// transmission throughput.
#[derive(Debug)]
pub struct ChefActions {
    action: ChefAction,
    num_actions: u32,
    snd: mpsc::Sender<ActionEvent>,
}

impl ChefActions {
    /// Create a new [`ChefActions`] instance.
    ///
    /// # Errors
    ///
    /// Creation will fail if any configured candidate fact list is empty.
    pub fn new(config: &Config, snd: mpsc::Sender<ActionEvent>) -> Result<Self, Error> {
        let action = ChefAction::new(&config.facts, config.random_data)?;
        Ok(Self {
            action,
            num_actions: config.num_actions,
            snd,
        })
    }

    /// Run the generation loop to completion.
    ///
    /// # Errors
    ///
    /// Function will return an error if event construction fails; a failure
    /// to queue an individual event is counted in the [`Summary`] and the
    /// run continues.
    pub async fn spin<R>(self, rng: &mut R) -> Result<Summary, Error>
    where
        R: rand::Rng + ?Sized,
    {
        info!(actions = self.num_actions, "generating chef actions");

        let mut summary = Summary::default();
        for _ in 0..self.num_actions {
            let event = self.action.generate(rng)?;
            summary.generated += 1;
            counter!("actions_generated").increment(1);
            debug!(action = %event, "generated");

            match self.snd.send(event).await {
                Ok(()) => {
                    summary.submitted += 1;
                    counter!("actions_submitted").increment(1);
                }
                Err(err) => {
                    warn!("failed to queue action: {err}");
                    summary.failed += 1;
                    counter!("actions_failed").increment(1);
                }
            }
        }

        info!(
            generated = summary.generated,
            submitted = summary.submitted,
            failed = summary.failed,
            "generation complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::SmallRng};
    use tokio::sync::mpsc;

    use super::{ChefActions, Summary};
    use crate::config::Config;

    fn config(num_actions: u32) -> Config {
        Config {
            num_actions,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn zero_count_queues_nothing() {
        let (snd, mut rcv) = mpsc::channel(1);
        let mut rng = SmallRng::seed_from_u64(0);

        let driver = ChefActions::new(&config(0), snd).expect("default facts must validate");
        let summary = driver.spin(&mut rng).await.expect("run must succeed");

        assert_eq!(summary, Summary::default());
        assert!(rcv.recv().await.is_none());
    }

    #[tokio::test]
    async fn requested_count_arrives_with_distinct_identities() {
        let (snd, mut rcv) = mpsc::channel(4);
        let mut rng = SmallRng::seed_from_u64(17);

        let collector = tokio::spawn(async move {
            let mut events = Vec::new();
            while let Some(event) = rcv.recv().await {
                events.push(event);
            }
            events
        });

        let driver = ChefActions::new(&config(50), snd).expect("default facts must validate");
        let summary = driver.spin(&mut rng).await.expect("run must succeed");
        let events = collector.await.expect("collector must not panic");

        assert_eq!(summary.generated, 50);
        assert_eq!(summary.submitted, 50);
        assert_eq!(summary.failed, 0);
        assert_eq!(events.len(), 50);

        let ids: HashSet<_> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn closed_channel_is_counted_not_fatal() {
        let (snd, rcv) = mpsc::channel(1);
        drop(rcv);
        let mut rng = SmallRng::seed_from_u64(3);

        let driver = ChefActions::new(&config(5), snd).expect("default facts must validate");
        let summary = driver.spin(&mut rng).await.expect("run must still succeed");

        assert_eq!(summary.generated, 5);
        assert_eq!(summary.submitted, 0);
        assert_eq!(summary.failed, 5);
    }

    #[tokio::test]
    async fn empty_fact_list_fails_before_generation() {
        let (snd, mut rcv) = mpsc::channel(1);
        let mut config = config(10);
        config.facts.organizations.clear();

        assert!(ChefActions::new(&config, snd).is_err());
        assert!(rcv.recv().await.is_none());
    }
}
