/*!
 * Handoff Queue Demo
 *
 * Runs the reference single-consumer shutdown scenario, then a
 * multi-producer / multi-consumer handoff sized from the environment.
 *
 * Environment variables:
 * - RUST_LOG, HANDOFF_TRACE_JSON: see `monitoring::init_tracing`
 * - HANDOFF_DEMO_ITEMS: items per producer (default: 8)
 * - HANDOFF_DEMO_PRODUCERS: producer threads (default: 2)
 * - HANDOFF_DEMO_CONSUMERS: consumer threads (default: 2)
 */

use handoff_queue::monitoring::{init_tracing, WorkerSpan};
use handoff_queue::{BlockingHandoffQueue, QueueConfig};
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

/// What the reference consumer records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observed {
    Value(u32),
    Exited,
}

#[derive(Debug)]
struct DemoConfig {
    items_per_producer: usize,
    producers: usize,
    consumers: usize,
    /// `items_per_producer * producers`, checked for overflow
    total_items: usize,
}

impl DemoConfig {
    fn from_env() -> Result<Self> {
        let items_per_producer = env_usize("HANDOFF_DEMO_ITEMS", 8)?;
        let producers = env_usize("HANDOFF_DEMO_PRODUCERS", 2)?;
        let consumers = env_usize("HANDOFF_DEMO_CONSUMERS", 2)?;
        Self::new(items_per_producer, producers, consumers)
    }

    fn new(items_per_producer: usize, producers: usize, consumers: usize) -> Result<Self> {
        let total_items = items_per_producer.checked_mul(producers).ok_or_else(|| {
            miette!(
                code = "demo::too_many_items",
                help = "Lower HANDOFF_DEMO_ITEMS or HANDOFF_DEMO_PRODUCERS.",
                "{} items for each of {} producers overflows usize",
                items_per_producer,
                producers
            )
        })?;

        Ok(Self {
            items_per_producer,
            producers,
            consumers,
            total_items,
        })
    }
}

fn env_usize(key: &str, default: usize) -> Result<usize> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .into_diagnostic()
            .wrap_err_with(|| format!("{} must be a non-negative integer, got {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

fn main() -> Result<()> {
    init_tracing();

    let config = DemoConfig::from_env()?;
    info!(?config, "Handoff demo starting");

    run_reference_scenario()?;
    run_fan_in_fan_out(&config)?;

    info!("Handoff demo finished");
    Ok(())
}

/// Block until `results` holds exactly `expected`
fn wait_for(results: &Mutex<Vec<Observed>>, expected: &[Observed]) -> Result<()> {
    for _ in 0..1000 {
        {
            let seen = results.lock();
            if seen.as_slice() == expected {
                return Ok(());
            }
            if seen.len() > expected.len() {
                return Err(miette!("consumer ran ahead: {:?}", *seen));
            }
        }
        thread::sleep(Duration::from_millis(1));
    }
    Err(miette!("timed out waiting for {:?}", expected))
}

/// One consumer, values 99 and 199, then close
fn run_reference_scenario() -> Result<()> {
    let queue = Arc::new(BlockingHandoffQueue::with_config(
        QueueConfig::default().with_name("reference"),
    ));
    let results = Arc::new(Mutex::new(Vec::new()));

    let consumer = {
        let queue = queue.clone();
        let results = results.clone();
        thread::Builder::new()
            .name("reference-consumer".into())
            .spawn(move || {
                for value in queue.iter() {
                    results.lock().push(Observed::Value(value));
                }
                results.lock().push(Observed::Exited);
            })
            .into_diagnostic()?
    };

    queue.append(99)?;
    wait_for(&results, &[Observed::Value(99)])?;
    info!(results = ?*results.lock(), "First handoff observed");

    queue.append(199)?;
    wait_for(&results, &[Observed::Value(99), Observed::Value(199)])?;
    info!(results = ?*results.lock(), "Second handoff observed");

    queue.close()?;
    wait_for(
        &results,
        &[Observed::Value(99), Observed::Value(199), Observed::Exited],
    )?;
    info!(results = ?*results.lock(), "Consumer exited after close");

    consumer
        .join()
        .map_err(|_| miette!("reference consumer panicked"))
}

/// Several producers, several consumers, every item delivered exactly once
fn run_fan_in_fan_out(config: &DemoConfig) -> Result<()> {
    let queue = Arc::new(BlockingHandoffQueue::with_config(
        QueueConfig::default()
            .with_name("fan-in-fan-out")
            .with_initial_capacity(config.total_items),
    ));

    let consumers: Vec<_> = (0..config.consumers)
        .map(|worker| {
            let queue = queue.clone();
            thread::Builder::new()
                .name(format!("consumer-{}", worker))
                .spawn(move || {
                    let mut span = WorkerSpan::new("consumer", worker);
                    let _entered = span.entered();
                    let mut received = Vec::new();
                    for item in queue.iter() {
                        span.record_item();
                        received.push(item);
                    }
                    received
                })
                .into_diagnostic()
        })
        .collect::<Result<_>>()?;

    let producers: Vec<_> = (0..config.producers)
        .map(|worker| {
            let queue = queue.clone();
            let items = config.items_per_producer;
            thread::Builder::new()
                .name(format!("producer-{}", worker))
                .spawn(move || {
                    let mut span = WorkerSpan::new("producer", worker);
                    let _entered = span.entered();
                    for seq in 0..items {
                        queue.append((worker, seq))?;
                        span.record_item();
                    }
                    Ok::<_, handoff_queue::QueueError>(())
                })
                .into_diagnostic()
        })
        .collect::<Result<_>>()?;

    for producer in producers {
        producer
            .join()
            .map_err(|_| miette!("producer panicked"))??;
    }
    queue.close()?;

    let mut delivered = Vec::new();
    for (worker, consumer) in consumers.into_iter().enumerate() {
        let received = consumer
            .join()
            .map_err(|_| miette!("consumer panicked"))?;
        info!(worker, count = received.len(), "Consumer drained");
        delivered.extend(received);
    }

    let expected = config.total_items;
    let total = delivered.len();
    delivered.sort_unstable();
    delivered.dedup();
    if total != expected || delivered.len() != expected {
        return Err(miette!(
            "expected {} distinct items, consumers saw {} ({} distinct)",
            expected,
            total,
            delivered.len()
        ));
    }

    let stats = queue.stats();
    info!(
        appended = stats.appended,
        received = stats.received,
        drained = stats.is_drained(),
        "Fan-in/fan-out complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_config_totals_items() {
        let config = DemoConfig::new(8, 3, 2).unwrap();
        assert_eq!(config.total_items, 24);
    }

    #[test]
    fn test_demo_config_rejects_overflowing_total() {
        let err = DemoConfig::new(usize::MAX, 2, 1).unwrap_err();
        assert!(err.to_string().contains("overflows usize"));
    }
}
