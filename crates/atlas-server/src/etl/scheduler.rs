//! Refresh scheduler
//!
//! Runs the ETL pipeline on a cron schedule through an apalis worker, and
//! exposes the on-demand trigger used by the API. Overlapping runs are not
//! mutually excluded: a scheduled run and an on-demand run may race, with
//! last-committer-wins semantics on the table set.

use apalis::prelude::*;
use apalis_cron::{CronStream, Tick};
use cron::Schedule;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::pipeline::EtlPipeline;
use crate::config::DEFAULT_REFRESH_CRON;

/// Recurring refresh scheduler
pub struct EtlScheduler {
    pipeline: Arc<EtlPipeline>,
    cron_expression: String,
}

impl EtlScheduler {
    pub fn new(pipeline: Arc<EtlPipeline>, cron_expression: impl Into<String>) -> Self {
        Self {
            pipeline,
            cron_expression: cron_expression.into(),
        }
    }

    /// Start the recurring schedule in a background task
    ///
    /// An invalid cron expression falls back to the default daily-at-
    /// midnight schedule rather than failing startup.
    pub fn start(self) -> JoinHandle<()> {
        let schedule = parse_schedule(&self.cron_expression);
        info!(
            expression = %self.cron_expression,
            "Starting ETL scheduler"
        );

        let pipeline = self.pipeline;

        tokio::spawn(async move {
            info!("ETL schedule worker started");
            if let Err(e) = Monitor::new()
                .register(move |_index| {
                    WorkerBuilder::new("atlas-etl-worker")
                        .backend(CronStream::new(schedule.clone()))
                        .data(pipeline.clone())
                        .build(run_scheduled_refresh)
                })
                .run()
                .await
            {
                error!("ETL schedule worker error: {:?}", e);
            }
            info!("ETL schedule worker stopped");
        })
    }
}

/// One tick of the recurring refresh schedule
#[derive(Debug, Clone)]
pub struct RefreshTick(DateTime<Utc>);

impl From<DateTime<Utc>> for RefreshTick {
    fn from(fired_at: DateTime<Utc>) -> Self {
        Self(fired_at)
    }
}

/// Process one schedule tick
///
/// Scheduled failures are logged and swallowed; the schedule keeps firing.
async fn run_scheduled_refresh(
    tick: Tick,
    pipeline: Data<Arc<EtlPipeline>>,
) -> anyhow::Result<()> {
    let tick = RefreshTick::from(*tick.get_timestamp());
    info!(fired_at = %tick.0, "Running scheduled ETL refresh");
    trigger_now(&pipeline).await;
    Ok(())
}

/// Run the pipeline once, reporting success as a boolean
///
/// Used by the on-demand API trigger. Errors are logged here and never
/// propagated to the caller.
pub async fn trigger_now(pipeline: &EtlPipeline) -> bool {
    info!("Running on-demand ETL refresh");

    match pipeline.run().await {
        Ok(stats) => {
            info!(countries = stats.countries, "On-demand ETL refresh succeeded");
            true
        },
        Err(err) => {
            error!(error = %err, "On-demand ETL refresh failed");
            false
        },
    }
}

/// Parse a cron expression, falling back to the default schedule
///
/// The `cron` crate expects a seconds field, so five-field expressions are
/// normalized by prepending `0`.
fn parse_schedule(expression: &str) -> Schedule {
    match Schedule::from_str(&normalize_cron(expression)) {
        Ok(schedule) => schedule,
        Err(e) => {
            error!(
                expression,
                error = %e,
                fallback = DEFAULT_REFRESH_CRON,
                "Invalid cron expression, using default schedule"
            );
            Schedule::from_str(&normalize_cron(DEFAULT_REFRESH_CRON))
                .expect("default cron expression is valid")
        },
    }
}

fn normalize_cron(expression: &str) -> String {
    let expression = expression.trim();
    if expression.split_whitespace().count() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    }
}
