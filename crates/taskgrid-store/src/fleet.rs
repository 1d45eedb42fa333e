//! Worker read model: derived status, busy flag and fleet aggregates.
//!
//! Status is never sent by the backend. It is recomputed from the heartbeat on
//! every fetch against the injected clock.

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskgrid_api_models::WorkerStatusDto;

use crate::format::parse_timestamp;
use crate::resources::ResourceSample;

/// Heartbeat age at which a worker counts as offline.
pub const HEARTBEAT_TIMEOUT_MS: i64 = 30_000;

/// Usage percentage above which a worker is busy.
pub const BUSY_THRESHOLD_PERCENT: f64 = 80.0;

/// Derived liveness of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Heartbeat younger than the timeout.
    Online,
    /// Heartbeat stale, missing or unparseable.
    Offline,
}

impl WorkerStatus {
    /// Stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }

    /// Status for a heartbeat observed at `now`.
    ///
    /// A heartbeat ahead of `now` (clock skew) counts as online.
    #[must_use]
    pub fn from_heartbeat(heartbeat: &str, now: DateTime<Utc>) -> Self {
        match parse_timestamp(heartbeat) {
            Some(seen) if (now - seen).num_milliseconds() < HEARTBEAT_TIMEOUT_MS => Self::Online,
            _ => Self::Offline,
        }
    }
}

/// Whether usage marks a worker busy.
#[must_use]
pub fn is_busy(cpu_usage_percent: f64, memory_usage_percent: f64) -> bool {
    cpu_usage_percent > BUSY_THRESHOLD_PERCENT || memory_usage_percent > BUSY_THRESHOLD_PERCENT
}

/// Worker with derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Worker {
    /// Worker identifier.
    pub worker_id: String,
    /// Owning organisation.
    pub client_id: String,
    /// CPU core count.
    pub cpu_cores: u32,
    /// CPU frequency in GHz.
    pub cpu_frequency_ghz: f64,
    /// Memory capacity in GB.
    pub memory_gb: f64,
    /// VRAM capacity in GB.
    pub vram_gb: f64,
    /// CPU usage percentage.
    pub cpu_usage_percent: f64,
    /// Memory usage percentage.
    pub memory_usage_percent: f64,
    /// VRAM usage percentage.
    pub vram_usage_percent: f64,
    /// Raw heartbeat timestamp.
    pub last_heartbeat: String,
    /// Derived liveness.
    pub status: WorkerStatus,
    /// Derived load flag.
    pub busy: bool,
}

impl Worker {
    /// Derive status and busy flag from a wire record.
    #[must_use]
    pub fn from_dto(dto: WorkerStatusDto, now: DateTime<Utc>) -> Self {
        let status = WorkerStatus::from_heartbeat(&dto.last_heartbeat, now);
        let busy = is_busy(dto.cpu_usage_percent, dto.memory_usage_percent);
        Self {
            worker_id: dto.worker_id,
            client_id: dto.client_id,
            cpu_cores: dto.cpu_cores,
            cpu_frequency_ghz: dto.cpu_frequency_ghz,
            memory_gb: dto.memory_gb,
            vram_gb: dto.vram_gb,
            cpu_usage_percent: dto.cpu_usage_percent,
            memory_usage_percent: dto.memory_usage_percent,
            vram_usage_percent: dto.vram_usage_percent,
            last_heartbeat: dto.last_heartbeat,
            status,
            busy,
        }
    }

    /// Online and not busy.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == WorkerStatus::Online && !self.busy
    }

    /// Usage sample stamped `timestamp`.
    #[must_use]
    pub fn sample(&self, timestamp: DateTime<Utc>) -> ResourceSample {
        ResourceSample::new(
            timestamp,
            self.cpu_usage_percent,
            self.memory_usage_percent,
            self.vram_usage_percent,
        )
    }
}

/// Online and available totals over one worker list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkerCounts {
    /// Workers with a fresh heartbeat.
    pub online: usize,
    /// Online workers that are not busy.
    pub available: usize,
}

/// Count online and available workers.
#[must_use]
pub fn worker_counts(workers: &[Worker]) -> WorkerCounts {
    WorkerCounts {
        online: workers
            .iter()
            .filter(|worker| worker.status == WorkerStatus::Online)
            .count(),
        available: workers.iter().filter(|worker| worker.is_available()).count(),
    }
}

/// Mean usage over every worker, `None` for an empty fleet.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fleet_average(workers: &[Worker], timestamp: DateTime<Utc>) -> Option<ResourceSample> {
    if workers.is_empty() {
        return None;
    }
    let total = workers.len() as f64;
    let (cpu, memory, vram) = workers.iter().fold((0.0, 0.0, 0.0), |acc, worker| {
        (
            acc.0 + worker.cpu_usage_percent,
            acc.1 + worker.memory_usage_percent,
            acc.2 + worker.vram_usage_percent,
        )
    });
    Some(ResourceSample::new(
        timestamp,
        cpu / total,
        memory / total,
        vram / total,
    ))
}

/// Worker with `worker_id`, if listed.
#[must_use]
pub fn find_worker<'a>(workers: &'a [Worker], worker_id: &str) -> Option<&'a Worker> {
    workers.iter().find(|worker| worker.worker_id == worker_id)
}
