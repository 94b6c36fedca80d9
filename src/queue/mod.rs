//! Task submission for package jobs.
//!
//! This module handles:
//! - The [`TaskQueue`] seam the web layer submits work through
//! - An in-process queue that runs jobs as they are submitted
//! - Per-task state tracking

use crate::config::Settings;
use crate::error::Result;
use crate::job::{JobReport, PackageJob, run_job};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// Identifier handed back when a job is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Where a submitted job is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
	/// Accepted, not finished yet.
	Waiting,
	Succeeded(JobReport),
	/// Finished with an error; holds the rendered error chain.
	Failed(String),
}

impl TaskState {
	/// Short lowercase name, e.g. for a status endpoint.
	pub fn as_str(&self) -> &'static str {
		match self {
			TaskState::Waiting => "waiting",
			TaskState::Succeeded(_) => "succeeded",
			TaskState::Failed(_) => "failed",
		}
	}
}

/// Interface for handing package jobs to a background worker.
pub trait TaskQueue {
	/// Accept a job. Fails only if the job itself is invalid; failures while
	/// running are reported through [`TaskQueue::state`].
	fn submit(&self, job: PackageJob) -> Result<TaskId>;

	/// Current state of a task, or `None` for an unknown id.
	fn state(&self, id: TaskId) -> Option<TaskState>;

	/// Drop a task's record and return its last state. Later lookups of `id`
	/// return `None`.
	fn forget(&self, id: TaskId) -> Option<TaskState>;
}

/// A [`TaskQueue`] that runs each job on the submitting thread.
///
/// Task states are kept until [`TaskQueue::forget`] is called for them.
/// A long-lived queue must forget tasks once their result has been read.
#[derive(Debug)]
pub struct InlineQueue {
	settings: Settings,
	next_id: AtomicU64,
	states: Mutex<HashMap<TaskId, TaskState>>,
}

impl InlineQueue {
	pub fn new(settings: Settings) -> Self {
		InlineQueue {
			settings,
			next_id: AtomicU64::new(1),
			states: Mutex::new(HashMap::new()),
		}
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	fn record(&self, id: TaskId, state: TaskState) {
		// A poisoned table only means another submitter panicked mid-insert.
		let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
		states.insert(id, state);
	}
}

impl TaskQueue for InlineQueue {
	fn submit(&self, job: PackageJob) -> Result<TaskId> {
		job.validate()?;

		let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.record(id, TaskState::Waiting);
		info!(task = %id, archive = %job.archive.display(), "task accepted");

		let state = match run_job(&job, &self.settings) {
			Ok(report) => TaskState::Succeeded(report),
			Err(err) => {
				let message = render_error_chain(&err);
				warn!(task = %id, error = %message, "task failed");
				TaskState::Failed(message)
			}
		};
		self.record(id, state);

		Ok(id)
	}

	fn state(&self, id: TaskId) -> Option<TaskState> {
		let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
		states.get(&id).cloned()
	}

	fn forget(&self, id: TaskId) -> Option<TaskState> {
		let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
		states.remove(&id)
	}
}

/// Join an error and its sources into one line.
fn render_error_chain(err: &dyn std::error::Error) -> String {
	let mut message = err.to_string();
	let mut source = err.source();
	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());
		source = cause.source();
	}
	message
}
