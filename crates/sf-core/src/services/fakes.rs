//! In-memory stand-ins for external tools, used by unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{FleetError, Result};
use crate::models::{ProcessDescriptor, ProcessInfo, ProcessState};

use super::command::{CommandOutput, CommandRunner, CommandSpec};
use super::supervisor::Supervisor;

/// Records every command and answers with canned outputs. Commands with no
/// matching response succeed with empty output.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<CommandSpec>>,
    responses: Mutex<Vec<(String, CommandOutput)>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any command whose display form contains `pattern`.
    pub fn respond(&self, pattern: &str, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap()
            .push((pattern.to_string(), output));
    }

    pub fn clear_responses(&self) {
        self.responses.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn displays(&self) -> Vec<String> {
        self.calls().iter().map(CommandSpec::display).collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.displays().iter().filter(|d| d.contains(pattern)).count()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        let display = spec.display();
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .iter()
            .find(|(pattern, _)| display.contains(pattern.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(CommandOutput::ok))
    }
}

/// A process table kept in memory.
#[derive(Default)]
pub struct MemorySupervisor {
    processes: Mutex<BTreeMap<String, ProcessState>>,
    actions: Mutex<Vec<String>>,
    unreachable: AtomicBool,
}

impl MemorySupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_process(self, name: &str, state: ProcessState) -> Self {
        self.processes
            .lock()
            .unwrap()
            .insert(name.to_string(), state);
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn state(&self, name: &str) -> Option<ProcessState> {
        self.processes.lock().unwrap().get(name).copied()
    }

    pub fn names(&self) -> Vec<String> {
        self.processes.lock().unwrap().keys().cloned().collect()
    }

    /// Every call so far, as `"<action> <name>"`.
    pub fn actions(&self) -> Vec<String> {
        self.actions.lock().unwrap().clone()
    }

    fn record(&self, action: &str, name: &str) {
        self.actions
            .lock()
            .unwrap()
            .push(format!("{action} {name}"));
    }
}

#[async_trait]
impl Supervisor for MemorySupervisor {
    async fn start(&self, descriptor: &ProcessDescriptor) -> Result<()> {
        self.record("start", &descriptor.name);
        self.processes
            .lock()
            .unwrap()
            .insert(descriptor.name.clone(), ProcessState::Online);
        Ok(())
    }

    async fn reload(&self, name: &str) -> Result<()> {
        self.record("reload", name);
        let mut processes = self.processes.lock().unwrap();
        match processes.get_mut(name) {
            Some(state) => {
                *state = ProcessState::Online;
                Ok(())
            }
            None => Err(FleetError::Supervisor(format!("process {name} not found"))),
        }
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.record("stop", name);
        if let Some(state) = self.processes.lock().unwrap().get_mut(name) {
            *state = ProcessState::Stopped;
        }
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<()> {
        self.record("remove", name);
        self.processes.lock().unwrap().remove(name);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProcessInfo>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(FleetError::Supervisor("pm2 unreachable".into()));
        }
        Ok(self
            .processes
            .lock()
            .unwrap()
            .iter()
            .map(|(name, status)| ProcessInfo {
                name: name.clone(),
                status: *status,
            })
            .collect())
    }
}
