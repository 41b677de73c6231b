//! Test helpers for application lifecycle integration tests.
//!
//! This module provides:
//! - Recording stand-ins for every host handle (shell, endpoint, bridge)
//! - A shared call log to assert on the order of host calls
//! - A recording delegate that observes hook invocations

use app_core::error::HandleError;
use app_core::pipe::PipeEndpoint;
use app_core::{
    AppContext, Application, ApplicationDelegate, HostBridge, ProviderEndpoint, ProviderId,
    ServiceProvider, ShellHandle,
};

use std::sync::{Arc, Mutex};

use url::Url;

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().expect("call log poisoned").clone()
}

fn record(log: &CallLog, entry: String) {
    log.lock().expect("call log poisoned").push(entry);
}

pub fn url(text: &str) -> Url {
    Url::parse(text).expect("test URL should parse")
}

/// Raw provider handle that records every call under its label.
pub struct StubEndpoint {
    label: String,
    log: CallLog,
    fail_close: bool,
}

impl StubEndpoint {
    pub fn new(label: &str, log: &CallLog) -> Self {
        Self {
            label: label.to_string(),
            log: Arc::clone(log),
            fail_close: false,
        }
    }

    pub fn failing(label: &str, log: &CallLog) -> Self {
        Self {
            fail_close: true,
            ..Self::new(label, log)
        }
    }

    pub fn boxed(label: &str, log: &CallLog) -> Box<dyn ProviderEndpoint> {
        Box::new(Self::new(label, log))
    }
}

impl ProviderEndpoint for StubEndpoint {
    fn connect_to_service(
        &mut self,
        interface_name: &str,
        _pipe: PipeEndpoint,
    ) -> Result<(), HandleError> {
        record(&self.log, format!("{}.connect:{}", self.label, interface_name));
        Ok(())
    }

    fn close(&mut self) -> Result<(), HandleError> {
        record(&self.log, format!("{}.close", self.label));
        if self.fail_close {
            return Err(HandleError::transport(format!(
                "{} refused to close",
                self.label
            )));
        }
        Ok(())
    }
}

pub struct StubShell {
    log: CallLog,
    fail_close: bool,
}

impl StubShell {
    pub fn boxed(log: &CallLog) -> Box<dyn ShellHandle> {
        Box::new(Self {
            log: Arc::clone(log),
            fail_close: false,
        })
    }

    pub fn failing(log: &CallLog) -> Box<dyn ShellHandle> {
        Box::new(Self {
            log: Arc::clone(log),
            fail_close: true,
        })
    }
}

impl ShellHandle for StubShell {
    fn connect_to_application(
        &mut self,
        url: &Url,
    ) -> Result<Box<dyn ProviderEndpoint>, HandleError> {
        record(&self.log, format!("shell.connect:{url}"));
        Ok(StubEndpoint::boxed(url.as_str(), &self.log))
    }

    fn close(&mut self) -> Result<(), HandleError> {
        record(&self.log, String::from("shell.close"));
        if self.fail_close {
            return Err(HandleError::transport("shell refused to close"));
        }
        Ok(())
    }
}

pub struct StubBridge {
    log: CallLog,
}

impl StubBridge {
    pub fn boxed(log: &CallLog) -> Box<dyn HostBridge> {
        Box::new(Self {
            log: Arc::clone(log),
        })
    }
}

impl HostBridge for StubBridge {
    fn quit(&mut self) -> Result<(), HandleError> {
        record(&self.log, String::from("bridge.quit"));
        Ok(())
    }
}

/// What the recording delegate observed.
#[derive(Debug, Default)]
pub struct DelegateRecord {
    pub initialized_with: Vec<Vec<String>>,
    pub accepted: Vec<(String, ProviderId)>,
}

/// Delegate that records hook calls and can be told to react to them.
#[derive(Default)]
pub struct RecordingDelegate {
    pub record: Arc<Mutex<DelegateRecord>>,
    /// Request quit from the accept hook once this many connections arrived.
    pub quit_after: Option<usize>,
    /// Provide this service on every accepted connection.
    pub provide: Option<(&'static str, Arc<Mutex<Vec<PipeEndpoint>>>)>,
    /// Request this service from every accepted connection.
    pub request_from_peer: Option<&'static str>,
}

impl RecordingDelegate {
    pub fn accepted(&self) -> Vec<(String, ProviderId)> {
        self.record.lock().expect("record poisoned").accepted.clone()
    }
}

impl ApplicationDelegate for RecordingDelegate {
    fn initialize(&mut self, _ctx: &mut AppContext<'_>, args: &[String]) {
        self.record
            .lock()
            .expect("record poisoned")
            .initialized_with
            .push(args.to_vec());
    }

    fn accept_connection(
        &mut self,
        ctx: &mut AppContext<'_>,
        url: &Url,
        provider: &mut ServiceProvider,
    ) {
        let accepted = {
            let mut record = self.record.lock().expect("record poisoned");
            record.accepted.push((url.to_string(), provider.id()));
            record.accepted.len()
        };

        if let Some((name, sink)) = &self.provide {
            let sink = Arc::clone(sink);
            provider
                .provide_service(*name, move |pipe: PipeEndpoint| {
                    sink.lock().expect("sink poisoned").push(pipe)
                })
                .expect("provider should be open");
        }

        if let Some(name) = self.request_from_peer {
            provider
                .request_service(name)
                .expect("provider should be open");
        }

        if self.quit_after.is_some_and(|limit| accepted >= limit) {
            ctx.request_quit();
        }
    }
}

/// Delegate that keeps both default hooks.
pub struct NoopDelegate;

impl ApplicationDelegate for NoopDelegate {}

pub fn application<D: ApplicationDelegate>(log: &CallLog, delegate: D) -> Application<D> {
    Application::new(
        StubShell::boxed(log),
        StubBridge::boxed(log),
        url("app:test"),
        delegate,
    )
}
