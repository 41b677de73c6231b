// Recording stand-ins for host handles, shared by the unit tests.

use crate::error::handle::HandleError;
use crate::handle::{HostBridge, ProviderEndpoint, ShellHandle};
use crate::pipe::PipeEndpoint;

use std::sync::{Arc, Mutex};

use url::Url;

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn calls(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub type Delivered = Arc<Mutex<Vec<(String, PipeEndpoint)>>>;

pub struct StubEndpoint {
    pub label: String,
    pub log: CallLog,
    pub delivered: Delivered,
    pub fail_close: bool,
}

impl StubEndpoint {
    pub fn new(label: &str, log: &CallLog) -> Self {
        Self {
            label: label.to_string(),
            log: Arc::clone(log),
            delivered: Arc::new(Mutex::new(Vec::new())),
            fail_close: false,
        }
    }
}

impl ProviderEndpoint for StubEndpoint {
    fn connect_to_service(
        &mut self,
        interface_name: &str,
        pipe: PipeEndpoint,
    ) -> Result<(), HandleError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}.connect:{}", self.label, interface_name));
        self.delivered
            .lock()
            .unwrap()
            .push((interface_name.to_string(), pipe));
        Ok(())
    }

    fn close(&mut self) -> Result<(), HandleError> {
        self.log.lock().unwrap().push(format!("{}.close", self.label));
        if self.fail_close {
            return Err(HandleError::transport(format!("{} refused to close", self.label)));
        }
        Ok(())
    }
}

pub struct StubShell {
    pub log: CallLog,
    pub fail_close: bool,
}

impl StubShell {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            fail_close: false,
        }
    }
}

impl ShellHandle for StubShell {
    fn connect_to_application(
        &mut self,
        url: &Url,
    ) -> Result<Box<dyn ProviderEndpoint>, HandleError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("shell.connect:{url}"));
        Ok(Box::new(StubEndpoint::new(url.as_str(), &self.log)))
    }

    fn close(&mut self) -> Result<(), HandleError> {
        self.log.lock().unwrap().push(String::from("shell.close"));
        if self.fail_close {
            return Err(HandleError::transport("shell refused to close"));
        }
        Ok(())
    }
}

pub struct StubBridge {
    pub log: CallLog,
}

impl HostBridge for StubBridge {
    fn quit(&mut self) -> Result<(), HandleError> {
        self.log.lock().unwrap().push(String::from("bridge.quit"));
        Ok(())
    }
}

pub fn url(text: &str) -> Url {
    Url::parse(text).unwrap()
}
