use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, Stdio};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::browser::driver::{is_same_origin, FireOutcome, PageDriver};
use crate::browser::error::DriverError;
use crate::model::snapshot::{assemble, RawElement, Snapshot};
use crate::model::state::{ContextEntry, TriggerRecord};

/// Request sent to the driver script over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BrowserRequest {
    Navigate {
        cmd: &'static str,
        url: String,
    },
    Snapshot {
        cmd: &'static str,
    },
    Fire {
        cmd: &'static str,
        trigger: TriggerRecord,
    },
    Reload {
        cmd: &'static str,
    },
    CurrentUrl {
        cmd: &'static str,
    },
    ResolvePath {
        cmd: &'static str,
        selector: String,
        event: String,
        handler: String,
    },
    Quit {
        cmd: &'static str,
    },
}

impl BrowserRequest {
    pub fn navigate(url: &str) -> Self {
        BrowserRequest::Navigate {
            cmd: "navigate",
            url: url.to_string(),
        }
    }

    pub fn snapshot() -> Self {
        BrowserRequest::Snapshot { cmd: "snapshot" }
    }

    pub fn fire(trigger: &TriggerRecord) -> Self {
        BrowserRequest::Fire {
            cmd: "fire",
            trigger: trigger.clone(),
        }
    }

    pub fn reload() -> Self {
        BrowserRequest::Reload { cmd: "reload" }
    }

    pub fn current_url() -> Self {
        BrowserRequest::CurrentUrl { cmd: "current_url" }
    }

    pub fn resolve_path(entry: &ContextEntry) -> Self {
        BrowserRequest::ResolvePath {
            cmd: "resolve_path",
            selector: entry.selector.clone(),
            event: entry.event.clone(),
            handler: entry.handler.clone(),
        }
    }

    pub fn quit() -> Self {
        BrowserRequest::Quit { cmd: "quit" }
    }
}

/// Response received from the driver script over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// `snapshot`: array of raw elements.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    /// `fire`: whether the element was found.
    #[serde(default)]
    pub resolved: Option<bool>,
    /// `fire`: whether the page navigated.
    #[serde(default)]
    pub redirected: Option<bool>,
    /// `resolve_path`: the element's current path, if found.
    #[serde(default)]
    pub path: Option<String>,
}

/// How to start and talk to the driver script.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Path to the Node.js driver script.
    pub script: String,
    /// Rendering-stability wait after each action; a timeout counts as settled.
    pub settle_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    /// Lower-cased event names dropped during snapshot assembly.
    pub excluded_events: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            script: "driver/page_driver.js".into(),
            settle_timeout_ms: 1000,
            navigation_timeout_ms: 5000,
            excluded_events: Vec::new(),
        }
    }
}

/// A persistent browser session backed by a Node.js driver script.
///
/// The script keeps one page open; commands are sent as NDJSON over stdin
/// and answered one line each on stdout.
pub struct BrowserSession {
    child: Child,
    stdin: std::process::ChildStdin,
    reader: BufReader<std::process::ChildStdout>,
    excluded_events: Vec<String>,
    origin_url: Option<String>,
}

impl BrowserSession {
    /// Spawn the driver script and wait for its ready signal.
    pub fn launch(options: SessionOptions) -> Result<Self, DriverError> {
        let mut child = Command::new("node")
            .arg(&options.script)
            .arg("--settle-timeout")
            .arg(options.settle_timeout_ms.to_string())
            .arg("--navigation-timeout")
            .arg(options.navigation_timeout_ms.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DriverError::Spawn {
                script: options.script.clone(),
                source: e,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| DriverError::Io("failed to capture driver stdin".into()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DriverError::Io("failed to capture driver stdout".into()))?;

        let mut reader = BufReader::new(stdout);

        let mut line = String::new();
        reader
            .read_line(&mut line)
            .map_err(|e| DriverError::Io(format!("failed to read ready signal: {}", e)))?;

        let response: BrowserResponse =
            serde_json::from_str(line.trim()).map_err(|e| DriverError::JsonParse {
                context: "driver ready signal".into(),
                source: e,
            })?;

        if !response.ok || response.ready != Some(true) {
            return Err(DriverError::Protocol {
                command: "launch".into(),
                error: "did not receive ready signal from driver".into(),
            });
        }
        debug!(script = %options.script, "driver ready");

        Ok(BrowserSession {
            child,
            stdin,
            reader,
            excluded_events: options.excluded_events,
            origin_url: None,
        })
    }

    fn send(&mut self, request: &BrowserRequest) -> Result<BrowserResponse, DriverError> {
        let json = serde_json::to_string(request).map_err(|e| DriverError::JsonSerialize {
            context: "BrowserRequest".into(),
            source: e,
        })?;
        trace!(request = %json, "driver request");

        writeln!(self.stdin, "{}", json)
            .map_err(|e| DriverError::Io(format!("failed to write to driver stdin: {}", e)))?;

        self.stdin
            .flush()
            .map_err(|e| DriverError::Io(format!("failed to flush driver stdin: {}", e)))?;

        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| DriverError::Io(format!("failed to read from driver stdout: {}", e)))?;

        if line.trim().is_empty() {
            return Err(DriverError::Io(
                "empty response from driver (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| DriverError::JsonParse {
            context: "driver response".into(),
            source: e,
        })
    }

    fn send_ok(
        &mut self,
        request: &BrowserRequest,
        command_name: &str,
    ) -> Result<BrowserResponse, DriverError> {
        let response = self.send(request)?;
        if !response.ok {
            return Err(DriverError::Protocol {
                command: command_name.into(),
                error: response.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        Ok(response)
    }

    /// Shut the driver down. Failures are ignored: the process may be gone.
    pub fn quit(&mut self) -> Result<(), DriverError> {
        let request = BrowserRequest::quit();
        let _ = self.send(&request);
        let _ = self.child.wait();
        Ok(())
    }
}

impl PageDriver for BrowserSession {
    fn snapshot(&mut self) -> Result<Snapshot, DriverError> {
        let response = self.send_ok(&BrowserRequest::snapshot(), "snapshot")?;
        let data = response.data.ok_or_else(|| DriverError::Protocol {
            command: "snapshot".into(),
            error: "no data in snapshot response".into(),
        })?;
        let elements: Vec<RawElement> =
            serde_json::from_value(data).map_err(|e| DriverError::JsonParse {
                context: "snapshot elements".into(),
                source: e,
            })?;
        Ok(assemble(elements, &self.excluded_events))
    }

    fn fire(&mut self, trigger: &TriggerRecord) -> Result<FireOutcome, DriverError> {
        let response = self.send_ok(&BrowserRequest::fire(trigger), "fire")?;
        let redirected = response.redirected.unwrap_or(false);
        let same_origin = match (&self.origin_url, &response.url) {
            (Some(origin), Some(url)) => is_same_origin(origin, url),
            _ => true,
        };
        Ok(FireOutcome {
            resolved: response.resolved.unwrap_or(true),
            redirected,
            same_origin,
        })
    }

    fn reload(&mut self) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::reload(), "reload")?;
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.send_ok(&BrowserRequest::navigate(url), "navigate")?;
        if self.origin_url.is_none() {
            self.origin_url = Some(url.to_string());
        }
        Ok(())
    }

    fn current_url(&mut self) -> Result<String, DriverError> {
        let response = self.send_ok(&BrowserRequest::current_url(), "current_url")?;
        response.url.ok_or_else(|| DriverError::Protocol {
            command: "current_url".into(),
            error: "no URL in current_url response".into(),
        })
    }

    fn resolve_current_path(&mut self, entry: &ContextEntry) -> Result<Option<String>, DriverError> {
        let response = self.send_ok(&BrowserRequest::resolve_path(entry), "resolve_path")?;
        Ok(response.path)
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let _ = self.quit();
    }
}
