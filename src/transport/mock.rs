//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted outcome for a `read_exact` call
enum ScriptedRead {
    Data(Vec<u8>),
    Error(std::io::ErrorKind),
}

/// Mock transport that replays a scripted sequence of reads
///
/// Once the script is exhausted, reads fail with `TimedOut`, which the
/// source reader treats as a fatal hardware condition.
#[derive(Clone)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<ScriptedRead>>>,
}

impl MockTransport {
    /// Create a new mock transport with an empty script
    pub fn new() -> Self {
        MockTransport {
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Queue one successful read returning `data`
    pub fn push_read(&self, data: &[u8]) {
        let mut script = self.script.lock().unwrap();
        script.push_back(ScriptedRead::Data(data.to_vec()));
    }

    /// Queue one failing read
    pub fn push_error(&self, kind: std::io::ErrorKind) {
        let mut script = self.script.lock().unwrap();
        script.push_back(ScriptedRead::Error(kind));
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut script = self.script.lock().unwrap();
        match script.pop_front() {
            Some(ScriptedRead::Data(data)) if data.len() == buf.len() => {
                buf.copy_from_slice(&data);
                Ok(())
            }
            // A scripted read shorter than the requested chunk behaves like
            // a real short read: the remainder times out
            Some(ScriptedRead::Data(_)) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "short read",
            ))),
            Some(ScriptedRead::Error(kind)) => {
                Err(Error::Io(std::io::Error::new(kind, "scripted failure")))
            }
            None => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "script exhausted",
            ))),
        }
    }
}
