//! The `julia` child-process backend.
//!
//! [`JuliaProcess`] runs `julia` with a small driver script and talks to it over
//! stdin and stdout. Each request is a chunk of Julia source; every primitive
//! of [`Interpreter`] is rendered as one (see [`codec`]). Objects that are not
//! plain data stay in a table inside the child and come back as handles. When
//! the last clone of a handle is dropped its id is queued, and the next request
//! tells the driver to drop the object from its table.
//!
//! The child's stderr is inherited, so anything user code prints shows up
//! there.

pub mod codec;

use crate::error::{Error, Result};
use crate::options::RuntimeOptions;
use crate::runtime::Interpreter;
use crate::value::{Handle, ReleaseQueue, Value};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use tracing::{debug, trace};

/// Request loop evaluated by the child on startup.
const DRIVER: &str = include_str!("driver.jl");

/// First line the driver writes once it accepts requests.
const READY: &str = "jlext ready";

/// A running `julia` process serving requests one at a time.
pub struct JuliaProcess {
    channel: Mutex<Channel>,
    releases: ReleaseQueue,
    pid: u32,
}

struct Channel {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl JuliaProcess {
    /// Start `julia` and wait until the driver is ready.
    pub fn spawn(options: &RuntimeOptions) -> Result<Self> {
        let args = options.julia_args();
        debug!(julia = %options.julia.display(), ?args, "spawning Julia");

        let mut child = Command::new(&options.julia)
            .args(&args)
            .arg("-e")
            .arg(DRIVER)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| Error::RuntimeInit {
                message: format!("cannot run `{}`: {err}", options.julia.display()),
            })?;

        let pid = child.id();
        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::RuntimeInit {
                message: "Julia process has no stdio pipes".to_string(),
            });
        };
        let mut channel = Channel {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        };
        channel.handshake()?;
        debug!(pid, "Julia process ready");

        Ok(Self {
            channel: Mutex::new(channel),
            releases: ReleaseQueue::default(),
            pid,
        })
    }

    /// OS process id of the child.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Objects the host dropped that the child has not been told about yet.
    pub fn pending_releases(&self) -> usize {
        self.releases.len()
    }

    fn request(&self, code: &str) -> Result<Value> {
        let line = {
            let mut channel = self.channel.lock();
            let released = self.releases.take();
            if let Err(err) = channel.send(code, &released) {
                self.releases.restore(released);
                return Err(err);
            }
            channel.receive()?
        };
        codec::decode_reply(&line, &self.releases)
    }
}

impl Channel {
    fn handshake(&mut self) -> Result<()> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).map_err(|err| Error::RuntimeInit {
            message: format!("cannot read from Julia: {err}"),
        })?;
        if read == 0 {
            return Err(Error::RuntimeInit {
                message: "Julia exited before it was ready".to_string(),
            });
        }
        if line.trim_end() != READY {
            return Err(Error::RuntimeInit {
                message: format!("unexpected greeting from Julia: {:?}", line.trim_end()),
            });
        }
        Ok(())
    }

    fn send(&mut self, code: &str, released: &[u64]) -> Result<()> {
        trace!(bytes = code.len(), released = released.len(), "request");
        writeln!(self.stdin, "{}", codec::header(code.len(), released))?;
        self.stdin.write_all(code.as_bytes())?;
        self.stdin.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(Error::Protocol("Julia closed its output".to_string()));
        }
        trace!(bytes = line.len(), "reply");
        Ok(line)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Interpreter for JuliaProcess {
    fn eval(&self, code: &str) -> Result<Value> {
        self.request(code)
    }

    fn call(&self, callee: &Handle, args: &[Value]) -> Result<Value> {
        self.request(&codec::call(callee, args))
    }

    fn get_attr(&self, target: &Handle, name: &str) -> Result<Value> {
        self.request(&codec::get_attr(target, name))
    }

    fn convert(&self, ty: &str, value: &Value) -> Result<Value> {
        self.request(&codec::convert(ty, value))
    }

    fn new_module(&self, name: &str) -> Result<Value> {
        self.request(&codec::new_module(name))
    }
}

impl core::fmt::Debug for JuliaProcess {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("JuliaProcess")
            .field("pid", &self.pid)
            .field("pending_releases", &self.releases.len())
            .finish()
    }
}
