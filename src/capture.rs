//! Output capture for supervised processes.
//!
//! Each pipe gets its own reader thread that reads to end-of-stream and
//! reports back over a channel, so a child filling one pipe never blocks
//! on a reader that is busy waiting on the other.

use std::borrow::Cow;
use std::io::{self, Read, Write};
use std::process::{ChildStderr, ChildStdout};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// Full contents of a child's stdout and stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    pub fn new(stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Stdout decoded for display; invalid UTF-8 becomes U+FFFD.
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Stderr decoded for display; invalid UTF-8 becomes U+FFFD.
    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    /// Consume into lossily decoded `(stdout, stderr)`.
    pub fn into_strings(self) -> (String, String) {
        (
            String::from_utf8_lossy(&self.stdout).into_owned(),
            String::from_utf8_lossy(&self.stderr).into_owned(),
        )
    }

    /// Echo both streams on the harness's own stdout/stderr.
    ///
    /// Valid UTF-8 goes through `print!`/`eprint!` so the Rust test harness
    /// captures the child's output together with the test's own. Anything
    /// else is written to the real stdout/stderr byte for byte.
    pub fn forward(&self) {
        match (std::str::from_utf8(&self.stdout), std::str::from_utf8(&self.stderr)) {
            (Ok(stdout), Ok(stderr)) => {
                print!("{}", stdout);
                eprint!("{}", stderr);
            }
            _ => {
                if let Err(err) = self.forward_to(&mut io::stdout(), &mut io::stderr()) {
                    tracing::warn!(error = %err, "failed to forward child output");
                }
            }
        }
    }

    /// Write both streams, unmodified, to the given sinks.
    pub fn forward_to<O, E>(&self, out: &mut O, err: &mut E) -> io::Result<()>
    where
        O: Write,
        E: Write,
    {
        out.write_all(&self.stdout)?;
        out.flush()?;
        err.write_all(&self.stderr)?;
        err.flush()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Stream::Stdout => "stdout",
            Stream::Stderr => "stderr",
        }
    }
}

struct Drained {
    stream: Stream,
    result: io::Result<Vec<u8>>,
}

/// Reader threads for one child's stdout and stderr.
pub(crate) struct Drainers {
    rx: Receiver<Drained>,
    stdout: Option<Vec<u8>>,
    stderr: Option<Vec<u8>>,
}

impl Drainers {
    /// Start draining both pipes.
    pub(crate) fn start(stdout: ChildStdout, stderr: ChildStderr) -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        spawn_reader(Stream::Stdout, stdout, tx.clone())?;
        spawn_reader(Stream::Stderr, stderr, tx)?;
        Ok(Self {
            rx,
            stdout: None,
            stderr: None,
        })
    }

    /// Both streams have reached end-of-stream.
    pub(crate) fn is_complete(&self) -> bool {
        self.stdout.is_some() && self.stderr.is_some()
    }

    /// Wait at most `max_wait` for a reader to finish.
    ///
    /// Returns early as soon as a stream completes. Once both streams are
    /// complete this just sleeps for `max_wait`.
    pub(crate) fn poll(&mut self, max_wait: Duration) -> io::Result<()> {
        if self.is_complete() {
            thread::sleep(max_wait);
            return Ok(());
        }

        match self.rx.recv_timeout(max_wait) {
            Ok(drained) => self.record(drained),
            Err(RecvTimeoutError::Timeout) => Ok(()),
            Err(RecvTimeoutError::Disconnected) => Err(reader_lost()),
        }
    }

    /// Take every result the readers have already reported, without waiting.
    pub(crate) fn collect_ready(&mut self) -> io::Result<()> {
        while !self.is_complete() {
            match self.rx.try_recv() {
                Ok(drained) => self.record(drained)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(reader_lost()),
            }
        }
        Ok(())
    }

    fn record(&mut self, drained: Drained) -> io::Result<()> {
        let bytes = drained.result?;
        tracing::debug!(
            stream = drained.stream.name(),
            bytes = bytes.len(),
            "stream reached end of file"
        );
        match drained.stream {
            Stream::Stdout => self.stdout = Some(bytes),
            Stream::Stderr => self.stderr = Some(bytes),
        }
        Ok(())
    }

    /// Bytes collected so far from streams that already completed.
    pub(crate) fn collected_bytes(&self) -> usize {
        self.stdout.as_ref().map_or(0, Vec::len) + self.stderr.as_ref().map_or(0, Vec::len)
    }

    /// Take the captured output. Only meaningful once [`is_complete`] holds.
    ///
    /// [`is_complete`]: Drainers::is_complete
    pub(crate) fn into_output(self) -> CapturedOutput {
        CapturedOutput {
            stdout: self.stdout.unwrap_or_default(),
            stderr: self.stderr.unwrap_or_default(),
        }
    }
}

fn reader_lost() -> io::Error {
    io::Error::other("output reader stopped without reporting a result")
}

fn spawn_reader<R>(stream: Stream, mut reader: R, tx: Sender<Drained>) -> io::Result<()>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name(format!("drain-{}", stream.name()))
        .spawn(move || {
            let mut buf = Vec::new();
            let result = reader.read_to_end(&mut buf).map(|_| buf);
            // The receiver is gone once the supervisor has given up on the run.
            let _ = tx.send(Drained { stream, result });
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::{Command, Stdio};
    use std::time::Instant;

    fn drain_to_completion(script: &str) -> Drainers {
        let mut child = Command::new("sh")
            .args(["-c", script])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut drainers =
            Drainers::start(child.stdout.take().unwrap(), child.stderr.take().unwrap()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while !drainers.is_complete() {
            assert!(Instant::now() < deadline, "drainers did not complete");
            drainers.poll(Duration::from_millis(10)).unwrap();
        }
        child.wait().unwrap();
        drainers
    }

    fn drain_command(script: &str) -> CapturedOutput {
        drain_to_completion(script).into_output()
    }

    #[test]
    fn lossy_decoding_replaces_invalid_utf8() {
        let output = CapturedOutput::new(vec![b'o', b'k', 0xff], b"err".to_vec());
        assert_eq!(output.stdout_lossy(), "ok\u{fffd}");
        assert_eq!(output.stderr_lossy(), "err");
    }

    #[test]
    fn into_strings_decodes_both_streams() {
        let output = CapturedOutput::new(b"hello\n".to_vec(), Vec::new());
        assert_eq!(
            output.into_strings(),
            ("hello\n".to_string(), String::new())
        );
    }

    #[test]
    fn drainers_capture_both_streams() {
        let output = drain_command("printf out; printf err >&2");
        assert_eq!(output.stdout, b"out");
        assert_eq!(output.stderr, b"err");
    }

    #[test]
    fn drainers_handle_output_larger_than_pipe_buffer() {
        // 1 MiB on each stream, far beyond the default 64 KiB pipe buffer.
        let output = drain_command(
            "head -c 1048576 /dev/zero; head -c 1048576 /dev/zero >&2",
        );
        assert_eq!(output.stdout.len(), 1_048_576);
        assert_eq!(output.stderr.len(), 1_048_576);
    }

    #[test]
    fn collect_ready_takes_all_queued_results() {
        let mut child = Command::new("sh")
            .args(["-c", "printf out; printf err >&2"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut drainers =
            Drainers::start(child.stdout.take().unwrap(), child.stderr.take().unwrap()).unwrap();
        child.wait().unwrap();

        // Both readers report shortly after the child exits; neither result
        // may be left in the channel.
        let deadline = Instant::now() + Duration::from_secs(10);
        while !drainers.is_complete() {
            assert!(Instant::now() < deadline, "readers did not report");
            std::thread::sleep(Duration::from_millis(20));
            drainers.collect_ready().unwrap();
        }
        let output = drainers.into_output();
        assert_eq!(output.stdout, b"out");
        assert_eq!(output.stderr, b"err");
    }

    #[test]
    fn collect_ready_does_not_block_on_running_child() {
        let mut child = Command::new("sleep")
            .arg("5")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let mut drainers =
            Drainers::start(child.stdout.take().unwrap(), child.stderr.take().unwrap()).unwrap();

        let started = Instant::now();
        drainers.collect_ready().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!drainers.is_complete());

        child.kill().unwrap();
        child.wait().unwrap();
    }

    #[test]
    fn forward_to_writes_bytes_verbatim() {
        let output = CapturedOutput::new(vec![b'a', 0xff, 0xfe, b'\n'], vec![0xc3, b'x']);
        let mut out = Vec::new();
        let mut err = Vec::new();
        output.forward_to(&mut out, &mut err).unwrap();
        assert_eq!(out, vec![b'a', 0xff, 0xfe, b'\n']);
        assert_eq!(err, vec![0xc3, b'x']);
    }

    #[test]
    fn collected_bytes_counts_completed_streams() {
        let drainers = drain_to_completion("printf abc; printf de >&2");
        assert_eq!(drainers.collected_bytes(), 5);
    }
}
