//! Progress bars that stay pinned below log output.
//!
//! Log lines are routed through [`LogWriterFactory`] so they print above the
//! active bar instead of tearing it. When stderr is not a terminal the bars are
//! hidden and log lines go straight to stderr.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

static MULTI_PROGRESS: OnceLock<MultiProgress> = OnceLock::new();

fn multi_progress() -> &'static MultiProgress {
    MULTI_PROGRESS.get_or_init(|| {
        let mp = MultiProgress::new();
        mp.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        mp
    })
}

/// Start a bar for `len` steps; no bar for empty work
pub fn start_progress_bar(len: usize, message: &str) -> Option<ProgressBar> {
    if len == 0 {
        return None;
    }

    let pb = multi_progress().add(ProgressBar::new(len as u64));
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}",
    ) {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub fn advance_progress(pb: &Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.inc(1);
    }
}

pub fn finish_progress(pb: Option<ProgressBar>, message: &str) {
    if let Some(pb) = pb {
        pb.finish_with_message(message.to_string());
    }
}

/// Where completed log lines are written
pub enum LogTarget {
    /// Above the active progress bars
    Progress,
    /// Directly to a stream (hidden progress display)
    Stream(Box<dyn Write + Send>),
}

impl LogTarget {
    /// Pick the target for the current display. `MultiProgress::println` is a
    /// no-op on a hidden draw target, so hidden displays bypass it.
    pub fn for_display(hidden: bool) -> Self {
        if hidden {
            LogTarget::Stream(Box::new(io::stderr()))
        } else {
            LogTarget::Progress
        }
    }
}

/// `MakeWriter` for the tracing fmt layer
#[derive(Default, Clone)]
pub struct LogWriterFactory;

/// Line-buffered writer that prints complete lines through the progress display
pub struct LogWriter {
    buffer: String,
    target: LogTarget,
}

impl LogWriter {
    pub fn new(target: LogTarget) -> Self {
        Self {
            buffer: String::new(),
            target,
        }
    }

    fn emit(&mut self, line: &str) {
        let line = line.trim_end_matches('\r');
        match &mut self.target {
            LogTarget::Progress => {
                let _ = multi_progress().println(line);
            }
            LogTarget::Stream(stream) => {
                let _ = writeln!(stream, "{}", line);
            }
        }
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.push_str(&String::from_utf8_lossy(buf));

        while let Some(idx) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..idx + 1).collect();
            self.emit(&line[..idx]);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.emit(&line);
        }
        if let LogTarget::Stream(stream) = &mut self.target {
            stream.flush()?;
        }
        Ok(())
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogWriterFactory {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter::new(LogTarget::for_display(multi_progress().is_hidden()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Stream that keeps everything written to it
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_no_bar_for_empty_work() {
        assert!(start_progress_bar(0, "nothing").is_none());
        advance_progress(&None);
        finish_progress(None, "done");
    }

    #[test]
    fn test_bar_counts_steps() {
        let pb = start_progress_bar(3, "work");
        advance_progress(&pb);
        advance_progress(&pb);
        assert_eq!(pb.as_ref().map(|p| p.position()), Some(2));
        finish_progress(pb, "done");
    }

    #[test]
    fn test_log_writer_buffers_partial_lines() {
        let mut writer = LogWriter::new(LogTarget::Progress);
        writer.write_all(b"first line\nsecond ").unwrap();
        assert_eq!(writer.buffer, "second ");
        writer.write_all(b"half\n").unwrap();
        assert!(writer.buffer.is_empty());
    }

    #[test]
    fn test_hidden_display_writes_to_stream() {
        assert!(matches!(LogTarget::for_display(true), LogTarget::Stream(_)));
        assert!(matches!(LogTarget::for_display(false), LogTarget::Progress));

        let sink = SharedBuffer::default();
        let mut writer = LogWriter::new(LogTarget::Stream(Box::new(sink.clone())));
        writer
            .write_all(b"[MISS] movieId=2 -> 'Jumanji'\nOMDb API key not set")
            .unwrap();
        drop(writer);

        assert_eq!(sink.contents(), "[MISS] movieId=2 -> 'Jumanji'\nOMDb API key not set\n");
    }
}
