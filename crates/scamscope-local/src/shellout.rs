//! Local document and OCR tools (`tesseract`, `pdftotext`, `mutool`, `pandoc`), used when present.
//!
//! Every call is bounded by a deadline and an output cap so a wedged tool cannot hang an
//! analysis. Each family can be switched off through its `SCAMSCOPE_*` mode variable.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

fn env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env(key).and_then(|s| s.parse().ok())
}

/// Tool deadline from `key`, clamped to 50ms..=5min.
pub fn timeout_from_env_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_parse(key).unwrap_or(default_ms).clamp(50, 300_000))
}

/// Output cap in chars from `key`, clamped to 200..=2M.
pub fn max_chars_from_env(key: &str, default_chars: usize) -> usize {
    env_parse(key).unwrap_or(default_chars).clamp(200, 2_000_000)
}

/// First executable named `bin` on `PATH`.
pub fn which(bin: &str) -> Option<PathBuf> {
    let names = if cfg!(windows) {
        vec![bin.to_string(), format!("{bin}.exe")]
    } else {
        vec![bin.to_string()]
    };
    std::env::split_paths(&std::env::var_os("PATH")?)
        .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
        .find(|cand| cand.is_file())
}

pub fn has(bin: &str) -> bool {
    which(bin).is_some()
}

/// Shellout mode for one tool family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Off,
    Auto,
    Strict,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Off => "off",
            Mode::Auto => "auto",
            Mode::Strict => "strict",
        }
    }
}

fn normalize_mode(s: Option<String>) -> Mode {
    match s.as_deref() {
        Some("off") => Mode::Off,
        Some("strict") => Mode::Strict,
        // Unknown value: treat as auto (bounded, best-effort).
        _ => Mode::Auto,
    }
}

pub fn ocr_mode_from_env() -> Mode {
    normalize_mode(env("SCAMSCOPE_OCR"))
}

pub fn pandoc_mode_from_env() -> Mode {
    normalize_mode(env("SCAMSCOPE_PANDOC"))
}

pub fn pdf_shellout_mode_from_env() -> Mode {
    normalize_mode(env("SCAMSCOPE_PDF_SHELLOUT"))
}

/// Run a tool and collect at most `max_stdout_bytes` of its stdout before `timeout`.
///
/// Stdout is drained on a reader thread while the child runs, so output larger than the pipe
/// buffer cannot stall the tool. Once the cap is reached the child is killed and the capped
/// output returned.
pub fn run_stdout_bounded(
    mut cmd: Command,
    timeout: Duration,
    max_stdout_bytes: usize,
) -> Result<Vec<u8>, &'static str> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            "shellout_tool_not_found"
        } else {
            "shellout_spawn_failed"
        }
    })?;
    let deadline = Instant::now() + timeout;
    let cap = max_stdout_bytes as u64;

    let Some(stdout) = child.stdout.take() else {
        stop(&mut child);
        return Err("shellout_spawn_failed");
    };
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut out = Vec::new();
        let read = stdout.take(cap).read_to_end(&mut out).map(|_| out);
        let _ = tx.send(read);
    });

    let mut drained: Option<Vec<u8>> = None;
    loop {
        if drained.is_none() {
            match rx.try_recv() {
                Ok(Ok(out)) if out.len() as u64 >= cap => {
                    stop(&mut child);
                    return Ok(out);
                }
                Ok(Ok(out)) => drained = Some(out),
                Ok(Err(_)) | Err(TryRecvError::Disconnected) => {
                    stop(&mut child);
                    return Err("shellout_read_failed");
                }
                Err(TryRecvError::Empty) => {}
            }
        }
        match child.try_wait() {
            Ok(Some(status)) if status.success() => break,
            Ok(Some(_)) => return Err("shellout_nonzero_exit"),
            Ok(None) => {}
            Err(_) => {
                stop(&mut child);
                return Err("shellout_wait_failed");
            }
        }
        if Instant::now() >= deadline {
            stop(&mut child);
            return Err("shellout_timeout");
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    match drained {
        Some(out) => Ok(out),
        // Exited; the reader finishes once the pipe hits EOF.
        None => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(Ok(out)) => Ok(out),
            Ok(Err(_)) => Err("shellout_read_failed"),
            Err(_) => Err("shellout_timeout"),
        },
    }
}

fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

pub fn write_temp_file(
    bytes: &[u8],
    suffix: &str,
) -> Result<tempfile::NamedTempFile, &'static str> {
    let mut tmp = tempfile::Builder::new()
        .prefix("scamscope-")
        .suffix(suffix)
        .tempfile()
        .map_err(|_| "shellout_tempfile_failed")?;
    use std::io::Write;
    tmp.write_all(bytes)
        .map_err(|_| "shellout_tempfile_write_failed")?;
    Ok(tmp)
}

fn non_blank_clipped(out: &[u8], max_chars: usize) -> Option<String> {
    let s = String::from_utf8_lossy(out);
    let clipped: String = s.chars().take(max_chars).collect();
    clipped
        .chars()
        .any(|c| !c.is_whitespace())
        .then_some(clipped)
}

/// OCR an image through `tesseract <in> stdout`.
pub fn tesseract_ocr(bytes: &[u8], suffix: &str) -> Result<String, &'static str> {
    if ocr_mode_from_env() == Mode::Off {
        return Err("ocr_disabled");
    }
    if !has("tesseract") {
        return Err("tesseract_not_found");
    }
    let timeout = timeout_from_env_ms("SCAMSCOPE_OCR_TIMEOUT_MS", 30_000);
    let max_chars = max_chars_from_env("SCAMSCOPE_OCR_MAX_CHARS", 50_000);
    let max_stdout_bytes = max_chars.saturating_mul(4).clamp(1_000, 4_000_000);
    let tmp = write_temp_file(bytes, suffix)?;

    let mut cmd = Command::new("tesseract");
    cmd.arg(tmp.path()).arg("stdout");
    let out = run_stdout_bounded(cmd, timeout, max_stdout_bytes)?;
    non_blank_clipped(&out, max_chars).ok_or("tesseract_empty_output")
}

/// Convert an office document to plain text through `pandoc <in> -t plain --wrap=none`.
pub fn pandoc_to_text(bytes: &[u8], suffix: &str) -> Result<String, &'static str> {
    if pandoc_mode_from_env() == Mode::Off {
        return Err("pandoc_disabled");
    }
    if !has("pandoc") {
        return Err("pandoc_not_found");
    }
    let timeout = timeout_from_env_ms("SCAMSCOPE_PANDOC_TIMEOUT_MS", 20_000);
    let max_chars = max_chars_from_env("SCAMSCOPE_PANDOC_MAX_CHARS", 200_000);
    let max_stdout_bytes = max_chars.saturating_mul(4).clamp(1_000, 8_000_000);
    let tmp = write_temp_file(bytes, suffix)?;

    let mut cmd = Command::new("pandoc");
    cmd.arg(tmp.path()).arg("-t").arg("plain").arg("--wrap=none");
    let out = run_stdout_bounded(cmd, timeout, max_stdout_bytes)?;
    non_blank_clipped(&out, max_chars).ok_or("pandoc_empty_output")
}

/// PDF text through `pdftotext`, then `mutool`. Returns the engine that produced it.
pub fn pdf_to_text(bytes: &[u8]) -> Result<(&'static str, String), &'static str> {
    if pdf_shellout_mode_from_env() == Mode::Off {
        return Err("pdf_shellout_disabled");
    }
    // Bound worst-case output by limiting pages.
    let max_pages = env_parse("SCAMSCOPE_PDF_SHELLOUT_MAX_PAGES")
        .unwrap_or(25usize)
        .clamp(1, 500);
    let timeout = timeout_from_env_ms("SCAMSCOPE_PDF_SHELLOUT_TIMEOUT_MS", 20_000);
    let max_chars = max_chars_from_env("SCAMSCOPE_PDF_SHELLOUT_MAX_CHARS", 200_000);
    let max_stdout_bytes = max_chars.saturating_mul(4).clamp(1_000, 8_000_000);
    let tmp = write_temp_file(bytes, ".pdf")?;

    if has("pdftotext") {
        let mut cmd = Command::new("pdftotext");
        cmd.args(["-f", "1", "-l", &max_pages.to_string(), "-layout", "-nopgbrk"])
            .args(["-enc", "UTF-8"])
            .arg(tmp.path())
            .arg("-");
        if let Some(s) = run_stdout_bounded(cmd, timeout, max_stdout_bytes)
            .ok()
            .and_then(|out| non_blank_clipped(&out, max_chars))
        {
            return Ok(("pdf-pdftotext", s));
        }
    }
    if has("mutool") {
        let mut cmd = Command::new("mutool");
        cmd.args(["draw", "-F", "text", "-o", "-"]).arg(tmp.path());
        if let Some(s) = run_stdout_bounded(cmd, timeout, max_stdout_bytes)
            .ok()
            .and_then(|out| non_blank_clipped(&out, max_chars))
        {
            return Ok(("pdf-mutool", s));
        }
    }
    Err("pdf_shellout_failed")
}
