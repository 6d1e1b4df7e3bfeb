use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};
use std::thread;
use std::time::{Duration, Instant};

/// Shared run counters. Counting always happens; the periodic stderr line is
/// only printed when enabled.
#[derive(Clone)]
pub struct Progress {
    enabled: bool,
    pub stage: Arc<Mutex<String>>,
    pub files_done: Arc<AtomicU64>,
    pub files_total: Arc<AtomicU64>,
    pub bytes_done: Arc<AtomicU64>,
    pub bytes_skipped: Arc<AtomicU64>,
    pub bytes_total: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stage: Arc::new(Mutex::new(String::new())),
            files_done: Arc::new(AtomicU64::new(0)),
            files_total: Arc::new(AtomicU64::new(0)),
            bytes_done: Arc::new(AtomicU64::new(0)),
            bytes_skipped: Arc::new(AtomicU64::new(0)),
            bytes_total: Arc::new(AtomicU64::new(0)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }
    pub fn set_stage(&self, s: &str) {
        if self.enabled {
            if let Ok(mut g) = self.stage.lock() {
                *g = s.to_string();
            }
        }
    }
    pub fn set_totals(&self, files: u64, bytes: u64) {
        self.files_total.store(files, Ordering::Relaxed);
        self.bytes_total.store(bytes, Ordering::Relaxed);
    }
    pub fn inc_file(&self) {
        self.files_done.fetch_add(1, Ordering::Relaxed);
    }
    pub fn add_bytes(&self, n: u64) {
        self.bytes_done.fetch_add(n, Ordering::Relaxed);
    }
    /// Declared bytes of files finished without a full hash (missing,
    /// wrong size, read error).
    pub fn skip_bytes(&self, n: u64) {
        let _ = self.bytes_skipped.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| {
            Some(v.saturating_add(n))
        });
    }
    /// Bytes fed to the hasher so far.
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_done.load(Ordering::Relaxed)
    }
    pub fn files_verified(&self) -> u64 {
        self.files_done.load(Ordering::Relaxed)
    }
    /// Share of declared bytes accounted for, hashed or skipped, capped at 100.
    pub fn bytes_percent(&self) -> u32 {
        let done = self
            .bytes_done
            .load(Ordering::Relaxed)
            .saturating_add(self.bytes_skipped.load(Ordering::Relaxed));
        let total = self.bytes_total.load(Ordering::Relaxed);
        if total == 0 {
            return 0;
        }
        ((done as f64 / total as f64) * 100.0).min(100.0) as u32
    }

    pub fn start(&self) {
        if !self.enabled {
            return;
        }
        self.running.store(true, Ordering::Relaxed);
        let p = self.clone();
        thread::spawn(move || {
            let t0 = Instant::now();
            while p.running.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_secs(5));
                if !p.running.load(Ordering::Relaxed) {
                    break;
                }
                let s = p.stage.lock().map(|g| g.to_string()).unwrap_or_default();
                let fd = p.files_done.load(Ordering::Relaxed);
                let ft = p.files_total.load(Ordering::Relaxed);
                eprintln!(
                    "[{:>4}s] {} | files {}/{} | bytes {}%",
                    t0.elapsed().as_secs(),
                    s,
                    fd,
                    ft,
                    p.bytes_percent()
                );
            }
        });
    }
    pub fn stop(&self) {
        if self.enabled {
            self.running.store(false, Ordering::Relaxed);
        }
    }
}
