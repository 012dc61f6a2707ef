//! Real-time metronome driver
//!
//! Runs a [`BeatScheduler`] on a background thread. The thread parks until the
//! next absolute beat target, polls the scheduler, and sends each beat over a
//! channel. `stop` raises the stop signal, wakes the thread, joins it, and
//! throws away anything still queued, so nothing is observable after it
//! returns.

use crate::beat::{BeatConfig, BeatEvent, BeatScheduler, BeatState, TempoPreset};
use crate::clock::MonotonicTime;
use crate::error::EngineError;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

// Longest single park, so a missed unpark can't stall the loop for long
const MAX_PARK: Duration = Duration::from_millis(50);

fn lock(scheduler: &Mutex<BeatScheduler>) -> MutexGuard<'_, BeatScheduler> {
    scheduler.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Runner {
    thread: thread::JoinHandle<()>,
    stop_signal: Arc<AtomicBool>,
    receiver: Receiver<BeatEvent>,
}

pub struct Metronome {
    scheduler: Arc<Mutex<BeatScheduler>>,
    time: MonotonicTime,
    runner: Option<Runner>,
}

impl Metronome {
    pub fn new(config: BeatConfig) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(BeatScheduler::new(config))),
            time: MonotonicTime::new(),
            runner: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_some()
    }

    pub fn state(&self) -> BeatState {
        lock(&self.scheduler).state()
    }

    /// Start ticking; does nothing if already running.
    pub fn start(&mut self) {
        if self.runner.is_some() {
            return;
        }

        lock(&self.scheduler).start(self.time.now_ms());

        let (sender, receiver) = channel();
        let stop_signal = Arc::new(AtomicBool::new(false));
        let scheduler = Arc::clone(&self.scheduler);
        let signal = Arc::clone(&stop_signal);
        let time = self.time;

        let thread = thread::spawn(move || run(scheduler, signal, sender, time));

        info!("Metronome started ({} bpm)", self.state().bpm);
        self.runner = Some(Runner {
            thread,
            stop_signal,
            receiver,
        });
    }

    /// Stop ticking. Returns once the timer thread has exited; beats not yet
    /// received are discarded. Idempotent.
    pub fn stop(&mut self) {
        let Some(runner) = self.runner.take() else {
            return;
        };
        runner.stop_signal.store(true, Ordering::Release);
        runner.thread.thread().unpark();
        let _ = runner.thread.join();

        let discarded = runner.receiver.try_iter().count();
        if discarded > 0 {
            debug!("discarded {} undelivered beats", discarded);
        }
        lock(&self.scheduler).stop();
        info!("Metronome stopped");
    }

    /// Beats emitted since the last call, oldest first
    pub fn drain(&self) -> Vec<BeatEvent> {
        match &self.runner {
            Some(runner) => runner.receiver.try_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Wait up to `timeout` for the next beat
    pub fn recv_timeout(&self, timeout: Duration) -> Option<BeatEvent> {
        let runner = self.runner.as_ref()?;
        match runner.receiver.recv_timeout(timeout) {
            Ok(beat) => Some(beat),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn set_bpm(&self, bpm: u16) -> Result<(), EngineError> {
        lock(&self.scheduler).set_bpm(bpm)?;
        self.wake();
        Ok(())
    }

    pub fn set_beats_per_measure(&self, beats: u8) -> Result<(), EngineError> {
        lock(&self.scheduler).set_beats_per_measure(beats)
    }

    pub fn set_preset(&self, preset: TempoPreset) -> Result<(), EngineError> {
        self.set_bpm(preset.bpm())
    }

    /// Stop and restore 120 bpm, 4 beats per measure
    pub fn reset(&mut self) {
        self.stop();
        lock(&self.scheduler).reset();
    }

    fn wake(&self) {
        if let Some(runner) = &self.runner {
            runner.thread.thread().unpark();
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    scheduler: Arc<Mutex<BeatScheduler>>,
    stop_signal: Arc<AtomicBool>,
    sender: Sender<BeatEvent>,
    time: MonotonicTime,
) {
    loop {
        if stop_signal.load(Ordering::Acquire) {
            return;
        }

        let Some(next) = lock(&scheduler).next_target() else {
            return;
        };

        let now = time.now_ms();
        if next > now {
            let wait = Duration::from_secs_f64((next - now) / 1000.0).min(MAX_PARK);
            thread::park_timeout(wait);
            continue;
        }

        let beats = {
            let mut guard = lock(&scheduler);
            if stop_signal.load(Ordering::Acquire) {
                return;
            }
            guard.poll(time.now_ms())
        };
        for beat in beats {
            if sender.send(beat).is_err() {
                return;
            }
        }
    }
}
