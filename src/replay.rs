//! Scripted replays
//!
//! Plays a chart against a recorded input script on a simulated clock that
//! advances in fixed ticks. Script format, one event per line:
//!
//! ```text
//! # comments and blank lines are ignored
//! press C4 1733
//! release C4 1800
//! ```
//!
//! Pitch names are case-insensitive. Times are milliseconds from session
//! start; an event takes effect on the first tick at or after its time.

use crate::error::CliError;
use keyfall_engine::{
    EngineConfig, InputEvent, InputKind, JudgedNote, Pitch, Session, SessionResult,
    SessionStatus,
};
use log::{debug, info};
use serde::Serialize;

pub const DEFAULT_TICK_MS: f64 = 16.0;

/// Cut a trailing comment. `#` opens one only at the start of a line or after
/// whitespace, since it is also the sharp sign in pitches like `C#4`.
fn strip_comment(raw: &str) -> &str {
    let mut previous = None;
    for (index, c) in raw.char_indices() {
        if c == '#' && previous.map_or(true, char::is_whitespace) {
            return &raw[..index];
        }
        previous = Some(c);
    }
    raw
}

/// Parse an input script. Events are returned in time order; events at the
/// same time keep their script order.
pub fn parse_script(text: &str) -> Result<Vec<InputEvent>, CliError> {
    let mut events = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = strip_comment(raw).trim();
        if content.is_empty() {
            continue;
        }

        let error = |message: String| CliError::Script { line, message };
        let fields: Vec<&str> = content.split_whitespace().collect();
        let [action, pitch, time] = fields.as_slice() else {
            return Err(error(format!(
                "expected '<press|release> <pitch> <ms>', found '{}'",
                content
            )));
        };

        let kind = match action.to_ascii_lowercase().as_str() {
            "press" => InputKind::Press,
            "release" => InputKind::Release,
            other => return Err(error(format!("unknown action '{}'", other))),
        };
        let pitch: Pitch = pitch.to_ascii_uppercase().parse().map_err(error)?;
        let timestamp_ms: f64 = time
            .parse()
            .ok()
            .filter(|t: &f64| t.is_finite() && *t >= 0.0)
            .ok_or_else(|| error(format!("'{}' is not a time in milliseconds", time)))?;

        events.push(InputEvent {
            kind,
            pitch,
            timestamp_ms,
        });
    }

    events.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
    Ok(events)
}

/// Everything a replay produced
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub title: String,
    pub result: SessionResult,
    pub judgments: Vec<JudgedNote>,
    pub duration_ms: f64,
}

pub struct Replay {
    tick_ms: f64,
    config: EngineConfig,
}

impl Replay {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            config,
        }
    }

    pub fn with_tick(mut self, tick_ms: f64) -> Result<Self, CliError> {
        if !(tick_ms.is_finite() && tick_ms > 0.0) {
            return Err(CliError::Usage(format!(
                "tick must be a positive number of milliseconds, got {}",
                tick_ms
            )));
        }
        self.tick_ms = tick_ms;
        Ok(self)
    }

    /// Play `source` (a chart document) against `events` until every note is
    /// judged.
    pub fn run(
        &self,
        name: &str,
        source: &str,
        events: &[InputEvent],
    ) -> Result<ReplayOutcome, CliError> {
        let (metadata, mut session) = keyfall_engine::load_session(source, &self.config)?;
        let title = metadata.title.unwrap_or_else(|| name.to_string());
        info!("Replaying '{}' with {} input events", title, events.len());

        let (judgments, duration_ms) = self.drive(&mut session, events);
        let result = session
            .result()
            .cloned()
            .unwrap_or_else(|| SessionResult::from(session.state()));

        Ok(ReplayOutcome {
            title,
            result,
            judgments,
            duration_ms,
        })
    }

    fn drive(&self, session: &mut Session, events: &[InputEvent]) -> (Vec<JudgedNote>, f64) {
        let mut judgments = Vec::new();
        let mut pending = events.iter().peekable();
        let mut tick = 0u64;
        let mut now = 0.0;

        session.start(now);
        while session.status() == SessionStatus::Playing {
            // computed from the tick count so long replays don't accumulate rounding
            now = tick as f64 * self.tick_ms;
            while let Some(event) = pending.next_if(|e| e.timestamp_ms <= now) {
                session.push_event(*event);
            }
            let report = session.tick(now);
            for judged in &report.judgments {
                debug!("{:>8.1} ms  {} {:?}", now, judged.pitch, judged.judgment);
            }
            judgments.extend(report.judgments);
            tick += 1;
        }

        (judgments, now)
    }
}
