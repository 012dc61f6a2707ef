//! Integration tests for the keyfall engine
//!
//! Plays whole charts through a session on a simulated 10 ms frame clock.

use keyfall_engine::{
    generate_scale, load_session, parse_chart, to_chart_string, BeatConfig, BeatScheduler,
    BeatsPerMeasure, EngineConfig, Judgment, PitchClass, ScaleKind, ScheduledNote, Session,
    SessionResult, SessionStatus,
};

const FRAME_MS: f64 = 10.0;

const TWINKLE: &str = r#"---
title: Twinkle Twinkle Little Star
difficulty: beginner
bpm: 120
---
C4:0:400,C4:500:400,G4:1000:400,G4:1500:400,A4:2000:400,A4:2500:400,G4:3000:800
"#;

/// Time at which a note of `onset` sits exactly on the hit zone
fn due(config: &EngineConfig, onset_ms: u64) -> f64 {
    onset_ms as f64 + config.judgment.hit_zone / config.judgment.fall_speed * 1000.0
}

/// Drive `session` frame by frame, pressing each note `offset` ms after it is due
/// and releasing it 50 ms later. Notes listed in `skip` are never played.
fn play(
    session: &mut Session,
    notes: &[ScheduledNote],
    config: &EngineConfig,
    offset: f64,
    skip: &[usize],
) -> SessionResult {
    let mut events: Vec<(f64, bool, usize)> = Vec::new();
    for note in notes.iter().filter(|n| !skip.contains(&n.id)) {
        let at = due(config, note.onset_ms) + offset;
        events.push((at, true, note.id));
        events.push((at + 50.0, false, note.id));
    }
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    session.start(0.0);
    let mut next_event = 0;
    let mut now = 0.0;
    while session.status() == SessionStatus::Playing {
        while next_event < events.len() && events[next_event].0 <= now {
            let (at, press, id) = events[next_event];
            if press {
                session.press(notes[id].pitch, at);
            } else {
                session.release(notes[id].pitch, at);
            }
            next_event += 1;
        }
        session.tick(now);
        now += FRAME_MS;
        assert!(now < 600_000.0, "session never finished");
    }
    session.result().cloned().expect("finished session has a result")
}

#[test]
fn test_twinkle_played_perfectly() {
    let config = EngineConfig::default();
    let (metadata, mut session) = load_session(TWINKLE, &config).unwrap();
    assert_eq!(metadata.title.as_deref(), Some("Twinkle Twinkle Little Star"));
    assert_eq!(metadata.bpm, Some(120));

    let notes: Vec<ScheduledNote> = session.field().notes().iter().map(|n| n.note().clone()).collect();
    let result = play(&mut session, &notes, &config, 0.0, &[]);

    assert_eq!(result.perfect, 7);
    assert_eq!(result.miss, 0);
    assert_eq!(result.max_combo, 7);
    assert_eq!(result.accuracy, 100.0);
    // 100 * (1 + 0.1k) for k = 0..6
    assert_eq!(result.display_score(), "910");
}

#[test]
fn test_late_presses_score_good() {
    let config = EngineConfig::default();
    let (_, mut session) = load_session(TWINKLE, &config).unwrap();
    let notes = parse_chart(
        "C4:0:400,C4:500:400,G4:1000:400,G4:1500:400,A4:2000:400,A4:2500:400,G4:3000:800",
    )
    .unwrap();

    // 140 ms late at 300 units/s is 42 units past the zone
    let result = play(&mut session, &notes, &config, 140.0, &[]);
    assert_eq!(result.good, 7);
    assert_eq!(result.perfect, 0);
    assert_eq!(result.accuracy, 50.0);
}

#[test]
fn test_skipped_notes_break_combo() {
    let config = EngineConfig::default();
    let (_, mut session) = load_session(TWINKLE, &config).unwrap();
    let notes = parse_chart(
        "C4:0:400,C4:500:400,G4:1000:400,G4:1500:400,A4:2000:400,A4:2500:400,G4:3000:800",
    )
    .unwrap();

    let result = play(&mut session, &notes, &config, 0.0, &[3]);
    assert_eq!(result.perfect, 6);
    assert_eq!(result.miss, 1);
    assert_eq!(result.max_combo, 3);
    assert_eq!(result.combo, 3);
    assert!((result.accuracy - 600.0 / 700.0 * 100.0).abs() < 1e-9);
}

#[test]
fn test_unplayed_chart_is_all_misses() {
    let config = EngineConfig::default();
    let notes = parse_chart("C4:0:300,C4:400:300,D4:800:600").unwrap();
    let mut session = Session::new(notes.clone(), &config).unwrap();
    let result = play(&mut session, &notes, &config, 0.0, &[0, 1, 2]);
    assert_eq!(result.miss, 3);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.accuracy, 0.0);
}

#[test]
fn test_generated_scale_replay() {
    let config = EngineConfig::default();
    let scale = generate_scale(PitchClass::A, 4, ScaleKind::Minor);
    assert_eq!(scale.len(), 8);

    // the scale survives a trip through chart text
    let text = to_chart_string(&scale);
    let notes = parse_chart(&text).unwrap();
    assert_eq!(notes, scale);

    let mut session = Session::new(notes.clone(), &config).unwrap();
    let result = play(&mut session, &notes, &config, 0.0, &[]);
    assert_eq!(result.perfect, 8);
}

#[test]
fn test_config_from_yaml_changes_timing() {
    let config = EngineConfig::from_yaml(
        "judgment:\n  fall-speed: 520\n  perfect-window: 10\n  good-window: 40\n",
    )
    .unwrap();
    // at 520 units/s a note is due exactly one second after onset
    assert_eq!(due(&config, 0), 1000.0);

    let notes = parse_chart("E4:0:400,F4:500:400").unwrap();
    let mut session = Session::new(notes.clone(), &config).unwrap();
    // 50 ms late is 26 units: Good under the narrower windows
    let result = play(&mut session, &notes, &config, 50.0, &[]);
    assert_eq!(result.good, 2);
}

#[test]
fn test_pause_mid_session_shifts_timeline() {
    let config = EngineConfig::default();
    let notes = parse_chart("C4:0:400").unwrap();
    let mut session = Session::new(notes, &config).unwrap();
    let hit_at = due(&config, 0);

    session.start(0.0);
    session.tick(1000.0);
    session.pause(1000.0);
    session.tick(4000.0);
    session.resume(4000.0);

    // three seconds were spent paused
    session.press("C4".parse().unwrap(), hit_at + 3000.0);
    let report = session.tick(hit_at + 3000.0);
    assert_eq!(report.judgments[0].judgment, Judgment::Perfect);
    assert!(report.result.is_some());
}

#[test]
fn test_beat_scheduler_ten_intervals() {
    let mut scheduler = BeatScheduler::new(BeatConfig::default());
    scheduler.start(0.0);

    let mut beats = Vec::new();
    let mut now = 0.0;
    while now <= 5000.0 {
        beats.extend(scheduler.poll(now));
        now += 16.0;
    }
    beats.extend(scheduler.poll(5000.0));

    assert_eq!(beats.len(), 10);
    for (k, beat) in beats.iter().enumerate() {
        assert_eq!(beat.target_ms, (k as f64 + 1.0) * 500.0);
    }
    let accents: Vec<bool> = beats.iter().map(|b| b.accent).collect();
    assert_eq!(
        accents,
        [true, false, false, false, true, false, false, false, true, false]
    );
}

#[test]
fn test_beat_scheduler_meter_and_tempo_change() {
    let config = BeatConfig::new(60, BeatsPerMeasure::new(3).unwrap()).unwrap();
    let mut scheduler = BeatScheduler::new(config);
    scheduler.start(0.0);
    assert_eq!(scheduler.poll(2000.0).len(), 2);

    scheduler.set_bpm(120).unwrap();
    let beats = scheduler.poll(4000.0);
    // beat 3 keeps its 3000 target, then 500 ms spacing
    let targets: Vec<f64> = beats.iter().map(|b| b.target_ms).collect();
    assert_eq!(targets, [3000.0, 3500.0, 4000.0]);
    let positions: Vec<u8> = beats.iter().map(|b| b.beat).collect();
    assert_eq!(positions, [3, 1, 2]);

    assert!(scheduler.set_bpm(250).is_err());
    assert_eq!(scheduler.config().bpm(), 120);
}
