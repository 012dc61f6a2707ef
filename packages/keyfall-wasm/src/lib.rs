use keyfall_engine::{
    BeatConfig, BeatScheduler, BeatsPerMeasure, ChartDocument, ChartMetadata, EngineConfig,
    EngineError, Pitch, ScaleKind, Session, TempoPreset,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize)]
struct EngineErrorJson {
    message: String,
    note: Option<usize>,
}

fn error_json(e: &EngineError) -> String {
    let error = match e {
        EngineError::ParseError { note, message } => EngineErrorJson {
            message: message.clone(),
            note: Some(*note),
        },
        EngineError::MetadataError(_) | EngineError::ConfigError(_) => EngineErrorJson {
            message: e.to_string(),
            note: None,
        },
    };
    serde_json::to_string(&error)
        .unwrap_or_else(|_| format!("{{\"message\":{:?}}}", e.to_string()))
}

fn to_js_error(e: EngineError) -> JsValue {
    JsValue::from_str(&error_json(&e))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

fn parse_pitch(pitch: &str) -> Result<Pitch, EngineError> {
    pitch
        .parse()
        .map_err(|message| EngineError::ParseError { note: 1, message })
}

fn parse_scale_kind(kind: &str) -> Result<ScaleKind, EngineError> {
    kind.parse::<ScaleKind>()
        .map_err(|message| EngineError::ParseError { note: 1, message })
}

fn load_config(config_yaml: Option<String>) -> Result<EngineConfig, EngineError> {
    match config_yaml {
        Some(yaml) => EngineConfig::from_yaml(&yaml),
        None => Ok(EngineConfig::default()),
    }
}

/// Parse a chart document, returning `{metadata, notes}` as JSON
#[wasm_bindgen]
pub fn parse_chart(source: &str) -> Result<String, JsValue> {
    let document = ChartDocument::parse(source).map_err(to_js_error)?;
    to_json(&document)
}

/// Generate a one-octave scale chart, returned as JSON notes
#[wasm_bindgen]
pub fn generate_scale(root: &str, octave: i8, kind: &str) -> Result<String, JsValue> {
    let kind = parse_scale_kind(kind).map_err(to_js_error)?;
    let notes = keyfall_engine::generate_scale_from_str(root, octave, kind).map_err(to_js_error)?;
    to_json(&notes)
}

/// Names of the bundled charts as a JSON array
#[wasm_bindgen]
pub fn list_charts() -> String {
    serde_json::to_string(&keyfall_charts::list_charts()).unwrap_or_else(|_| "[]".to_string())
}

/// Source text of a bundled chart
#[wasm_bindgen]
pub fn get_chart(name: &str) -> Option<String> {
    keyfall_charts::get_chart(name).map(|chart| chart.content)
}

/// Keys of an on-screen keyboard with their lane positions
#[wasm_bindgen]
pub fn keyboard_keys(start_octave: i8, octaves: u8) -> Result<JsValue, JsValue> {
    to_js(&keyfall_engine::keyboard_keys(start_octave, octaves))
}

/// One lesson play-through driven by the page's frame timestamps
#[wasm_bindgen]
pub struct LessonSession {
    session: Session,
    metadata: ChartMetadata,
}

#[wasm_bindgen]
impl LessonSession {
    #[wasm_bindgen(constructor)]
    pub fn new(source: &str, config_yaml: Option<String>) -> Result<LessonSession, JsValue> {
        let config = load_config(config_yaml).map_err(to_js_error)?;
        let (metadata, session) =
            keyfall_engine::load_session(source, &config).map_err(to_js_error)?;
        Ok(LessonSession { session, metadata })
    }

    pub fn title(&self) -> Option<String> {
        self.metadata.title.clone()
    }

    pub fn bpm(&self) -> Option<u16> {
        self.metadata.bpm
    }

    pub fn start(&mut self, now: f64) {
        self.session.start(now);
    }

    pub fn pause(&mut self, now: f64) {
        self.session.pause(now);
    }

    pub fn resume(&mut self, now: f64) {
        self.session.resume(now);
    }

    pub fn stop(&mut self) {
        self.session.stop();
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn press(&mut self, pitch: &str, now: f64) -> Result<(), JsValue> {
        let pitch = parse_pitch(pitch).map_err(to_js_error)?;
        self.session.press(pitch, now);
        Ok(())
    }

    pub fn release(&mut self, pitch: &str, now: f64) -> Result<(), JsValue> {
        let pitch = parse_pitch(pitch).map_err(to_js_error)?;
        self.session.release(pitch, now);
        Ok(())
    }

    /// Advance to `now`; returns the tick report as JSON
    pub fn tick(&mut self, now: f64) -> Result<String, JsValue> {
        let report = self.session.tick(now);
        to_json(&report)
    }

    /// Active notes with lane positions as JSON
    pub fn render(&self) -> Result<String, JsValue> {
        to_json(&self.session.render())
    }

    pub fn state(&self) -> Result<String, JsValue> {
        to_json(self.session.state())
    }

    /// Finalized result as JSON, once the session has finished
    pub fn result(&self) -> Option<String> {
        self.session
            .result()
            .and_then(|result| serde_json::to_string(result).ok())
    }

    pub fn status(&self) -> Result<String, JsValue> {
        to_json(&self.session.status())
    }
}

/// Beat scheduler driven by the page's timestamps
#[wasm_bindgen]
pub struct BeatClock {
    scheduler: BeatScheduler,
}

#[wasm_bindgen]
impl BeatClock {
    #[wasm_bindgen(constructor)]
    pub fn new(bpm: u16, beats_per_measure: u8) -> Result<BeatClock, JsValue> {
        let beats = BeatsPerMeasure::new(beats_per_measure).map_err(to_js_error)?;
        let config = BeatConfig::new(bpm, beats).map_err(to_js_error)?;
        Ok(BeatClock {
            scheduler: BeatScheduler::new(config),
        })
    }

    pub fn set_bpm(&mut self, bpm: u16) -> Result<(), JsValue> {
        self.scheduler.set_bpm(bpm).map_err(to_js_error)
    }

    pub fn set_beats_per_measure(&mut self, beats: u8) -> Result<(), JsValue> {
        self.scheduler.set_beats_per_measure(beats).map_err(to_js_error)
    }

    /// Apply a named tempo preset such as `"Andante"`
    pub fn set_preset(&mut self, name: &str) -> Result<(), JsValue> {
        let preset = TempoPreset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                to_js_error(EngineError::ConfigError(format!("Unknown tempo preset: {}", name)))
            })?;
        self.scheduler.set_preset(preset).map_err(to_js_error)
    }

    pub fn start(&mut self, now: f64) {
        self.scheduler.start(now);
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn reset(&mut self) {
        self.scheduler.reset();
    }

    pub fn next_target(&self) -> Option<f64> {
        self.scheduler.next_target()
    }

    /// Beats due at or before `now`, as an array of beat objects
    pub fn poll(&mut self, now: f64) -> Result<JsValue, JsValue> {
        to_js(&self.scheduler.poll(now))
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.scheduler.state())
    }
}
