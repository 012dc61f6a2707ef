include!(concat!(env!("OUT_DIR"), "/charts.rs"));

/// A bundled chart document with its name and source text
#[derive(Debug, Clone, PartialEq)]
pub struct ChartEntry {
    pub name: String,
    pub content: String,
}

impl ChartEntry {
    fn from_static((name, content): &(&str, &str)) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_string(),
        }
    }
}

/// Get all embedded charts, sorted by name
pub fn get_all_charts() -> Vec<ChartEntry> {
    CHARTS.iter().map(ChartEntry::from_static).collect()
}

/// Get a chart by name, e.g. `"twinkle"`
pub fn get_chart(name: &str) -> Option<ChartEntry> {
    CHARTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(ChartEntry::from_static)
}

/// List all chart names
pub fn list_charts() -> Vec<&'static str> {
    CHARTS.iter().map(|(name, _)| *name).collect()
}
