use std::env;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("charts.rs");

    let charts_dir = Path::new("charts");
    let mut charts: Vec<(String, String)> = Vec::new();

    if charts_dir.exists() {
        for entry in WalkDir::new(charts_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "chart"))
        {
            let path = entry.path();
            let relative_path = path.strip_prefix(charts_dir).unwrap().with_extension("");
            let name = relative_path.to_string_lossy().replace('\\', "/");

            if let Ok(content) = fs::read_to_string(path) {
                charts.push((name, content));
            }
        }
    }

    let mut code = String::new();
    code.push_str("/// Embedded chart files, by name without extension\n");
    code.push_str("pub static CHARTS: &[(&str, &str)] = &[\n");
    for (name, content) in &charts {
        // Debug formatting yields a valid Rust string literal
        code.push_str(&format!("    ({:?}, {:?}),\n", name, content));
    }
    code.push_str("];\n");

    fs::write(&dest_path, code).unwrap();

    println!("cargo:rerun-if-changed=charts");
}
