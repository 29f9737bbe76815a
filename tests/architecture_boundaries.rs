use std::fs;
use std::path::Path;

/// A Rust source file under the crate root, path relative and `/`-separated.
struct SourceFile {
    path: String,
    content: String,
}

fn sources_under(dir: &str) -> Vec<SourceFile> {
    let crate_root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut pending = vec![crate_root.join(dir)];
    let mut files = Vec::new();

    while let Some(current) = pending.pop() {
        let Ok(entries) = fs::read_dir(&current) else {
            continue;
        };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            if path.extension().is_none_or(|ext| ext != "rs") {
                continue;
            }
            let relative = path.strip_prefix(crate_root).unwrap_or(&path);
            files.push(SourceFile {
                path: relative.to_string_lossy().replace('\\', "/"),
                content: fs::read_to_string(&path).unwrap_or_default(),
            });
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

fn mentions(files: &[SourceFile], needles: &[&str]) -> Vec<String> {
    files
        .iter()
        .flat_map(|file| {
            needles
                .iter()
                .filter(|needle| file.content.contains(**needle))
                .map(move |needle| format!("{} references `{}`", file.path, needle))
        })
        .collect()
}

#[test]
fn system_module_is_transport_agnostic() {
    let violations = mentions(
        &sources_under("src/system"),
        &["crate::server", "crate::console", "axum", "tower_http", "tokio::"],
    );

    assert!(
        violations.is_empty(),
        "System layering violations:\n{}",
        violations.join("\n")
    );
}

#[test]
fn sysinfo_is_scoped_to_system_module() {
    let violations: Vec<String> = mentions(&sources_under("src"), &["sysinfo::"])
        .into_iter()
        .filter(|v| !v.starts_with("src/system/"))
        .collect();

    assert!(
        violations.is_empty(),
        "Unexpected sysinfo usage:\n{}",
        violations.join("\n")
    );
}

#[test]
fn console_does_not_touch_http_stack() {
    let console: Vec<SourceFile> = sources_under("src")
        .into_iter()
        .filter(|f| f.path == "src/console.rs")
        .collect();
    assert_eq!(console.len(), 1, "src/console.rs not found");

    let violations = mentions(&console, &["axum", "tower_http", "TcpListener"]);

    assert!(
        violations.is_empty(),
        "Console/server boundary violations:\n{}",
        violations.join("\n")
    );
}
