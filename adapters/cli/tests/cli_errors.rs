use std::{fs, path::PathBuf, process::Command};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("civitas-errors-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch directory");
    dir
}

fn civitas_stderr(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_civitas"))
        .args(args)
        .output()
        .expect("failed to run civitas");
    assert!(!output.status.success(), "civitas {args:?} should fail");
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn unknown_glyphs_name_the_offending_tile() {
    let dir = scratch_dir("glyph");
    let map = dir.join("city.txt");
    fs::write(&map, "..\n.?\n").expect("write map");

    let stderr = civitas_stderr(&["--map", map.to_str().expect("utf-8 path"), "stats"]);
    assert!(stderr.contains("failed to parse map layout"), "{stderr}");
    assert!(stderr.contains("unknown tile glyph '?' at column 1, row 1"), "{stderr}");
}

#[test]
fn truncated_state_files_are_rejected() {
    let dir = scratch_dir("state");
    let map = dir.join("city.txt");
    let state = dir.join("routing.bin");
    fs::write(&map, "...\n").expect("write map");
    fs::write(&state, [0_u8; 5]).expect("write state");

    let stderr = civitas_stderr(&[
        "--map",
        map.to_str().expect("utf-8 path"),
        "--state",
        state.to_str().expect("utf-8 path"),
        "stats",
    ]);
    assert!(stderr.contains("failed to restore router state"), "{stderr}");
    assert!(stderr.contains("router state needs 16 bytes, found 5"), "{stderr}");
}
