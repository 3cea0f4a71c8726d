use std::fs;
use std::io::Write;
use std::path::Path;

pub static TESTS_DIR: &str = "tests/files";
pub static SCHED_EXT: &str = "sched";

fn gentests(testdir: &str, ext: &str, target: &Path) {
    let mut f = fs::File::create(target).unwrap();
    // Open reference test directory
    let dir = fs::read_dir(testdir).unwrap();

    for e in dir {
        let p = e.as_ref().unwrap().path();
        let n = p.file_stem().unwrap().to_str().unwrap();
        //
        if p.extension().map(|x| x == ext).unwrap_or(false) {
            writeln!(f).unwrap();
            writeln!(f, "#[test]").unwrap();
            writeln!(f, "fn test_{n}() {{ check(\"{n}\"); }}").unwrap();
        }
    }
}

/// The purpose of this script is to generate one test per scheduling
/// problem under `tests/files`.
fn main() {
    let out_dir = std::env::var("OUT_DIR").unwrap();
    let sched_file = std::path::Path::new(&out_dir).join("sched_tests.rs");
    gentests(TESTS_DIR, SCHED_EXT, &sched_file);
    println!("cargo:rerun-if-changed={TESTS_DIR}");
}
