use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Each board brings its own memory layout. Host builds (unit tests) have
    // no board feature enabled and skip the linker plumbing entirely.
    let memory = if env::var_os("CARGO_FEATURE_BOARD_PICO").is_some() {
        "memory-pico.x"
    } else if env::var_os("CARGO_FEATURE_BOARD_FEATHER_F405").is_some() {
        "memory-feather-f405.x"
    } else {
        return;
    };

    // Copy the selected layout to OUT_DIR as the `memory.x` that `link.x`
    // includes, and add the output directory to the linker search path.
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("memory.x");
    fs::copy(memory, &dest_path).unwrap();
    println!("cargo:rustc-link-search={}", out_dir);
    println!("cargo:rerun-if-changed={}", memory);

    // Set linker flags for all binaries
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");

    // Only link defmt when RTT logging is enabled
    if env::var_os("CARGO_FEATURE_DEBUG").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }
}
