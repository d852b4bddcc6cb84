// Copies the demo site in `static/` to `dist/` so `wasm-pack build --out-dir dist/pkg`
// produces a servable bundle.
use std::{env, path::Path};

use fs_extra::dir::{copy, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");

    let manifest = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into());
    let static_dir = Path::new(&manifest).join("static");
    if !static_dir.exists() {
        return;
    }

    let out_dir = Path::new(&manifest).join("dist");
    if let Err(err) = std::fs::create_dir_all(&out_dir) {
        println!("cargo:warning=could not create dist/: {err}");
        return;
    }

    let options = CopyOptions::new().overwrite(true).content_only(true);
    if let Err(err) = copy(&static_dir, &out_dir, &options) {
        println!("cargo:warning=copying static/ failed: {err}");
    }
}
