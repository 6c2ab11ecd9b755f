//! Stages the weight file for the `embedded_nnue` feature.
//!
//! The blob comes from `EVAL_CORE_NET` if set, else from
//! `src/nnue/nets/default.nnue`. A blob of the wrong size fails the build;
//! a missing one builds a crate whose embedded network reports `Missing`.

use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

const NETWORK_BYTES: u64 = 197_440;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rustc-check-cfg=cfg(embedded_net)");
    println!("cargo:rerun-if-env-changed=EVAL_CORE_NET");

    if env::var_os("CARGO_FEATURE_EMBEDDED_NNUE").is_none() {
        return Ok(());
    }

    let source = match env::var_os("EVAL_CORE_NET") {
        Some(path) => PathBuf::from(path),
        None => Path::new(&env::var("CARGO_MANIFEST_DIR")?).join("src/nnue/nets/default.nnue"),
    };
    println!("cargo:rerun-if-changed={}", source.display());

    let Ok(meta) = fs::metadata(&source) else {
        println!(
            "cargo:warning=no network at {}, Network::embedded() will report Missing",
            source.display()
        );
        return Ok(());
    };
    assert_eq!(
        meta.len(),
        NETWORK_BYTES,
        "{} is not a valid network blob",
        source.display()
    );

    let dest = Path::new(&env::var("OUT_DIR")?).join("embedded.nnue");
    fs::copy(&source, dest)?;
    println!("cargo:rustc-cfg=embedded_net");
    Ok(())
}
