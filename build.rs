use std::{env, path::PathBuf};

// ffmpeg-sys-next finds FFmpeg through pkg-config on Unix. On Windows it
// needs FFMPEG_DIR, which is easy to miss when FFmpeg came from vcpkg.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows")
        || env::var_os("FFMPEG_DIR").is_some()
    {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!("cargo:warning=FFMPEG_DIR is not set; point it at an FFmpeg install to build vid2frames on Windows.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.is_dir() {
        println!(
            "cargo:warning=FFMPEG_DIR is not set; found a vcpkg FFmpeg at {}, set FFMPEG_DIR to it.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=FFMPEG_DIR is not set and no vcpkg FFmpeg exists at {}.",
            candidate.display()
        );
    }
}
