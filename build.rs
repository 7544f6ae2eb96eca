use std::env;
use std::path::PathBuf;

// Windows-only build hints: ffmpeg-sys-next finds FFmpeg through pkg-config
// on Unix, but on Windows it needs FFMPEG_DIR or a vcpkg install. Emit
// warnings that point at the likely fix instead of failing with a linker
// error later.
fn main() {
    for variable in [
        "FFMPEG_DIR",
        "VCPKG_ROOT",
        "VCPKGRS_DYNAMIC",
        "VCPKGRS_TRIPLET",
    ] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let on_windows = env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("windows");
    if !on_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    match vcpkg_ffmpeg_dir() {
        None => {
            println!(
                "cargo:warning=FFMPEG_DIR is not set. On Windows, install FFmpeg via vcpkg and set VCPKG_ROOT + FFMPEG_DIR for reliable builds."
            );
        }
        Some(dir) if dir.exists() => {
            println!(
                "cargo:warning=Found a vcpkg FFmpeg install at {0}. Set FFMPEG_DIR={0} to make ffmpeg-sys-next discovery explicit.",
                dir.display(),
            );
            if env::var_os("VCPKGRS_DYNAMIC").is_none() {
                println!(
                    "cargo:warning=Dynamic vcpkg FFmpeg builds also need VCPKGRS_DYNAMIC=1."
                );
            }
        }
        Some(dir) => {
            println!(
                "cargo:warning=VCPKG_ROOT is set but no FFmpeg install was found at {}.",
                dir.display(),
            );
        }
    }
}

fn vcpkg_ffmpeg_dir() -> Option<PathBuf> {
    let root = env::var("VCPKG_ROOT").ok()?;
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    Some(PathBuf::from(root).join("installed").join(triplet))
}
