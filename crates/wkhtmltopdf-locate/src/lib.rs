//! # wkhtmltopdf-locate
//!
//! Find the [wkhtmltopdf](https://wkhtmltopdf.org/) executable and check that
//! it actually runs, so that callers can report a missing renderer as a
//! normal condition with install guidance instead of a spawn error deep in
//! their pipeline.
//!
//! ## How it works
//!
//! [`locate`] resolves the executable in this order:
//!
//! 1. `WKHTMLTOPDF_PATH`, if it points at an existing file.
//! 2. The first `wkhtmltopdf` (`wkhtmltopdf.exe` on Windows) on `PATH`.
//! 3. Well-known install locations for the current platform.
//!
//! [`probe`] then runs `<program> --version` and reports whether it exited
//! cleanly. It never returns an error.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wkhtmltopdf_locate::{install_hint, locate, probe};
//!
//! match locate() {
//!     Some(path) if probe(&path) => println!("renderer: {}", path.display()),
//!     _ => eprintln!("wkhtmltopdf is not installed.\n{}", install_hint()),
//! }
//! ```
//!
//! ## Platform support
//!
//! | OS      | Executable          | Extra search locations                        |
//! |---------|---------------------|-----------------------------------------------|
//! | Linux   | `wkhtmltopdf`       | `/usr/local/bin`, `/usr/bin`                  |
//! | macOS   | `wkhtmltopdf`       | `/usr/local/bin`, `/opt/homebrew/bin`         |
//! | Windows | `wkhtmltopdf.exe`   | `C:\Program Files\wkhtmltopdf\bin`            |
//!
//! ## Environment variable overrides
//!
//! - `WKHTMLTOPDF_PATH` — path to an existing wkhtmltopdf executable.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides executable discovery.
pub const PATH_ENV_VAR: &str = "WKHTMLTOPDF_PATH";

/// Bare program name, resolved through `PATH` by the OS when spawned.
pub const PROGRAM_NAME: &str = if cfg!(windows) {
    "wkhtmltopdf.exe"
} else {
    "wkhtmltopdf"
};

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by [`version`].
#[derive(Error, Debug)]
pub enum LocateError {
    /// The executable could not be spawned at all.
    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The executable ran but exited non-zero.
    #[error("'{program}' exited with status {code:?}")]
    Exit { program: PathBuf, code: Option<i32> },

    /// The executable exited cleanly but printed nothing recognisable.
    #[error("'{program}' printed no version string")]
    NoVersion { program: PathBuf },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

struct PlatformInfo {
    /// Directories searched after `PATH`.
    extra_dirs: &'static [&'static str],
    /// One-line install instruction for this platform.
    hint: &'static str,
}

const LINUX_HINT: &str = "  Ubuntu/Debian: sudo apt-get install -y wkhtmltopdf";
const MACOS_HINT: &str = "  macOS: brew install wkhtmltopdf";
const WINDOWS_HINT: &str = "  Windows: Download from https://wkhtmltopdf.org/downloads.html";

fn detect_platform() -> Option<PlatformInfo> {
    match std::env::consts::OS {
        "linux" => Some(PlatformInfo {
            extra_dirs: &["/usr/local/bin", "/usr/bin"],
            hint: LINUX_HINT,
        }),
        "macos" => Some(PlatformInfo {
            extra_dirs: &["/usr/local/bin", "/opt/homebrew/bin"],
            hint: MACOS_HINT,
        }),
        "windows" => Some(PlatformInfo {
            extra_dirs: &[
                r"C:\Program Files\wkhtmltopdf\bin",
                r"C:\Program Files (x86)\wkhtmltopdf\bin",
            ],
            hint: WINDOWS_HINT,
        }),
        _ => None,
    }
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Installation guidance for the current platform.
///
/// Falls back to the guidance for every supported platform when the OS is
/// not one of Linux, macOS or Windows.
pub fn install_hint() -> String {
    match detect_platform() {
        Some(info) => format!("Please install it:\n{}", info.hint),
        None => format!("Please install it:\n{LINUX_HINT}\n{MACOS_HINT}\n{WINDOWS_HINT}"),
    }
}

/// Resolve the wkhtmltopdf executable, or `None` if it cannot be found.
///
/// Only checks that a file exists; use [`probe`] to check that it runs.
pub fn locate() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(PATH_ENV_VAR) {
        let p = PathBuf::from(p);
        if p.is_file() {
            return Some(p);
        }
    }

    if let Some(path_var) = std::env::var_os("PATH") {
        if let Some(found) = search_dirs(std::env::split_paths(&path_var)) {
            return Some(found);
        }
    }

    let info = detect_platform()?;
    search_dirs(info.extra_dirs.iter().map(PathBuf::from))
}

/// Returns `true` when `program --version` exits with status 0.
///
/// A program that cannot be found or spawned is reported as `false`, not as
/// an error.
pub fn probe(program: impl AsRef<OsStr>) -> bool {
    Command::new(program.as_ref())
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Run `program --version` and return the first non-empty output line,
/// e.g. `wkhtmltopdf 0.12.6 (with patched qt)`.
pub fn version(program: impl AsRef<OsStr>) -> Result<String, LocateError> {
    let program = program.as_ref();
    let output = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .map_err(|source| LocateError::Spawn {
            program: PathBuf::from(program),
            source,
        })?;

    if !output.status.success() {
        return Err(LocateError::Exit {
            program: PathBuf::from(program),
            code: output.status.code(),
        });
    }

    parse_version(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        LocateError::NoVersion {
            program: PathBuf::from(program),
        }
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn search_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|d| d.join(PROGRAM_NAME))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn parse_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_missing_program_is_false() {
        assert!(!probe("/definitely/not/a/real/wkhtmltopdf"));
    }

    #[test]
    fn version_of_missing_program_is_spawn_error() {
        let err = version("/definitely/not/a/real/wkhtmltopdf").unwrap_err();
        assert!(matches!(err, LocateError::Spawn { .. }), "got: {err}");
    }

    #[test]
    fn install_hint_mentions_wkhtmltopdf() {
        let hint = install_hint();
        assert!(hint.starts_with("Please install it:"));
        assert!(hint.contains("wkhtmltopdf"));
    }

    #[test]
    fn parse_version_skips_blank_lines() {
        assert_eq!(
            parse_version("\n  wkhtmltopdf 0.12.6 (with patched qt)\n").as_deref(),
            Some("wkhtmltopdf 0.12.6 (with patched qt)")
        );
        assert_eq!(parse_version("   \n"), None);
    }

    #[test]
    fn search_dirs_ignores_missing_candidates() {
        let empty = tempfile::tempdir().unwrap();
        assert_eq!(search_dirs([empty.path().to_path_buf()]), None);
    }

    #[cfg(unix)]
    #[test]
    fn search_dirs_finds_executable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join(PROGRAM_NAME);
        std::fs::write(&exe, "#!/bin/sh\n").unwrap();

        // Not executable yet.
        assert_eq!(search_dirs([dir.path().to_path_buf()]), None);

        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(search_dirs([dir.path().to_path_buf()]), Some(exe));
    }

    #[test]
    fn platform_info_fields_nonempty() {
        if let Some(info) = detect_platform() {
            assert!(!info.extra_dirs.is_empty());
            assert!(info.hint.contains("wkhtmltopdf"));
        }
    }
}
