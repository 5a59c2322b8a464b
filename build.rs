// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    // Re-run build script if git HEAD changes
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=FRAME_POSTFX_VERSION");

    // Packagers can pin the version string explicitly
    let version = match std::env::var("FRAME_POSTFX_VERSION") {
        Ok(v) => v,
        Err(_) => describe_version(),
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn describe_version() -> String {
    let package_version = env_or_unknown("CARGO_PKG_VERSION");

    // "v0.1.0" at a tag, "v0.1.0-5-gabcdef1" after it, bare hash without tags
    let described = git(&["describe", "--tags", "--always", "--match", "v*"]);
    let commit = git(&["rev-parse", "--short", "HEAD"]);

    match (described, commit) {
        (Some(described), _) if described.contains('-') => {
            let described = described.strip_prefix('v').unwrap_or(&described);
            let parts: Vec<&str> = described.rsplitn(3, '-').collect();
            match parts.as_slice() {
                [hash, _, base] => {
                    let hash = hash.strip_prefix('g').unwrap_or(hash);
                    format!("{}-dirty-{}", base, hash)
                }
                _ => described.to_string(),
            }
        }
        (Some(described), Some(commit)) if described.starts_with('v') => {
            format!("{}-{}", &described[1..], commit)
        }
        (_, Some(commit)) => format!("{}-{}", package_version, commit),
        (_, None) => package_version,
    }
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}

fn env_or_unknown(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| "unknown".to_string())
}
