// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=SNAPCAM_VERSION");

    // Packagers (flatpak, distro builds) pin the version explicitly
    let version = std::env::var("SNAPCAM_VERSION").unwrap_or_else(|_| {
        let pkg_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
        match short_commit() {
            Some(hash) => format!("{pkg_version}-{hash}"),
            None => pkg_version,
        }
    });

    println!("cargo::rustc-env=GIT_VERSION={version}");
}

/// Short hash of HEAD, or `None` outside a git checkout
fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty())
}
