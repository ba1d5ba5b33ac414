use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=PACKAGE_VERSION");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs/heads");

    println!("cargo:rustc-env=BUILD_INFO={}", build_info());
}

/// Version string shown in the startup banner.
///
/// CI provides `PACKAGE_VERSION`; local builds fall back to the crate version
/// plus the short commit hash when git is available.
fn build_info() -> String {
    if let Ok(version) = std::env::var("PACKAGE_VERSION") {
        return format!("{}+ci", version);
    }

    let base = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    match git(&["rev-parse", "--short", "HEAD"]) {
        Some(hash) => {
            let dirty = Command::new("git")
                .args(["diff", "--quiet"])
                .status()
                .map(|status| !status.success())
                .unwrap_or(false);
            format!("{}+{}{}", base, hash, if dirty { "-dirty" } else { "" })
        }
        None => base,
    }
}

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
}
