use std::process::Command;
use chrono::Local;

fn main() {
    // `git describe` gives the tag-relative name when tags exist, else the short hash
    let described = Command::new("git")
        .args(["describe", "--always", "--tags", "--dirty"])
        .output();

    let build_hash = match described {
        Ok(output) if output.status.success() => {
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if name.ends_with("-dirty") {
                // Dirty builds also get a timestamp so two of them can be told apart
                format!("{}-{}", name, Local::now().format("%Y%m%d-%H%M%S"))
            } else {
                name
            }
        }
        _ => "unknown".to_string(),
    };

    println!("cargo:rustc-env=BUILD_HASH={}", build_hash);

    // .git is at workspace root, two levels up from this crate
    println!("cargo:rerun-if-changed=../../.git/HEAD");
    println!("cargo:rerun-if-changed=../../.git/index");
    println!("cargo:rerun-if-changed=../../.git/refs/tags");
}
