use std::env;

fn main() {
    let version =
        env::var("APP_VERSION").unwrap_or_else(|_| env::var("CARGO_PKG_VERSION").unwrap());
    println!("cargo:rerun-if-env-changed=APP_VERSION");
    println!("cargo:rustc-env=APP_VERSION={version}");
}
