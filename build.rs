use std::env::var;

const FORWARDED_ENV: [&str; 2] = ["CARGO_CFG_TARGET_ARCH", "CARGO_CFG_TARGET_OS"];

fn main() {
    for env in FORWARDED_ENV {
        if let Ok(value) = var(env) {
            println!("cargo:rustc-env=STORYROVER_{}={}", env, value);
        }
    }
}
