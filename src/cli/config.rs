use eyre::Result;

use crate::config::{API_KEY_VAR, Config};

pub fn print(config: &Config) -> Result<()> {
    println!("{config}\n");
    println!("{}", serde_yaml::to_string(config)?);

    let credential = match config.speech.api_key {
        Some(_) => "set",
        None => "not set",
    };

    println!("{API_KEY_VAR}: {credential}");
    Ok(())
}
