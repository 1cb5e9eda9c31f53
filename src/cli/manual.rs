use eyre::{Result, bail};

use crate::{
    config::Config,
    context::RoverContext,
    dispatcher::Dispatcher,
    hardware::{MoveOutcome, Zone},
    speech::{Emotion, Speaker},
};

/// Moves to a zone given by name or by story choice (`spend`, `save`, `invest`).
pub async fn move_to_zone(config: &Config, zone: &str) -> Result<()> {
    let zone = zone_for(zone);

    let context = RoverContext::connect(config).await;
    let dispatcher = Dispatcher::new(config, context);

    match dispatcher.move_to_zone(&zone).await {
        MoveOutcome::Moved => Ok(()),
        outcome => bail!("Movement to {zone} did not happen ({outcome})"),
    }
}

pub async fn say(config: &Config, text: &str, emotion: Emotion) -> Result<()> {
    let context = RoverContext::speech_only(config);
    let speaker = Speaker::new(
        context.synth,
        context.player,
        config.speech.scratch_path.clone(),
    );

    if !speaker.speak(text, emotion).await {
        bail!("Nothing was spoken");
    }

    Ok(())
}

fn zone_for(name: &str) -> String {
    match Zone::from_choice(name) {
        Some(zone) => zone.to_string(),
        None => name.to_owned(),
    }
}
