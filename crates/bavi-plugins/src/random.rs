//! `.choose a, b, c` (alias `.pick`): picks one item at random.

use rand::seq::SliceRandom;

use bavi_framework::prelude::*;

register_plugin! {
    pub static RANDOM = PluginDescriptor::new("random", init)
        .with_desc("Picks one of several choices");
}

/// Separators tried in order; the first that splits the input wins.
const SEPARATORS: [char; 4] = [',', '|', '/', '\\'];

fn init(bot: &mut Bot, _config: &PluginConfig) -> Result<(), BoxError> {
    bot.add_command("choose", choose, &["pick"])?;
    Ok(())
}

async fn choose(ctx: CommandContext) -> HandlerResult {
    let items = split_choices(&ctx.args);

    let response = if items.len() > 1 {
        let picked = items
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default();
        format!("Your choices: {}, I chose: {picked}.", items.join(", "))
    } else {
        "You need to give me more than one thing to choose!".to_string()
    };

    ctx.reply(&response).await?;
    Ok(())
}

/// Splits on the first separator that yields more than one item, trimming
/// each item.
///
/// Input without any separator comes back as a single item.
pub fn split_choices(text: &str) -> Vec<&str> {
    SEPARATORS
        .iter()
        .map(|sep| text.split(*sep).collect::<Vec<_>>())
        .find(|items| items.len() > 1)
        .unwrap_or_else(|| vec![text])
        .into_iter()
        .map(str::trim)
        .collect()
}
