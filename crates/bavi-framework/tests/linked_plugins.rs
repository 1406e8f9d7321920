//! Plugins declared with `register_plugin!` are discovered by the loader.

use std::sync::Arc;

use bavi_core::testing::RecordingConnection;
use bavi_core::{InboundMessage, Source};
use bavi_framework::prelude::*;
use bavi_framework::{Dispatcher, PluginLoader};

register_plugin! {
    pub static ALPHA = PluginDescriptor::new("alpha", alpha).with_version("1.0.0");
}

register_plugin! {
    pub static BETA = PluginDescriptor::new("beta", beta);
}

fn alpha(bot: &mut Bot, config: &PluginConfig) -> Result<(), BoxError> {
    let greeting = config
        .raw()
        .get("greeting")
        .and_then(|v| v.as_str())
        .unwrap_or("hello")
        .to_string();
    bot.add_command(
        "greet",
        move |ctx: CommandContext| {
            let greeting = greeting.clone();
            async move {
                ctx.reply(&greeting).await?;
                Ok::<_, HandlerError>(())
            }
        },
        &[],
    )?;
    Ok(())
}

fn beta(_bot: &mut Bot, _config: &PluginConfig) -> Result<(), BoxError> {
    Err("beta is unhappy".into())
}

#[test]
fn test_discover_is_sorted() {
    let names: Vec<_> = PluginLoader::discover().iter().map(|p| p.name).collect();
    assert_eq!(names, ["alpha", "beta"]);
}

#[tokio::test]
async fn test_load_all_with_config() {
    let conn = Arc::new(RecordingConnection::new("TestBot", ["#test"]));
    let mut bot = Bot::new(conn.clone());

    let report = PluginLoader::new()
        .with_configs(
            [("alpha".to_string(), serde_json::json!({ "greeting": "howdy" }))]
                .into_iter()
                .collect(),
        )
        .load_all(&mut bot);
    assert_eq!(report.loaded(), ["alpha"]);
    assert_eq!(report.failed(), ["beta"]);

    let dispatcher = Dispatcher::new(bot);
    dispatcher
        .dispatch(InboundMessage::new(Source::new("ann"), "#test", ".greet"))
        .await;
    assert_eq!(conn.last(), Some(("#test".to_string(), "ann: howdy".to_string())));
}
