//! Per-user time zones.
//!
//! - `.settz <zone>` remembers the sender's IANA zone.
//! - `.time` shows the time in the sender's zone, `.time <nick>` in another
//!   user's, and `.time <zone>` in the given zone.
//!
//! Nicks are stored lowercased with IRC case mapping, so `.time OThER` finds
//! the zone `other` set.

use chrono::Utc;
use chrono_tz::Tz;
use tracing::debug;

use bavi_core::irc_to_lower;
use bavi_framework::prelude::*;
use bavi_framework::rusqlite::{OptionalExtension, params};

register_plugin! {
    pub static TZ = PluginDescriptor::new("tz", init)
        .with_desc("Remembers time zones and tells the time");
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

fn init(bot: &mut Bot, _config: &PluginConfig) -> Result<(), BoxError> {
    let storage = bot
        .storage()
        .cloned()
        .ok_or("the tz plugin needs a storage handle")?;

    storage.with_connection(|conn| {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tz_info (
                 nick TEXT PRIMARY KEY,
                 tz TEXT NOT NULL,
                 created_at DATETIME,
                 updated_at DATETIME
             )",
        )
    })?;
    storage.create_audit_triggers("tz_info", "nick")?;

    let settz_storage = storage.clone();
    bot.add_command(
        "settz",
        move |ctx: CommandContext| set_tz(settz_storage.clone(), ctx),
        &[],
    )?;
    bot.add_command(
        "time",
        move |ctx: CommandContext| time(storage.clone(), ctx),
        &[],
    )?;
    Ok(())
}

async fn set_tz(storage: Storage, ctx: CommandContext) -> HandlerResult {
    let zone = ctx.args.trim();

    if zone.is_empty() {
        ctx.reply("Give me a timezone, for example .settz America/Los_Angeles")
            .await?;
        return Ok(());
    }
    let Ok(tz) = zone.parse::<Tz>() else {
        ctx.reply("I don't know about that timezone").await?;
        return Ok(());
    };

    let nick = irc_to_lower(&ctx.source.nick);
    storage.with_connection(|conn| {
        conn.execute(
            "INSERT INTO tz_info (nick, tz) VALUES (?1, ?2)
             ON CONFLICT(nick) DO UPDATE SET tz = excluded.tz",
            params![nick, tz.name()],
        )
    })?;
    debug!(nick = %nick, tz = tz.name(), "Stored time zone");

    ctx.reply(&format!("Your timezone has been set to {}", tz.name()))
        .await?;
    Ok(())
}

async fn time(storage: Storage, ctx: CommandContext) -> HandlerResult {
    let arg = match ctx.args.trim() {
        "" => ctx.source.nick.as_str(),
        arg => arg,
    };

    // '/' never appears in a nick, so such an argument must be a zone.
    let tz = if arg.contains('/') || arg.parse::<Tz>().is_ok() {
        match arg.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                ctx.reply("I don't know about that timezone.").await?;
                return Ok(());
            }
        }
    } else {
        let nick = irc_to_lower(arg);
        match lookup(&storage, &nick)? {
            Some(tz) => tz,
            None => {
                ctx.reply(&format!("I don't know {nick}'s timezone.")).await?;
                return Ok(());
            }
        }
    };

    ctx.say(&format!(
        "Current time in {} is: {}",
        tz.name(),
        Utc::now().with_timezone(&tz).format(TIME_FORMAT)
    ))
    .await?;
    Ok(())
}

/// The stored zone for an already lowercased nick.
fn lookup(storage: &Storage, nick: &str) -> Result<Option<Tz>, HandlerError> {
    let stored: Option<String> = storage.with_connection(|conn| {
        conn.query_row("SELECT tz FROM tz_info WHERE nick = ?1", [nick], |row| {
            row.get(0)
        })
        .optional()
    })?;

    stored
        .map(|name| name.parse::<Tz>())
        .transpose()
        .map_err(HandlerError::tagged("InvalidTimezone"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bavi_core::testing::RecordingConnection;
    use bavi_core::{InboundMessage, Source};
    use bavi_framework::Dispatcher;

    struct Harness {
        conn: Arc<RecordingConnection>,
        storage: Storage,
        dispatcher: Dispatcher,
    }

    impl Harness {
        fn new() -> Self {
            let conn = Arc::new(RecordingConnection::new("TestBot", ["#test"]));
            let storage = Storage::in_memory().unwrap();
            let mut bot = Bot::new(conn.clone()).with_storage(storage.clone());
            init(&mut bot, &PluginConfig::default()).unwrap();
            Self {
                conn,
                storage,
                dispatcher: Dispatcher::new(bot),
            }
        }

        async fn send(&self, nick: &str, text: &str) -> String {
            self.dispatcher
                .dispatch(InboundMessage::new(Source::new(nick), "#test", text))
                .await;
            self.conn.last().unwrap().1
        }

        fn stored(&self, nick: &str) -> Option<String> {
            self.storage
                .with_connection(|conn| {
                    conn.query_row("SELECT tz FROM tz_info WHERE nick = ?1", [nick], |row| {
                        row.get(0)
                    })
                    .optional()
                })
                .unwrap()
        }
    }

    #[test]
    fn test_init_requires_storage() {
        let conn = Arc::new(RecordingConnection::new("TestBot", ["#test"]));
        let mut bot = Bot::new(conn);
        assert!(init(&mut bot, &PluginConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_settz_create_and_update() {
        let h = Harness::new();

        assert_eq!(
            h.send("test", ".settz America/Chicago").await,
            "test: Your timezone has been set to America/Chicago"
        );
        assert_eq!(h.stored("test").as_deref(), Some("America/Chicago"));

        assert_eq!(
            h.send("test", ".settz America/New_York").await,
            "test: Your timezone has been set to America/New_York"
        );
        assert_eq!(h.stored("test").as_deref(), Some("America/New_York"));
    }

    #[tokio::test]
    async fn test_settz_stamps_audit_columns() {
        let h = Harness::new();
        h.send("test", ".settz UTC").await;

        let (created, updated): (Option<String>, Option<String>) = h
            .storage
            .with_connection(|conn| {
                conn.query_row(
                    "SELECT created_at, updated_at FROM tz_info WHERE nick = 'test'",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .unwrap();
        assert!(created.is_some());
        assert!(updated.is_some());
    }

    #[tokio::test]
    async fn test_settz_invalid_or_missing() {
        let h = Harness::new();

        assert_eq!(
            h.send("test", ".settz NotA/RealTimezone").await,
            "test: I don't know about that timezone"
        );
        assert_eq!(
            h.send("test", ".settz").await,
            "test: Give me a timezone, for example .settz America/Los_Angeles"
        );
        assert_eq!(h.stored("test"), None);
    }

    #[tokio::test]
    async fn test_time_for_self_and_other() {
        let h = Harness::new();
        h.send("other", ".settz America/Chicago").await;

        assert!(
            h.send("other", ".time")
                .await
                .starts_with("Current time in America/Chicago is: ")
        );
        assert!(
            h.send("test", ".time OThER")
                .await
                .starts_with("Current time in America/Chicago is: ")
        );
    }

    #[tokio::test]
    async fn test_time_unknown_nick() {
        let h = Harness::new();
        assert_eq!(
            h.send("test", ".time Other").await,
            "test: I don't know other's timezone."
        );
    }

    #[tokio::test]
    async fn test_time_in_zone() {
        let h = Harness::new();

        assert!(
            h.send("test", ".time America/New_York")
                .await
                .starts_with("Current time in America/New_York is: ")
        );
        assert!(
            h.send("test", ".time UTC")
                .await
                .starts_with("Current time in UTC is: ")
        );
        assert_eq!(
            h.send("test", ".time NotA/Timezone").await,
            "test: I don't know about that timezone."
        );
    }
}
