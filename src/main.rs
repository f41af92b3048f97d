use anyhow::{bail, Context};
use instagram_publish::{AccessToken, CarouselItem, ClientConfig, InstagramClient, MediaSpec, MediaType};
use tokio_util::sync::CancellationToken;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

const USAGE: &str = "usage:
  instagram-publish token <authorization_code>
  instagram-publish me <access_token> <fields>
  instagram-publish publish <account_id> <access_token> <IMAGE|VIDEO|REELS|STORIES|CAROUSEL> <url>...";

#[derive(Debug, PartialEq)]
enum Command {
    Token {
        code: String,
    },
    Me {
        token: String,
        fields: String,
    },
    Publish {
        account_id: String,
        token: String,
        spec: MediaSpec,
    },
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["token", code] => Ok(Command::Token { code: code.to_string() }),
        ["me", token, fields] => Ok(Command::Me {
            token: token.to_string(),
            fields: fields.to_string(),
        }),
        ["publish", account_id, token, media_type, urls @ ..] if !urls.is_empty() => Ok(Command::Publish {
            account_id: account_id.to_string(),
            token: token.to_string(),
            spec: build_spec(media_type, urls)?,
        }),
        _ => bail!(USAGE),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let (credentials, config) = ClientConfig::from_env().context("Failed to load configuration")?;
    let client = InstagramClient::new(credentials, config).context("Failed to build client")?;

    match command {
        Command::Token { code } => {
            let payload = client.exchange_code_for_token(&code).await?;
            println!("{}", serde_json::Value::Object(payload));
        }
        Command::Me { token, fields } => {
            let profile = client.get_user_info(&AccessToken::new(token), &fields).await?;
            println!("{}", serde_json::Value::Object(profile));
        }
        Command::Publish {
            account_id,
            token,
            spec,
        } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling publish");
                    on_signal.cancel();
                }
            });

            let result = client
                .publish_media_with_cancel(&account_id, &AccessToken::new(token), &spec, &cancel)
                .await?;
            println!("{}", result.media_id);
        }
    }

    Ok(())
}
fn build_spec(media_type: &str, urls: &[&str]) -> anyhow::Result<MediaSpec> {
    let media_type: MediaType = media_type.parse()?;

    if media_type == MediaType::Carousel {
        let items = urls
            .iter()
            .map(|url| {
                let lower = url.to_ascii_lowercase();
                if lower.ends_with(".mp4") || lower.ends_with(".mov") {
                    CarouselItem::video(*url)
                } else {
                    CarouselItem::image(*url)
                }
            })
            .collect();
        return Ok(MediaSpec::Carousel { items, caption: None });
    }

    match urls {
        [url] => Ok(MediaSpec::single(*url, media_type)),
        _ => bail!("{} takes exactly one URL", media_type),
    }
}
