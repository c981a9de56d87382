use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode, time::Duration};

use anyhow::{anyhow, bail};
use clap::Parser;
use fake_user_agent::get_chrome_rua;
use log::LevelFilter;
use reqwest::ClientBuilder;
use scws::{
    config::{DEFAULT_CONTENT_HOST, DEFAULT_IP_ECHO_URL, DEFAULT_KEY_URL, DEFAULT_VIDEO_HOST},
    merge::{write_output, write_playlist},
    HttpClient, ServiceConfig, Session, SessionRef, TitleRef,
};

#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct ScwsArgs {
    /// Streaming site url, e.g. https://example.tld
    #[clap(short, long)]
    url: String,

    /// Name of the movie or series to search for
    #[clap(short, long)]
    movie: String,

    /// Season to download, starts from 1
    #[clap(short, long)]
    season: Option<NonZeroUsize>,

    /// Episode to download, starts from 1
    #[clap(short, long)]
    episode: Option<NonZeroUsize>,

    /// Max number of titles loaded from search results
    #[clap(long, default_value = "3")]
    max_search_results: usize,

    /// Index of the title to download if multiple results are found
    #[clap(long, alias = "index")]
    movie_index: Option<usize>,

    /// Output file path
    #[clap(short, long)]
    output: PathBuf,

    /// Export the playlist instead of downloading the video
    #[clap(long)]
    playlist: bool,

    /// Debug output
    #[clap(long, alias = "debug")]
    verbose: bool,

    /// HTTP timeout, in seconds
    #[clap(short, long, default_value = "60")]
    timeout: u64,

    /// Cookies sent to the streaming site, e.g. "name=value"
    #[clap(long = "cookie")]
    cookies: Vec<String>,

    /// Host serving video metadata
    #[clap(long, env = "SCWS_VIDEO_HOST", default_value = DEFAULT_VIDEO_HOST)]
    video_host: String,

    /// Url of the stream decryption key
    #[clap(long, env = "SCWS_KEY_URL", default_value = DEFAULT_KEY_URL)]
    key_url: String,

    /// Endpoint echoing the public IP, used to sign requests
    #[clap(long, env = "SCWS_IP_ECHO_URL", default_value = DEFAULT_IP_ECHO_URL)]
    ip_echo_url: String,

    /// Domain of the CDN proxies
    #[clap(long, env = "SCWS_CONTENT_HOST", default_value = DEFAULT_CONTENT_HOST)]
    content_host: String,

    /// Secret to sign manifest requests with. Uses the token of the player page if unset.
    #[clap(long, env = "SCWS_SHARED_SECRET", hide_env_values = true)]
    shared_secret: Option<String>,
}

impl ScwsArgs {
    fn client(&self) -> anyhow::Result<HttpClient> {
        let builder = ClientBuilder::new()
            .user_agent(get_chrome_rua())
            .timeout(Duration::from_secs(self.timeout));
        Ok(HttpClient::new(builder)?)
    }

    fn service_config(&self) -> anyhow::Result<ServiceConfig> {
        if !self.url.starts_with("https://") {
            print_examples();
            bail!("invalid url: {}", self.url);
        }

        Ok(ServiceConfig::new(&self.url)?
            .with_video_host(&self.video_host)?
            .with_key_url(&self.key_url)?
            .with_ip_echo_url(&self.ip_echo_url)?
            .with_content_host(self.content_host.clone())
            .with_shared_secret(self.shared_secret.clone()))
    }

    fn selection(&self) -> SessionRef {
        SessionRef {
            season: self.season.map(|s| s.get() - 1),
            episode: self.episode.map(|e| e.get() - 1),
        }
    }

    /// Picks a title, or lists the candidates when the choice is ambiguous.
    fn choose<'a>(&self, titles: &'a [TitleRef]) -> anyhow::Result<Option<&'a TitleRef>> {
        match self.movie_index {
            Some(index) => titles.get(index).map(Some).ok_or_else(|| {
                anyhow!(
                    "movie index {index} out of range, {} title(s) found",
                    titles.len()
                )
            }),
            None if titles.len() > 1 => {
                for (index, title) in titles.iter().enumerate() {
                    if title.is_series() {
                        println!("{index}. {} ({} seasons)", title.name, title.seasons.len());
                    } else {
                        println!("{index}. {}", title.name);
                    }
                }
                println!(
                    "now take the index of the title you prefer and restart the program adding: --movie-index <chosen-index>"
                );
                Ok(None)
            }
            None => Ok(titles.first()),
        }
    }
}

fn print_examples() {
    println!("EXAMPLES:");
    println!(
        r#"  scws-dl --url "https://example.tld" --movie "rick and morty" --season 1 --episode 3 --output episode.mp4"#
    );
    println!(r#"  scws-dl --url "https://example.tld" --movie "Enola Holmes 2" --output movie.mp4"#);
}

async fn run(args: ScwsArgs) -> anyhow::Result<()> {
    let config = args.service_config()?;
    let client = args.client()?;
    if !args.cookies.is_empty() {
        client.add_cookies(args.cookies.clone(), config.site_url.clone())?;
    }
    let session = Session::new(client, config);

    let titles = session
        .catalog()
        .search(&args.movie, args.max_search_results)
        .await?;
    if titles.is_empty() {
        println!("0 titles found");
        println!(
            "if you cannot find your title, try to increase the max search results number: --max-search-results <number>"
        );
        return Ok(());
    }
    let Some(title) = args.choose(&titles)? else {
        return Ok(());
    };

    let selection = args.selection();
    if args.playlist {
        log::info!("Getting the playlist of {}...", title.name);
        let playlist = session.playlist(title, &selection).await?;
        write_playlist(&args.output, playlist).await?;
    } else {
        log::info!("Downloading {}...", title.name);
        let data = session.download(title, &selection).await?;
        write_output(&args.output, &data).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = ScwsArgs::parse();
    pretty_env_logger::formatted_builder()
        .filter_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!("try --verbose to discover more");
            ExitCode::FAILURE
        }
    }
}
