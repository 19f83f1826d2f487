use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

mod anify;
mod extractor;
mod filters;
mod player;
mod prefs;
mod resolvers;
mod ui;
mod utils;

use anify::Anify;
use filters::{FilterSelection, Order, Status};
use prefs::UserPreference;
use ui::select_from_list;

#[derive(Parser)]
#[command(name = "anifyrust", version, about = "Anime CLI em Rust para o anify.to")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Anime search query
    query: Option<String>,

    /// Preferred video quality (1080p, 720p, 480p, 360p)
    #[arg(short, long)]
    quality: Option<String>,

    /// Preferred server (CDN, Filemoon, Doodstream)
    #[arg(short, long)]
    server: Option<String>,

    /// Prefer dubbed audio
    #[arg(long)]
    dub: bool,

    /// Episode number to play
    #[arg(short, long)]
    episode: Option<f32>,

    /// Browse popular anime instead of searching
    #[arg(long)]
    popular: bool,

    /// Browse ongoing anime instead of searching
    #[arg(long)]
    latest: bool,

    /// Pick the video source from a menu instead of the ranked first
    #[arg(long)]
    choose: bool,

    /// Filter by genre (repeatable)
    #[arg(long)]
    genre: Vec<String>,

    /// Filter by score bracket (repeatable)
    #[arg(long)]
    score: Vec<String>,

    /// Filter by year (repeatable)
    #[arg(long)]
    year: Vec<String>,

    /// Filter by content rating (repeatable)
    #[arg(long)]
    rating: Vec<String>,

    /// Filter by airing status (ongoing, completed)
    #[arg(long)]
    status: Option<String>,

    /// Result ordering (nameaz, nameza, datenewold, dateoldnew, score, mostwatched)
    #[arg(long)]
    order: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Save default preferences
    Prefs {
        /// Preferred video quality
        #[arg(long)]
        quality: Option<String>,

        /// Preferred server
        #[arg(long)]
        server: Option<String>,

        /// Preferred audio type (Sub, Dub)
        #[arg(long = "type")]
        audio_type: Option<String>,

        /// Preferred title language (data-en, data-jp)
        #[arg(long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Prefs {
        quality,
        server,
        audio_type,
        lang,
    }) = &cli.command
    {
        return save_prefs(quality, server, audio_type, lang);
    }

    // Load saved preferences and apply the session overrides
    let mut prefs = UserPreference::load()?;
    if let Some(quality) = &cli.quality {
        prefs.preferred_quality = validate_entry(quality, prefs::QUALITY_ENTRIES)?;
    }
    if let Some(server) = &cli.server {
        prefs.preferred_server = validate_entry(server, prefs::SERVER_ENTRIES)?;
    }
    if cli.dub {
        prefs.preferred_type = "Dub".to_string();
    }

    let site = Anify::new()?;

    // Browse listings or search
    let results = if cli.popular {
        println!("Buscando animes populares...");
        site.popular_anime(&prefs).await?
    } else if cli.latest {
        println!("Buscando animes em exibição...");
        site.latest_anime(&prefs).await?
    } else {
        let query = match &cli.query {
            Some(q) => q.clone(),
            None => ui::prompt_input("Digite o nome do anime")?,
        };

        println!("Buscando: {}", query);
        let selection = build_selection(&cli)?;
        let page = site.search_anime(&query, 1, &selection, &prefs).await?;
        page.items
    };

    if results.is_empty() {
        return Err(anyhow!("Nenhum anime encontrado"));
    }

    // Display results and let user select
    let titles: Vec<String> = results.iter().map(|anime| anime.title.clone()).collect();
    let selected_index = select_from_list(&titles, "Selecione o anime")?;
    let selected_anime = &results[selected_index];

    let details = site.anime_details(&selected_anime.url, &prefs).await?;
    println!("\n{}", details.title);
    if !details.genres.is_empty() {
        println!("Gêneros: {}", details.genres);
    }
    if !details.description.is_empty() {
        println!("{}\n", details.description);
    }

    // Get episodes
    let episodes = site.episode_list(&selected_anime.url).await?;
    if episodes.is_empty() {
        return Err(anyhow!("Nenhum episódio encontrado para: {}", details.title));
    }

    // Let user select episode or use provided episode number
    let episode_index = match cli.episode {
        Some(number) => episodes
            .iter()
            .position(|ep| ep.number == number)
            .ok_or_else(|| {
                anyhow!(
                    "Episódio {} não disponível. Total de episódios: {}",
                    number,
                    episodes.len()
                )
            })?,
        None => {
            let episode_names: Vec<String> =
                episodes.iter().map(|ep| ep.name.clone()).collect();
            select_from_list(&episode_names, "Selecione o episódio")?
        }
    };

    let selected_episode = &episodes[episode_index];
    println!("Selecionado: {}", selected_episode.name);

    // Resolve video sources
    let videos = site
        .episode_videos(&selected_episode.url, &prefs)
        .await
        .with_context(|| format!("Falha ao resolver vídeos de {}", selected_episode.name))?;

    let video = if cli.choose {
        let labels: Vec<String> = videos.iter().map(|v| v.label.clone()).collect();
        let index = select_from_list(&labels, "Selecione a fonte de vídeo")?;
        &videos[index]
    } else {
        // A ordenação já colocou a melhor fonte em primeiro
        &videos[0]
    };

    println!("Reproduzindo: {}", video.label);
    player::play_with_mpv(&video.url, anify::BASE_URL)?;

    Ok(())
}

// Monta a seleção de filtros a partir das flags da CLI
fn build_selection(cli: &Cli) -> Result<FilterSelection> {
    let mut selection = FilterSelection::default();
    for genre in &cli.genre {
        selection.genres.push(filters::lookup(filters::GENRES, genre)?);
    }
    for score in &cli.score {
        selection.score.push(filters::lookup(filters::SCORES, score)?);
    }
    for year in &cli.year {
        selection.years.push(filters::lookup(filters::YEARS, year)?);
    }
    for rating in &cli.rating {
        selection
            .ratings
            .push(filters::lookup(filters::RATINGS, rating)?);
    }
    if let Some(status) = &cli.status {
        selection.status = Status::parse(status)?;
    }
    if let Some(order) = &cli.order {
        selection.order = Order::parse(order)?;
    }
    Ok(selection)
}

fn save_prefs(
    quality: &Option<String>,
    server: &Option<String>,
    audio_type: &Option<String>,
    lang: &Option<String>,
) -> Result<()> {
    let mut prefs = UserPreference::load()?;
    if let Some(quality) = quality {
        prefs.preferred_quality = validate_entry(quality, prefs::QUALITY_ENTRIES)?;
    }
    if let Some(server) = server {
        prefs.preferred_server = validate_entry(server, prefs::SERVER_ENTRIES)?;
    }
    if let Some(audio_type) = audio_type {
        prefs.preferred_type = validate_entry(audio_type, prefs::TYPE_ENTRIES)?;
    }
    if let Some(lang) = lang {
        prefs.preferred_lang = validate_entry(lang, prefs::LANG_ENTRIES)?;
    }
    prefs.save()?;
    println!("Preferências salvas");
    Ok(())
}

// Normaliza para a grafia canônica da tabela, sem diferenciar maiúsculas
fn validate_entry(value: &str, entries: &[&str]) -> Result<String> {
    entries
        .iter()
        .find(|entry| entry.eq_ignore_ascii_case(value))
        .map(|entry| entry.to_string())
        .ok_or_else(|| anyhow!("valor inválido: {} (valores: {})", value, entries.join(", ")))
}
