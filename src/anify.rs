use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::extractor::{self, ResolverSet, Video};
use crate::filters::FilterSelection;
use crate::prefs::UserPreference;
use crate::utils::{absolute_url, extract_number};

pub const BASE_URL: &str = "https://anify.to";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

// Um anime na listagem ou nos resultados de busca
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeItem {
    pub url: String,
    pub title: String,
    pub thumbnail: String,
}

// Detalhes da página do anime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeDetails {
    pub title: String,
    pub thumbnail: String,
    pub genres: String,
    pub description: String,
    pub status: AnimeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimeStatus {
    Ongoing,
    Completed,
    Unknown,
}

// Um episódio da lista
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeItem {
    pub url: String,
    pub name: String,
    pub number: f32,
}

// Uma página de resultados de busca
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub items: Vec<AnimeItem>,
    pub has_next_page: bool,
}

// Adaptador do site anify.to: listagens, busca, detalhes, episódios e a
// resolução das fontes de vídeo de um episódio.
pub struct Anify {
    client: Client,
    base_url: String,
}

impl Anify {
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    // Função para baixar uma página e devolver o HTML como texto
    async fn fetch(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;

        if !resp.status().is_success() {
            return Err(anyhow!("Falha ao carregar {}: HTTP {}", url, resp.status()));
        }

        Ok(resp.text().await?)
    }

    // Função para listar os animes populares
    pub async fn popular_anime(&self, prefs: &UserPreference) -> Result<Vec<AnimeItem>> {
        let html = self.fetch(&format!("{}/animelist/", self.base_url)).await?;
        Ok(self.parse_anime_list(
            &html,
            "div#popular-tab-pane > div.row > div.col-md-6",
            prefs,
        ))
    }

    // Função para listar os animes em exibição
    pub async fn latest_anime(&self, prefs: &UserPreference) -> Result<Vec<AnimeItem>> {
        let html = self.fetch(&format!("{}/animelist/", self.base_url)).await?;
        Ok(self.parse_anime_list(
            &html,
            "div#ongoing-tab-pane > div.row > div.col-md-6",
            prefs,
        ))
    }

    // Função para buscar animes pelo nome, com filtros opcionais
    pub async fn search_anime(
        &self,
        query: &str,
        page: u32,
        selection: &FilterSelection,
        prefs: &UserPreference,
    ) -> Result<SearchPage> {
        // O site espera a busca em minúsculas com espaços como "+"
        let clean_query = urlencoding::encode(&query.to_lowercase()).replace("%20", "+");
        let url = format!(
            "{}/search/?searchtext={}&page={}&{}",
            self.base_url,
            clean_query,
            page,
            selection.build_query()
        );

        let html = self.fetch(&url).await?;
        Ok(self.parse_search_page(&html, prefs))
    }

    // Função para obter os detalhes de um anime
    pub async fn anime_details(&self, url: &str, prefs: &UserPreference) -> Result<AnimeDetails> {
        let html = self.fetch(url).await?;
        parse_details(&html, prefs)
    }

    // Função para obter a lista de episódios de um anime
    pub async fn episode_list(&self, url: &str) -> Result<Vec<EpisodeItem>> {
        let html = self.fetch(url).await?;
        Ok(parse_episodes(&html, &self.base_url))
    }

    // Função que resolve as fontes de vídeo da página de um episódio:
    // script inline -> candidatos -> resolução concorrente -> ordenação
    // por preferência.
    pub async fn episode_videos(&self, url: &str, prefs: &UserPreference) -> Result<Vec<Video>> {
        let html = self
            .fetch(url)
            .await
            .with_context(|| format!("Falha ao carregar página do episódio {}", url))?;

        let script =
            find_server_script(&html).ok_or_else(|| anyhow!(extractor::NO_VIDEOS_FOUND))?;
        let servers = extractor::extract_servers(&script, &self.base_url);

        let resolvers = ResolverSet::new(self.client.clone());
        let videos = extractor::resolve_servers(&servers, |id| resolvers.dispatch(id)).await?;

        Ok(extractor::sort_videos(videos, prefs))
    }

    fn parse_anime_list(
        &self,
        html: &str,
        selector: &str,
        prefs: &UserPreference,
    ) -> Vec<AnimeItem> {
        let document = Html::parse_document(html);
        let item_selector = Selector::parse(selector).unwrap();
        document
            .select(&item_selector)
            .filter_map(|element| self.anime_from_element(&element, prefs))
            .collect()
    }

    fn anime_from_element(
        &self,
        element: &ElementRef,
        prefs: &UserPreference,
    ) -> Option<AnimeItem> {
        let link_selector = Selector::parse("div.animeinfo > a").unwrap();
        let img_selector = Selector::parse("img").unwrap();
        let name_selector = Selector::parse("span.animename").unwrap();

        let href = element.select(&link_selector).next()?.value().attr("href")?;
        let thumbnail = element
            .select(&img_selector)
            .next()
            .and_then(|img| img.value().attr("data-src"))
            .unwrap_or("")
            .to_string();
        // O título vem no atributo data-en ou data-jp, conforme a
        // preferência de idioma
        let title = element
            .select(&name_selector)
            .next()
            .and_then(|name| name.value().attr(prefs.preferred_lang.as_str()))
            .unwrap_or("")
            .to_string();

        Some(AnimeItem {
            url: absolute_url(&self.base_url, href),
            title,
            thumbnail,
        })
    }

    fn parse_search_page(&self, html: &str, prefs: &UserPreference) -> SearchPage {
        let document = Html::parse_document(html);
        let block_selector = Selector::parse("div.col-12").unwrap();
        let heading_selector = Selector::parse("h4 > b").unwrap();
        let card_selector = Selector::parse("div.card-body").unwrap();
        let next_selector =
            Selector::parse("ul.pagination > li.page-item > a.page-link[rel]").unwrap();

        // A página de busca também lista filmes e OVAs; só interessa o
        // bloco cujo cabeçalho é "Series". Página sem esse bloco é um
        // resultado vazio, não erro.
        let series_block = document.select(&block_selector).find(|block| {
            block
                .select(&heading_selector)
                .next()
                .map(|heading| own_text(&heading).trim() == "Series")
                .unwrap_or(false)
        });

        let items = match series_block {
            Some(block) => block
                .select(&card_selector)
                .filter_map(|element| self.anime_from_element(&element, prefs))
                .collect(),
            None => Vec::new(),
        };

        let has_next_page = document.select(&next_selector).next().is_some();
        SearchPage {
            items,
            has_next_page,
        }
    }
}

// Texto direto do elemento, sem descer nos filhos
fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect()
}

// Função para extrair os detalhes da página do anime
fn parse_details(html: &str, prefs: &UserPreference) -> Result<AnimeDetails> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("div.component-animeinfo > div.card-body > div.row").unwrap();
    let details = document
        .select(&row_selector)
        .next()
        .ok_or_else(|| anyhow!("Bloco de detalhes não encontrado na página"))?;

    let title = details
        .select(&Selector::parse("h2.dynamic-name").unwrap())
        .next()
        .and_then(|el| el.value().attr(prefs.preferred_lang.as_str()))
        .unwrap_or("")
        .to_string();
    let thumbnail = details
        .select(&Selector::parse("img").unwrap())
        .next()
        .and_then(|img| img.value().attr("data-src").or(img.value().attr("src")))
        .unwrap_or("")
        .to_string();
    let genres = details
        .select(&Selector::parse("span.badge-genre").unwrap())
        .map(|el| own_text(&el).trim().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let description = details
        .select(&Selector::parse("span.description").unwrap())
        .next()
        .map(|el| own_text(&el).trim().to_string())
        .unwrap_or_default();
    let status = details
        .select(&Selector::parse("span.badge-status").unwrap())
        .next()
        .map(|el| parse_status(own_text(&el).trim()))
        .unwrap_or(AnimeStatus::Unknown);

    Ok(AnimeDetails {
        title,
        thumbnail,
        genres,
        description,
        status,
    })
}

fn parse_status(status: &str) -> AnimeStatus {
    match status {
        "Ongoing" => AnimeStatus::Ongoing,
        "Completed" => AnimeStatus::Completed,
        _ => AnimeStatus::Unknown,
    }
}

// Função para extrair a lista de episódios.
// O site lista do mais recente para o mais antigo; a saída vai na ordem de
// exibição (episódio 1 primeiro).
fn parse_episodes(html: &str, base_url: &str) -> Vec<EpisodeItem> {
    let document = Html::parse_document(html);
    let list_selector = Selector::parse("div.episodelist").unwrap();
    let link_selector = Selector::parse("a").unwrap();
    let tag_selector = Selector::parse("span.animename").unwrap();
    let name_selector = Selector::parse("div.flex-grow-1 > span").unwrap();

    let mut episodes: Vec<EpisodeItem> = document
        .select(&list_selector)
        .filter_map(|element| {
            let href = element.select(&link_selector).next()?.value().attr("href")?;
            let tag = element
                .select(&tag_selector)
                .next()
                .map(|el| own_text(&el).trim().to_string())?;
            let extra = element
                .select(&name_selector)
                .next()
                .map(|el| own_text(&el).trim().to_string())
                .filter(|name| !name.is_empty());

            let name = match extra {
                Some(extra) => format!("{}: {}", tag, extra),
                None => tag.clone(),
            };
            let number = tag
                .split(' ')
                .next_back()
                .and_then(|n| n.parse::<f32>().ok())
                .or_else(|| extract_number(&tag))
                .unwrap_or(0.0);

            Some(EpisodeItem {
                url: absolute_url(base_url, href),
                name,
                number,
            })
        })
        .collect();

    episodes.reverse();
    episodes
}

// Função para achar o primeiro script inline que monta os iframes dos
// servidores de vídeo
fn find_server_script(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse("script").unwrap();
    document
        .select(&script_selector)
        .map(|el| el.text().collect::<String>())
        .find(|text| text.contains("iframe"))
        .map(|text| text.trim().to_string())
}
