use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use regex::Regex;
use reqwest::Client;
use std::time::{SystemTime, UNIX_EPOCH};
use url::Url;

use crate::extractor::Video;

// Cabeçalho Origin exigido pelo player vidstack do site
const VIDSTACK_ORIGIN: &str = "https://vidstack.xyz";

// Interface comum dos resolvedores: recebem a URL do servidor e um prefixo
// de rótulo, devolvem zero ou mais streams reproduzíveis. Cada chamada
// constrói os Video do zero; nada é cacheado.
#[async_trait]
pub trait VideoResolver: Send + Sync {
    async fn videos_from_url(&self, url: &str, prefix: &str) -> Result<Vec<Video>>;
}

// ========================== Vidstack (CDN) ============================

// Resolvedor das páginas de player do próprio site (servidores cdn/cdn2).
// A página embute um script com a URL do master playlist HLS.
pub struct VidstackResolver {
    client: Client,
}

impl VidstackResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoResolver for VidstackResolver {
    async fn videos_from_url(&self, url: &str, prefix: &str) -> Result<Vec<Video>> {
        let page = self
            .client
            .get(url)
            .header("Origin", VIDSTACK_ORIGIN)
            .send()
            .await?
            .text()
            .await?;

        let playlist_url = extract_vidstack_playlist(&page)
            .ok_or_else(|| anyhow!("playlist não encontrado em {}", url))?;

        let playlist = self
            .client
            .get(&playlist_url)
            .header("Origin", VIDSTACK_ORIGIN)
            .send()
            .await?
            .text()
            .await?;

        let variants = parse_master_playlist(&playlist, &playlist_url)?;
        Ok(variants
            .into_iter()
            .map(|(quality, variant_url)| Video {
                url: variant_url,
                label: format!("{} - {}", prefix, quality),
                quality,
            })
            .collect())
    }
}

// Função para achar a URL do m3u8 no script do player (file": '...')
fn extract_vidstack_playlist(page: &str) -> Option<String> {
    let start = page.find("file\": '")? + "file\": '".len();
    let end = page[start..].find('\'')?;
    Some(page[start..start + end].to_string())
}

// ============================= Filemoon ==============================

// Resolvedor das páginas de embed do Filemoon. O script do player declara
// file: "..m3u8.." com o master playlist.
pub struct FilemoonResolver {
    client: Client,
}

impl FilemoonResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoResolver for FilemoonResolver {
    async fn videos_from_url(&self, url: &str, prefix: &str) -> Result<Vec<Video>> {
        let page = self.client.get(url).send().await?.text().await?;

        let re = Regex::new(r#"file\s*:\s*"([^"]+\.m3u8[^"]*)""#).unwrap();
        let playlist_url = re
            .captures(&page)
            .map(|cap| cap[1].to_string())
            .ok_or_else(|| anyhow!("fonte m3u8 não encontrada em {}", url))?;

        let playlist = self
            .client
            .get(&playlist_url)
            .header("Referer", url)
            .send()
            .await?
            .text()
            .await?;

        let variants = parse_master_playlist(&playlist, &playlist_url)?;
        Ok(variants
            .into_iter()
            .map(|(quality, variant_url)| Video {
                url: variant_url,
                // O rótulo do despacho já termina em " - "
                label: format!("{}{}", prefix, quality),
                quality,
            })
            .collect())
    }
}

// ============================ Doodstream =============================

// Resolvedor das páginas de embed do Doodstream. A página traz um caminho
// /pass_md5/ que devolve a base da URL do vídeo; o resto é um sufixo
// aleatório mais token e expiry.
pub struct DoodResolver {
    client: Client,
}

impl DoodResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VideoResolver for DoodResolver {
    async fn videos_from_url(&self, url: &str, prefix: &str) -> Result<Vec<Video>> {
        let page = self.client.get(url).send().await?.text().await?;

        let re = Regex::new(r"'(/pass_md5/[^']+)'").unwrap();
        let md5_path = re
            .captures(&page)
            .map(|cap| cap[1].to_string())
            .ok_or_else(|| anyhow!("caminho pass_md5 não encontrado em {}", url))?;

        let base = Url::parse(url).context("URL de embed inválida")?;
        let host = format!(
            "{}://{}",
            base.scheme(),
            base.host_str().unwrap_or_default()
        );

        let video_base = self
            .client
            .get(format!("{}{}", host, md5_path))
            .header("Referer", url)
            .send()
            .await?
            .text()
            .await?;

        let token = md5_path.rsplit('/').next().unwrap_or_default();
        let expiry = SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis();
        let video_url = format!(
            "{}{}?token={}&expiry={}",
            video_base,
            random_suffix(10),
            token,
            expiry
        );

        Ok(vec![Video {
            url: video_url,
            label: prefix.to_string(),
            quality: prefix.to_string(),
        }])
    }
}

// Sufixo aleatório de 10 caracteres exigido pelas URLs do Doodstream
fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

// =============================== HLS =================================

// Função para listar as variantes de um master playlist HLS como pares
// (qualidade, url). Cada linha #EXT-X-STREAM-INF traz RESOLUTION=LxA e a
// linha seguinte traz a URI da variante, possivelmente relativa. Um
// playlist de mídia (sem variantes) devolve a própria URL com o rótulo
// "Video".
pub fn parse_master_playlist(text: &str, playlist_url: &str) -> Result<Vec<(String, String)>> {
    if !text.contains("#EXTM3U") {
        return Err(anyhow!("resposta de {} não é um playlist HLS", playlist_url));
    }

    let resolution_re = Regex::new(r"RESOLUTION=\d+x(\d+)").unwrap();
    let mut variants = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        if !line.starts_with("#EXT-X-STREAM-INF") {
            continue;
        }
        let quality = resolution_re
            .captures(line)
            .map(|cap| format!("{}p", &cap[1]))
            .unwrap_or_else(|| "Video".to_string());
        if let Some(uri) = lines.next() {
            variants.push((quality, join_playlist_url(playlist_url, uri.trim())?));
        }
    }

    if variants.is_empty() {
        variants.push(("Video".to_string(), playlist_url.to_string()));
    }

    Ok(variants)
}

// Resolve a URI de uma variante contra a URL do playlist
fn join_playlist_url(playlist_url: &str, uri: &str) -> Result<String> {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(uri.to_string());
    }
    let base = Url::parse(playlist_url).context("URL do playlist inválida")?;
    Ok(base.join(uri)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    const MASTER: &str = "#EXTM3U\n\
        #EXT-X-STREAM-INF:BANDWIDTH=5000000,RESOLUTION=1920x1080\n\
        1080/index.m3u8\n\
        #EXT-X-STREAM-INF:BANDWIDTH=2500000,RESOLUTION=1280x720\n\
        720/index.m3u8\n";

    #[test]
    fn master_playlist_lists_variants() {
        let variants =
            parse_master_playlist(MASTER, "https://cdn.anify.to/stream/master.m3u8").unwrap();
        assert_eq!(
            variants,
            vec![
                (
                    "1080p".to_string(),
                    "https://cdn.anify.to/stream/1080/index.m3u8".to_string()
                ),
                (
                    "720p".to_string(),
                    "https://cdn.anify.to/stream/720/index.m3u8".to_string()
                ),
            ]
        );
    }

    #[test]
    fn media_playlist_falls_back_to_itself() {
        let media = "#EXTM3U\n#EXTINF:4.0,\nseg0.ts\n";
        let variants =
            parse_master_playlist(media, "https://cdn.anify.to/stream/index.m3u8").unwrap();
        assert_eq!(
            variants,
            vec![(
                "Video".to_string(),
                "https://cdn.anify.to/stream/index.m3u8".to_string()
            )]
        );
    }

    #[test]
    fn non_hls_response_is_error() {
        let err = parse_master_playlist("<html>erro</html>", "https://x.to/a.m3u8").unwrap_err();
        assert!(err.to_string().contains("não é um playlist HLS"));
    }

    #[test]
    fn vidstack_playlist_extraction() {
        let page = r#"<script>player.setup({"file": 'https://cdn.anify.to/m/master.m3u8'});</script>"#;
        assert_eq!(
            extract_vidstack_playlist(page),
            Some("https://cdn.anify.to/m/master.m3u8".to_string())
        );
        assert_eq!(extract_vidstack_playlist("<html></html>"), None);
    }

    #[tokio::test]
    async fn vidstack_resolves_variants() {
        let server = MockServer::start();
        let master_url = server.url("/stream/master.m3u8");
        let page_body = format!("<script>var p = {{\"file\": '{}'}};</script>", master_url);

        server.mock(|when, then| {
            when.method(GET).path("/embed/abc");
            then.status(200).body(&page_body);
        });
        server.mock(|when, then| {
            when.method(GET).path("/stream/master.m3u8");
            then.status(200).body(MASTER);
        });

        let resolver = VidstackResolver::new(Client::new());
        let videos = resolver
            .videos_from_url(&server.url("/embed/abc"), "CDN (Sub)")
            .await
            .unwrap();

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].label, "CDN (Sub) - 1080p");
        assert_eq!(videos[0].quality, "1080p");
        assert!(videos[0].url.ends_with("/stream/1080/index.m3u8"));
        assert_eq!(videos[1].label, "CDN (Sub) - 720p");
    }

    #[tokio::test]
    async fn filemoon_resolves_variants() {
        let server = MockServer::start();
        let master_url = server.url("/hls/master.m3u8");
        let page_body = format!(
            "<script>jwplayer().setup({{ sources: [{{ file: \"{}\" }}] }});</script>",
            master_url
        );

        server.mock(|when, then| {
            when.method(GET).path("/e/xyz");
            then.status(200).body(&page_body);
        });
        server.mock(|when, then| {
            when.method(GET).path("/hls/master.m3u8");
            then.status(200).body(MASTER);
        });

        let resolver = FilemoonResolver::new(Client::new());
        let videos = resolver
            .videos_from_url(&server.url("/e/xyz"), "Filemoon (Sub) - ")
            .await
            .unwrap();

        assert_eq!(videos[0].label, "Filemoon (Sub) - 1080p");
        assert_eq!(videos[1].label, "Filemoon (Sub) - 720p");
    }

    #[tokio::test]
    async fn filemoon_without_source_is_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/e/empty");
            then.status(200).body("<html>sem player</html>");
        });

        let resolver = FilemoonResolver::new(Client::new());
        let err = resolver
            .videos_from_url(&server.url("/e/empty"), "Filemoon (Sub) - ")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("fonte m3u8 não encontrada"));
    }

    #[tokio::test]
    async fn dood_builds_tokenized_url() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/e/video1");
            then.status(200)
                .body("<script>$.get('/pass_md5/1234/tok99', function(data) {});</script>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/pass_md5/1234/tok99");
            then.status(200).body("https://d1.dood.video/abcd~");
        });

        let resolver = DoodResolver::new(Client::new());
        let videos = resolver
            .videos_from_url(&server.url("/e/video1"), "Doodstream (Sub)")
            .await
            .unwrap();

        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].label, "Doodstream (Sub)");
        assert!(videos[0].url.starts_with("https://d1.dood.video/abcd~"));
        assert!(videos[0].url.contains("?token=tok99&expiry="));
    }
}
