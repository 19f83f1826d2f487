use std::cmp::Reverse;

use anyhow::{Result, anyhow};
use futures::future::join_all;
use regex::Regex;
use reqwest::Client;

use crate::prefs::UserPreference;
use crate::resolvers::{DoodResolver, FilemoonResolver, VideoResolver, VidstackResolver};
use crate::utils::absolute_url;

// Mensagem do erro de lote vazio: nenhum candidato reconhecido ou nenhum
// resolvedor devolveu streams. Distinta de uma falha de resolução.
pub const NO_VIDEOS_FOUND: &str = "nenhum vídeo encontrado";

// Um servidor candidato extraído do script da página de episódio.
// O identificador é opaco e pode se repetir; cada ocorrência é resolvida
// de forma independente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCandidate {
    pub identifier: String,
    pub url: String,
}

// Um stream reproduzível devolvido por um resolvedor.
// O rótulo ("CDN (Sub) - 1080p") é o que o usuário vê e também a base da
// ordenação por preferência.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    pub url: String,
    pub label: String,
    pub quality: String,
}

// Função para extrair os pares (servidor, url) do bloco de script inline.
//
// O site define uma função por servidor, cada uma montando um iframe com
// src="...". O casamento é preguiçoso: cada função casa sozinha e a ordem
// da saída segue a ordem do texto. Script sem função reconhecível devolve
// lista vazia, não erro.
pub fn extract_servers(script: &str, base_url: &str) -> Vec<ServerCandidate> {
    let re = Regex::new(r#"(?s)function\s+(\w+)\s*\(\)\s*\{.*?src="([^"]+)".*?\}"#).unwrap();
    let mut servers = Vec::new();
    for cap in re.captures_iter(script.trim()) {
        servers.push(ServerCandidate {
            identifier: cap[1].to_string(),
            url: absolute_url(base_url, &cap[2]),
        });
    }
    servers
}

// Conjunto dos resolvedores concretos usados pela tabela fixa de despacho
pub struct ResolverSet {
    vidstack: VidstackResolver,
    filemoon: FilemoonResolver,
    dood: DoodResolver,
}

impl ResolverSet {
    pub fn new(client: Client) -> Self {
        Self {
            vidstack: VidstackResolver::new(client.clone()),
            filemoon: FilemoonResolver::new(client.clone()),
            dood: DoodResolver::new(client),
        }
    }

    // Tabela fixa: identificador do servidor -> (resolvedor, rótulo).
    // Identificador desconhecido não tem tratador e contribui com zero
    // resultados, sem falhar o lote.
    pub fn dispatch(&self, identifier: &str) -> Option<(&dyn VideoResolver, &'static str)> {
        match identifier {
            "cdn" => Some((&self.vidstack, "CDN (Sub)")),
            "cdn2" => Some((&self.vidstack, "CDN2 (Sub)")),
            "cdn_dubbed" => Some((&self.vidstack, "CDN (Dub)")),
            "fm" => Some((&self.filemoon, "Filemoon (Sub) - ")),
            "ds" => Some((&self.dood, "Doodstream (Sub)")),
            "ds_dubbed" => Some((&self.dood, "Doodstream (Dub)")),
            _ => None,
        }
    }
}

// Função que resolve todos os candidatos em paralelo e concatena os
// resultados na ordem de entrada.
//
// Espera todos os futuros terminarem antes de devolver qualquer coisa; uma
// falha em qualquer resolvedor derruba o lote inteiro. Se a concatenação
// final ficar vazia o chamador recebe o erro NO_VIDEOS_FOUND em vez de uma
// lista vazia silenciosa.
pub async fn resolve_servers<'a, F>(servers: &[ServerCandidate], dispatch: F) -> Result<Vec<Video>>
where
    F: Fn(&str) -> Option<(&'a dyn VideoResolver, &'static str)>,
{
    let tasks = servers.iter().map(|server| {
        let resolved = dispatch(&server.identifier);
        let url = server.url.clone();
        async move {
            match resolved {
                Some((resolver, label)) => resolver.videos_from_url(&url, label).await,
                None => Ok(Vec::new()),
            }
        }
    });

    let mut videos = Vec::new();
    for result in join_all(tasks).await {
        videos.extend(result?);
    }

    if videos.is_empty() {
        return Err(anyhow!(NO_VIDEOS_FOUND));
    }

    Ok(videos)
}

// Função para ordenar os vídeos pela preferência do usuário.
//
// Prioridade: servidor > tipo > qualidade, casando cada preferência contra
// o rótulo. Ordenação estável e decrescente; empates mantêm a ordem de
// entrada, então ordenar duas vezes dá o mesmo resultado.
pub fn sort_videos(mut videos: Vec<Video>, prefs: &UserPreference) -> Vec<Video> {
    videos.sort_by_key(|video| {
        Reverse((
            video.label.contains(&prefs.preferred_server),
            video.label.contains(&prefs.preferred_type),
            video.label.contains(&prefs.preferred_quality),
        ))
    });
    videos
}
