use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

// Valores padrão das preferências (os mesmos do site)
pub const DEFAULT_QUALITY: &str = "1080p";
pub const DEFAULT_SERVER: &str = "CDN";
pub const DEFAULT_TYPE: &str = "Sub";
pub const DEFAULT_LANG: &str = "data-en";

// Valores aceitos para cada preferência
pub const QUALITY_ENTRIES: &[&str] = &["1080p", "720p", "480p", "360p"];
pub const SERVER_ENTRIES: &[&str] = &["CDN", "Filemoon", "Doodstream"];
pub const TYPE_ENTRIES: &[&str] = &["Sub", "Dub"];
pub const LANG_ENTRIES: &[&str] = &["data-en", "data-jp"];

// Estrutura com as preferências persistidas do usuário.
// Lida uma vez no início da execução e passada por referência ao ordenador
// de vídeos; o pipeline em si nunca escreve nela.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPreference {
    pub preferred_quality: String,
    pub preferred_server: String,
    pub preferred_type: String,
    pub preferred_lang: String,
}

impl Default for UserPreference {
    fn default() -> Self {
        Self {
            preferred_quality: DEFAULT_QUALITY.to_string(),
            preferred_server: DEFAULT_SERVER.to_string(),
            preferred_type: DEFAULT_TYPE.to_string(),
            preferred_lang: DEFAULT_LANG.to_string(),
        }
    }
}

impl UserPreference {
    // Carrega as preferências do arquivo, ou usa os padrões se não existir
    pub fn load() -> Result<Self> {
        let prefs_path = get_prefs_path()?;

        if !prefs_path.exists() {
            return Ok(UserPreference::default());
        }

        let mut file = File::open(&prefs_path)
            .context("Falha ao abrir arquivo de preferências")?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Falha ao ler arquivo de preferências")?;

        if contents.trim().is_empty() {
            return Ok(UserPreference::default());
        }

        serde_json::from_str(&contents)
            .context("Falha ao deserializar preferências")
    }

    // Salva as preferências no arquivo
    pub fn save(&self) -> Result<()> {
        let prefs_path = get_prefs_path()?;

        // Cria o diretório se não existir
        if let Some(parent) = prefs_path.parent() {
            fs::create_dir_all(parent)
                .context("Falha ao criar diretório de configuração")?;
        }

        let json = serde_json::to_string_pretty(self)
            .context("Falha ao serializar preferências")?;

        let mut file = File::create(&prefs_path)
            .context("Falha ao abrir arquivo de preferências para escrita")?;

        file.write_all(json.as_bytes())
            .context("Falha ao escrever preferências no arquivo")?;

        Ok(())
    }
}

// Obtém o caminho para o arquivo de preferências
fn get_prefs_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .context("Não foi possível determinar o diretório de configuração")?;

    path.push("anifyrust");
    path.push("prefs.json");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_site() {
        let prefs = UserPreference::default();
        assert_eq!(prefs.preferred_quality, "1080p");
        assert_eq!(prefs.preferred_server, "CDN");
        assert_eq!(prefs.preferred_type, "Sub");
        assert_eq!(prefs.preferred_lang, "data-en");
    }

    #[test]
    fn roundtrip_json() {
        let prefs = UserPreference {
            preferred_quality: "720p".to_string(),
            preferred_server: "Doodstream".to_string(),
            preferred_type: "Dub".to_string(),
            preferred_lang: "data-jp".to_string(),
        };
        let json = serde_json::to_string(&prefs).unwrap();
        let back: UserPreference = serde_json::from_str(&json).unwrap();
        assert_eq!(back.preferred_quality, prefs.preferred_quality);
        assert_eq!(back.preferred_server, prefs.preferred_server);
    }
}
