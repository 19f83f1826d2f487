use regex::Regex;

// Função para montar uma URL absoluta a partir de um caminho extraído da página
//
// O site usa caminhos relativos nos links ("/anime/..", "/embed/..") e os
// players externos às vezes vêm sem esquema ("//dood.la/e/..").
pub fn absolute_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else if path.starts_with("//") {
        format!("https:{}", path)
    } else if path.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), path)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

// Função para extrair o primeiro número de uma string (ex: "Episode 12" -> 12.0)
pub fn extract_number(s: &str) -> Option<f32> {
    let re = Regex::new(r"(\d+(\.\d+)?)").unwrap();
    re.captures(s)
        .and_then(|cap| cap[1].parse::<f32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_keeps_absolute() {
        assert_eq!(
            absolute_url("https://anify.to", "https://dood.la/e/abc"),
            "https://dood.la/e/abc"
        );
    }

    #[test]
    fn absolute_url_adds_scheme() {
        assert_eq!(
            absolute_url("https://anify.to", "//dood.la/e/abc"),
            "https://dood.la/e/abc"
        );
    }

    #[test]
    fn absolute_url_joins_paths() {
        assert_eq!(
            absolute_url("https://anify.to", "/embed/abc"),
            "https://anify.to/embed/abc"
        );
        assert_eq!(
            absolute_url("https://anify.to/", "embed/abc"),
            "https://anify.to/embed/abc"
        );
    }

    #[test]
    fn extract_number_finds_episode() {
        assert_eq!(extract_number("Episode 12"), Some(12.0));
        assert_eq!(extract_number("Episode 7.5: Recap"), Some(7.5));
        assert_eq!(extract_number("Special"), None);
    }
}
