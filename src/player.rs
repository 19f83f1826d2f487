use anyhow::{Context, Result, anyhow};
use std::path::Path;
use std::process::Command;

// Função para reproduzir vídeo com MPV.
// Os servidores de vídeo validam o Referer, então ele sempre vai junto.
pub fn play_with_mpv(stream_url: &str, referer: &str) -> Result<()> {
    println!("Iniciando reprodução do vídeo...");

    let header = format!("--http-header-fields=Referer: {}", referer);

    if let Ok(mpv_path) = find_mpv() {
        println!("Usando MPV para reprodução...");

        let args = vec![
            "--no-terminal",      // Não usa o terminal para output
            "--fs",               // Inicia em tela cheia
            "--force-window=yes", // Força a abertura da janela
            "--keep-open=yes",    // Mantém a janela aberta após o término
            "--ytdl=no",          // Desativa o uso interno do youtube-dl
            header.as_str(),
            stream_url,
        ];

        return Command::new(&mpv_path)
            .args(&args)
            .spawn()
            .and_then(|mut child| child.wait())
            .map(|_| ())
            .context("Erro ao executar MPV");
    }

    // Se MPV não estiver disponível, tentar VLC
    println!("MPV não encontrado, tentando VLC...");

    let vlc_path = find_vlc().context("Nenhum player encontrado (instale mpv ou vlc)")?;
    let vlc_referer = format!("--http-referrer={}", referer);

    Command::new(&vlc_path)
        .args(&[
            "--fullscreen",
            "--no-video-title-show",
            vlc_referer.as_str(),
            stream_url,
        ])
        .spawn()
        .and_then(|mut child| child.wait())
        .map(|_| ())
        .context("Erro ao executar VLC")
}

// Funções auxiliares para encontrar executáveis de players

fn find_mpv() -> Result<String> {
    find_player("mpv")
}

fn find_vlc() -> Result<String> {
    find_player("vlc")
}

fn find_player(name: &str) -> Result<String> {
    match Command::new("which").arg(name).output() {
        Ok(output) if output.status.success() => {
            let path = String::from_utf8(output.stdout)
                .map_err(|_| anyhow!("Erro ao converter caminho do {}", name))?;
            Ok(path.trim().to_string())
        }
        _ => {
            // Tentar caminhos comuns
            for dir in &["/usr/bin", "/usr/local/bin", "/bin"] {
                let path = format!("{}/{}", dir, name);
                if Path::new(&path).exists() {
                    return Ok(path);
                }
            }
            Err(anyhow!("{} não encontrado", name))
        }
    }
}
