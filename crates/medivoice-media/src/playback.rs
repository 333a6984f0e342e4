//! Local-mode autoplay through the platform's audio player.
//!
//! Fire-and-forget: playback failures (including an unrecognized OS) are
//! logged and otherwise ignored. Hosted deployments never call this — the
//! UI's own audio widget handles playback there.

use std::path::Path;

use tracing::debug;

/// Play an audio file with the platform player, swallowing any failure.
pub async fn play(path: &Path) {
    if let Err(e) = play_inner(path).await {
        debug!(%e, path = %path.display(), "Audio autoplay failed");
    }
}

async fn play_inner(path: &Path) -> anyhow::Result<()> {
    let status = match std::env::consts::OS {
        "macos" => {
            tokio::process::Command::new("afplay")
                .arg(path)
                .status()
                .await?
        }
        "windows" => {
            tokio::process::Command::new("powershell")
                .arg("-c")
                .arg(format!(
                    r#"(New-Object Media.SoundPlayer "{}").PlaySync();"#,
                    path.display()
                ))
                .status()
                .await?
        }
        "linux" => {
            tokio::process::Command::new("aplay")
                .arg(path)
                .status()
                .await?
        }
        other => anyhow::bail!("unsupported operating system: {other}"),
    };

    if !status.success() {
        anyhow::bail!("audio player exited with {status}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_play_swallows_failures() {
        // Nonexistent file: the player (or its spawn) fails, play() must not.
        play(Path::new("/nonexistent/clip.mp3")).await;
    }
}
