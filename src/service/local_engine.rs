use crate::error::BlundersError;
use crate::service::uci;
use crate::types::analysis::{AnalysisResult, SearchLimits};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// A UCI engine binary spawned once per analysis.
#[derive(Debug, Clone)]
pub struct LocalEngine {
    path: PathBuf,
    timeout: Duration,
}

impl LocalEngine {
    pub fn new(path: PathBuf, timeout: Duration) -> Self {
        Self { path, timeout }
    }

    pub async fn analyze(
        &self,
        fen: &str,
        limits: SearchLimits,
    ) -> Result<AnalysisResult, BlundersError> {
        let mut results = self.search(&[format!("fen {fen}")], limits).await?;
        results
            .pop()
            .ok_or_else(|| BlundersError::Engine("engine returned no search".into()))
    }

    /// Search the position before and after `uci_move` in one engine session.
    pub async fn analyze_move(
        &self,
        fen: &str,
        uci_move: &str,
        limits: SearchLimits,
    ) -> Result<(AnalysisResult, AnalysisResult), BlundersError> {
        let positions = [format!("fen {fen}"), format!("fen {fen} moves {uci_move}")];
        let mut results = self.search(&positions, limits).await?.into_iter();
        match (results.next(), results.next()) {
            (Some(before), Some(after)) => Ok((before, after)),
            _ => Err(BlundersError::Engine("engine returned too few searches".into())),
        }
    }

    /// Run one `go depth` per position (UCI `position` arguments) and parse
    /// each transcript.
    async fn search(
        &self,
        positions: &[String],
        limits: SearchLimits,
    ) -> Result<Vec<AnalysisResult>, BlundersError> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| BlundersError::Engine("engine stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BlundersError::Engine("engine stdout unavailable".into()))?;
        let mut lines = BufReader::new(stdout).lines();

        let session = run_session(&mut stdin, &mut lines, positions, limits);
        let transcripts = tokio::time::timeout(self.timeout, session)
            .await
            .map_err(|_| BlundersError::Engine("analysis timed out".into()))??;

        if let Err(e) = stdin.write_all(b"quit\n").await {
            warn!(error = %e, "failed to send quit to engine");
        }
        drop(stdin);
        if tokio::time::timeout(Duration::from_secs(2), child.wait())
            .await
            .is_err()
        {
            child.kill().await?;
        }

        Ok(transcripts.iter().map(|t| uci::parse_output(t)).collect())
    }
}

async fn run_session(
    stdin: &mut ChildStdin,
    lines: &mut Lines<BufReader<ChildStdout>>,
    positions: &[String],
    limits: SearchLimits,
) -> Result<Vec<String>, BlundersError> {
    send(stdin, "uci\nisready\n").await?;
    wait_for(lines, "readyok").await?;

    send(
        stdin,
        &format!("setoption name MultiPV value {}\nisready\n", limits.multipv),
    )
    .await?;
    wait_for(lines, "readyok").await?;

    let mut transcripts = Vec::with_capacity(positions.len());
    for position in positions {
        send(
            stdin,
            &format!("position {position}\ngo depth {}\n", limits.depth),
        )
        .await?;
        transcripts.push(read_until_bestmove(lines).await?);
    }
    Ok(transcripts)
}

async fn read_until_bestmove(
    lines: &mut Lines<BufReader<ChildStdout>>,
) -> Result<String, BlundersError> {
    let mut transcript = String::new();
    while let Some(line) = lines.next_line().await? {
        let done = line.starts_with("bestmove");
        transcript.push_str(&line);
        transcript.push('\n');
        if done {
            return Ok(transcript);
        }
    }
    Err(BlundersError::Engine(
        "engine exited before reporting bestmove".into(),
    ))
}

async fn send(stdin: &mut ChildStdin, commands: &str) -> Result<(), BlundersError> {
    debug!(commands = commands.trim_end(), "uci >");
    stdin.write_all(commands.as_bytes()).await?;
    stdin.flush().await?;
    Ok(())
}

async fn wait_for(
    lines: &mut Lines<BufReader<ChildStdout>>,
    token: &str,
) -> Result<(), BlundersError> {
    while let Some(line) = lines.next_line().await? {
        if line.contains(token) {
            return Ok(());
        }
    }
    Err(BlundersError::Engine(format!(
        "engine exited while waiting for {token}"
    )))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::types::analysis::Score;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{SystemTime, UNIX_EPOCH};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    /// Minimal UCI engine: a fixed search for the root position and another
    /// once a move has been played.
    const STUB_ENGINE: &str = r#"#!/bin/sh
pos=""
while read -r line; do
  case "$line" in
    uci) echo "id name stub"; echo "uciok" ;;
    isready) echo "readyok" ;;
    position*) pos="$line" ;;
    go*)
      case "$pos" in
        *" moves "*)
          echo "info depth 12 seldepth 15 multipv 1 score cp 250 nodes 9000 pv d8h4 e1e2"
          echo "bestmove d8h4" ;;
        *)
          echo "info depth 11 multipv 1 score cp 12 pv d2d4"
          echo "info depth 12 multipv 1 score upperbound cp 90 pv g1f3"
          echo "info depth 12 multipv 1 score cp 31 pv e2e4 e7e5"
          echo "bestmove e2e4 ponder e7e5" ;;
      esac ;;
    quit) exit 0 ;;
  esac
done
"#;

    /// Answers the handshake, then never finishes a search.
    const STALLED_ENGINE: &str = r#"#!/bin/sh
while read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) sleep 30 ;;
  esac
done
"#;

    fn write_engine(name: &str, script: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("blunders-{name}-{}-{nanos}.sh", std::process::id()));
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn limits() -> SearchLimits {
        SearchLimits::clamped(Some(12), Some(1), 20)
    }

    #[tokio::test]
    async fn session_reports_deepest_exact_line() {
        let path = write_engine("stub", STUB_ENGINE);
        let engine = LocalEngine::new(path.clone(), Duration::from_secs(10));

        let result = engine.analyze(START_FEN, limits()).await.unwrap();

        assert_eq!(result.bestmove.as_deref(), Some("e2e4"));
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].depth, 12);
        assert_eq!(result.lines[0].score, Score::Cp(31));
        assert_eq!(result.lines[0].pv, ["e2e4", "e7e5"]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn move_searches_share_one_session() {
        let path = write_engine("stub-move", STUB_ENGINE);
        let engine = LocalEngine::new(path.clone(), Duration::from_secs(10));

        let (before, after) = engine
            .analyze_move(START_FEN, "f2f3", limits())
            .await
            .unwrap();

        assert_eq!(before.bestmove.as_deref(), Some("e2e4"));
        assert_eq!(after.bestmove.as_deref(), Some("d8h4"));
        assert_eq!(after.lines[0].score, Score::Cp(250));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn stalled_search_times_out() {
        let path = write_engine("stalled", STALLED_ENGINE);
        let engine = LocalEngine::new(path.clone(), Duration::from_millis(300));

        let err = engine.analyze(START_FEN, limits()).await.unwrap_err();

        assert!(matches!(err, BlundersError::Engine(msg) if msg == "analysis timed out"));
        let _ = std::fs::remove_file(&path);
    }
}
