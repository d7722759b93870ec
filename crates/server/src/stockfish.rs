//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use async_trait::async_trait;
use shakmaty::uci::UciMove;
use shakmaty::Chess;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use tutor_core::engine::{AnalysisEngine, CandidateLine, EngineError, Score, SearchBudget};
use tutor_core::notation;

/// Process-level engine settings.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub threads: u32,
    pub hash_mb: u32,
    /// Longest wait for a single output line before the engine is declared dead.
    pub read_timeout: Duration,
}

/// Lines and best move reported by one `go` command.
#[derive(Debug)]
struct SearchOutput {
    lines: Vec<CandidateLine>,
    best_move: Option<UciMove>,
}

/// A running Stockfish process
struct UciProcess {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    read_timeout: Duration,
}

impl UciProcess {
    /// Spawn a new Stockfish process and initialize UCI
    async fn spawn(path: &str, options: &EngineOptions) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::Unavailable(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            read_timeout: options.read_timeout,
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine
            .send(&format!("setoption name Threads value {}", options.threads))
            .await?;
        engine
            .send(&format!("setoption name Hash value {}", options.hash_mb))
            .await?;
        engine.sync().await?;

        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin.write_all(format!("{cmd}\n").as_bytes()).await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Next output line, trimmed. Fails on EOF or when the engine goes quiet.
    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let read = tokio::time::timeout(self.read_timeout, self.stdout.read_line(&mut line))
            .await
            .map_err(|_| EngineError::Timeout(self.read_timeout))??;
        if read == 0 {
            return Err(EngineError::Unavailable("engine closed its output".into()));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    async fn sync(&mut self) -> Result<(), EngineError> {
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Cap playing strength at `elo`, or play at full strength with `None`.
    async fn limit_strength(&mut self, elo: Option<u32>) -> Result<(), EngineError> {
        match elo {
            Some(elo) => {
                self.send("setoption name UCI_LimitStrength value true")
                    .await?;
                self.send(&format!("setoption name UCI_Elo value {elo}"))
                    .await?;
            }
            None => {
                self.send("setoption name UCI_LimitStrength value false")
                    .await?
            }
        }
        self.sync().await
    }

    /// Search `pos` with the given `go` command and collect every reported line.
    async fn search(
        &mut self,
        pos: &Chess,
        go: &str,
        multipv: usize,
    ) -> Result<SearchOutput, EngineError> {
        self.send(&format!("position fen {}", notation::fen(pos)))
            .await?;
        self.send(go).await?;

        let mut slots: Vec<Option<CandidateLine>> = vec![None; multipv.max(1)];
        loop {
            let line = self.read_line().await?;

            if line.starts_with("info") && line.contains(" pv ") {
                let index = parse_multipv_index(&line).unwrap_or(1).saturating_sub(1) as usize;
                if let (Some(slot), Some(score)) = (slots.get_mut(index), parse_score(&line)) {
                    *slot = Some(CandidateLine {
                        pv: parse_pv(&line),
                        score,
                    });
                }
            } else if line.starts_with("bestmove") {
                return Ok(SearchOutput {
                    lines: slots.into_iter().flatten().collect(),
                    best_move: parse_bestmove(&line)?,
                });
            }
        }
    }
}

impl Drop for UciProcess {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Stockfish behind the tutor's engine trait. A failed read or write marks
/// the process dead until `restart` spawns a new one.
pub struct StockfishEngine {
    path: String,
    options: EngineOptions,
    process: Option<UciProcess>,
}

impl StockfishEngine {
    /// Start the engine. A missing binary is logged and leaves the engine offline.
    pub async fn connect(path: &str, options: EngineOptions) -> Self {
        let process = match UciProcess::spawn(path, &options).await {
            Ok(process) => {
                info!(path, "Stockfish started");
                Some(process)
            }
            Err(e) => {
                warn!(path, error = %e, "Stockfish not available, tutoring without analysis");
                None
            }
        };
        Self {
            path: path.to_string(),
            options,
            process,
        }
    }

    fn live(&mut self) -> Result<&mut UciProcess, EngineError> {
        self.process
            .as_mut()
            .ok_or_else(|| EngineError::Unavailable("engine is not running".into()))
    }

    /// Drop the process when the pipe broke or the engine stopped answering.
    fn check<T>(&mut self, result: Result<T, EngineError>) -> Result<T, EngineError> {
        if let Err(e) = &result {
            let lost = matches!(
                e,
                EngineError::Io(_) | EngineError::Timeout(_) | EngineError::Unavailable(_)
            );
            if lost && self.process.is_some() {
                warn!(error = %e, "Stockfish lost, marking engine dead");
                self.process = None;
            }
        }
        result
    }

    async fn run_search(
        &mut self,
        pos: &Chess,
        go: &str,
        multipv: usize,
    ) -> Result<SearchOutput, EngineError> {
        let result = match self.live() {
            Ok(process) => process.search(pos, go, multipv).await,
            Err(e) => Err(e),
        };
        self.check(result)
    }
}

#[async_trait]
impl AnalysisEngine for StockfishEngine {
    async fn evaluate_top(
        &mut self,
        pos: &Chess,
        depth: u32,
        lines: usize,
    ) -> Result<Vec<CandidateLine>, EngineError> {
        let set = match self.live() {
            Ok(process) => {
                process
                    .send(&format!("setoption name MultiPV value {lines}"))
                    .await
            }
            Err(e) => Err(e),
        };
        self.check(set)?;

        let output = self
            .run_search(pos, &format!("go depth {depth}"), lines)
            .await?;

        // Reset MultiPV to 1
        let reset = match self.live() {
            Ok(process) => process.send("setoption name MultiPV value 1").await,
            Err(e) => Err(e),
        };
        self.check(reset)?;

        Ok(output.lines)
    }

    async fn evaluate(&mut self, pos: &Chess, depth: u32) -> Result<Score, EngineError> {
        let output = self
            .run_search(pos, &format!("go depth {depth}"), 1)
            .await?;
        output
            .lines
            .first()
            .map(|line| line.score)
            .ok_or_else(|| EngineError::Protocol("search reported no score".into()))
    }

    async fn best_move(
        &mut self,
        pos: &Chess,
        budget: SearchBudget,
    ) -> Result<Option<UciMove>, EngineError> {
        let go = format!(
            "go depth {} movetime {}",
            budget.depth,
            budget.think_time.as_millis()
        );
        Ok(self.run_search(pos, &go, 1).await?.best_move)
    }

    async fn set_strength(&mut self, elo: Option<u32>) -> Result<(), EngineError> {
        let result = match self.live() {
            Ok(process) => process.limit_strength(elo).await,
            Err(e) => Err(e),
        };
        if result.is_ok() {
            debug!(?elo, "Engine strength set");
        }
        self.check(result)
    }

    fn is_alive(&self) -> bool {
        self.process.is_some()
    }

    async fn restart(&mut self) -> Result<(), EngineError> {
        if self.process.is_some() {
            return Ok(());
        }
        let process = UciProcess::spawn(&self.path, &self.options).await?;
        info!(path = %self.path, "Stockfish restarted");
        self.process = Some(process);
        Ok(())
    }
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "cp" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "mate" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

fn parse_score(line: &str) -> Option<Score> {
    parse_mate(line)
        .map(Score::Mate)
        .or_else(|| parse_cp(line).map(Score::Cp))
}

/// Parse multipv index from info line
fn parse_multipv_index(line: &str) -> Option<u32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == "multipv" && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

/// Parse PV moves from info line. Stops at the first token that is not a move.
fn parse_pv(line: &str) -> Vec<UciMove> {
    line.split_whitespace()
        .skip_while(|part| *part != "pv")
        .skip(1)
        .map_while(|part| part.parse::<UciMove>().ok())
        .collect()
}

/// Parse `bestmove e2e4 [ponder ...]`. `(none)` means no legal move.
fn parse_bestmove(line: &str) -> Result<Option<UciMove>, EngineError> {
    match line.split_whitespace().nth(1) {
        Some("(none)") | Some("0000") => Ok(None),
        Some(text) => text
            .parse::<UciMove>()
            .map(Some)
            .map_err(|_| EngineError::Protocol(format!("unreadable bestmove '{text}'"))),
        None => Err(EngineError::Protocol("bestmove without a move".into())),
    }
}
