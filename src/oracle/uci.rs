use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::debug;

use super::MoveOracle;
use crate::error::OracleError;

/// Score reported for a forced mate, minus the distance to it.
const MATE_SCORE: i32 = 10_000;

/// Oracle that runs a UCI engine (e.g. Stockfish) per query.
pub struct UciOracle {
    path: PathBuf,
}

#[derive(Debug, Default)]
struct SearchReport {
    best_move: Option<String>,
    score: Option<i32>,
}

impl UciOracle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn search(&self, fen: &str, depth: u8) -> Result<SearchReport, OracleError> {
        if !self.path.exists() {
            return Err(OracleError::Unavailable(self.path.clone()));
        }

        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let mut stdin = child.stdin.take().ok_or(OracleError::NoAnswer("stdin"))?;
        let stdout = child.stdout.take().ok_or(OracleError::NoAnswer("stdout"))?;
        let mut lines = BufReader::new(stdout).lines();

        writeln!(stdin, "uci")?;
        loop {
            let line = lines.next().ok_or(OracleError::NoAnswer("uciok"))??;
            if line.trim() == "uciok" {
                break;
            }
        }

        writeln!(stdin, "position fen {}", fen)?;
        writeln!(stdin, "go depth {}", depth)?;

        let mut report = SearchReport::default();
        for line in lines {
            let line = line?;
            if line.starts_with("info") {
                if let Some(score) = parse_score(&line)? {
                    report.score = Some(score);
                }
            } else if let Some(rest) = line.strip_prefix("bestmove") {
                report.best_move = rest
                    .split_whitespace()
                    .next()
                    .filter(|mv| *mv != "(none)")
                    .map(str::to_string);
                break;
            }
        }

        // The engine may already be gone; nothing to do about it here.
        let _ = writeln!(stdin, "quit");
        drop(stdin);
        if child.wait().is_err() {
            let _ = child.kill();
        }

        debug!("UCI search at depth {}: {:?}", depth, report);
        Ok(report)
    }
}

impl MoveOracle for UciOracle {
    fn best_move(&self, fen: &str, depth: u8) -> Result<String, OracleError> {
        self.search(fen, depth)?
            .best_move
            .ok_or(OracleError::NoAnswer("best move"))
    }

    fn evaluate(&self, fen: &str, depth: u8) -> Result<i32, OracleError> {
        self.search(fen, depth)?
            .score
            .ok_or(OracleError::NoAnswer("score"))
    }
}

/// Extract `score cp N` or `score mate N` from an `info` line.
///
/// Lines without a score yield `None`; a score that does not parse is an error.
fn parse_score(line: &str) -> Result<Option<i32>, OracleError> {
    let mut tokens = line.split_whitespace().skip_while(|t| *t != "score").skip(1);
    let (Some(unit), Some(raw)) = (tokens.next(), tokens.next()) else {
        return Ok(None);
    };
    let bad_output = || OracleError::BadOutput(line.to_string());
    let value: i32 = match unit {
        "cp" | "mate" => raw.parse().map_err(|_| bad_output())?,
        _ => return Ok(None),
    };
    Ok(Some(match unit {
        "cp" => value,
        _ if value > 0 => MATE_SCORE - value,
        _ => -MATE_SCORE - value,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_centipawn_score() {
        let line = "info depth 12 seldepth 18 multipv 1 score cp 34 nodes 1234 pv e2e4 e7e5";
        assert_eq!(parse_score(line).unwrap(), Some(34));
        assert_eq!(parse_score("info depth 3 score cp -120 pv d2d4").unwrap(), Some(-120));
    }

    #[test]
    fn test_parse_mate_score() {
        assert_eq!(parse_score("info depth 9 score mate 3 pv h5f7").unwrap(), Some(9997));
        assert_eq!(parse_score("info depth 9 score mate -2 pv a2a3").unwrap(), Some(-9998));
    }

    #[test]
    fn test_parse_score_missing() {
        assert_eq!(parse_score("info string NNUE evaluation enabled").unwrap(), None);
        assert_eq!(parse_score("info depth 1 score").unwrap(), None);
    }

    #[test]
    fn test_parse_garbled_score_is_bad_output() {
        let err = parse_score("info depth 4 score cp lots pv e2e4").unwrap_err();
        assert!(matches!(err, OracleError::BadOutput(line) if line.contains("cp lots")));
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let oracle = UciOracle::new(PathBuf::from("/nonexistent/stockfish"));
        let err = oracle.best_move("8/8/8/8/8/8/8/8 w - - 0 1", 5).unwrap_err();
        assert!(matches!(err, OracleError::Unavailable(_)));
    }
}
