use cifar_engine::{ScoringEngine, MODEL_DIR_ENV};
use std::env;
use std::fmt::Display;
use std::io::{self, BufRead, Write};

fn error_line(message: impl Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

/// Writes one output line for one request. Failures to read the request
/// count against that request only.
fn respond(
    engine: &ScoringEngine,
    body: io::Result<String>,
    out: &mut impl Write,
) -> io::Result<()> {
    let line = match body {
        Ok(body) => match engine.run(&body) {
            Ok(prediction) => serde_json::to_string(&prediction)?,
            Err(e) => {
                log::error!("request failed: {}", e);
                error_line(e.summary())
            }
        },
        Err(e) => {
            log::error!("unreadable request: {}", e);
            error_line(e)
        }
    };
    writeln!(out, "{}", line)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: {} [request.json ...]", args[0]);
        eprintln!("\nLoads {}/cifar_net.pt, then scores each request file,", MODEL_DIR_ENV);
        eprintln!("or each non-empty stdin line when no files are given.");
        return Ok(());
    }

    let engine = match ScoringEngine::init() {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("startup failed: {}", e);
            std::process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.len() > 1 {
        for path in &args[1..] {
            let body = std::fs::read_to_string(path)
                .map_err(|e| io::Error::new(e.kind(), format!("{}: {}", path, e)));
            respond(&engine, body, &mut out)?;
        }
    } else {
        for line in io::stdin().lock().split(b'\n') {
            let body = String::from_utf8(line?)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e));
            if matches!(&body, Ok(text) if text.trim().is_empty()) {
                continue;
            }
            respond(&engine, body, &mut out)?;
        }
    }

    Ok(())
}
