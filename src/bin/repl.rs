//! Interactive REPL for patternlm.
//!
//! Run: cargo run --release --bin repl
//!
//! Commands:
//!   <prompt text>     — generate up to 20 tokens from the prompt
//!   temp <t>          — set sampling temperature (default 0.7)
//!   report            — efficiency report
//!   info              — model info
//!   save <path>       — persist the trained model
//!   load <path>       — restore a persisted model
//!   quit / exit       — leave

use std::io::{self, BufRead, Write};

use patternlm::data::medium_corpus;
use patternlm::{EngineConfig, PatternEngine};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    eprintln!("=== patternlm REPL ===");
    eprintln!("Training on the built-in corpus...");

    let config = EngineConfig::default();
    let mut engine = match PatternEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("engine init failed: {e}");
            return;
        }
    };
    if let Err(e) = engine.train(&medium_corpus()) {
        eprintln!("training failed: {e}");
        return;
    }

    let info = engine.model_info();
    eprintln!(
        "Ready! patterns={}, vocab={}, graph={} nodes / {} edges, ~{:.1} KB",
        info.patterns,
        info.vocabulary_words,
        info.graph_nodes,
        info.graph_edges,
        info.memory_bytes as f64 / 1024.0
    );
    eprintln!();

    let mut temperature = 0.7;
    let stdin = io::stdin();
    loop {
        eprint!("lm> ");
        io::stderr().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break; // EOF
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "quit" | "exit" => break,
            "report" => {
                let report = match engine.efficiency_report() {
                    Ok(report) => report,
                    Err(e) => {
                        eprintln!("  report unavailable: {e}");
                        continue;
                    }
                };
                println!("  patterns stored:  {}", report.patterns_stored);
                println!("  memory estimate:  {:.1} KB", report.memory_bytes as f64 / 1024.0);
                println!("  sparsity:         {:.1}%", report.sparsity_ratio * 100.0);
                println!("  cache hit rate:   {:.2}", report.cache_hit_rate);
                println!("  avg activations:  {:.2}", report.avg_activations_per_generation);
            }
            "info" => {
                let info = engine.model_info();
                println!("  trained:       {}", info.is_trained);
                println!("  patterns:      {}", info.patterns);
                println!("  vocabulary:    {}", info.vocabulary_words);
                println!("  graph:         {} nodes, {} edges", info.graph_nodes, info.graph_edges);
                println!("  cached ctxs:   {}", info.cached_contexts);
                println!("  memory:        {:.1} KB", info.memory_bytes as f64 / 1024.0);
            }
            _ if line.starts_with("temp ") => match line[5..].trim().parse::<f64>() {
                Ok(t) if t >= 0.0 => {
                    temperature = t;
                    println!("  temperature = {temperature}");
                }
                _ => eprintln!("  usage: temp <non-negative float>"),
            },
            _ if line.starts_with("save ") => {
                let path = line[5..].trim();
                match engine.save(path) {
                    Ok(()) => println!("  saved to {path}"),
                    Err(e) => eprintln!("  save failed: {e}"),
                }
            }
            _ if line.starts_with("load ") => {
                let path = line[5..].trim();
                match engine.load(path) {
                    Ok(()) => println!("  loaded from {path}"),
                    Err(e) => eprintln!("  load failed: {e}"),
                }
            }
            prompt => match engine.generate(prompt, 20, temperature) {
                Ok(text) => println!("  {text}"),
                Err(e) => eprintln!("  generation failed: {e}"),
            },
        }
    }
}
