//! fss-ctl — command-line client for the FSS sentence-search responder.

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};

use fss_core::config::FssConfig;
use fss_core::wire::{MacAddr, SENTENCE_MAX};
use fss_link::{FssClient, SearchReply};

// ── Rendering ─────────────────────────────────────────────────────────────────

/// One reply, rendered the way the terminal user sees it.
///
/// `sentence` is the (already truncated) sentence we sent; the matched
/// substring is sliced out of it rather than the echo, so a reply from a
/// confused peer can never make us print someone else's bytes.
fn render_reply(sentence: &[u8], phrase: &str, reply: &SearchReply) -> String {
    let mut out = format!("phrase '{}' found {} time(s)", phrase, reply.find_count);

    if let Some(pos) = reply.first_find {
        out.push_str(&format!("\nfirst occurrence at byte {}", pos));
        // An offset past our own sentence is nonsense; print no substring.
        let start = pos as usize;
        if let Some(hit) = sentence.get(start..start.saturating_add(phrase.len())) {
            out.push_str(&format!(": \"{}\"", String::from_utf8_lossy(hit)));
        }
    }

    out
}

/// Warn-and-truncate for sentences past the wire capacity. The codec
/// would truncate anyway; doing it here keeps the printed substring
/// offsets honest.
fn clamp_sentence(mut sentence: Vec<u8>) -> Vec<u8> {
    if sentence.len() > SENTENCE_MAX {
        println!("sentence too long, truncating to {} bytes", SENTENCE_MAX);
        sentence.truncate(SENTENCE_MAX);
    }
    sentence
}

// ── Modes ─────────────────────────────────────────────────────────────────────

/// Interactive loop: one sentence per line, `exit` (or EOF) ends the
/// session. Exchange failures are printed and the prompt comes back;
/// nothing a single exchange does ends the loop.
fn run_loop(client: &FssClient, phrase: &str) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let line = match lines.next() {
            Some(line) => line.context("failed to read stdin")?,
            None => break,
        };
        if line == "exit" {
            break;
        }

        let sentence = clamp_sentence(line.into_bytes());
        match client.exchange(&sentence) {
            Ok(reply) => println!("{}", render_reply(&sentence, phrase, &reply)),
            Err(e) => println!("{}", e),
        }
    }

    Ok(())
}

/// One-shot mode: send a single sentence, print the result, exit nonzero
/// on any failure. Scriptable.
fn run_send(client: &FssClient, phrase: &str, sentence: &str) -> Result<()> {
    let sentence = clamp_sentence(sentence.as_bytes().to_vec());
    let reply = client.exchange(&sentence)?;
    println!("{}", render_reply(&sentence, phrase, &reply));
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn print_usage() {
    println!("Usage: fss-ctl [options] [send <sentence>...]");
    println!();
    println!("Without a command, runs the interactive loop: one sentence per line,");
    println!("'exit' quits.");
    println!();
    println!("Commands:");
    println!("  send <sentence>...   Send one sentence, print the result, exit");
    println!();
    println!("Options:");
    println!("  --iface <name>       Interface to bind (overrides config)");
    println!("  --peer <mac>         Responder hardware address (overrides config)");
    println!("  --timeout-ms <n>     Reply deadline in milliseconds (overrides config)");
    println!("  --phrase <p>         Phrase used to render matches (overrides config)");
}

fn open_client(config: &FssConfig) -> Result<FssClient> {
    if config.link.interface.is_empty() {
        bail!("no interface: pass --iface or set [link] interface in the config");
    }
    let peer: MacAddr = config
        .link
        .peer_mac
        .parse()
        .with_context(|| format!("invalid peer MAC '{}'", config.link.peer_mac))?;
    let timeout = Duration::from_millis(config.exchange.timeout_ms);

    FssClient::open(&config.link.interface, peer, timeout)
        .with_context(|| format!("failed to open client on '{}'", config.link.interface))
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut config = FssConfig::load().unwrap_or_else(|e| {
        eprintln!("failed to load config, using defaults: {e}");
        FssConfig::default()
    });

    // Parse option flags; each overrides its config field
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--iface" => {
                i += 1;
                config.link.interface = args.get(i).context("--iface requires a value")?.clone();
            }
            "--peer" => {
                i += 1;
                config.link.peer_mac = args.get(i).context("--peer requires a value")?.clone();
            }
            "--timeout-ms" => {
                i += 1;
                config.exchange.timeout_ms = args
                    .get(i)
                    .context("--timeout-ms requires a value")?
                    .parse()
                    .context("--timeout-ms must be a number")?;
            }
            "--phrase" => {
                i += 1;
                config.search.phrase = args.get(i).context("--phrase requires a value")?.clone();
            }
            _ => remaining.push(&args[i]),
        }
        i += 1;
    }

    match remaining.as_slice() {
        []                             => run_loop(&open_client(&config)?, &config.search.phrase),
        ["send", sentence @ ..] if !sentence.is_empty() => {
            run_send(&open_client(&config)?, &config.search.phrase, &sentence.join(" "))
        }
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
