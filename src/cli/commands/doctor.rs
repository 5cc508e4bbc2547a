//! Doctor command - verify system requirements and configuration.

use crate::cli::preflight::version_arg;
use crate::cli::Output;
use crate::config::{EmbeddingProvider, Settings};
use crate::vector_store::{CHUNKS_FILE, INDEX_FILE};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

fn print_section(title: &str, checks: &[CheckResult]) {
    println!("{}", style(title).bold());
    for check in checks {
        check.print();
    }
    println!();
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Svar Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    let tools = vec![
        check_tool(&settings.transcription.extractor, install_hint_ytdlp()),
        check_tool(&settings.transcription.command, install_hint_whisper()),
        check_tool("ffmpeg", install_hint_ffmpeg()),
        check_tool("ffprobe", install_hint_ffmpeg()),
    ];
    print_section("External Tools", &tools);
    checks.extend(tools);

    let mut credentials = vec![check_hf_token(settings.answer.api_token.as_deref())];
    if settings.embedding.provider == EmbeddingProvider::OpenAI {
        credentials.push(check_openai_api_key());
    }
    print_section("API Configuration", &credentials);
    checks.extend(credentials);

    let dirs = check_directories(settings);
    print_section("Directories", &dirs);
    checks.extend(dirs);

    let config = vec![check_config_file()];
    print_section("Configuration", &config);
    checks.extend(config);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Svar.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Svar is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg(version_arg(name)).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .filter(|line| !line.starts_with("usage:"))
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = match version.char_indices().nth(50) {
                Some((idx, _)) => format!("{}...", &version[..idx]),
                None => version,
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::error(name, "not found", hint),
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check the answer service credential.
fn check_hf_token(token: Option<&str>) -> CheckResult {
    match token {
        Some(key) if key.is_ascii() && key.starts_with("hf_") && key.len() > 10 => {
            let masked = format!("{}...{}", &key[..5], &key[key.len() - 4..]);
            CheckResult::ok("HF_TOKEN", &format!("configured ({})", masked))
        }
        Some("") | None => CheckResult::error(
            "HF_TOKEN",
            "not set",
            "Set with: export HF_TOKEN='hf_...' (answers will be errors without it)",
        ),
        Some(_) => CheckResult::warning(
            "HF_TOKEN",
            "set but format looks unusual",
            "Expected format: hf_... (Hugging Face access token)",
        ),
    }
}

/// Check the OpenAI key when OpenAI embeddings are configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => CheckResult::ok("OPENAI_API_KEY", "configured"),
        _ => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...' or switch embedding.provider to huggingface",
        ),
    }
}

/// Check cache, audio and index locations.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![
        check_dir("Cache directory", &settings.cache_dir()),
        check_dir("Audio directory", &settings.temp_audio_dir()),
    ];

    let cache_dir = settings.cache_dir();
    let index_path = cache_dir.join(INDEX_FILE);
    let chunks_path = cache_dir.join(CHUNKS_FILE);
    match (index_path.exists(), chunks_path.exists()) {
        (true, true) => {
            let size = std::fs::metadata(&index_path)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "unknown size".to_string());
            results.push(CheckResult::ok(
                "Index",
                &format!("{} ({})", index_path.display(), size),
            ));
        }
        (false, false) => results.push(CheckResult::warning(
            "Index",
            "not built yet",
            "The index is built on the first question with sources",
        )),
        _ => results.push(CheckResult::warning(
            "Index",
            "incomplete (one of the two index files is missing)",
            "Ask a question with sources to rebuild it",
        )),
    }

    let cached = std::fs::read_dir(&cache_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
                .count()
        })
        .unwrap_or(0);
    results.push(CheckResult::ok("Cached transcripts", &cached.to_string()));

    results
}

fn check_dir(name: &str, path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok(name, &format!("{}", path.display()))
    } else {
        CheckResult::warning(
            name,
            &format!("{} (will be created)", path.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: svar config edit")
    }
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}

fn install_hint_whisper() -> &'static str {
    "Install with: pip install -U openai-whisper"
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
