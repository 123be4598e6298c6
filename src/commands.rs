use crate::cli::Commands;
use crate::config::Config;
use crate::error::{Result, SnipError};
use crate::library::{SearchSource, SnippetLibrary};
use crate::models::{language_from_path, Snippet};
use crate::policy::{SaveMode, SaveOutcome};
use crate::server::{start_api_server, ServerState};
use crate::storage::LocalStore;
use arboard::Clipboard;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

pub async fn handle_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Add {
            title,
            description,
            language,
            tags,
            file,
        } => handle_add(config, title, description, language, tags, file).await,
        Commands::List => handle_list(config).await,
        Commands::Search { query } => handle_search(config, query).await,
        Commands::Show { position } => {
            let snippet = get_snippet(&SnippetLibrary::open(config), position).await?;
            print!("{}", snippet.code);
            if !snippet.code.ends_with('\n') {
                println!();
            }
            Ok(())
        }
        Commands::Insert { position } => handle_insert(config, position).await,
        Commands::Delete { position } => handle_delete(config, position).await,
        Commands::Sync => handle_sync(config).await,
        Commands::Config => handle_config(&config),
        Commands::Serve {
            port,
            token,
            in_memory,
        } => {
            let store = if in_memory {
                LocalStore::in_memory()
            } else {
                LocalStore::open(config.server_db_file_path())
            };
            println!("Serving snippets on http://127.0.0.1:{}", port);
            start_api_server(port, ServerState::new(store, token)).await
        }
    }
}

async fn handle_add(
    config: Config,
    title: String,
    description: String,
    language: Option<String>,
    tags: Vec<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    // Validate before reading any input
    if title.trim().is_empty() {
        return Err(SnipError::Validation("title must not be empty".to_string()));
    }

    let (code, language) = match file {
        Some(path) => {
            let code = fs::read_to_string(&path)?;
            let language = language.unwrap_or_else(|| language_from_path(&path).to_string());
            (code, language)
        }
        None => {
            let mut stdin = io::stdin();
            if stdin.is_terminal() {
                eprintln!("Reading code from stdin, finish with Ctrl-D");
            }
            let mut code = String::new();
            stdin.read_to_string(&mut code)?;
            (code, language.unwrap_or_else(|| "plaintext".to_string()))
        }
    };

    let snippet = Snippet::new(title, description, code, language, tags)?;
    let library = SnippetLibrary::open(config);

    match library.save(snippet).await? {
        SaveOutcome::RemoteAndLocal(snippet) => println!(
            "Snippet '{}' saved to the remote service and locally",
            snippet.title
        ),
        SaveOutcome::Local(snippet) => println!("Snippet '{}' saved locally", snippet.title),
        SaveOutcome::LocalFallback { snippet, error } => {
            eprintln!(
                "Warning: could not reach the remote service ({}). Snippet '{}' saved locally; run `snipsync sync` later.",
                error, snippet.title
            );
        }
    }
    Ok(())
}

async fn handle_list(config: Config) -> Result<()> {
    let snippets = SnippetLibrary::open(config).list().await?;
    if snippets.is_empty() {
        println!("No snippets yet. Add one with `snipsync add`.");
        return Ok(());
    }

    let now = Utc::now();
    for (i, snippet) in snippets.iter().enumerate() {
        println!("{}", format_row(i + 1, snippet, now));
    }
    Ok(())
}

async fn handle_search(config: Config, query: Option<String>) -> Result<()> {
    let results = SnippetLibrary::open(config)
        .search(query.as_deref())
        .await?;

    let source = match results.source {
        SearchSource::Remote => "remote",
        SearchSource::Local => "local",
    };
    println!("{} {} result(s)", results.snippets.len(), source);

    let now = Utc::now();
    for (i, snippet) in results.snippets.iter().enumerate() {
        println!("{}", format_row(i + 1, snippet, now));
    }
    Ok(())
}

async fn handle_insert(config: Config, position: usize) -> Result<()> {
    let snippet = get_snippet(&SnippetLibrary::open(config), position).await?;

    let mut clipboard = Clipboard::new().map_err(|e| SnipError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(snippet.code.clone())
        .map_err(|e| SnipError::Clipboard(e.to_string()))?;

    println!("Copied '{}' to the clipboard", snippet.title);
    Ok(())
}

async fn handle_delete(config: Config, position: usize) -> Result<()> {
    let library = SnippetLibrary::open(config);
    let removed = library
        .delete(to_index(position)?)
        .await
        .map_err(|e| with_user_position(e, position))?;

    println!("Snippet '{}' deleted", removed.title);
    Ok(())
}

async fn handle_sync(config: Config) -> Result<()> {
    let report = SnippetLibrary::open(config).sync().await?;

    if report.attempted() == 0 {
        println!("Everything is already synced");
    } else if report.is_clean() {
        println!("Synced {} snippet(s)", report.synced);
    } else {
        eprintln!(
            "Synced {} snippet(s), {} failed; they stay local until the next sync",
            report.synced, report.failed
        );
    }
    Ok(())
}

fn handle_config(config: &Config) -> Result<()> {
    let mode = match SaveMode::from_config(config) {
        SaveMode::Remote => "remote + local",
        SaveMode::LocalOnly => "local only",
    };
    let key = match &config.api_key {
        Some(_) => "********",
        None => "(none)",
    };

    println!("Save mode:  {}", mode);
    println!("API URL:    {}", config.api_url);
    println!("API key:    {}", key);
    println!("Snippets:   {}", config.db_file_path().display());
    Ok(())
}

async fn get_snippet(library: &SnippetLibrary, position: usize) -> Result<Snippet> {
    library
        .get(to_index(position)?)
        .await
        .map_err(|e| with_user_position(e, position))
}

/// Positions on the command line start at 1
fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or(SnipError::NotFound(position))
}

fn with_user_position(err: SnipError, position: usize) -> SnipError {
    match err {
        SnipError::NotFound(_) => SnipError::NotFound(position),
        other => other,
    }
}

fn format_row(position: usize, snippet: &Snippet, now: DateTime<Utc>) -> String {
    let marker = if snippet.is_synced() { ' ' } else { '*' };
    let tags = if snippet.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", snippet.tags.join(", "))
    };

    format!(
        "{:>3}{} {} {:<12} {}{}",
        position,
        marker,
        format_elapsed_time(snippet.created_at, now),
        snippet.language,
        snippet.title,
        tags
    )
}

fn format_elapsed_time(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(created);

    let formatted = if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds().max(0))
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else {
        format!("{}d ago", duration.num_days())
    };

    format!("{:>7}", formatted) // Right-align with 7 characters
}
