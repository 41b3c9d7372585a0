//! Question answering command.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::icons::{error, info};
use crate::config::Config;
use crate::embed::create_embedder;
use crate::llm::LlmClient;
use crate::models::Answer;
use crate::qa::QueryEngine;

const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

/// Answer one question, or run an interactive loop when none is given.
pub async fn cmd_ask(config: &Config, index_dir: &Path, question: Option<&str>) -> anyhow::Result<()> {
    let embedder = create_embedder(&config.embedding)?;
    let llm = Arc::new(LlmClient::new(config.llm.clone())?);
    let engine = QueryEngine::open(index_dir, embedder, llm, config.retrieval.clone())?
        .with_prompt(config.llm.get_qa_prompt());

    if let Some(question) = question {
        let answer = engine.ask(question).await?;
        print_answer(&answer);
        return Ok(());
    }

    let meta = &engine.index().meta;
    println!(
        "{} Loaded {} ({} passages). Ask a question, or type 'quit' to exit.",
        info(),
        style(&meta.source.file_name).bold(),
        engine.index().len()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n{} ", style("Question:").cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&question.to_lowercase().as_str()) {
            break;
        }

        match engine.ask(question).await {
            Ok(answer) => print_answer(&answer),
            Err(e) => eprintln!("{} {}", error(), e),
        }
    }

    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("\n{}", answer.answer);
    if answer.sources.is_empty() {
        return;
    }
    println!("\n{}", style("Sources:").dim());
    for (i, source) in answer.sources.iter().enumerate() {
        println!(
            "  [{}] Page {} ({}) {}",
            i + 1,
            source.page,
            source.kind,
            style(format!("{:.3}", source.score)).dim()
        );
    }
}
