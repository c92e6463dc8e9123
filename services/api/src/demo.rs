use crate::infra::open_store;
use clap::Args;
use gut_catcher::config::AppConfig;
use gut_catcher::error::AppError;
use gut_catcher::workflows::questionnaire::{
    evaluate, resolve_persona, AnswerSet, JsonFileStore, QuestionnaireSession,
    QuestionnaireSource, ScoreResult, Step,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file mapping question ids to the selected option
    #[arg(long)]
    pub(crate) answers: PathBuf,
    /// Persona to score for (defaults to the general audience)
    #[arg(long)]
    pub(crate) persona: Option<String>,
    /// Questionnaire data directory (defaults to APP_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Persona to walk the questionnaire as
    #[arg(long)]
    pub(crate) persona: Option<String>,
    /// Questionnaire data directory (defaults to APP_DATA_DIR)
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

fn store_for(data_dir: Option<PathBuf>) -> Result<Arc<JsonFileStore>, AppError> {
    let data_dir = match data_dir {
        Some(dir) => dir,
        None => AppConfig::load()?.storage.data_dir,
    };
    open_store(&data_dir)
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        answers,
        persona,
        data_dir,
    } = args;

    let store = store_for(data_dir)?;
    let raw = std::fs::read_to_string(&answers)?;
    let answers: AnswerSet = serde_json::from_str(&raw)?;

    let persona = resolve_persona(persona.as_deref(), &store.personas());
    let result = evaluate(
        &store.catalog(),
        &store.scoring_profiles(),
        &persona,
        &answers,
    );

    for line in render_review(&result) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = store_for(args.data_dir)?;
    let catalog = store.catalog();
    let profiles = store.scoring_profiles();
    let persona = resolve_persona(args.persona.as_deref(), &store.personas());

    println!("Gut Catcher questionnaire demo");
    let mut session = QuestionnaireSession::new(persona);

    for _ in 0..session.total_steps(&catalog) {
        println!("\n{}", session.progress_label(&catalog));
        match session.step(&catalog) {
            Step::Welcome => println!("Persona: {}", session.persona()),
            Step::Section(_) => {
                let Some(section) = session.current_section(&catalog) else {
                    break;
                };
                println!("{}", section.title);
                for question in &section.items {
                    let Some(option) = question.options.first() else {
                        continue;
                    };
                    match session.select(question, option) {
                        Some(detail) => println!("  {} -> {option} ({detail})", question.title),
                        None => println!("  {} -> {option}", question.title),
                    }
                }
            }
            Step::Review => {
                for line in render_review(&session.preview(&catalog, &profiles)) {
                    println!("{line}");
                }
                break;
            }
        }
        session.next(&catalog);
    }

    Ok(())
}

fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(value) => format!("{}%", value.round() as i64),
        None => "n/a".to_string(),
    }
}

/// One line per scored section followed by the overall score.
pub(crate) fn render_review(result: &ScoreResult) -> Vec<String> {
    let mut lines: Vec<String> = result
        .per_section
        .iter()
        .map(|(_, section)| {
            format!(
                "{}: {} ({} answered)",
                section.title,
                format_percent(section.percent),
                section.answered
            )
        })
        .collect();
    lines.push(format!("Overall: {}", format_percent(result.overall)));
    lines
}
