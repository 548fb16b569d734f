//! The `recque learn` command: the interactive question loop.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use comfy_table::{Cell, Table};
use uuid::Uuid;

use recque_core::engine::{AnswerOutcome, EngineState, QuestioningEngine};
use recque_core::error::EngineError;
use recque_core::model::{Question, SessionState, SkillAdvance};
use recque_core::statistics::SessionStats;
use recque_core::traits::{QuestionProvider, SessionStore};
use recque_providers::{create_provider, load_config_from, ProviderConfig};
use recque_store::JsonFileStore;

pub async fn execute(
    topic: Option<String>,
    resume: Option<Uuid>,
    provider_name: Option<String>,
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    no_save: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let name = provider_name.unwrap_or_else(|| config.default_provider.clone());

    let provider_config = match config.providers.get(&name) {
        Some(pc) => pc.clone(),
        // The mock provider needs no configuration.
        None if name == "mock" => ProviderConfig::Mock {},
        None => bail!(
            "provider '{name}' is not configured. Run `recque init` and edit recque.toml"
        ),
    };
    let provider: Arc<dyn QuestionProvider> = Arc::from(create_provider(&provider_config)?);
    tracing::info!(provider = provider.name(), "provider ready");

    let store: Option<Arc<dyn SessionStore>> = if no_save {
        None
    } else {
        Some(Arc::new(JsonFileStore::new(
            data_dir.unwrap_or(config.data_dir),
        )))
    };

    let mut engine = match &store {
        Some(store) => QuestioningEngine::with_store(provider, store.clone()),
        None => QuestioningEngine::new(provider),
    };

    match (resume, topic) {
        (Some(session_id), _) => {
            let store = store
                .as_ref()
                .context("--resume requires persistence; drop --no-save")?;
            let session = store
                .load(session_id)
                .await
                .with_context(|| format!("failed to load session {session_id}"))?;
            engine.resume(session)?;
            println!(
                "Resuming \"{}\" ({} of {} skills complete)\n",
                engine.topic().unwrap_or_default(),
                engine.session().map_or(0, |s| s.skill_track.completed_count()),
                engine.session().map_or(0, |s| s.skill_track.len()),
            );
        }
        (None, Some(topic)) => {
            println!("Mapping out \"{topic}\"...\n");
            engine.start_topic(&topic).await?;
        }
        (None, None) => bail!("provide a topic to learn, or --resume <id>"),
    }

    let persisted = store.is_some();
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    run_session(&mut engine, &mut input, persisted).await?;
    Ok(())
}

/// Drive the engine until the topic completes or the learner quits.
async fn run_session(
    engine: &mut QuestioningEngine,
    input: &mut impl BufRead,
    persisted: bool,
) -> Result<()> {
    let mut announced_skill: Option<String> = None;

    loop {
        match engine.state() {
            EngineState::TopicComplete => {
                println!("\nTopic complete. Well done!");
                if let Some(session) = engine.session() {
                    print_stats(session);
                }
                return Ok(());
            }
            EngineState::AwaitingQuestion | EngineState::AwaitingAnswer => {}
            state => bail!("unexpected engine state: {state}"),
        }

        if let Some(skill) = engine.current_skill() {
            if announced_skill.as_deref() != Some(skill.name.as_str()) {
                println!("# {}\n", titlecase(&skill.name));
                announced_skill = Some(skill.name.clone());
            }
        }

        let question = engine
            .request_current_question()
            .await
            .context("question generation failed; the session is saved up to the last answer")?;
        present_question(&question, engine);

        let Some(choice) = read_choice(input, question.options.len())? else {
            // Quit: the last committed snapshot stays on disk for resume.
            let session = engine.abandon_session()?;
            println!("\nStopping here.");
            if persisted {
                println!("Resume with: recque learn --resume {}", session.id);
            }
            print_stats(&session);
            return Ok(());
        };

        match engine.submit_answer(choice).await {
            Ok(AnswerOutcome::NewSubquestion(_)) => {
                println!("\nNot quite. Let's build up to it with a simpler question.\n");
            }
            Ok(AnswerOutcome::RetryParent(_)) => {
                println!("\nCorrect! Back to the earlier question.\n");
            }
            Ok(AnswerOutcome::SkillFinished(SkillAdvance::AdvancedTo(next))) => {
                println!("\nCorrect! Skill complete. Next up: {}\n", next.name);
            }
            Ok(AnswerOutcome::SkillFinished(SkillAdvance::TrackComplete)) => {
                println!("\nCorrect!");
            }
            Err(EngineError::InvalidAnswerIndex { options, .. }) => {
                println!("\nEnter a number between 1 and {options}, or q to quit.\n");
            }
            // The engine left everything untouched, so the same question
            // can simply be asked again.
            Err(EngineError::Provider(e)) if !e.is_permanent() => {
                println!("\nProvider error: {e}. Let's try that again.\n");
            }
            Err(e) => return Err(e.into()),
        }

        ensure_saved(engine).await;
    }
}

/// A failed commit-point save leaves the engine dirty. Retry once and
/// tell the learner where things stand either way.
async fn ensure_saved(engine: &mut QuestioningEngine) {
    if !engine.is_dirty() {
        return;
    }
    println!("Saving progress failed, retrying...");
    match engine.persist().await {
        Ok(()) => println!("Saved."),
        Err(e) => {
            println!("Still unable to save ({e}); progress is kept in memory and the next answer retries.");
        }
    }
}

/// Print the question with numbered options. Options the learner already
/// got wrong on this very question are marked so they can rule them out.
fn present_question(question: &Question, engine: &QuestioningEngine) {
    let wrong_choices: Vec<usize> = engine
        .history()
        .iter()
        .filter(|r| r.question_id == question.id && !r.correct)
        .map(|r| r.chosen_option_index)
        .collect();

    println!("Question: {}\n", question.prompt_text);
    for (i, option) in question.options.iter().enumerate() {
        if wrong_choices.contains(&i) {
            println!("  {}. {option} (incorrect)", i + 1);
        } else {
            println!("  {}. {option}", i + 1);
        }
    }
}

/// Read a 1-based option choice. Returns `None` on "q" or end of input.
fn read_choice(input: &mut impl BufRead, option_count: usize) -> Result<Option<usize>> {
    loop {
        print!("\nYour answer (1-{option_count}, q to quit): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match trimmed.parse::<usize>() {
            Ok(n) if n >= 1 && n <= option_count => return Ok(Some(n - 1)),
            _ => println!("Enter a number between 1 and {option_count}, or q to quit."),
        }
    }
}

fn print_stats(session: &SessionState) {
    let stats = SessionStats::for_session(session);
    if stats.total_answers == 0 {
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Skill", "Answers", "Correct", "Accuracy", "Sub-questions"]);
    for (skill, s) in &stats.per_skill {
        table.add_row(vec![
            Cell::new(skill),
            Cell::new(s.total_answers),
            Cell::new(s.correct_answers),
            Cell::new(format!("{:.0}%", s.accuracy() * 100.0)),
            Cell::new(s.subquestion_answers),
        ]);
    }
    println!("\n{table}");
    println!(
        "Overall: {}/{} correct ({:.0}%), deepest question level {}",
        stats.correct_answers,
        stats.total_answers,
        stats.accuracy * 100.0,
        stats.max_depth_reached.unwrap_or(0),
    );
}

fn titlecase(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use recque_core::error::StoreError;
    use recque_core::model::SessionSummary;
    use recque_providers::MockProvider;

    #[test]
    fn titlecase_capitalizes_each_word() {
        assert_eq!(titlecase("basic math"), "Basic Math");
        assert_eq!(titlecase("themes"), "Themes");
        assert_eq!(titlecase(""), "");
    }

    #[test]
    fn read_choice_parses_numbers_and_quit() {
        let mut input = std::io::Cursor::new("2\n");
        assert_eq!(read_choice(&mut input, 4).unwrap(), Some(1));

        let mut input = std::io::Cursor::new("q\n");
        assert_eq!(read_choice(&mut input, 4).unwrap(), None);

        let mut input = std::io::Cursor::new("");
        assert_eq!(read_choice(&mut input, 4).unwrap(), None);

        // Garbage is re-prompted until something usable arrives.
        let mut input = std::io::Cursor::new("abc\n3\n");
        assert_eq!(read_choice(&mut input, 4).unwrap(), Some(2));
    }

    #[test]
    fn read_choice_rejects_out_of_range_numbers() {
        let mut input = std::io::Cursor::new("9\n0\n2\n");
        assert_eq!(read_choice(&mut input, 4).unwrap(), Some(1));
    }

    /// Store double whose next save can be made to fail once.
    #[derive(Default)]
    struct FlakyStore {
        fail_next_save: AtomicBool,
        saves: Mutex<Vec<SessionState>>,
    }

    #[async_trait::async_trait]
    impl SessionStore for FlakyStore {
        async fn save(&self, state: &SessionState) -> Result<(), StoreError> {
            if self.fail_next_save.swap(false, Ordering::Relaxed) {
                return Err(StoreError::Io("disk full".into()));
            }
            self.saves.lock().unwrap().push(state.clone());
            Ok(())
        }

        async fn load(&self, session_id: Uuid) -> Result<SessionState, StoreError> {
            Err(StoreError::NotFound(session_id))
        }

        async fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
            Ok(Vec::new())
        }

        async fn delete(&self, session_id: Uuid) -> Result<(), StoreError> {
            Err(StoreError::NotFound(session_id))
        }
    }

    #[tokio::test]
    async fn dirty_session_is_persisted_on_the_next_pass() {
        let store = Arc::new(FlakyStore::default());
        let mut engine = QuestioningEngine::with_store(Arc::new(MockProvider::new()), store.clone());
        engine.start_topic("basic math").await.unwrap();
        engine.request_current_question().await.unwrap();

        store.fail_next_save.store(true, Ordering::Relaxed);
        engine.submit_answer(1).await.unwrap();
        assert!(engine.is_dirty());

        ensure_saved(&mut engine).await;
        assert!(!engine.is_dirty());

        let saves = store.saves.lock().unwrap();
        let last = saves.last().unwrap();
        assert_eq!(last.answer_history.len(), 1, "the answered question made it to disk");
    }

    #[tokio::test]
    async fn ensure_saved_is_a_no_op_when_clean() {
        let store = Arc::new(FlakyStore::default());
        let mut engine = QuestioningEngine::with_store(Arc::new(MockProvider::new()), store.clone());
        engine.start_topic("basic math").await.unwrap();

        let saves_before = store.saves.lock().unwrap().len();
        ensure_saved(&mut engine).await;
        assert_eq!(store.saves.lock().unwrap().len(), saves_before);
    }
}
