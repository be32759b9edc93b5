use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use recall_core::classifier::classify_with;
use recall_core::review_log::read_reviews;
use recall_core::stats::AllStats;
use recall_core::*;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "recall")]
#[command(about = "Spaced-repetition flashcard trainer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend the current time is this RFC 3339 instant
    #[arg(long, global = true, hide = true, value_parser = parse_instant)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a flashcard, optionally into a deck (created if missing)
    Add {
        #[arg(long)]
        term: String,

        #[arg(long)]
        definition: String,

        /// Example sentence using the term
        #[arg(long)]
        context: Option<String>,

        #[arg(long)]
        deck: Option<String>,
    },

    /// List cards due for review
    Due {
        #[arg(long)]
        deck: Option<String>,
    },

    /// List every card of a deck, least recently reviewed first
    Practice {
        #[arg(long)]
        deck: Option<String>,
    },

    /// Record a review verdict for a card
    Review {
        card_id: Uuid,

        /// 1 (difficult), 3 (correct) or 5 (easy)
        #[arg(value_parser = parse_quality)]
        quality: Quality,

        /// Hints used before answering
        #[arg(long, default_value_t = 0)]
        hints: usize,

        /// Where the verdict came from (review, practice, quiz, challenge)
        #[arg(long, default_value = "review", value_parser = parse_source)]
        source: ReviewSource,
    },

    /// Run a quiz, reading answers from stdin
    Quiz {
        #[arg(long)]
        deck: Option<String>,

        #[arg(long)]
        count: Option<usize>,

        /// Print questions with their answers instead of prompting
        #[arg(long)]
        show_answers: bool,
    },

    /// Build a challenge session biased toward hard and overdue cards
    Challenge {
        #[arg(long)]
        deck: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show the next hint for a card
    Hint {
        card_id: Uuid,

        /// Hint types already revealed (first_letter, word_length, context_sentence)
        #[arg(long = "used", value_parser = parse_hint_type)]
        used: Vec<HintType>,
    },

    /// Show logged reviews, most recent first
    History {
        /// Only reviews of this card
        #[arg(long)]
        card: Option<Uuid>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Show mastery statistics
    Stats {
        /// progress-asc, progress-desc, name-asc or name-desc
        #[arg(long, value_parser = parse_sort)]
        sort: Option<DeckSortKey>,
    },
}

fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn parse_quality(s: &str) -> std::result::Result<Quality, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_source(s: &str) -> std::result::Result<ReviewSource, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_hint_type(s: &str) -> std::result::Result<HintType, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

fn parse_sort(s: &str) -> std::result::Result<DeckSortKey, String> {
    s.parse().map_err(|e: Error| e.to_string())
}

/// Config and clock shared by every command
struct Env {
    config: Config,
    clock: Box<dyn Clock>,
}

impl Env {
    fn store(&self) -> JsonStore {
        JsonStore::new(self.config.data.store_path())
    }

    fn coordinator(&self) -> ReviewCoordinator<JsonStore> {
        ReviewCoordinator::new(self.store())
            .with_review_log(JsonlReviewLog::new(self.config.data.review_log_path()))
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

fn deck_arg(deck: Option<String>) -> DeckId {
    deck.map(DeckId::new).unwrap_or_else(DeckId::global)
}

fn main() -> Result<()> {
    // Initialize logging
    recall_core::logging::init();

    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    let clock: Box<dyn Clock> = match cli.now {
        Some(now) => Box::new(FixedClock(now)),
        None => Box::new(SystemClock),
    };

    tracing::debug!("Using data directory {:?}", config.data.data_dir);
    let env = Env { config, clock };

    match cli.command {
        Commands::Add {
            term,
            definition,
            context,
            deck,
        } => cmd_add(&env, term, definition, context, deck),
        Commands::Due { deck } => cmd_due(&env, deck_arg(deck)),
        Commands::Practice { deck } => cmd_practice(&env, deck_arg(deck)),
        Commands::Review {
            card_id,
            quality,
            hints,
            source,
        } => cmd_review(&env, card_id, quality, hints, source),
        Commands::Quiz {
            deck,
            count,
            show_answers,
        } => cmd_quiz(&env, deck_arg(deck), count, show_answers),
        Commands::Challenge { deck, limit } => cmd_challenge(&env, deck_arg(deck), limit),
        Commands::Hint { card_id, used } => cmd_hint(&env, card_id, &used),
        Commands::History { card, limit } => cmd_history(&env, card, limit),
        Commands::Stats { sort } => cmd_stats(&env, sort),
    }
}

fn cmd_add(
    env: &Env,
    term: String,
    definition: String,
    context: Option<String>,
    deck: Option<String>,
) -> Result<()> {
    let now = env.now();
    let mut store = env.store();

    let card = Flashcard::new(term, definition, context, now);
    let card_id = card.id;

    match deck {
        Some(deck) => store.insert_card_in_deck(
            card,
            Deck {
                id: DeckId::new(deck.clone()),
                name: deck,
                created_at: now,
            },
        )?,
        None => store.insert_card(card)?,
    }

    println!("✓ Added card {}", card_id);
    Ok(())
}

fn print_card_line(env: &Env, card: &Flashcard, now: DateTime<Utc>) {
    let category = classify_with(card, now, &env.config.mastery);
    let next = card
        .next_review_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "now".to_string());
    println!(
        "  {}  {:<20} {:<10} next: {}",
        card.id,
        card.term,
        format!("{:?}", category),
        next
    );
}

fn cmd_due(env: &Env, deck: DeckId) -> Result<()> {
    let now = env.now();
    let cards = env.coordinator().get_due_flashcards(&deck, now)?;

    if cards.is_empty() {
        println!("Nothing due. Come back later!");
        return Ok(());
    }

    println!("{} card(s) due:", cards.len());
    for card in &cards {
        print_card_line(env, card, now);
    }
    Ok(())
}

fn cmd_practice(env: &Env, deck: DeckId) -> Result<()> {
    let now = env.now();
    let cards = env.coordinator().get_all_flashcards_for_deck(&deck)?;

    if cards.is_empty() {
        println!("No cards in this deck yet.");
        return Ok(());
    }

    println!("{} card(s) to practice:", cards.len());
    for card in &cards {
        print_card_line(env, card, now);
    }
    Ok(())
}

fn cmd_review(
    env: &Env,
    card_id: Uuid,
    quality: Quality,
    hints: usize,
    source: ReviewSource,
) -> Result<()> {
    let quality = apply_penalty(quality, hints);
    let input = ReviewInput {
        flashcard_id: card_id,
        quality,
        source,
    };

    match env.coordinator().apply_review(&input, env.now())? {
        Some(card) => {
            println!("✓ Reviewed \"{}\" as {}", card.term, quality);
            println!("  Next review in {} day(s)", card.interval_days());
            println!("  Ease factor: {:.2}", card.ease_factor());
        }
        None => {
            println!("Card {} not found - review skipped.", card_id);
        }
    }
    Ok(())
}

fn display_question(number: usize, question: &QuizQuestion) {
    println!("\n{}. {}", number, question.question_text);
    match &question.kind {
        QuestionKind::MultipleChoice { options } => {
            for (i, option) in options.iter().enumerate() {
                println!("   {}) {}", i + 1, option);
            }
        }
        QuestionKind::FillInTheBlank {
            sentence_with_blank,
        } => {
            println!("   {}", sentence_with_blank);
        }
    }
}

/// Accept either the option number or the option text
fn resolve_answer(question: &QuizQuestion, input: &str) -> String {
    if let QuestionKind::MultipleChoice { options } = &question.kind {
        if let Ok(n) = input.trim().parse::<usize>() {
            if let Some(option) = n.checked_sub(1).and_then(|i| options.get(i)) {
                return option.clone();
            }
        }
    }
    input.to_string()
}

fn cmd_quiz(env: &Env, deck: DeckId, count: Option<usize>, show_answers: bool) -> Result<()> {
    let now = env.now();
    let count = count.unwrap_or(env.config.session.quiz_size);
    let mut rng = rand::thread_rng();
    let mut coordinator = env.coordinator();

    let pool = coordinator.get_quiz_flashcards(&deck, count, now, &mut rng)?;
    let questions = quiz::generate(&pool, count, &mut rng);

    if questions.is_empty() {
        println!("Not enough cards for a quiz.");
        return Ok(());
    }

    if show_answers {
        for (i, question) in questions.iter().enumerate() {
            display_question(i + 1, question);
            println!("   → {}", question.correct_answer);
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut correct = 0;
    let mut answered = 0;

    for (i, question) in questions.iter().enumerate() {
        display_question(i + 1, question);
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let answer = resolve_answer(question, &line?);
        answered += 1;

        let quality = if quiz::evaluate(&answer, &question.correct_answer) {
            correct += 1;
            println!("✓ Correct!");
            Quality::Correct
        } else {
            println!("✗ The answer was: {}", question.correct_answer);
            Quality::Difficult
        };

        coordinator.apply_review(
            &ReviewInput {
                flashcard_id: question.source.id,
                quality,
                source: ReviewSource::Quiz,
            },
            now,
        )?;
    }

    println!("\nScore: {}/{}", correct, answered);
    Ok(())
}

fn cmd_challenge(env: &Env, deck: DeckId, limit: Option<usize>) -> Result<()> {
    let now = env.now();
    let config = ChallengeConfig {
        deck_id: deck,
        card_limit: limit.unwrap_or(env.config.session.challenge_limit),
    };
    let coordinator = env.coordinator();
    let pool = coordinator.get_all_flashcards_for_deck(&config.deck_id)?;

    let selected = challenge::select(&config, &pool, now, &mut rand::thread_rng());

    if selected.is_empty() {
        println!("Not enough cards for a challenge.");
        return Ok(());
    }

    println!("Challenge: {} card(s)", selected.len());
    for card in &selected {
        print_card_line(env, card, now);
    }
    Ok(())
}

fn cmd_hint(env: &Env, card_id: Uuid, used: &[HintType]) -> Result<()> {
    let Some(card) = env.store().get_card(card_id)? else {
        println!("Card {} not found.", card_id);
        return Ok(());
    };

    match next_hint(&card, used) {
        Some(hint) => println!("{:?}: {}", hint.kind, hint.content),
        None => println!("No more hints for this card."),
    }
    Ok(())
}

fn cmd_history(env: &Env, card: Option<Uuid>, limit: usize) -> Result<()> {
    let mut records = read_reviews(&env.config.data.review_log_path())?;
    if let Some(card_id) = card {
        records.retain(|r| r.flashcard_id == card_id);
    }

    if records.is_empty() {
        println!("No reviews logged yet.");
        return Ok(());
    }

    let terms: HashMap<Uuid, String> = env
        .store()
        .query_cards(&CardQuery::deck(DeckId::global()))?
        .into_iter()
        .map(|c| (c.id, c.term))
        .collect();

    println!("{} review(s):", records.len());
    for record in records.iter().rev().take(limit) {
        let term = terms
            .get(&record.flashcard_id)
            .map(String::as_str)
            .unwrap_or("(deleted)");
        println!(
            "  {}  {:<20} {:<14} {:?}  next in {} day(s), ease {:.2}",
            record.reviewed_at.format("%Y-%m-%d %H:%M"),
            term,
            record.quality.to_string(),
            record.source,
            record.interval_days,
            record.ease_factor
        );
    }
    Ok(())
}

fn cmd_stats(env: &Env, sort: Option<DeckSortKey>) -> Result<()> {
    let store = env.store();
    let AllStats { global, decks } = StatisticsAggregator::new(&store)
        .with_thresholds(env.config.mastery)
        .compute_all(env.now())?;

    let decks = match sort {
        Some(key) => sort_decks(&decks, key),
        None => decks,
    };

    println!(
        "All cards: {}% ({} total, {} mastered, {} learning, {} to review, {} unseen)",
        global.progress,
        global.counts.total,
        global.counts.mastered,
        global.counts.learning,
        global.counts.to_review,
        global.counts.unseen
    );
    for deck in &decks {
        println!(
            "  {:<20} {:>3}%  ({} cards)",
            deck.name, deck.stats.progress, deck.stats.counts.total
        );
    }
    Ok(())
}
