//! The terminal front-end for the study assistant.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use study_assistant::core::auth::{
    AuthError, NewUser, UserDirectory, UserProfile,
};
use study_assistant::gateway::{AssignmentRequest, Role};
use study_assistant::store::{FsStore, StateStore};
use study_assistant::{GatewayConfigBuilder, HttpGateway, Session, SessionBuilder};
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Ok(base_url) = env::var("STUDY_ASSISTANT_GATEWAY_URL") else {
        eprintln!("STUDY_ASSISTANT_GATEWAY_URL environment variable is not set");
        return;
    };
    let Some(data_dir) = data_dir() else {
        eprintln!("no data directory is available on this platform");
        return;
    };
    let state: Arc<dyn StateStore> = match FsStore::open(&data_dir) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            eprintln!("failed to open data directory: {err}");
            return;
        }
    };

    let directory = UserDirectory::new(Arc::clone(&state));
    let Some(user) = authenticate(&directory).await else {
        return;
    };
    println!("Welcome, {}!", user.name.bright_white().bold());

    let config = GatewayConfigBuilder::with_base_url(base_url).build();
    let session = SessionBuilder::with_gateway(HttpGateway::new(config))
        .with_state_store(state)
        .build(user);
    let mut session = match session {
        Ok(session) => session,
        Err(err) => {
            eprintln!("failed to open your collections: {err}");
            return;
        }
    };

    println!("Type a message to chat, or /help for commands.");
    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !run_command(&mut session, command).await {
                break;
            }
            continue;
        }

        let spinner = spinner();
        let result = session.send_message(line).await;
        spinner.finish_and_clear();
        if let Err(err) = result {
            error!("chat turn failed: {err}");
        }
        // On failure the apology message has already been recorded, so
        // the latest assistant message is the right thing to show
        // either way.
        print_last_answer(&session);
    }
}

async fn authenticate(directory: &UserDirectory) -> Option<UserProfile> {
    loop {
        let line = prompt("[l]og in or [s]ign up? ").await?;
        match line.trim() {
            "l" | "login" => {
                let email = prompt("Email: ").await?;
                let password = prompt("Password: ").await?;
                match directory.log_in(email.trim(), password.trim()) {
                    Ok(user) => return Some(user),
                    Err(AuthError::InvalidCredentials) => {
                        println!(
                            "{}",
                            "Invalid email or password.".bright_red()
                        );
                    }
                    Err(err) => {
                        eprintln!("log-in failed: {err}");
                        return None;
                    }
                }
            }
            "s" | "signup" => {
                let email = prompt("Email: ").await?;
                let password = prompt("Password: ").await?;
                let name = prompt("Name: ").await?;
                let education_level = prompt("Education level: ").await?;
                let subjects = prompt("Subjects (comma-separated): ").await?;
                let new_user = NewUser {
                    email: email.trim().to_owned(),
                    password: password.trim().to_owned(),
                    name: name.trim().to_owned(),
                    education_level: education_level.trim().to_owned(),
                    subjects: subjects
                        .split(',')
                        .map(|subject| subject.trim().to_owned())
                        .filter(|subject| !subject.is_empty())
                        .collect(),
                };
                match directory.sign_up(new_user) {
                    Ok(user) => return Some(user),
                    Err(AuthError::EmailTaken) => {
                        println!(
                            "{}",
                            "An account with this email already exists."
                                .bright_red()
                        );
                    }
                    Err(err) => {
                        eprintln!("sign-up failed: {err}");
                        return None;
                    }
                }
            }
            _ => {}
        }
    }
}

/// Runs one slash command, returning `false` when the REPL should exit.
async fn run_command(session: &mut Session, command: &str) -> bool {
    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    match name {
        "help" => {
            println!("/new                start a new conversation");
            println!("/list               list conversations");
            println!("/open <n>           switch to a conversation");
            println!("/delete <n>         delete a conversation");
            println!("/model [name]       show or select the model");
            println!("/assignment         generate a new assignment");
            println!("/assignments        list assignments");
            println!("/read <n>           show an assignment");
            println!("/quit               exit");
        }
        "new" => match session.new_conversation() {
            Ok(_) => println!("Started a new conversation."),
            Err(err) => eprintln!("{err}"),
        },
        "list" => {
            let active = session.active_conversation().map(|c| c.id);
            for (idx, conversation) in
                session.conversations().iter().enumerate()
            {
                let marker =
                    if active == Some(conversation.id) { "*" } else { " " };
                println!("{marker} {idx}: {}", conversation.title);
            }
        }
        "open" => match arg
            .parse::<usize>()
            .ok()
            .and_then(|idx| session.conversations().get(idx).map(|c| c.id))
        {
            Some(id) => {
                if let Err(err) = session.select_conversation(id) {
                    eprintln!("{err}");
                }
            }
            None => println!("Usage: /open <conversation index>"),
        },
        "delete" => match arg
            .parse::<usize>()
            .ok()
            .and_then(|idx| session.conversations().get(idx).map(|c| c.id))
        {
            Some(id) => {
                if let Err(err) = session.delete_conversation(id) {
                    eprintln!("{err}");
                }
            }
            None => println!("Usage: /delete <conversation index>"),
        },
        "model" => {
            if arg.is_empty() {
                println!("Current model: {}", session.model());
            } else {
                session.set_model(arg);
            }
        }
        "assignment" => generate_assignment(session).await,
        "assignments" => {
            let selected = session.selected_assignment().map(|a| a.id);
            for (idx, assignment) in session.assignments().iter().enumerate() {
                let marker =
                    if selected == Some(assignment.id) { "*" } else { " " };
                println!(
                    "{marker} {idx}: {} — {}",
                    assignment.subject, assignment.topic
                );
            }
        }
        "read" => match arg
            .parse::<usize>()
            .ok()
            .and_then(|idx| session.assignments().get(idx).map(|a| a.id))
        {
            Some(id) => {
                if let Err(err) = session.select_assignment(id) {
                    eprintln!("{err}");
                } else if let Some(assignment) = session.selected_assignment() {
                    print_assignment(assignment);
                }
            }
            None => println!("Usage: /read <assignment index>"),
        },
        "quit" | "exit" => return false,
        _ => println!("Unknown command: /{name}"),
    }
    true
}

async fn generate_assignment(session: &mut Session) {
    let Some(subject) = prompt("Subject: ").await else {
        return;
    };
    let Some(topic) = prompt("Topic: ").await else {
        return;
    };
    let Some(difficulty) = prompt("Difficulty: ").await else {
        return;
    };
    let Some(count) = prompt("Number of questions [5]: ").await else {
        return;
    };
    let Some(question_types) = prompt("Question types [mixed]: ").await else {
        return;
    };

    let question_types = match question_types.trim() {
        "" => "mixed".to_owned(),
        types => types.to_owned(),
    };
    let request = AssignmentRequest {
        subject: subject.trim().to_owned(),
        topic: topic.trim().to_owned(),
        difficulty: difficulty.trim().to_owned(),
        question_count: count.trim().parse().unwrap_or(5),
        question_types,
    };

    let spinner = spinner();
    let result = session.generate_assignment(request).await;
    spinner.finish_and_clear();
    match result {
        Ok(assignment) => print_assignment(assignment),
        Err(err) => eprintln!("assignment generation failed: {err}"),
    }
}

fn print_last_answer(session: &Session) {
    let Some(conversation) = session.active_conversation() else {
        return;
    };
    let Some(message) = conversation
        .messages
        .iter()
        .rev()
        .find(|message| message.role == Role::Assistant)
    else {
        return;
    };
    println!(
        "{}🤖 {}",
        BAR_CHAR.bright_cyan(),
        message.content.bright_white()
    );
}

fn print_assignment(assignment: &study_assistant::store::Assignment) {
    println!(
        "{}📚 {} — {}",
        BAR_CHAR.bright_green(),
        assignment.subject.bright_white().bold(),
        assignment.topic.bright_white().bold()
    );
    println!("{}", assignment.content);
}

fn spinner() -> ProgressBar {
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(
        ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    progress_bar.set_message("🤔 Thinking...");
    progress_bar.enable_steady_tick(Duration::from_millis(100));
    progress_bar
}

fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var("STUDY_ASSISTANT_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }
    Some(dirs::data_dir()?.join("study-assistant"))
}

async fn prompt(label: &str) -> Option<String> {
    print!("{label}");
    std::io::stdout().flush().unwrap();
    read_line().await
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
