use std::io::{self, Write};

use colored::Colorize;
use oncall_client::{ConversationController, SendOutcome};
use oncall_core::{department_question, texts, DepartmentDirectory, Message, Sender};
use oncall_observability::{create_session_span, LogManager};
use tracing::Instrument;

use crate::Context;

const HELP: &str = "\
/departments   진료과 목록
/dept <번호>   해당 진료과 당직 질문
/examples      예시 질문
/update        데이터 업데이트
/retry         서버 재연결
/reset         새 대화 시작
/log <level>   로그 레벨 변경 (error, warn, info, debug, trace)
exit           종료";

pub(crate) fn print_departments(directory: &DepartmentDirectory) {
    for (idx, name) in directory.names().iter().enumerate() {
        println!("  {:>2}. {}", idx + 1, name);
    }
}

fn print_message(message: &Message) {
    match message.sender {
        Sender::User => {
            println!("{} {}", "You:".cyan().bold(), message.text);
        }
        Sender::Bot => {
            println!("{}", "Assistant:".green().bold());
            for line in message.lines() {
                println!("  {}", line);
            }
        }
    }
}

/// Print bot messages appended after `seen`
fn print_new_replies(controller: &ConversationController, seen: usize) {
    for message in controller.messages().iter().skip(seen).filter(|m| !m.is_user()) {
        print_message(message);
    }
}

fn warn_if_disconnected(controller: &ConversationController) {
    if controller.state().connection_error {
        println!("{}", "⚠️  서버 연결에 문제가 있습니다. /retry 로 다시 연결하세요.".yellow());
    }
}

async fn ask(controller: &ConversationController, text: &str, debug: bool) -> SendOutcome {
    let seen = controller.messages().len();
    let outcome = controller.send_message(text).await;

    if debug {
        eprintln!("{}", format!("[DEBUG] Outcome: {:?}", outcome).dimmed());
    }

    print_new_replies(controller, seen);
    if outcome == SendOutcome::Failed {
        warn_if_disconnected(controller);
    }
    outcome
}

pub(crate) async fn send_once(context: &Context, message: &str) -> anyhow::Result<()> {
    let session = context.open_session().await?;
    let controller = ConversationController::new(context.backend.clone(), session);
    let span = create_session_span(&controller.session_id().await);

    let outcome = ask(&controller, message, context.debug).instrument(span).await;
    match outcome {
        SendOutcome::Ignored => {
            println!("{}", "❌ 질문을 입력해주세요.".red());
            std::process::exit(1);
        }
        SendOutcome::Failed => std::process::exit(1),
        _ => Ok(()),
    }
}

pub(crate) async fn run_interactive_chat(
    context: &Context,
    mut log_manager: Option<&mut LogManager>,
) -> anyhow::Result<()> {
    let session = context.open_session().await?;
    let controller = ConversationController::new(context.backend.clone(), session);
    let mut span = create_session_span(&controller.session_id().await);

    println!("{}", "🏥 병원 당직 안내".cyan().bold());
    println!("{}", format!("Session ID: {}", controller.session_id().await).dimmed());
    println!("{}", "Type /help for commands, 'exit' to leave".dimmed());
    println!();

    controller
        .initialize(context.watchdog())
        .instrument(span.clone())
        .await;

    for message in controller.messages() {
        print_message(&message);
    }
    warn_if_disconnected(&controller);
    println!();

    loop {
        print!("{} ", "You:".cyan().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("{}", "👋 Goodbye!".cyan());
            break;
        }

        let (command, argument) = match input.split_once(' ') {
            Some((command, argument)) => (command, argument.trim()),
            None => (input, ""),
        };

        match command {
            "/help" => println!("{}", HELP.dimmed()),
            "/departments" => print_departments(&controller.departments()),
            "/examples" => {
                for (idx, example) in texts::EXAMPLE_QUESTIONS.iter().enumerate() {
                    println!("  {}. {}", idx + 1, example);
                }
            }
            "/dept" => {
                let directory = controller.departments();
                let picked = argument
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| directory.get_numbered(n));
                match picked {
                    Some(name) => {
                        let question = department_question(name);
                        println!("{} {}", "You:".cyan().bold(), question);
                        ask(&controller, &question, context.debug)
                            .instrument(span.clone())
                            .await;
                    }
                    None => println!(
                        "{}",
                        format!("❌ 1부터 {} 사이의 번호를 입력하세요.", directory.len()).red()
                    ),
                }
            }
            "/reset" => match controller.reset_session().await {
                Ok(new_id) => {
                    span = create_session_span(&new_id);
                    println!("{}", format!("🔄 새 대화를 시작합니다 ({})", new_id).green());
                }
                Err(e) => println!("{}", format!("❌ 세션 초기화 실패: {}", e).red()),
            },
            "/retry" => {
                let load = controller.retry_connection().instrument(span.clone()).await;
                if load.connection_error {
                    println!(
                        "{}",
                        format!("❌ 재연결 실패 (시도 {}회)", controller.state().retry_count).red()
                    );
                } else {
                    println!(
                        "{}",
                        format!("✅ 연결됨, 진료과 {}개", load.directory.len()).green()
                    );
                }
            }
            "/update" => {
                let last = crate::run_update(context).instrument(span.clone()).await;
                if last.connection_error {
                    controller.mark_disconnected();
                    warn_if_disconnected(&controller);
                }
            }
            "/log" => match log_manager.as_deref_mut() {
                Some(manager) if argument.is_empty() => {
                    println!("{}", format!("📝 로그 레벨: {}", manager.level()).dimmed());
                }
                Some(manager) => match manager.update_level(argument) {
                    Ok(()) => println!("{}", format!("📝 로그 레벨: {}", manager.level()).green()),
                    Err(e) => println!("{}", format!("❌ {}", e).red()),
                },
                None => println!("{}", "❌ 로그가 비활성화되어 있습니다.".red()),
            },
            _ => {
                ask(&controller, input, context.debug)
                    .instrument(span.clone())
                    .await;
            }
        }

        println!();
    }

    controller.shutdown();
    tracing::debug!(messages = controller.messages().len(), "Chat ended");
    Ok(())
}
