//! Stdin/stdout REPL for trying the enrollment dialogue locally.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::enrollment::{self, EnrollmentState, InitOptions, prompts};
use crate::error::Result;

/// Run one enrollment conversation on the terminal.
///
/// `/quit` exits, `/state` dumps the current state as JSON and `/reset`
/// starts over. Returns once the conversation reaches a terminal step or
/// stdin closes.
pub async fn run_repl(options: InitOptions) -> Result<()> {
    let mut state = enrollment::initialize(options);
    println!("\n{}\n", prompts::step_prompt(state.step, &state));
    eprint!("> ");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => {
                eprint!("> ");
                continue;
            }
            "/quit" => break,
            "/state" => print_state(&state),
            "/reset" => {
                state = enrollment::initialize(options);
                println!("\n{}\n", prompts::step_prompt(state.step, &state));
            }
            _ => {
                let transition = enrollment::advance(&state, line);
                println!("\n{}\n", transition.message);
                state = transition.next_state;
                if transition.is_complete {
                    tracing::info!(step = %state.step, "CLI enrollment finished");
                    break;
                }
            }
        }
        eprint!("> ");
    }

    Ok(())
}

fn print_state(state: &EnrollmentState) {
    match serde_json::to_string_pretty(state) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Failed to serialize state: {}", e),
    }
}
