use cert_get_core::RetrievalState;
use indicatif::{ProgressBar, ProgressStyle};

pub fn get_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.enable_steady_tick(120);
    let ps: ProgressStyle = ProgressStyle::default_spinner()
        .template("{spinner:.blue} {msg}")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]);
    pb.set_style(ps);
    pb
}

/// Spinner message for a retrieval state
pub fn state_message(state: RetrievalState) -> &'static str {
    match state {
        RetrievalState::Idle => "waiting...",
        RetrievalState::Parsing => "parsing address...",
        RetrievalState::Connecting => "connecting and negotiating TLS...",
        RetrievalState::Extracting => "reading certificate chain...",
        RetrievalState::Writing => "writing certificates...",
        RetrievalState::Done => "done.",
        RetrievalState::Failed(_) => "failed.",
    }
}

/// Reflect a state transition on `pb`
pub fn update(pb: &ProgressBar, state: RetrievalState) {
    match state {
        RetrievalState::Done => pb.finish_with_message(state_message(state)),
        RetrievalState::Failed(_) => pb.abandon_with_message(state_message(state)),
        _ => pb.set_message(state_message(state)),
    }
}
