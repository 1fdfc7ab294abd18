use anyhow::Result;

use crate::gemini::{GeminiClient, GENERATION_FAILED_MSG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Lifecycle of the single outstanding generation request.
///
/// Exactly one variant is active at a time and the response panel is a pure
/// function of it; "succeeded while still generating" is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Generating,
    Succeeded(String),
    Failed(String),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Prompt input
    pub prompt_input: String,
    pub prompt_cursor: usize, // cursor position in chars

    // Request lifecycle
    pub request_state: RequestState,
    /// Id of the most recently triggered request. Completions carrying an
    /// older id are stale and must not overwrite newer state.
    request_seq: u64,

    // Response viewport
    pub response_scroll: u16,
    pub response_height: u16,
    pub total_response_lines: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub client: GeminiClient,
}

impl App {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            prompt_input: String::new(),
            prompt_cursor: 0,

            request_state: RequestState::Idle,
            request_seq: 0,

            response_scroll: 0,
            response_height: 0,
            total_response_lines: 0,

            animation_frame: 0,

            client,
        }
    }

    pub fn is_generating(&self) -> bool {
        self.request_state == RequestState::Generating
    }

    /// Starts a new request: transitions to Generating and returns the id
    /// the eventual completion must carry to be applied.
    ///
    /// Overlapping triggers are allowed; each one takes a fresh id, so
    /// whichever request was triggered last owns the displayed outcome
    /// regardless of completion order.
    pub fn begin_generation(&mut self) -> u64 {
        self.request_seq += 1;
        self.request_state = RequestState::Generating;
        self.response_scroll = 0;
        self.request_seq
    }

    /// Applies a completed request, dropping it if a newer trigger exists.
    ///
    /// Failures collapse to one fixed user-facing message; the cause is
    /// logged for diagnostics only.
    pub fn apply_generation(&mut self, request_id: u64, result: Result<String>) {
        if request_id != self.request_seq {
            tracing::debug!(request_id, latest = self.request_seq, "dropping stale response");
            return;
        }

        self.request_state = match result {
            Ok(answer) => RequestState::Succeeded(answer),
            Err(cause) => {
                tracing::error!("generation failed: {cause:#}");
                RequestState::Failed(GENERATION_FAILED_MSG.to_string())
            }
        };
    }

    // Response scrolling
    pub fn scroll_down(&mut self) {
        if self.response_scroll < self.total_response_lines.saturating_sub(self.response_height) {
            self.response_scroll = self.response_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.response_height / 2;
        let max_scroll = self.total_response_lines.saturating_sub(self.response_height);
        self.response_scroll = (self.response_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.response_height / 2;
        self.response_scroll = self.response_scroll.saturating_sub(half_page);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_generating() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoint;
    use anyhow::anyhow;

    fn test_app() -> App {
        let client = GeminiClient::new(Endpoint {
            url: "https://example.invalid/generate".to_string(),
            credential: "test-key".to_string(),
        })
        .expect("client");
        App::new(client)
    }

    #[test]
    fn starts_idle() {
        assert_eq!(test_app().request_state, RequestState::Idle);
    }

    #[test]
    fn begin_generation_transitions_to_generating() {
        let mut app = test_app();
        app.begin_generation();
        assert_eq!(app.request_state, RequestState::Generating);
    }

    #[test]
    fn successful_completion_is_applied() {
        let mut app = test_app();
        let id = app.begin_generation();
        app.apply_generation(id, Ok("Recursion is...".to_string()));
        assert_eq!(
            app.request_state,
            RequestState::Succeeded("Recursion is...".to_string())
        );
    }

    #[test]
    fn empty_answer_is_success_not_failure() {
        let mut app = test_app();
        let id = app.begin_generation();
        app.apply_generation(id, Ok(String::new()));
        assert_eq!(app.request_state, RequestState::Succeeded(String::new()));
    }

    #[test]
    fn distinct_failures_map_to_one_fixed_message() {
        for cause in [
            anyhow!("connection refused"),
            anyhow!("generation request failed with status 500 Internal Server Error"),
            anyhow!("generation request failed with status 429 Too Many Requests"),
            anyhow!("operation timed out"),
        ] {
            let mut app = test_app();
            let id = app.begin_generation();
            app.apply_generation(id, Err(cause));
            assert_eq!(
                app.request_state,
                RequestState::Failed(GENERATION_FAILED_MSG.to_string())
            );
        }
    }

    #[test]
    fn stale_completion_does_not_overwrite_newer_trigger() {
        let mut app = test_app();
        let first = app.begin_generation();
        let second = app.begin_generation();

        // Second request resolves first and is applied
        app.apply_generation(second, Ok("newer".to_string()));
        assert_eq!(app.request_state, RequestState::Succeeded("newer".to_string()));

        // The older request resolving late must not clobber it
        app.apply_generation(first, Ok("older".to_string()));
        assert_eq!(app.request_state, RequestState::Succeeded("newer".to_string()));
    }

    #[test]
    fn stale_completion_is_dropped_while_newer_is_in_flight() {
        let mut app = test_app();
        let first = app.begin_generation();
        let _second = app.begin_generation();

        app.apply_generation(first, Ok("older".to_string()));
        assert_eq!(app.request_state, RequestState::Generating);
    }

    #[test]
    fn retrigger_overwrites_terminal_state() {
        let mut app = test_app();
        let id = app.begin_generation();
        app.apply_generation(id, Err(anyhow!("boom")));
        assert!(matches!(app.request_state, RequestState::Failed(_)));

        app.begin_generation();
        assert_eq!(app.request_state, RequestState::Generating);
    }

    #[test]
    fn animation_only_advances_while_generating() {
        let mut app = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.begin_generation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
    }
}
