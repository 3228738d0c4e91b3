use std::sync::Arc;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use portal_core::{
    quick_action, AssistantClient, AssistantError, ChatMessage, ChatSession, PortalClient,
    SubmitOutcome, UserProfile,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Projects,
    Chat,
    Input,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Projects => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Input,
            FocusPane::Input => FocusPane::Projects,
        }
    }
}

/// Where the user profile stands; the session works in every state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileState {
    Loading,
    Loaded(UserProfile),
    Unavailable,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Chat state
    pub session: Arc<ChatSession>,
    pub input_cursor: usize, // cursor position (in chars) within the pending input
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of the chat panel, set during render
    pub chat_width: u16,  // inner width of the chat panel, set during render
    pub follow_chat: bool,
    pub submission_task: Option<JoinHandle<SubmitOutcome>>,

    // Project panel
    pub profile: ProfileState,
    pub profile_task: Option<JoinHandle<Result<UserProfile, AssistantError>>>,
    pub project_state: ListState,
    pub selected_project: Option<usize>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub projects_area: Option<Rect>,
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(assistant: Arc<dyn AssistantClient>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            session: Arc::new(ChatSession::new(assistant)),
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_chat: true,
            submission_task: None,

            profile: ProfileState::Loading,
            profile_task: None,
            project_state: ListState::default(),
            selected_project: None,

            animation_frame: 0,

            projects_area: None,
            chat_area: None,
        }
    }

    /// Fetch the user profile in the background
    pub fn load_profile(&mut self, client: PortalClient) {
        self.profile = ProfileState::Loading;
        self.profile_task = Some(tokio::spawn(async move { client.fetch_user().await }));
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.session.snapshot()
    }

    pub fn input(&self) -> String {
        self.session.input()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match &self.profile {
            ProfileState::Loaded(user) => Some(user),
            _ => None,
        }
    }

    /// Hand `text` to the chat session. Ignored by the session when blank or
    /// while another request is in flight.
    pub fn submit(&mut self, text: &str) {
        match self.session.begin(text) {
            Ok(submission) => {
                self.input_cursor = 0;
                self.follow_chat = true;
                self.animation_frame = 0;
                self.submission_task = Some(tokio::spawn(submission.run()));
            }
            Err(rejection) => debug!(?rejection, "submission not started"),
        }
    }

    pub fn submit_input(&mut self) {
        let text = self.session.input();
        self.submit(&text);
    }

    /// Submit the quick action bound to key `number` (1-based)
    pub fn submit_quick_action(&mut self, number: usize) {
        if let Some(text) = quick_action(number) {
            info!(number, "quick action");
            self.submit(text);
        }
    }

    /// Collect finished background work. Cheap when nothing has finished.
    pub async fn poll_tasks(&mut self) {
        if self.submission_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.submission_task.take() {
                match task.await {
                    Ok(outcome) => debug!(?outcome, "submission finished"),
                    Err(err) => error!(error = %err, "submission task aborted"),
                }
                self.follow_chat = true;
            }
        }

        if self.profile_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.profile_task.take() {
                self.profile = match task.await {
                    Ok(Ok(user)) => {
                        info!(customer_id = %user.customer_id, projects = user.projects.len(), "loaded user profile");
                        if !user.projects.is_empty() {
                            self.project_state.select(Some(0));
                        }
                        ProfileState::Loaded(user)
                    }
                    Ok(Err(err)) => {
                        warn!(error = %err, "failed to load user profile");
                        ProfileState::Unavailable
                    }
                    Err(err) => {
                        error!(error = %err, "profile task aborted");
                        ProfileState::Unavailable
                    }
                };
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Project panel navigation
    fn project_count(&self) -> usize {
        self.user().map_or(0, |u| u.projects.len())
    }

    pub fn project_nav_down(&mut self) {
        let len = self.project_count();
        if len > 0 {
            let i = self.project_state.selected().map_or(0, |i| (i + 1).min(len - 1));
            self.project_state.select(Some(i));
        }
    }

    pub fn project_nav_up(&mut self) {
        if self.project_count() > 0 {
            let i = self.project_state.selected().unwrap_or(0);
            self.project_state.select(Some(i.saturating_sub(1)));
        }
    }

    /// Mark the highlighted project card as selected
    pub fn select_project(&mut self) {
        if let Some(i) = self.project_state.selected() {
            if i < self.project_count() {
                self.selected_project = Some(i);
            }
        }
    }

    // Chat scrolling
    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        self.follow_chat = self.chat_scroll >= max;
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_chat = false;
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
        self.follow_chat = true;
    }

    fn max_chat_scroll(&self) -> u16 {
        // Fall back to a typical panel size before the first render
        let height = if self.chat_height > 0 { self.chat_height } else { 20 };
        let width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        chat_line_count(&self.messages(), self.is_busy(), width).saturating_sub(height)
    }
}

/// Rendered height of the transcript at `wrap_width` columns, matching the
/// layout in `ui::render_chat`.
pub fn chat_line_count(messages: &[ChatMessage], busy: bool, wrap_width: usize) -> u16 {
    let wrap_width = wrap_width.max(1);
    let mut total_lines: u16 = 0;

    for msg in messages {
        total_lines = total_lines.saturating_add(1); // "You  12:00:00" header
        for line in msg.content.lines() {
            // Use character count, not byte length, for proper UTF-8 handling
            let char_count = line.chars().count();
            let wrapped = if char_count == 0 { 1 } else { char_count.div_ceil(wrap_width) };
            total_lines = total_lines.saturating_add(wrapped as u16);
        }
        total_lines = total_lines.saturating_add(1); // blank line after message
    }

    if busy {
        total_lines = total_lines.saturating_add(2); // "Assistant" + "Thinking..."
    }

    total_lines
}
