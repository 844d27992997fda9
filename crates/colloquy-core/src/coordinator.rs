//! The conversation coordinator.
//!
//! The coordinator owns the message log and a stack of dialogues. Only the
//! top of the stack is active: it receives user input, and only its output is
//! accepted. Every call into dialogue code is followed by a drain of the
//! dialogue event queue, so outputs are applied one at a time in the order
//! they were emitted:
//!
//!   user input → before-middleware → log → dispatch → drain
//!   output → staleness check → after-middleware (reversed) → log → action
//!
//! Failures of dialogues and middleware are published as
//! `CoordinatorEvent::DialogueError` and never escape the public methods.
//! Public methods return `Err` only for protocol violations.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use colloquy_contracts::{
    config::CoordinatorConfig,
    error::{ColloquyError, ColloquyResult},
    input::InputMode,
    message::{
        AgentMessage, InstanceId, Message, MessageId, MessageMeta, UserInput, UserMessage,
        SYSTEM_DIALOGUE_IDENTIFIER,
    },
    snapshot::{ConversationId, ConversationSnapshot, StackEntrySnapshot, SNAPSHOT_VERSION},
};

use crate::{
    busy::BusyFlag,
    event::{CoordinatorEvent, MessageChanges},
    output::{DialogueOutput, OutputAction},
    sink::{DialogueEvent, DialogueKey, DialogueSink, Envelope},
    traits::{Dialogue, DialogueHydrator, Middleware},
};

/// One pushed dialogue instance.
struct StackEntry {
    key: DialogueKey,
    instance: InstanceId,
    identifier: String,
    dialogue: Box<dyn Dialogue>,
    /// Identifier of the child this dialogue issued a wait for.
    waiting_for: Option<String>,
}

pub struct Coordinator {
    id: ConversationId,
    config: CoordinatorConfig,
    message_log: Vec<Message>,
    /// Bottom first; the last entry is the active dialogue.
    stack: Vec<StackEntry>,
    middlewares: Vec<Arc<dyn Middleware>>,
    did_start: bool,
    is_active: bool,
    /// Held while a user message is being handled.
    processing: BusyFlag,
    /// Held while the event queue is being drained by an outer call.
    draining: BusyFlag,
    next_key: u64,
    events_tx: UnboundedSender<Envelope>,
    events_rx: UnboundedReceiver<Envelope>,
    observers: Vec<UnboundedSender<CoordinatorEvent>>,
}

impl Coordinator {
    /// Create a coordinator with an empty stack.
    pub fn new(config: CoordinatorConfig) -> Self {
        Self::with_id(config, ConversationId::new())
    }

    /// Create a coordinator whose stack holds `root`. `root` is started by
    /// the first call to `start`.
    pub fn with_root(config: CoordinatorConfig, root: Box<dyn Dialogue>) -> Self {
        let mut coordinator = Self::new(config);
        coordinator.install(root, InstanceId::new());
        coordinator
    }

    /// Rebuild a coordinator from a snapshot.
    ///
    /// Dialogues are hydrated bottom first and installed without being
    /// started; the message log is restored verbatim.
    pub fn from_snapshot(
        config: CoordinatorConfig,
        snapshot: ConversationSnapshot,
        hydrator: &dyn DialogueHydrator,
    ) -> ColloquyResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ColloquyError::InvalidSnapshot {
                reason: format!(
                    "unsupported snapshot version {} (expected {})",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            });
        }

        let mut coordinator = Self::with_id(config, snapshot.id);
        for entry in snapshot.dialogues {
            let dialogue = hydrator.hydrate(&entry.snapshot)?;
            let key = coordinator.install(dialogue, entry.instance.unwrap_or_default());
            if let Some(installed) = coordinator.entry_mut(key) {
                installed.waiting_for = entry.waiting_for;
            }
        }
        coordinator.message_log = snapshot.message_log;
        coordinator.did_start = snapshot.did_start;

        info!(
            conversation = %coordinator.id,
            dialogues = coordinator.stack.len(),
            messages = coordinator.message_log.len(),
            "conversation hydrated from snapshot"
        );
        Ok(coordinator)
    }

    fn with_id(config: CoordinatorConfig, id: ConversationId) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            id,
            config,
            message_log: Vec::new(),
            stack: Vec::new(),
            middlewares: Vec::new(),
            did_start: false,
            is_active: false,
            processing: BusyFlag::new(),
            draining: BusyFlag::new(),
            next_key: 1,
            events_tx,
            events_rx,
            observers: Vec::new(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn message_log(&self) -> &[Message] {
        &self.message_log
    }

    /// The input mode of the last message, when that message is an agent
    /// message carrying one.
    pub fn active_input_mode(&self) -> Option<&InputMode> {
        self.message_log
            .last()
            .and_then(Message::as_agent)
            .and_then(|m| m.input_mode.as_ref())
    }

    /// True between an active dialogue's "output starting" and its output.
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn did_start(&self) -> bool {
        self.did_start
    }

    pub fn is_processing(&self) -> bool {
        self.processing.is_set()
    }

    /// Identifier of the dialogue on top of the stack.
    pub fn active_dialogue(&self) -> Option<&str> {
        self.stack.last().map(|e| e.identifier.as_str())
    }

    /// Identifiers of every dialogue on the stack, bottom first.
    pub fn stack(&self) -> Vec<&str> {
        self.stack.iter().map(|e| e.identifier.as_str()).collect()
    }

    /// Receive every change event published from now on.
    pub fn subscribe(&mut self) -> UnboundedReceiver<CoordinatorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    /// Register a middleware. Before-hooks run in registration order,
    /// after-hooks in reverse.
    pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    // ── Conversation operations ───────────────────────────────────────────────

    /// Start the conversation by starting the bottom dialogue.
    ///
    /// Calling `start` again after a successful start does nothing.
    pub async fn start(&mut self) -> ColloquyResult<()> {
        if self.did_start {
            debug!(conversation = %self.id, "start called twice; ignoring");
            return Ok(());
        }
        let Some(bottom) = self.stack.first_mut() else {
            return Err(ColloquyError::NoDialogues);
        };

        info!(conversation = %self.id, dialogue = %bottom.identifier, "starting conversation");
        self.did_start = true;
        let key = bottom.key;
        let result = bottom.dialogue.on_start().await;
        if let Err(error) = result {
            self.queue_error(key, error);
        }
        self.drain().await;
        Ok(())
    }

    /// Handle one message from the user.
    ///
    /// Input arriving while a previous message is still being processed
    /// (e.g. sent from a middleware hook) is dropped. Dropping the returned
    /// future mid-turn releases the coordinator for the next message.
    pub async fn send_user_message(&mut self, input: UserInput) {
        let Some(_processing) = self.processing.try_acquire() else {
            debug!(conversation = %self.id, "user message received while processing; dropped");
            return;
        };

        if self.run_before_middleware(&input).await {
            if let Some(body) = &input.body {
                let is_undoable = self
                    .message_log
                    .iter()
                    .rev()
                    .find_map(Message::as_agent)
                    .is_some_and(AgentMessage::is_undoable_prompt);
                let message = Message::User(UserMessage {
                    id: MessageId::new(),
                    created_at: Utc::now(),
                    body: Some(body.clone()),
                    value: input.value.clone(),
                    attachment: input.attachment.clone(),
                    is_undoable,
                });
                self.append_messages(vec![message]);
            }

            match input.dispatch_value() {
                Some(value) => self.dispatch(value).await,
                None => debug!(conversation = %self.id, "user message has no body or value; not dispatched"),
            }
        }

        self.drain().await;
    }

    /// Undo the user message `id` and everything after it.
    ///
    /// The message must answer a prompt issued by the active dialogue
    /// instance (not merely a dialogue with the same identifier) that carries
    /// a rewind token. The dialogue is rewound first; the log is truncated only
    /// if the rewind succeeds.
    pub fn undo_user_message(&mut self, id: MessageId) -> ColloquyResult<()> {
        if self.processing.is_set() {
            return Err(ColloquyError::Busy);
        }

        let index = self
            .message_log
            .iter()
            .position(|m| matches!(m, Message::User(user) if user.id == id))
            .ok_or_else(|| ColloquyError::MessageNotFound { id: id.to_string() })?;

        let prompt = self.message_log[..index]
            .iter()
            .rev()
            .find_map(Message::as_agent)
            .ok_or_else(|| ColloquyError::MissingRewindToken { id: id.to_string() })?;
        let token = prompt
            .meta
            .rewind_token
            .clone()
            .ok_or_else(|| ColloquyError::MissingRewindToken { id: id.to_string() })?;
        if !prompt.is_undoable_prompt() {
            return Err(ColloquyError::NotUndoable { id: id.to_string() });
        }
        let owner = prompt.meta.dialogue.clone();
        let owner_instance = prompt.meta.instance;

        let top = self.stack.last_mut().ok_or(ColloquyError::NoDialogues)?;
        if top.identifier != owner || owner_instance.is_some_and(|instance| instance != top.instance) {
            return Err(ColloquyError::CrossDialogueUndo {
                owner,
                active: top.identifier.clone(),
            });
        }
        if !top.dialogue.can_rewind() {
            return Err(ColloquyError::RewindUnsupported { dialogue: owner });
        }
        top.dialogue.rewind(&token)?;

        let removed = self.message_log.split_off(index);
        info!(
            conversation = %self.id,
            dialogue = %owner,
            token = %token,
            removed = removed.len(),
            "user message undone"
        );
        self.publish(CoordinatorEvent::MessagesChanged(MessageChanges {
            removed,
            ..MessageChanges::default()
        }));
        Ok(())
    }

    /// Push `dialogue` and start it. With `clear_stack`, every dialogue
    /// already on the stack is removed first, bottom first, without resuming.
    pub async fn start_dialogue(&mut self, dialogue: Box<dyn Dialogue>, clear_stack: bool) {
        if clear_stack {
            let keys: Vec<DialogueKey> = self.stack.iter().map(|e| e.key).collect();
            for key in keys {
                self.remove_entry(key, false, None).await;
            }
        }
        self.push_entry(dialogue, true).await;
        self.drain().await;
    }

    /// Push `dialogue` on top of the stack and start it.
    pub async fn push_dialogue(&mut self, dialogue: Box<dyn Dialogue>) {
        self.start_dialogue(dialogue, false).await;
    }

    /// Remove the active dialogue and resume the one beneath it.
    pub async fn pop_dialogue(&mut self) {
        if let Some(key) = self.stack.last().map(|e| e.key) {
            self.remove_entry(key, true, None).await;
        }
        self.drain().await;
    }

    /// Append system messages to the log.
    pub fn interject_messages<I, S>(&mut self, bodies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let messages = bodies
            .into_iter()
            .map(|body| {
                Message::Agent(AgentMessage {
                    id: MessageId::new(),
                    created_at: Utc::now(),
                    body: Some(body.into()),
                    attachment: None,
                    input_mode: None,
                    meta: MessageMeta {
                        dialogue: SYSTEM_DIALOGUE_IDENTIFIER.to_string(),
                        instance: None,
                        rewind_token: None,
                    },
                })
            })
            .collect();
        self.append_messages(messages);
    }

    /// Forward an interrupt to the active dialogue.
    pub async fn interrupt(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            let key = top.key;
            let result = top.dialogue.on_interrupt().await;
            if let Err(error) = result {
                self.queue_error(key, error);
            }
        }
        self.drain().await;
    }

    /// Forward a resume (without value) to the active dialogue.
    pub async fn resume(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            let key = top.key;
            let result = top.dialogue.on_resume(None).await;
            if let Err(error) = result {
                self.queue_error(key, error);
            }
        }
        self.drain().await;
    }

    /// Apply events dialogues emitted outside of a coordinator call.
    pub async fn process_pending(&mut self) {
        self.drain().await;
    }

    /// Capture the conversation. Dialogues that cannot be snapshotted are
    /// left out.
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            version: SNAPSHOT_VERSION,
            id: self.id,
            did_start: self.did_start,
            message_log: self.message_log.clone(),
            dialogues: self
                .stack
                .iter()
                .filter_map(|entry| {
                    entry.dialogue.snapshot().map(|snapshot| StackEntrySnapshot {
                        snapshot,
                        instance: Some(entry.instance),
                        waiting_for: entry.waiting_for.clone(),
                    })
                })
                .collect(),
        }
    }

    /// Dump the message log and stack through `tracing`.
    pub fn log_state(&self) {
        for (index, message) in self.message_log.iter().enumerate() {
            let author = match message {
                Message::Agent(agent) => agent.meta.dialogue.as_str(),
                Message::User(_) => "user",
            };
            debug!(index, author, body = message.body().unwrap_or(""), "message log entry");
        }
        for (depth, entry) in self.stack.iter().enumerate() {
            debug!(
                depth,
                dialogue = %entry.identifier,
                waiting_for = entry.waiting_for.as_deref().unwrap_or("-"),
                snapshot = ?entry.dialogue.snapshot(),
                "stack entry"
            );
        }
    }

    // ── Input path ────────────────────────────────────────────────────────────

    /// Returns false when a middleware halted the message.
    async fn run_before_middleware(&mut self, input: &UserInput) -> bool {
        let middlewares = self.middlewares.clone();
        for middleware in &middlewares {
            match middleware.before(input, self).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(middleware = middleware.name(), "middleware halted user message");
                    return false;
                }
                Err(error) => {
                    self.report_error(error);
                    return false;
                }
            }
        }
        true
    }

    async fn dispatch(&mut self, value: Value) {
        let Some(top) = self.stack.last_mut() else {
            self.diagnostic("user input received with no active dialogue".to_string());
            return;
        };
        debug!(dialogue = %top.identifier, "dispatching user input");
        let key = top.key;
        let result = top.dialogue.on_receive_input(Some(value)).await;
        if let Err(error) = result {
            self.queue_error(key, error);
        }
    }

    // ── Event handling ────────────────────────────────────────────────────────

    async fn drain(&mut self) {
        let Some(_draining) = self.draining.try_acquire() else {
            return;
        };
        while let Ok(envelope) = self.events_rx.try_recv() {
            self.handle_envelope(envelope).await;
        }
    }

    async fn handle_envelope(&mut self, envelope: Envelope) {
        let Envelope { key, event } = envelope;
        match event {
            DialogueEvent::OutputStarting => {
                if self.is_top(key) {
                    self.set_active(true);
                }
            }
            DialogueEvent::Output {
                output,
                is_finished,
            } => self.handle_output(key, output, is_finished).await,
            DialogueEvent::Error(error) => {
                self.report_error(error);
                self.set_active(false);
            }
        }
    }

    async fn handle_output(&mut self, key: DialogueKey, output: DialogueOutput, is_finished: bool) {
        let Some((identifier, instance)) = self
            .stack
            .last()
            .filter(|e| e.key == key)
            .map(|e| (e.identifier.clone(), e.instance))
        else {
            warn!(key = key.0, "discarding output from a dialogue that is not active");
            self.diagnostic("discarded output from an inactive dialogue".to_string());
            return;
        };
        debug!(
            dialogue = %identifier,
            messages = output.messages.len(),
            action = output.action.name(),
            is_finished,
            "applying dialogue output"
        );
        self.set_active(false);

        let middlewares = self.middlewares.clone();
        for middleware in middlewares.iter().rev() {
            if let Err(error) = middleware.after(&output, self).await {
                self.report_error(error);
            }
        }

        let messages = agent_messages(&output, &identifier, instance);
        self.append_messages(messages);

        match output.action {
            OutputAction::Continue => {
                if is_finished {
                    self.finish_entry(key, None).await;
                }
            }
            OutputAction::Finish(value) => self.finish_entry(key, value).await,
            OutputAction::Transition(target) => {
                self.push_entry(target, true).await;
                self.remove_entry(key, false, None).await;
            }
            OutputAction::Wait(child) => {
                let child_identifier = child.identifier().to_string();
                if let Some(entry) = self.entry_mut(key) {
                    entry.waiting_for = Some(child_identifier);
                }
                self.push_entry(child, true).await;
                if is_finished {
                    self.remove_entry(key, false, None).await;
                }
            }
        }
    }

    // ── Stack management ──────────────────────────────────────────────────────

    /// Attach a sink and put `dialogue` on top without any lifecycle calls.
    fn install(&mut self, mut dialogue: Box<dyn Dialogue>, instance: InstanceId) -> DialogueKey {
        let key = DialogueKey(self.next_key);
        self.next_key += 1;
        dialogue.attach(DialogueSink::new(key, self.events_tx.clone()));
        let identifier = dialogue.identifier().to_string();
        self.stack.push(StackEntry {
            key,
            instance,
            identifier: identifier.clone(),
            dialogue,
            waiting_for: None,
        });
        self.publish(CoordinatorEvent::DialoguePushed { identifier });
        key
    }

    async fn push_entry(&mut self, dialogue: Box<dyn Dialogue>, start: bool) {
        if let Some(top) = self.stack.last_mut() {
            let key = top.key;
            let result = top.dialogue.on_interrupt().await;
            if let Err(error) = result {
                self.queue_error(key, error);
            }
        }

        let key = self.install(dialogue, InstanceId::new());
        debug!(dialogue = self.active_dialogue().unwrap_or(""), key = key.0, "dialogue pushed");
        if !start {
            return;
        }
        let started = match self.stack.last_mut() {
            Some(top) => top.dialogue.on_start().await,
            None => Ok(()),
        };
        if let Err(error) = started {
            self.queue_error(key, error);
        }
    }

    async fn finish_entry(&mut self, key: DialogueKey, value: Option<Value>) {
        let finished = match self.entry_mut(key) {
            Some(entry) => entry.dialogue.on_finish().await,
            None => Ok(()),
        };
        if let Err(error) = finished {
            self.queue_error(key, error);
        }
        self.remove_entry(key, true, value).await;
    }

    /// Remove the entry `key`. When it was on top and `resume` is set, the
    /// new top is resumed; it receives `value` only if it was waiting for a
    /// dialogue with the removed identifier.
    async fn remove_entry(&mut self, key: DialogueKey, resume: bool, value: Option<Value>) {
        let Some(index) = self.stack.iter().position(|e| e.key == key) else {
            return;
        };
        let was_top = index + 1 == self.stack.len();
        let mut entry = self.stack.remove(index);
        entry.dialogue.detach();
        debug!(dialogue = %entry.identifier, key = key.0, "dialogue removed");

        self.close_prompts(entry.instance);
        self.publish(CoordinatorEvent::DialogueRemoved {
            identifier: entry.identifier.clone(),
        });

        if !(was_top && resume) {
            return;
        }
        let Some(top) = self.stack.last_mut() else {
            return;
        };
        let carried = match top.waiting_for.take() {
            Some(waiting_for) if waiting_for == entry.identifier => value,
            _ => None,
        };
        debug!(dialogue = %top.identifier, has_value = carried.is_some(), "resuming dialogue");
        let top_key = top.key;
        let result = top.dialogue.on_resume(carried).await;
        if let Err(error) = result {
            self.queue_error(top_key, error);
        }
    }

    /// Mark every still-undoable prompt of `instance` as non-undoable. Its
    /// rewind tokens no longer refer to a live dialogue.
    fn close_prompts(&mut self, instance: InstanceId) {
        let mut updated = Vec::new();
        for message in &mut self.message_log {
            let Message::Agent(agent) = message else {
                continue;
            };
            if agent.meta.instance != Some(instance) {
                continue;
            }
            if let Some(mode) = agent.input_mode.as_mut().filter(|m| m.is_undoable) {
                mode.is_undoable = false;
                updated.push(Message::Agent(agent.clone()));
            }
        }
        if updated.is_empty() {
            return;
        }
        self.publish(CoordinatorEvent::MessagesChanged(MessageChanges {
            updated,
            ..MessageChanges::default()
        }));
    }

    fn entry_mut(&mut self, key: DialogueKey) -> Option<&mut StackEntry> {
        self.stack.iter_mut().find(|e| e.key == key)
    }

    fn is_top(&self, key: DialogueKey) -> bool {
        self.stack.last().is_some_and(|e| e.key == key)
    }

    // ── Publishing ────────────────────────────────────────────────────────────

    fn append_messages(&mut self, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        self.message_log.extend(messages.iter().cloned());
        self.publish(CoordinatorEvent::MessagesChanged(MessageChanges {
            added: messages,
            ..MessageChanges::default()
        }));
    }

    fn set_active(&mut self, active: bool) {
        if self.is_active != active {
            self.is_active = active;
            self.publish(CoordinatorEvent::ActiveChanged(active));
        }
    }

    /// Queue a hook failure behind whatever the dialogue already emitted, so
    /// the drain applies its events and the failure in order.
    fn queue_error(&self, key: DialogueKey, error: ColloquyError) {
        DialogueSink::new(key, self.events_tx.clone()).error(error);
    }

    fn report_error(&mut self, error: ColloquyError) {
        warn!(conversation = %self.id, %error, "dialogue error");
        self.publish(CoordinatorEvent::DialogueError(error));
    }

    fn diagnostic(&mut self, message: String) {
        debug!(conversation = %self.id, "{}", message);
        if self.config.debug_mode {
            let body = format!("{} {}", self.config.debug_prefix, message);
            self.interject_messages([body]);
        }
    }

    fn publish(&mut self, event: CoordinatorEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Turn an output into log entries. Only the last entry carries the input
/// mode and rewind token; a prompt without messages becomes a bodiless entry.
fn agent_messages(output: &DialogueOutput, identifier: &str, instance: InstanceId) -> Vec<Message> {
    let stamp = |body: Option<String>, attachment, last: bool| {
        Message::Agent(AgentMessage {
            id: MessageId::new(),
            created_at: Utc::now(),
            body,
            attachment,
            input_mode: if last { output.input_mode.clone() } else { None },
            meta: MessageMeta {
                dialogue: identifier.to_string(),
                instance: Some(instance),
                rewind_token: if last { output.rewind_token.clone() } else { None },
            },
        })
    };

    if output.messages.is_empty() {
        return match output.input_mode {
            Some(_) => vec![stamp(None, None, true)],
            None => Vec::new(),
        };
    }

    let count = output.messages.len();
    output
        .messages
        .iter()
        .enumerate()
        .map(|(index, message)| stamp(message.body.clone(), message.attachment.clone(), index + 1 == count))
        .collect()
}
