#[cfg(test)]
mod tests {
    use crate::conversation::{Conversation, MessageRole};
    use crate::error::{ConfabError, Result};
    use crate::session::manager::{SendOutcome, SessionManager};
    use crate::session::remote::{
        AssistantReply, CreateSessionAck, CreateSessionRequest, HistoryPayload, PromptReply,
        RemoteConversationService,
    };
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;
    use uuid::Uuid;

    /// What the mock records about each remote call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum RecordedCall {
        FetchHistory,
        CreateSession {
            session_id: String,
            prompt: Option<String>,
        },
        SendPrompt {
            session_id: String,
            prompt: String,
        },
    }

    enum ReplyScript {
        Ready(Result<PromptReply>),
        Gated {
            entered: oneshot::Sender<()>,
            release: oneshot::Receiver<Result<PromptReply>>,
        },
    }

    // Scripted remote backend that records every call it receives.
    struct MockRemoteService {
        history: Mutex<VecDeque<Result<HistoryPayload>>>,
        create_acks: Mutex<VecDeque<Result<CreateSessionAck>>>,
        replies: Mutex<VecDeque<ReplyScript>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl MockRemoteService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                history: Mutex::new(VecDeque::new()),
                create_acks: Mutex::new(VecDeque::new()),
                replies: Mutex::new(VecDeque::new()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn push_history(&self, result: Result<HistoryPayload>) {
            self.history.lock().unwrap().push_back(result);
        }

        fn push_create_ack(&self, result: Result<CreateSessionAck>) {
            self.create_acks.lock().unwrap().push_back(result);
        }

        fn push_reply(&self, result: Result<PromptReply>) {
            self.replies
                .lock()
                .unwrap()
                .push_back(ReplyScript::Ready(result));
        }

        /// Scripts a reply that blocks until the returned sender releases it.
        ///
        /// The returned receiver fires once the manager has entered the
        /// network call, i.e. after its optimistic append was committed.
        fn push_gated_reply(
            &self,
        ) -> (
            oneshot::Receiver<()>,
            oneshot::Sender<Result<PromptReply>>,
        ) {
            let (entered_tx, entered_rx) = oneshot::channel();
            let (release_tx, release_rx) = oneshot::channel();
            self.replies.lock().unwrap().push_back(ReplyScript::Gated {
                entered: entered_tx,
                release: release_rx,
            });
            (entered_rx, release_tx)
        }

        fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        fn prompts_sent(&self) -> usize {
            self.calls()
                .iter()
                .filter(|call| matches!(call, RecordedCall::SendPrompt { .. }))
                .count()
        }
    }

    #[async_trait::async_trait]
    impl RemoteConversationService for MockRemoteService {
        async fn fetch_history(&self) -> Result<HistoryPayload> {
            self.calls.lock().unwrap().push(RecordedCall::FetchHistory);
            self.history
                .lock()
                .unwrap()
                .pop_front()
                .expect("no history scripted")
        }

        async fn create_session(&self, request: CreateSessionRequest) -> Result<CreateSessionAck> {
            self.calls
                .lock()
                .unwrap()
                .push(RecordedCall::CreateSession {
                    session_id: request.session_id,
                    prompt: request.prompt,
                });
            self.create_acks
                .lock()
                .unwrap()
                .pop_front()
                .expect("no create ack scripted")
        }

        async fn send_prompt(&self, session_id: &str, prompt: &str) -> Result<PromptReply> {
            self.calls.lock().unwrap().push(RecordedCall::SendPrompt {
                session_id: session_id.to_string(),
                prompt: prompt.to_string(),
            });
            let script = self.replies.lock().unwrap().pop_front();
            match script.expect("no reply scripted") {
                ReplyScript::Ready(result) => result,
                ReplyScript::Gated { entered, release } => {
                    let _ = entered.send(());
                    release
                        .await
                        .unwrap_or_else(|_| Err(ConfabError::transport("reply gate dropped")))
                }
            }
        }
    }

    fn conversation(id: &str) -> Conversation {
        Conversation::new(id, "user-1")
    }

    fn ok_reply(text: &str) -> Result<PromptReply> {
        Ok(PromptReply::Enveloped {
            status: true,
            data: AssistantReply {
                text: text.to_string(),
                timestamp: None,
            },
        })
    }

    fn contents(conversation: &Conversation) -> Vec<String> {
        conversation
            .messages
            .iter()
            .map(|message| message.content.clone())
            .collect()
    }

    #[tokio::test]
    async fn load_history_activates_the_first_conversation() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![
            conversation("a"),
            conversation("b"),
        ])));
        let manager = SessionManager::new(remote.clone(), "user-1");

        manager.load_history().await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.active_conversation_id(), Some("a"));
        assert_eq!(snapshot.conversations.len(), 2);
        assert_eq!(snapshot.conversations[0].conversation_id, "a");
        assert_eq!(snapshot.conversations[1].conversation_id, "b");
    }

    #[tokio::test]
    async fn load_history_accepts_the_enveloped_shape() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Enveloped {
            data: vec![conversation("a")],
        }));
        let manager = SessionManager::new(remote.clone(), "user-1");

        manager.load_history().await.unwrap();

        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.active_conversation_id(), Some("a"));
    }

    #[tokio::test]
    async fn load_history_with_no_conversations_leaves_none_active() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(Vec::new())));
        let manager = SessionManager::new(remote.clone(), "user-1");

        manager.load_history().await.unwrap();

        let snapshot = manager.snapshot().await;
        assert!(snapshot.conversations.is_empty());
        assert!(snapshot.active_conversation.is_none());
        assert_eq!(snapshot.active_conversation_id(), None);
    }

    #[tokio::test]
    async fn failed_history_reload_leaves_the_store_unchanged() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        remote.push_history(Err(ConfabError::transport("connection refused")));
        let manager = SessionManager::new(remote.clone(), "user-1");

        manager.load_history().await.unwrap();
        let err = manager.load_history().await.unwrap_err();

        assert!(err.is_transport());
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.conversations.len(), 1);
        assert_eq!(snapshot.active_conversation_id(), Some("a"));
    }

    #[tokio::test]
    async fn new_session_is_prepended_and_activated() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        remote.push_create_ack(Ok(CreateSessionAck { status: true }));
        let manager = SessionManager::new(remote.clone(), "user-1");
        manager.load_history().await.unwrap();

        let id = manager.new_session(None).await.unwrap();

        assert!(Uuid::parse_str(&id).is_ok());
        let snapshot = manager.snapshot().await;
        assert_eq!(snapshot.conversations.len(), 2);
        assert_eq!(snapshot.conversations[0].conversation_id, id);
        assert_eq!(snapshot.active_conversation_id(), Some(id.as_str()));
        let active = snapshot.active_conversation.unwrap();
        assert!(active.messages.is_empty());
        assert_eq!(active.user_id, "user-1");
        // The backend was asked to adopt the locally generated id.
        assert!(remote.calls().contains(&RecordedCall::CreateSession {
            session_id: id,
            prompt: None,
        }));
    }

    #[tokio::test]
    async fn new_session_forwards_the_seed_prompt() {
        let remote = MockRemoteService::new();
        remote.push_create_ack(Ok(CreateSessionAck { status: true }));
        let manager = SessionManager::new(remote.clone(), "user-1");

        let id = manager.new_session(Some("hey how are you")).await.unwrap();

        assert!(remote.calls().contains(&RecordedCall::CreateSession {
            session_id: id,
            prompt: Some("hey how are you".to_string()),
        }));
    }

    #[tokio::test]
    async fn rejected_new_session_mutates_nothing() {
        let remote = MockRemoteService::new();
        remote.push_create_ack(Ok(CreateSessionAck { status: false }));
        let manager = SessionManager::new(remote.clone(), "user-1");

        let err = manager.new_session(None).await.unwrap_err();

        assert!(err.is_rejected());
        let snapshot = manager.snapshot().await;
        assert!(snapshot.conversations.is_empty());
        assert!(snapshot.active_conversation.is_none());
    }

    #[tokio::test]
    async fn failed_new_session_mutates_nothing() {
        let remote = MockRemoteService::new();
        remote.push_create_ack(Err(ConfabError::transport("connection refused")));
        let manager = SessionManager::new(remote.clone(), "user-1");

        let err = manager.new_session(None).await.unwrap_err();

        assert!(err.is_transport());
        assert!(manager.snapshot().await.conversations.is_empty());
    }

    #[tokio::test]
    async fn sent_message_is_visible_before_the_reply_lands() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        let (entered, release) = remote.push_gated_reply();
        let manager = Arc::new(SessionManager::new(remote.clone(), "user-1"));
        manager.load_history().await.unwrap();

        let send = tokio::spawn({
            let manager = manager.clone();
            async move { manager.send_message("hello").await }
        });
        entered.await.unwrap();

        // The optimistic append is in while the reply is still pending.
        let snapshot = manager.snapshot().await;
        let active = snapshot.active_conversation.clone().unwrap();
        assert_eq!(active.messages.len(), 1);
        assert_eq!(active.messages[0].role, MessageRole::User);
        assert_eq!(active.messages[0].content, "hello");
        assert!(snapshot.is_awaiting_reply("a"));
        assert!(manager.is_awaiting_reply("a").await);

        release.send(ok_reply("hi")).unwrap();
        let outcome = send.await.unwrap().unwrap();
        assert_eq!(outcome, SendOutcome::Replied);

        let active = manager.snapshot().await.active_conversation.unwrap();
        assert_eq!(active.messages.len(), 2);
        assert_eq!(active.messages[1].role, MessageRole::Assistant);
        assert_eq!(active.messages[1].content, "hi");
        assert!(active.messages[1].id.ends_with("-ai"));
        assert!(!manager.is_awaiting_reply("a").await);
    }

    #[tokio::test]
    async fn failed_send_keeps_the_user_message_without_a_reply() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        remote.push_reply(Err(ConfabError::transport("connection reset")));
        let manager = SessionManager::new(remote.clone(), "user-1");
        manager.load_history().await.unwrap();

        let err = manager.send_message("hello").await.unwrap_err();

        assert!(err.is_transport());
        let active = manager.snapshot().await.active_conversation.unwrap();
        assert_eq!(contents(&active), vec!["hello"]);
        assert_eq!(active.messages[0].role, MessageRole::User);
        assert!(!manager.is_awaiting_reply("a").await);
    }

    #[tokio::test]
    async fn rejected_reply_keeps_the_user_message() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        remote.push_reply(Ok(PromptReply::Enveloped {
            status: false,
            data: AssistantReply {
                text: "ignored".to_string(),
                timestamp: None,
            },
        }));
        let manager = SessionManager::new(remote.clone(), "user-1");
        manager.load_history().await.unwrap();

        let err = manager.send_message("hello").await.unwrap_err();

        assert!(err.is_rejected());
        let active = manager.snapshot().await.active_conversation.unwrap();
        assert_eq!(contents(&active), vec!["hello"]);
        assert!(!manager.is_awaiting_reply("a").await);
    }

    #[tokio::test]
    async fn bare_reply_shape_merges_with_its_timestamp() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        remote.push_reply(Ok(PromptReply::Bare(AssistantReply {
            text: "hi".to_string(),
            timestamp: Some("2025-03-01T12:00:00Z".to_string()),
        })));
        let manager = SessionManager::new(remote.clone(), "user-1");
        manager.load_history().await.unwrap();

        let outcome = manager.send_message("hello").await.unwrap();

        assert_eq!(outcome, SendOutcome::Replied);
        let active = manager.snapshot().await.active_conversation.unwrap();
        assert_eq!(active.messages[1].content, "hi");
        assert_eq!(active.messages[1].timestamp, "2025-03-01T12:00:00Z");
    }

    #[tokio::test]
    async fn blank_input_is_a_no_op() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        let manager = SessionManager::new(remote.clone(), "user-1");
        manager.load_history().await.unwrap();

        assert_eq!(manager.send_message("").await.unwrap(), SendOutcome::Ignored);
        assert_eq!(
            manager.send_message("   ").await.unwrap(),
            SendOutcome::Ignored
        );

        let active = manager.snapshot().await.active_conversation.unwrap();
        assert!(active.messages.is_empty());
        assert_eq!(remote.prompts_sent(), 0);
    }

    #[tokio::test]
    async fn send_without_an_active_conversation_is_a_no_op() {
        let remote = MockRemoteService::new();
        let manager = SessionManager::new(remote.clone(), "user-1");

        let outcome = manager.send_message("hello").await.unwrap();

        assert_eq!(outcome, SendOutcome::Ignored);
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn set_active_switches_and_rejects_unknown_ids() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![
            conversation("a"),
            conversation("b"),
        ])));
        let manager = SessionManager::new(remote.clone(), "user-1");
        manager.load_history().await.unwrap();

        manager.set_active("b").await.unwrap();
        assert_eq!(
            manager.snapshot().await.active_conversation_id(),
            Some("b")
        );

        let err = manager.set_active("nonexistent").await.unwrap_err();
        assert!(err.is_unknown_conversation());
        assert_eq!(
            manager.snapshot().await.active_conversation_id(),
            Some("b")
        );
    }

    #[tokio::test]
    async fn overlapping_replies_merge_in_completion_order() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        let (entered_first, release_first) = remote.push_gated_reply();
        let (entered_second, release_second) = remote.push_gated_reply();
        let manager = Arc::new(SessionManager::new(remote.clone(), "user-1"));
        manager.load_history().await.unwrap();

        let first = tokio::spawn({
            let manager = manager.clone();
            async move { manager.send_message("one").await }
        });
        entered_first.await.unwrap();
        let second = tokio::spawn({
            let manager = manager.clone();
            async move { manager.send_message("two").await }
        });
        entered_second.await.unwrap();

        // Both user messages are committed in send order while both replies
        // are outstanding; the second one was not lost to a stale snapshot.
        let active = manager.snapshot().await.active_conversation.unwrap();
        assert_eq!(contents(&active), vec!["one", "two"]);
        assert!(manager.is_awaiting_reply("a").await);

        // The later send completes first, so its reply merges first.
        release_second.send(ok_reply("reply two")).unwrap();
        second.await.unwrap().unwrap();
        assert!(manager.is_awaiting_reply("a").await);

        release_first.send(ok_reply("reply one")).unwrap();
        first.await.unwrap().unwrap();
        assert!(!manager.is_awaiting_reply("a").await);

        let active = manager.snapshot().await.active_conversation.unwrap();
        assert_eq!(
            contents(&active),
            vec!["one", "two", "reply two", "reply one"]
        );
        let roles: Vec<MessageRole> = active.messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::Assistant,
            ]
        );
    }

    #[tokio::test]
    async fn awaiting_flag_is_scoped_to_the_sending_conversation() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![
            conversation("a"),
            conversation("b"),
        ])));
        let (entered, release) = remote.push_gated_reply();
        let manager = Arc::new(SessionManager::new(remote.clone(), "user-1"));
        manager.load_history().await.unwrap();

        let send = tokio::spawn({
            let manager = manager.clone();
            async move { manager.send_message("hello").await }
        });
        entered.await.unwrap();

        assert!(manager.is_awaiting_reply("a").await);
        assert!(!manager.is_awaiting_reply("b").await);
        let snapshot = manager.snapshot().await;
        assert!(snapshot.is_awaiting_reply("a"));
        assert!(!snapshot.is_awaiting_reply("b"));

        release.send(ok_reply("hi")).unwrap();
        send.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn reply_for_a_conversation_dropped_by_a_reload_is_not_merged() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        remote.push_history(Ok(HistoryPayload::Conversations(Vec::new())));
        let (entered, release) = remote.push_gated_reply();
        let manager = Arc::new(SessionManager::new(remote.clone(), "user-1"));
        manager.load_history().await.unwrap();

        let send = tokio::spawn({
            let manager = manager.clone();
            async move { manager.send_message("hello").await }
        });
        entered.await.unwrap();

        // A reload drops the conversation while the reply is in flight.
        manager.load_history().await.unwrap();

        release.send(ok_reply("hi")).unwrap();
        let err = send.await.unwrap().unwrap_err();

        assert!(err.is_unknown_conversation());
        assert!(manager.snapshot().await.conversations.is_empty());
        assert!(!manager.is_awaiting_reply("a").await);
    }

    #[tokio::test]
    async fn merged_reply_bumps_the_conversation_revision() {
        let remote = MockRemoteService::new();
        remote.push_history(Ok(HistoryPayload::Conversations(vec![conversation("a")])));
        remote.push_reply(ok_reply("hi"));
        let manager = SessionManager::new(remote.clone(), "user-1");
        manager.load_history().await.unwrap();

        manager.send_message("hello").await.unwrap();

        // One bump for the optimistic append, one for the merge.
        let active = manager.snapshot().await.active_conversation.unwrap();
        assert_eq!(active.revision, 2);
    }
}
