//! Property-based tests for the state machine
//!
//! A small in-test executor applies effects to a real `MessageStore` so the
//! session invariants can be checked across arbitrary event sequences.

use super::*;
use crate::session::{MessageStore, Role, Turn};
use proptest::prelude::*;

// ============================================================================
// Test Harness
// ============================================================================

#[derive(Debug, Default)]
struct Harness {
    status: SessionStatus,
    store: MessageStore,
    staged: usize,
    generation: u64,
    dispatched: Vec<(u64, String)>,
}

impl Harness {
    /// Run one event. Returns whether the transition was accepted.
    fn step(&mut self, event: Event) -> bool {
        let context = SessionContext::new(&self.store, self.staged, self.generation);
        let Ok(result) = transition(self.status, &context, event) else {
            return false;
        };
        self.status = result.new_status;
        for effect in result.effects {
            match effect {
                Effect::AppendTurn { role, parts } => {
                    self.store.append(Turn::new(role, parts).expect("effects carry parts"));
                }
                Effect::TruncateAfter { turn_id } => {
                    self.store.truncate_after(turn_id).expect("truncate target exists");
                }
                Effect::DrainAttachments => self.staged = 0,
                Effect::DispatchCompletion { generation, prompt } => {
                    self.generation = generation;
                    self.dispatched.push((generation, prompt));
                }
            }
        }
        true
    }

    /// Resolve the current generation with a reply
    fn succeed(&mut self, text: impl Into<String>) -> bool {
        let event = Event::CompletionSucceeded {
            generation: self.generation,
            text: text.into(),
        };
        self.step(event)
    }

    /// Resolve the current generation with a failure
    fn fail(&mut self, message: impl Into<String>) -> bool {
        let event = Event::CompletionFailed {
            generation: self.generation,
            message: message.into(),
        };
        self.step(event)
    }

    fn roles(&self) -> Vec<Role> {
        self.store.turns().iter().map(Turn::role).collect()
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Action {
    Send(String),
    Stage,
    Regenerate,
    Succeed(String),
    Fail(String),
    /// Resolution carrying an older generation
    Stale,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => "[a-zA-Z ]{0,12}".prop_map(Action::Send),
        1 => Just(Action::Stage),
        2 => Just(Action::Regenerate),
        3 => "[a-zA-Z ]{1,12}".prop_map(Action::Succeed),
        2 => "[a-zA-Z ]{1,12}".prop_map(Action::Fail),
        1 => Just(Action::Stale),
    ]
}

fn to_event(harness: &mut Harness, action: Action) -> Option<Event> {
    match action {
        Action::Send(text) => Some(Event::Send { text }),
        Action::Stage => {
            harness.staged += 1;
            None
        }
        Action::Regenerate => Some(Event::Regenerate),
        Action::Succeed(text) => Some(Event::CompletionSucceeded {
            generation: harness.generation,
            text,
        }),
        Action::Fail(message) => Some(Event::CompletionFailed {
            generation: harness.generation,
            message,
        }),
        Action::Stale => Some(Event::CompletionSucceeded {
            generation: harness.generation.wrapping_sub(1),
            text: "stale".to_string(),
        }),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Status is busy exactly while a dispatched generation is unresolved,
    /// and every turn keeps at least one part.
    #[test]
    fn prop_invariants_hold_over_any_sequence(
        actions in proptest::collection::vec(arb_action(), 0..40),
    ) {
        let mut harness = Harness::default();
        let mut outstanding = false;

        for action in actions {
            let is_stale = matches!(action, Action::Stale);
            let Some(event) = to_event(&mut harness, action) else { continue };
            let before_len = harness.store.len();
            let before_status = harness.status;
            let is_request = matches!(event, Event::Send { .. } | Event::Regenerate);
            let accepted = harness.step(event);

            if !accepted {
                prop_assert_eq!(harness.store.len(), before_len);
                prop_assert_eq!(harness.status, before_status);
            } else if is_request {
                prop_assert!(!before_status.is_busy());
                outstanding = true;
            } else {
                prop_assert!(!is_stale);
                prop_assert_eq!(harness.store.len(), before_len + 1);
                outstanding = false;
            }

            prop_assert_eq!(harness.status.is_busy(), outstanding);
            for turn in harness.store.turns() {
                prop_assert!(!turn.parts().is_empty());
            }
        }
    }

    /// Generations handed to the gateway strictly increase.
    #[test]
    fn prop_generations_are_monotonic(actions in proptest::collection::vec(arb_action(), 0..40)) {
        let mut harness = Harness::default();
        for action in actions {
            if let Some(event) = to_event(&mut harness, action) {
                harness.step(event);
            }
        }
        for pair in harness.dispatched.windows(2) {
            prop_assert!(pair[0].0 < pair[1].0);
        }
    }

    /// Each successful exchange adds exactly one user and one assistant turn, in order.
    #[test]
    fn prop_successful_sends_grow_by_two(
        messages in proptest::collection::vec("[a-zA-Z]{1,10}", 1..10),
    ) {
        let mut harness = Harness::default();
        for (i, text) in messages.iter().enumerate() {
            prop_assert!(harness.step(Event::send(text.clone())));
            let reply = format!("reply {i}");
            prop_assert!(harness.succeed(reply));
            prop_assert_eq!(harness.store.len(), 2 * (i + 1));
        }

        let user_texts: Vec<String> = harness
            .store
            .turns()
            .iter()
            .filter(|t| t.role() == Role::User)
            .map(Turn::text)
            .collect();
        prop_assert_eq!(user_texts, messages);
        prop_assert_eq!(harness.status, SessionStatus::Idle);
    }

    /// Regenerating never duplicates the user turn and always ends right after it.
    #[test]
    fn prop_regenerate_replaces_trailing_turns(
        text in "[a-zA-Z]{1,10}",
        failures in 0usize..3,
        reply in "[a-zA-Z]{1,10}",
    ) {
        let mut harness = Harness::default();
        prop_assert!(harness.step(Event::send(text.clone())));
        prop_assert!(harness.succeed("first"));

        for _ in 0..failures {
            prop_assert!(harness.step(Event::Regenerate));
            prop_assert!(harness.fail("down"));
        }

        prop_assert!(harness.step(Event::Regenerate));
        prop_assert_eq!(harness.roles(), vec![Role::User]);
        prop_assert_eq!(harness.dispatched.last().map(|d| d.1.clone()), Some(text.clone()));

        prop_assert!(harness.succeed(reply.clone()));
        prop_assert_eq!(harness.roles(), vec![Role::User, Role::Assistant]);
        prop_assert_eq!(harness.store.turns()[0].text(), text);
        prop_assert_eq!(harness.store.turns()[1].text(), reply);
    }

    /// An empty send with nothing staged never changes anything.
    #[test]
    fn prop_empty_send_is_inert(prefix in proptest::collection::vec("[a-z]{1,5}", 0..4)) {
        let mut harness = Harness::default();
        for text in prefix {
            harness.step(Event::send(text));
            harness.succeed("ok");
        }
        let before = harness.store.len();
        let dispatched = harness.dispatched.len();

        prop_assert!(!harness.step(Event::send("")));
        prop_assert_eq!(harness.store.len(), before);
        prop_assert_eq!(harness.dispatched.len(), dispatched);
        prop_assert_eq!(harness.status, SessionStatus::Idle);
    }
}
