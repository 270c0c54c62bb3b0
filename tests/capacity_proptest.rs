//! Property tests for roster bookkeeping
//!
//! Arbitrary join/leave sequences are replayed against the event service and
//! a plain model; the stored roster must match the model and never exceed
//! capacity.

mod helpers;

use proptest::prelude::*;

use eventhub::database::EventStore;
use eventhub::utils::errors::{ConflictReason, EventHubError};
use helpers::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Join(usize),
    Leave(usize),
}

fn op(users: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..users).prop_map(Op::Join),
        (0..users).prop_map(Op::Leave),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn roster_matches_model(capacity in 1i32..6, ops in prop::collection::vec(op(8), 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let ctx = TestContext::new().await;
            let events = &ctx.services.event_service;
            let id = ctx.approved_event(capacity).await.event.id;
            let mut actors = Vec::new();
            for _ in 0..8 {
                actors.push(ctx.register_user().await);
            }

            let mut model: Vec<usize> = Vec::new();
            for op in ops {
                match op {
                    Op::Join(i) => {
                        let result = events.participate(&actors[i], id).await;
                        if model.contains(&i) {
                            assert!(matches!(
                                result,
                                Err(EventHubError::Conflict(ConflictReason::AlreadyParticipant))
                            ));
                        } else if model.len() >= capacity as usize {
                            assert!(matches!(
                                result,
                                Err(EventHubError::Conflict(ConflictReason::EventFull))
                            ));
                        } else {
                            assert!(result.is_ok());
                            model.push(i);
                        }
                    }
                    Op::Leave(i) => {
                        let result = events.cancel_participation(&actors[i], id).await;
                        if model.contains(&i) {
                            assert!(result.is_ok());
                            model.retain(|m| *m != i);
                        } else {
                            assert!(matches!(
                                result,
                                Err(EventHubError::Conflict(ConflictReason::NotParticipant))
                            ));
                        }
                    }
                }

                let event = ctx.store.find_event(id).await.unwrap().unwrap();
                assert!(event.participants.len() <= capacity as usize);
                let expected: Vec<_> = model.iter().map(|i| actors[*i].id).collect();
                assert_eq!(event.participants, expected);
            }
        });
    }
}
