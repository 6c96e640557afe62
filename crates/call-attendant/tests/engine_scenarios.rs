//! End-to-end call handling through the processing engine
//!
//! These tests drive the engine with simulated line hardware and paused
//! tokio time, so ring cadence timing is deterministic.

mod common;

use call_attendant::prelude::*;
use call_attendant::simulated::LineEvent;
use common::*;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_whitelisted_caller_is_answered_after_two_rings() {
    let mut config = test_config();
    config.permitted.rings_before_answer = 2;
    let h = HarnessBuilder::new(config).build();

    ring_later(&h.ring, Duration::from_secs(6), 2);
    let outcome = h.engine.process_call(Caller::new("5551234567")).await;

    assert_eq!(outcome.classification, Classification::permitted("Friends and family"));
    assert_eq!(outcome.ring_wait, Some(RingWaitResult { eligible: true, ring_count: 2 }));
    let call_id = outcome.call_id.expect("call logged");
    assert_eq!(h.log.get(call_id).unwrap().category, CallCategory::Permitted);

    assert!(outcome.answered());
    assert_eq!(
        h.line.events(),
        vec![
            LineEvent::OffHook,
            LineEvent::Played("general_greeting.wav".into()),
            LineEvent::OnHook,
        ]
    );
    assert_eq!(*h.recorder.messages.lock(), vec![call_id]);
    assert_eq!(h.approved.count(), 1);
    assert_eq!(h.blocked.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_blacklisted_caller_is_blocked() {
    let mut config = test_config();
    config.screening.modes = vec![ScreeningMode::Blacklist];
    let h = HarnessBuilder::new(config).build();

    let outcome = h.engine.process_call(Caller::new("5559998888")).await;

    assert_eq!(outcome.classification.category, CallCategory::Blocked);
    assert_eq!(h.blocked.count(), 1);
    assert_eq!(h.approved.count(), 0);

    let entry = h.log.get(outcome.call_id.unwrap()).unwrap();
    assert_eq!(entry.category, CallCategory::Blocked);
    assert_eq!(entry.reason, "Known telemarketer");

    // Default blocked plan: greeting only, answered on the first ring
    assert!(outcome.dispatch.as_ref().unwrap().executed(AnswerAction::Greeting));
    assert_eq!(
        h.line.events(),
        vec![
            LineEvent::OffHook,
            LineEvent::Played("blocked_greeting.wav".into()),
            LineEvent::OnHook,
        ]
    );
    assert!(h.recorder.messages.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ringing_stops_before_ring_count() {
    let mut config = test_config();
    config.screened.rings_before_answer = 3;
    let h = HarnessBuilder::new(config).build();

    ring_later(&h.ring, Duration::from_secs(6), 1);
    let outcome = h.engine.process_call(Caller::new("5550001111")).await;

    assert_eq!(outcome.classification.category, CallCategory::Screened);
    assert_eq!(outcome.ring_wait, Some(RingWaitResult { eligible: false, ring_count: 2 }));
    assert!(outcome.dispatch.is_none());
    assert!(h.line.events().is_empty());
    assert_eq!(h.log.len(), 1);
    assert_eq!(h.engine.stats().snapshot().not_eligible, 1);
}

#[tokio::test(start_paused = true)]
async fn test_line_already_off_hook() {
    let h = HarnessBuilder::new(test_config()).build();
    assert!(h.line.manual_pick_up());

    let outcome = h.engine.process_call(Caller::new("5550001111")).await;

    assert_eq!(outcome.dispatch, Some(DispatchOutcome::LineBusy));
    assert!(!outcome.answered());
    assert_eq!(h.line.events(), vec![LineEvent::PickUpRefused]);
    assert!(h.recorder.messages.lock().is_empty());
    assert_eq!(h.log.len(), 1);
    // The extension still holds the line
    assert!(h.line.is_off_hook());
    assert_eq!(h.engine.stats().snapshot().line_busy, 1);
}

#[tokio::test(start_paused = true)]
async fn test_screening_failure_fails_open() {
    let h = HarnessBuilder::new(test_config())
        .checker(Arc::new(BrokenChecker))
        .build();

    let outcome = h.engine.process_call(Caller::new("5559998888")).await;

    assert_eq!(outcome.classification.category, CallCategory::Screened);
    assert_eq!(h.approved.count(), 1);
    assert_eq!(h.blocked.count(), 0);
    assert!(outcome.call_id.is_some());
    assert!(outcome.answered());
    assert_eq!(h.engine.stats().snapshot().screening_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_log_failure_skips_answer() {
    let h = HarnessBuilder::new(test_config())
        .logger(Arc::new(BrokenLogger))
        .build();

    let outcome = h.engine.process_call(Caller::new("5550001111")).await;

    assert!(outcome.call_id.is_none());
    assert!(outcome.ring_wait.is_none());
    assert!(outcome.dispatch.is_none());
    assert!(h.line.events().is_empty());
    assert_eq!(h.engine.stats().snapshot().log_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_empty_plan_is_logged_but_not_answered() {
    let mut config = test_config();
    config.screened.actions.clear();
    let h = HarnessBuilder::new(config).build();

    let outcome = h.engine.process_call(Caller::new("P")).await;

    assert_eq!(outcome.classification.category, CallCategory::Screened);
    assert_eq!(outcome.ring_wait.map(|r| r.eligible), Some(true));
    assert!(outcome.dispatch.is_none());
    assert!(h.line.events().is_empty());
    assert_eq!(h.log.get(outcome.call_id.unwrap()).unwrap().number, "P");
}

#[tokio::test(start_paused = true)]
async fn test_private_number_is_screened_by_pattern() {
    let mut config = test_config();
    config
        .screening
        .block_number_patterns
        .insert("^P$".into(), "Private number".into());
    let h = HarnessBuilder::new(config).build();

    let outcome = h.engine.process_call(Caller::new("P")).await;

    assert_eq!(outcome.classification, Classification::blocked("Private number"));
}

#[tokio::test(start_paused = true)]
async fn test_action_failure_does_not_affect_next_call() {
    let h = HarnessBuilder::new(test_config())
        .recorder(ScriptedRecorder {
            fail_record: true,
            ..Default::default()
        })
        .build();

    let first = h.engine.process_call(Caller::new("5550001111")).await;
    let second = h.engine.process_call(Caller::new("5550002222")).await;

    for outcome in [&first, &second] {
        match outcome.dispatch.as_ref().unwrap() {
            DispatchOutcome::ActionFailed { action, completed, .. } => {
                assert_eq!(*action, AnswerAction::RecordMessage);
                assert_eq!(completed, &vec![AnswerAction::Greeting]);
            }
            other => panic!("unexpected dispatch outcome {:?}", other),
        }
    }
    assert_eq!(count_events(&h.line, &LineEvent::OffHook), 2);
    assert_eq!(count_events(&h.line, &LineEvent::OnHook), 2);
    assert!(!h.line.is_off_hook());
    assert_eq!(h.engine.stats().snapshot().action_failures, 2);
}

#[tokio::test(start_paused = true)]
async fn test_run_processes_calls_in_arrival_order() {
    let mut h = HarnessBuilder::new(test_config()).build();

    let sender = h.sender.clone();
    let producer = std::thread::spawn(move || {
        for number in ["5551234567", "5559998888", "5550001111"] {
            sender.push(Caller::new(number)).unwrap();
        }
    });
    producer.join().unwrap();
    drop(h.sender);

    let result = h.engine.run().await;
    assert!(matches!(result, Err(AttendantError::IngestionClosed)));

    let mut order = Vec::new();
    while let Ok(outcome) = h.outcomes.try_recv() {
        order.push((outcome.caller.number().to_string(), outcome.classification.category));
    }
    assert_eq!(
        order,
        vec![
            ("5551234567".to_string(), CallCategory::Permitted),
            ("5559998888".to_string(), CallCategory::Blocked),
            ("5550001111".to_string(), CallCategory::Screened),
        ]
    );

    let ids: Vec<u64> = h.log.entries().iter().map(|e| e.call_id.0).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_run_survives_panicking_action() {
    let mut h = HarnessBuilder::new(test_config())
        .recorder(ScriptedRecorder {
            panic_record: true,
            ..Default::default()
        })
        .build();

    h.sender.push(Caller::new("5550001111")).unwrap();
    h.sender.push(Caller::new("5550002222")).unwrap();
    drop(h.sender);

    let stats = h.engine.stats();
    let result = h.engine.run().await;

    assert!(matches!(result, Err(AttendantError::IngestionClosed)));
    assert_eq!(stats.snapshot().calls, 2);
    assert_eq!(stats.snapshot().action_failures, 2);
    assert_eq!(count_events(&h.line, &LineEvent::OnHook), 2);

    let mut received = 0;
    while h.outcomes.try_recv().is_ok() {
        received += 1;
    }
    assert_eq!(received, 2);
}
