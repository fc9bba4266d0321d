// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test readability over pedantic

//! Listener callbacks and WaitSet wakeups driven by real publishes.

use hdds_intra::dds::{
    ClosureListener, Condition, DataReaderListener, GuardCondition, HasStatusCondition,
    SampleLostStatus, SampleRejectedReason, SampleRejectedStatus, SampleStateMask, StatusMask,
    SubscriptionMatchedStatus, WaitSet,
};
use hdds_intra::{Error, Participant, QoS, SampleBuffer, SequenceNumber};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct ReaderLog {
    data: Mutex<Vec<SequenceNumber>>,
    matched: Mutex<Vec<SubscriptionMatchedStatus>>,
    lost: Mutex<Vec<SampleLostStatus>>,
    rejected: Mutex<Vec<SampleRejectedStatus>>,
}

impl DataReaderListener for ReaderLog {
    fn on_data_available(&self, sample: &SampleBuffer) {
        self.data.lock().push(sample.sequence());
    }

    fn on_subscription_matched(&self, status: SubscriptionMatchedStatus) {
        self.matched.lock().push(status);
    }

    fn on_sample_lost(&self, status: SampleLostStatus) {
        self.lost.lock().push(status);
    }

    fn on_sample_rejected(&self, status: SampleRejectedStatus) {
        self.rejected.lock().push(status);
    }
}

fn participant(domain: u32) -> Participant {
    Participant::builder("listeners")
        .domain_id(domain)
        .build()
        .expect("participant")
}

#[test]
fn reader_listener_sees_every_event_kind() {
    let participant = participant(121);
    let topic = participant.create_topic("events", "Blob").expect("topic");
    let log = Arc::new(ReaderLog::default());
    let reader = participant
        .create_reader_with_listener(
            &topic,
            QoS::default().keep_last(1),
            Arc::clone(&log) as Arc<dyn DataReaderListener>,
        )
        .expect("reader");

    let writer = participant
        .create_writer(&topic, QoS::default())
        .expect("writer");
    for i in 1..=3u8 {
        writer.publish(vec![i]).expect("publish");
    }
    drop(writer);

    assert_eq!(
        *log.data.lock(),
        vec![SequenceNumber(1), SequenceNumber(2), SequenceNumber(3)]
    );
    let lost = log.lost.lock().clone();
    assert_eq!(lost.len(), 2);
    assert_eq!(lost[1].total_count, 2);
    assert_eq!(lost[1].total_count_change, 1);

    let matched: Vec<(u32, i32)> = log
        .matched
        .lock()
        .iter()
        .map(|s| (s.current_count, s.current_count_change))
        .collect();
    assert_eq!(matched, vec![(1, 1), (0, -1)]);
    assert!(log.rejected.lock().is_empty());

    // A listener consumes the statuses; no condition bit is left behind.
    assert!(reader.get_status_condition().get_active_statuses().is_empty());
    assert_eq!(reader.take().map(|s| s.payload().to_vec()), Some(vec![3u8]));
}

#[test]
fn rejected_samples_reach_listener_with_reason() {
    let participant = participant(122);
    let topic = participant.create_topic("full", "Blob").expect("topic");
    let log = Arc::new(ReaderLog::default());
    let writer = participant
        .create_writer(&topic, QoS::best_effort())
        .expect("writer");
    let _reader = participant
        .create_reader_with_listener(
            &topic,
            QoS::default().keep_all().max_samples(1),
            Arc::clone(&log) as Arc<dyn DataReaderListener>,
        )
        .expect("reader");

    writer.publish(vec![1u8]).expect("publish");
    writer.publish(vec![2u8]).expect("dropped for the full reader");

    let rejected = log.rejected.lock().clone();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].total_count, 1);
    assert_eq!(rejected[0].last_reason, SampleRejectedReason::ResourceLimit);
    assert_eq!(rejected[0].last_publication_handle, Some(writer.id()));
}

#[test]
fn late_joiner_replay_is_reported_as_data() {
    let participant = participant(123);
    let topic = participant.create_topic("replay", "Blob").expect("topic");
    let writer = participant
        .create_writer(&topic, QoS::default().keep_last(4).transient_local())
        .expect("writer");
    writer.publish(vec![1u8]).expect("publish");
    writer.publish(vec![2u8]).expect("publish");

    let count = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&count);
    let listener = ClosureListener::new(move |_sample: &SampleBuffer| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let reader = participant
        .create_reader_with_listener(
            &topic,
            QoS::default().keep_last(4).transient_local(),
            Arc::new(listener),
        )
        .expect("reader");

    assert_eq!(count.load(Ordering::SeqCst), 2);
    assert_eq!(reader.len(), 2);
}

#[test]
fn waitset_wakes_on_publish_from_another_thread() {
    let participant = participant(124);
    let topic = participant.create_topic("wake", "Blob").expect("topic");
    let reader = participant
        .create_reader(&topic, QoS::default().keep_last(8))
        .expect("reader");
    let writer = participant
        .create_writer(&topic, QoS::default())
        .expect("writer");

    let data = reader.create_read_condition(SampleStateMask::NOT_READ);
    let waitset = WaitSet::new();
    waitset.attach_condition(data.clone()).expect("attach");

    assert!(matches!(
        waitset.wait(Some(Duration::from_millis(10))),
        Err(Error::WouldBlock)
    ));

    let publisher = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        writer.publish(vec![9u8]).expect("publish");
        writer
    });
    let triggered = waitset
        .wait(Some(Duration::from_secs(5)))
        .expect("data arrives");
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].condition_id(), data.condition_id());
    assert_eq!(reader.take().map(|s| s.payload().to_vec()), Some(vec![9u8]));
    drop(publisher.join().expect("publisher panicked"));
}

#[test]
fn waitset_on_status_condition_and_guard() {
    let participant = participant(125);
    let topic = participant.create_topic("status", "Blob").expect("topic");
    let reader = participant
        .create_reader(&topic, QoS::default())
        .expect("reader");
    let condition = reader.get_status_condition();
    condition.set_enabled_statuses(StatusMask::SUBSCRIPTION_MATCHED);

    let stop = Arc::new(GuardCondition::new());
    let waitset = Arc::new(WaitSet::new());
    waitset.attach(&reader).expect("attach reader");
    waitset.attach_condition(stop.clone()).expect("attach guard");

    let waiter = {
        let waitset = Arc::clone(&waitset);
        thread::spawn(move || waitset.wait(Some(Duration::from_secs(5))))
    };
    thread::sleep(Duration::from_millis(20));
    let _writer = participant
        .create_writer(&topic, QoS::default())
        .expect("writer");

    let triggered = waiter
        .join()
        .expect("waiter panicked")
        .expect("match triggers the status condition");
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].condition_id(), condition.condition_id());

    assert_eq!(reader.subscription_matched_status().current_count, 1);
    assert!(!condition.get_trigger_value());

    stop.set_trigger_value(true);
    let triggered = waitset.wait(Some(Duration::from_secs(1))).expect("guard");
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].condition_id(), stop.condition_id());
}
