// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::ReaderState;
use crate::core::rt::SampleState;
use crate::core::types::{SequenceNumber, TypeId};
use crate::dds::{Error, QoS, TopicRegistry};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn registry() -> Arc<TopicRegistry> {
    Arc::new(TopicRegistry::new())
}

fn bytes() -> TypeId {
    TypeId::from_type_name("Bytes")
}

#[test]
fn reader_returns_none_when_queue_empty() {
    let registry = registry();
    let reader = registry
        .register_reader("empty", bytes(), &QoS::default())
        .expect("reader");
    assert!(reader.take().is_none());
    assert!(reader.is_empty());
}

#[test]
fn zero_depth_is_invalid_qos() {
    let registry = registry();
    let err = registry
        .register_reader("bad", bytes(), &QoS::default().keep_last(0))
        .expect_err("depth 0");
    assert!(matches!(err, Error::InvalidQos(_)));
    assert!(!registry.contains("bad"));
}

#[test]
fn take_with_scopes_the_reference() {
    let registry = registry();
    let writer = registry
        .register_writer("scoped", bytes(), &QoS::default())
        .expect("writer");
    let reader = registry
        .register_reader("scoped", bytes(), &QoS::default())
        .expect("reader");
    writer.publish(vec![1u8, 2, 3]).expect("publish");

    let len = reader.take_with(|sample| {
        assert_eq!(sample.ref_count(), 1);
        sample.len()
    });
    assert_eq!(len, Some(3));
    assert_eq!(reader.channel().metrics().live(), 0);
    assert_eq!(reader.take_with(|s| s.len()), None);
}

#[test]
fn read_is_non_destructive_and_tracks_state() {
    let registry = registry();
    let writer = registry
        .register_writer("peek", bytes(), &QoS::default())
        .expect("writer");
    let reader = registry
        .register_reader("peek", bytes(), &QoS::default().keep_last(4))
        .expect("reader");
    writer.publish(vec![1u8]).expect("publish");

    let first = reader.read();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].1.sample_state, SampleState::NotRead);
    assert_eq!(first[0].1.sequence, SequenceNumber(1));
    assert_eq!(first[0].1.publication_handle, writer.id());

    let again = reader.read();
    assert_eq!(again[0].1.sample_state, SampleState::Read);
    assert_eq!(reader.len(), 1);
    assert!(reader.take().is_some());
}

#[test]
fn wait_for_sample_times_out() {
    let registry = registry();
    let reader = registry
        .register_reader("quiet", bytes(), &QoS::default())
        .expect("reader");
    let result = reader.wait_for_sample(Some(Duration::from_millis(10)));
    assert!(matches!(result, Ok(None)));
}

#[test]
fn wait_for_sample_receives_publish() {
    let registry = registry();
    let writer = registry
        .register_writer("wake", bytes(), &QoS::default())
        .expect("writer");
    let reader = Arc::new(
        registry
            .register_reader("wake", bytes(), &QoS::default())
            .expect("reader"),
    );
    let waiter = {
        let reader = Arc::clone(&reader);
        thread::spawn(move || reader.wait_for_sample(None))
    };
    thread::sleep(Duration::from_millis(20));
    writer.publish(vec![5u8]).expect("publish");

    let sample = waiter
        .join()
        .expect("waiter panicked")
        .expect("not destroyed")
        .expect("sample");
    assert_eq!(sample.payload(), &[5u8]);
}

#[test]
fn destroy_wakes_all_waiters() {
    let registry = registry();
    let reader = Arc::new(
        registry
            .register_reader("cancel", bytes(), &QoS::default())
            .expect("reader"),
    );
    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let reader = Arc::clone(&reader);
            thread::spawn(move || reader.wait_for_sample(None))
        })
        .collect();
    thread::sleep(Duration::from_millis(20));

    let started = Instant::now();
    reader.destroy();
    for w in waiters {
        let result = w.join().expect("waiter panicked");
        assert!(matches!(result, Err(Error::Unregistered)));
    }
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(reader.state(), ReaderState::Destroyed);
}

#[test]
fn destroy_releases_backlog_and_is_idempotent() {
    let registry = registry();
    let writer = registry
        .register_writer("drain", bytes(), &QoS::default())
        .expect("writer");
    let reader = registry
        .register_reader("drain", bytes(), &QoS::default().keep_last(4))
        .expect("reader");
    for i in 0..3u8 {
        writer.publish(vec![i]).expect("publish");
    }
    assert_eq!(writer.channel().metrics().live(), 3);

    reader.destroy();
    reader.destroy();
    assert_eq!(writer.channel().metrics().live(), 0);
    assert!(reader.take().is_none());
    assert!(reader.read().is_empty());
    assert!(matches!(
        reader.wait_for_sample(Some(Duration::ZERO)),
        Err(Error::Unregistered)
    ));
    assert!(matches!(reader.unmatch(), Err(Error::Unregistered)));
    assert_eq!(registry.reader_count("drain"), 0);
    assert_eq!(writer.matched_readers(), 0);
}

#[test]
fn state_machine_follows_writers() {
    let registry = registry();
    let reader = registry
        .register_reader("states", bytes(), &QoS::default().keep_last(4))
        .expect("reader");
    assert_eq!(reader.state(), ReaderState::Registered);

    let writer = registry
        .register_writer("states", bytes(), &QoS::default())
        .expect("writer");
    assert_eq!(reader.state(), ReaderState::Matched);
    writer.publish(vec![1u8]).expect("publish");

    drop(writer);
    assert_eq!(reader.state(), ReaderState::Unmatched);
    // Backlog survives the unmatch.
    assert_eq!(reader.take().map(|s| s.sequence()), Some(SequenceNumber(1)));

    let again = registry
        .register_writer("states", bytes(), &QoS::default())
        .expect("writer");
    assert_eq!(reader.state(), ReaderState::Matched);
    drop(again);

    reader.destroy();
    assert_eq!(reader.state(), ReaderState::Destroyed);
}

#[test]
fn explicit_unmatch_keeps_backlog_and_stops_new_samples() {
    let registry = registry();
    let writer = registry
        .register_writer("pause", bytes(), &QoS::default())
        .expect("writer");
    let reader = registry
        .register_reader("pause", bytes(), &QoS::default().keep_last(4))
        .expect("reader");

    writer.publish(vec![1u8]).expect("publish");
    reader.unmatch().expect("live reader");
    assert_eq!(reader.state(), ReaderState::Unmatched);
    writer.publish(vec![2u8]).expect("publish");

    reader.rematch().expect("live reader");
    writer.publish(vec![3u8]).expect("publish");
    let seqs: Vec<u64> = reader.take_batch(8).iter().map(|s| s.sequence().0).collect();
    assert_eq!(seqs, vec![1, 3]);
}

#[test]
fn late_joiner_gets_transient_local_history() {
    let registry = registry();
    let writer = registry
        .register_writer("late", bytes(), &QoS::default().keep_last(3).transient_local())
        .expect("writer");
    for i in 1..=5u8 {
        writer.publish(vec![i]).expect("publish");
    }

    let volatile = registry
        .register_reader("late", bytes(), &QoS::default().keep_last(8))
        .expect("volatile reader");
    assert!(volatile.is_empty());

    let durable = registry
        .register_reader("late", bytes(), &QoS::default().keep_last(8).transient_local())
        .expect("durable reader");
    let seqs: Vec<u64> = durable.take_batch(8).iter().map(|s| s.sequence().0).collect();
    assert_eq!(seqs, vec![3, 4, 5]);

    writer.publish(vec![6u8]).expect("publish");
    assert_eq!(durable.take().map(|s| s.sequence()), Some(SequenceNumber(6)));
}

#[test]
fn status_condition_tracks_unread_statuses_without_listener() {
    use crate::dds::condition::{Condition, HasStatusCondition, StatusMask};

    let registry = registry();
    let reader = registry
        .register_reader("status", bytes(), &QoS::default().keep_last(1))
        .expect("reader");
    let condition = reader.get_status_condition();
    assert!(!condition.get_trigger_value());

    let writer = registry
        .register_writer("status", bytes(), &QoS::default())
        .expect("writer");
    assert!(condition
        .get_active_statuses()
        .contains(StatusMask::SUBSCRIPTION_MATCHED));
    let matched = reader.subscription_matched_status();
    assert_eq!(matched.current_count, 1);
    assert_eq!(matched.current_count_change, 1);
    assert_eq!(matched.last_publication_handle, Some(writer.id()));
    assert!(!condition.get_trigger_value());

    writer.publish(vec![1u8]).expect("publish");
    writer.publish(vec![2u8]).expect("publish");
    let active = condition.get_active_statuses();
    assert!(active.contains(StatusMask::DATA_AVAILABLE | StatusMask::SAMPLE_LOST));

    let lost = reader.sample_lost_status();
    assert_eq!((lost.total_count, lost.total_count_change), (1, 1));
    assert_eq!(reader.sample_lost_status().total_count_change, 0);

    assert_eq!(reader.take().map(|s| s.sequence()), Some(SequenceNumber(2)));
    assert!(!condition.get_trigger_value());
}

#[test]
fn read_condition_reflects_queue_contents() {
    use crate::dds::condition::{Condition, SampleStateMask};

    let registry = registry();
    let writer = registry
        .register_writer("rc", bytes(), &QoS::default())
        .expect("writer");
    let reader = registry
        .register_reader("rc", bytes(), &QoS::default().keep_last(4))
        .expect("reader");
    let unread = reader.create_read_condition(SampleStateMask::NOT_READ);
    let any = reader.create_read_condition(SampleStateMask::ANY);
    assert!(!any.get_trigger_value());

    writer.publish(vec![1u8]).expect("publish");
    assert!(unread.get_trigger_value());
    reader.read();
    assert!(!unread.get_trigger_value());
    assert!(any.get_trigger_value());

    reader.destroy();
    assert!(!any.get_trigger_value());
}
