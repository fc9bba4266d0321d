// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use std::thread;

fn type_a() -> TypeId {
    TypeId::from_type_name("TypeA")
}

fn type_b() -> TypeId {
    TypeId::from_type_name("TypeB")
}

#[test]
fn test_first_registration_creates_entry() {
    let registry = Arc::new(TopicRegistry::new());
    assert_eq!(registry.topic_count(), 0);

    let writer = registry
        .register_writer("t", type_a(), &QoS::default())
        .expect("writer");
    assert!(registry.contains("t"));
    assert_eq!(registry.type_of("t"), Some(type_a()));
    assert_eq!(registry.writer_count("t"), 1);
    assert_eq!(registry.reader_count("t"), 0);

    let entry = registry.lookup("t").expect("entry");
    assert_eq!(entry.name(), "t");
    assert!(Arc::ptr_eq(entry.channel(), writer.channel()));
}

#[test]
fn test_type_mismatch_leaves_state_unchanged() {
    let registry = Arc::new(TopicRegistry::new());
    let writer = registry
        .register_writer("t", type_a(), &QoS::default())
        .expect("writer");

    let err = registry
        .register_reader("t", type_b(), &QoS::default())
        .expect_err("type B on a type A topic");
    assert!(matches!(err, Error::TypeMismatch { ref topic } if topic == "t"));
    assert_eq!(registry.reader_count("t"), 0);
    assert_eq!(registry.writer_count("t"), 1);
    assert_eq!(registry.type_of("t"), Some(type_a()));
    assert_eq!(writer.matched_readers(), 0);

    let reader = registry
        .register_reader("t", type_a(), &QoS::default())
        .expect("matching type succeeds");
    assert_eq!(registry.reader_count("t"), 1);
    assert_eq!(writer.matched_readers(), 1);
    drop(reader);
}

#[test]
fn test_entry_removed_when_last_endpoint_leaves() {
    let registry = Arc::new(TopicRegistry::new());
    let writer = registry
        .register_writer("t", type_a(), &QoS::default())
        .expect("writer");
    let reader = registry
        .register_reader("t", type_a(), &QoS::default())
        .expect("reader");

    registry.unregister_writer(writer);
    assert!(registry.contains("t"));
    registry.unregister_reader(reader);
    assert!(!registry.contains("t"));
    assert_eq!(registry.topic_count(), 0);

    // A fresh entry may now use another type.
    let _reader = registry
        .register_reader("t", type_b(), &QoS::default())
        .expect("new type after teardown");
    assert_eq!(registry.type_of("t"), Some(type_b()));
}

#[test]
fn test_members_are_ordered_by_registration() {
    let registry = Arc::new(TopicRegistry::new());
    let readers: Vec<_> = (0..3)
        .map(|_| {
            registry
                .register_reader("t", type_a(), &QoS::default())
                .expect("reader")
        })
        .collect();

    let entry = registry.lookup("t").expect("entry");
    let ids: Vec<_> = readers.iter().map(|r| r.id()).collect();
    assert_eq!(entry.readers(), ids);
    assert!(entry.writers().is_empty());
}

#[test]
fn test_invalid_qos_creates_nothing() {
    let registry = Arc::new(TopicRegistry::new());
    let err = registry
        .register_writer("t", type_a(), &QoS::default().keep_all().max_samples(0))
        .expect_err("invalid");
    assert!(matches!(err, Error::InvalidQos(_)));
    assert_eq!(registry.topic_count(), 0);
}

#[test]
fn test_topic_names_sorted() {
    let registry = Arc::new(TopicRegistry::new());
    let _b = registry
        .register_writer("beta", type_a(), &QoS::default())
        .expect("writer");
    let _a = registry
        .register_writer("alpha", type_a(), &QoS::default())
        .expect("writer");
    assert_eq!(registry.topic_names(), vec!["alpha", "beta"]);
}

#[test]
fn test_concurrent_churn_on_one_topic() {
    let registry = Arc::new(TopicRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    if i % 2 == 0 {
                        let w = registry
                            .register_writer("churn", type_a(), &QoS::default())
                            .expect("writer");
                        drop(w);
                    } else {
                        let r = registry
                            .register_reader("churn", type_a(), &QoS::default())
                            .expect("reader");
                        drop(r);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("worker panicked");
    }
    assert!(!registry.contains("churn"));
    assert_eq!(registry.topic_count(), 0);
}

#[test]
fn test_registration_outlives_registry() {
    let registry = Arc::new(TopicRegistry::new());
    let writer = registry
        .register_writer("t", type_a(), &QoS::default())
        .expect("writer");
    drop(registry);
    // Channel still works; unregistration on drop is a no-op.
    writer.publish(vec![1u8]).expect("publish");
    drop(writer);
}

#[test]
fn test_retired_entry_is_already_out_of_the_index() {
    let registry = Arc::new(TopicRegistry::new());
    let writer = registry
        .register_writer("t", type_a(), &QoS::default())
        .expect("writer");
    let stale = registry.lookup("t").expect("entry");
    drop(writer);

    // Retirement and removal happen under the same entry lock.
    let members = stale.members.lock();
    assert!(members.retired);
    assert!(registry.lookup("t").is_none());
    drop(members);

    let reader = registry
        .register_reader("t", type_b(), &QoS::default())
        .expect("fresh entry takes the new type");
    let fresh = registry.lookup("t").expect("entry");
    assert!(!Arc::ptr_eq(&stale, &fresh));
    assert_eq!(fresh.type_id(), type_b());
    drop(reader);
}
