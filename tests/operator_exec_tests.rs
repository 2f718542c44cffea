//! End-to-end executor tests: coverage, ordering, throughput

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use opflow::{AsyncOpFunc, Context, Filter, Map, Operator, Receiver};

/// Drain `out` until it closes; fails the test if that takes too long.
async fn drain<T: Send + 'static>(out: Receiver<T>) -> Vec<T> {
    let collect = async move {
        let mut got = Vec::new();
        while let Ok(v) = out.recv().await {
            got.push(v);
        }
        got
    };
    tokio::time::timeout(Duration::from_secs(10), collect)
        .await
        .expect("output was not closed in time")
}

fn groups() -> Vec<Vec<&'static str>> {
    vec![vec!["A", "B", "C"], vec!["D", "E"], vec!["G"]]
}

fn group_size_operator(concurrency: usize) -> (Operator<Vec<&'static str>, usize>, Receiver<usize>) {
    let mut op = Operator::new(Context::background());
    op.set_operation_fn(|_ctx, group: Vec<&'static str>| Some(group.len()));
    op.set_concurrency(concurrency).unwrap();

    let (tx, rx) = async_channel::unbounded();
    tokio::spawn(async move {
        for g in groups() {
            tx.send(g).await.unwrap();
        }
        tx.close();
    });
    op.set_input(rx);
    let out = op.output();
    (op, out)
}

#[tokio::test]
async fn test_group_sizes_in_order_with_single_worker() {
    let (mut op, out) = group_size_operator(1);
    op.exec(&Context::background()).expect("exec");

    assert_eq!(drain(out).await, vec![3, 2, 1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_group_sizes_unordered_with_four_workers() {
    let (mut op, out) = group_size_operator(4);
    op.exec(&Context::background()).expect("exec");

    let mut got = drain(out).await;
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3]);

    let stats = op.join().await.expect("join");
    assert_eq!(stats.workers_finished, 4);
    assert_eq!(stats.forwarded, 3);
}

#[tokio::test]
async fn test_single_worker_preserves_order_with_drops() {
    let mut op: Operator<u32, u32> = Operator::new(Context::background());
    op.set_operation(Filter::new(|v: &u32| v % 3 != 0));

    let (tx, rx) = async_channel::bounded(16);
    tokio::spawn(async move {
        for v in 0..1_000u32 {
            tx.send(v).await.unwrap();
        }
    });
    op.set_input(rx);
    op.exec(&Context::background()).expect("exec");

    let expected: Vec<u32> = (0..1_000).filter(|v| v % 3 != 0).collect();
    assert_eq!(drain(op.output()).await, expected);

    let stats = op.join().await.unwrap();
    assert_eq!(stats.dropped, 334);
    assert_eq!(stats.forwarded, 666);
    assert_eq!(stats.unaccounted(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_result_exactly_once_across_concurrency_levels() {
    for concurrency in [1, 2, 3, 8, 32] {
        let mut op: Operator<u64, u64> = Operator::new(Context::background());
        op.set_operation_fn(|_ctx, v| if v % 7 == 0 { None } else { Some(v * v) });
        op.set_concurrency(concurrency).unwrap();

        let (tx, rx) = async_channel::bounded(8);
        tokio::spawn(async move {
            for v in 0..2_000u64 {
                tx.send(v).await.unwrap();
            }
        });
        op.set_input(rx);
        op.exec(&Context::background()).expect("exec");

        let mut counts: HashMap<u64, usize> = HashMap::new();
        for v in drain(op.output()).await {
            *counts.entry(v).or_default() += 1;
        }

        let expected: Vec<u64> = (0..2_000u64).filter(|v| v % 7 != 0).map(|v| v * v).collect();
        assert_eq!(counts.len(), expected.len(), "concurrency {concurrency}");
        for v in expected {
            assert_eq!(counts.get(&v), Some(&1), "value {v} at concurrency {concurrency}");
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_throughput_counter_matches_input() {
    const N: usize = 10_000;

    let mut op: Operator<String, String> = Operator::new(Context::background());
    op.set_concurrency(8).unwrap();

    let (tx, rx) = async_channel::bounded(N / 2);
    op.set_input(rx);
    tokio::spawn(async move {
        for i in 0..N {
            tx.send(format!("word-{i}")).await.unwrap();
        }
    });

    let counter = Arc::new(Mutex::new(0usize));
    let seen = Arc::clone(&counter);
    op.set_operation_fn(move |_ctx, word| {
        *seen.lock().unwrap() += 1;
        Some(word)
    });

    let consumer = tokio::spawn(drain(op.output()));
    op.exec(&Context::background()).expect("exec");

    let got = consumer.await.expect("consumer task");
    assert_eq!(got.len(), N);
    assert_eq!(*counter.lock().unwrap(), N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_async_operation_runs_concurrently() {
    let mut op: Operator<u32, u32> = Operator::new(Context::background());
    op.set_operation(AsyncOpFunc::new(|_ctx: Context, v: u32| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Some(v)
    }));
    op.set_concurrency(16).unwrap();

    let (tx, rx) = async_channel::unbounded();
    for v in 0..16u32 {
        tx.send(v).await.unwrap();
    }
    tx.close();
    op.set_input(rx);

    let started = tokio::time::Instant::now();
    op.exec(&Context::background()).expect("exec");
    let mut got = drain(op.output()).await;
    got.sort_unstable();

    assert_eq!(got, (0..16).collect::<Vec<_>>());
    // 16 sleeps of 20ms on 16 workers overlap instead of adding up
    assert!(started.elapsed() < Duration::from_millis(300));
}

#[tokio::test]
async fn test_empty_input_closes_output() {
    let mut op: Operator<u8, u8> = Operator::new(Context::background());
    op.set_operation(Map::new(|v: u8| v));
    op.set_concurrency(3).unwrap();

    let (tx, rx) = async_channel::unbounded::<u8>();
    tx.close();
    op.set_input(rx);
    op.exec(&Context::background()).expect("exec");

    assert!(drain(op.output()).await.is_empty());
    let stats = op.join().await.unwrap();
    assert_eq!(stats.received, 0);
    assert_eq!(stats.workers_finished, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_operators_chain_into_a_pipeline() {
    let (tx, rx) = async_channel::unbounded();

    let mut lengths: Operator<String, usize> = Operator::new(Context::background());
    lengths.set_operation_fn(|_ctx, s: String| Some(s.len()));
    lengths.set_concurrency(2).unwrap();
    lengths.set_input(rx);

    let mut evens: Operator<usize, usize> = Operator::new(Context::background());
    evens.set_operation(Filter::new(|n: &usize| n % 2 == 0));
    evens.set_input(lengths.output());

    lengths.exec(&Context::background()).expect("exec lengths");
    evens.exec(&Context::background()).expect("exec evens");

    for w in ["ab", "abc", "abcd", "a", ""] {
        tx.send(w.to_string()).await.unwrap();
    }
    tx.close();

    let mut got = drain(evens.output()).await;
    got.sort_unstable();
    assert_eq!(got, vec![0, 2, 4]);
}
