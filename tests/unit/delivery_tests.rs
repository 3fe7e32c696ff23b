use flexchannel_rs::{FlexChannel, FlexChannelConfig, FlexChannelError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_tracing;

    const REPEAT_COUNT: usize = 100;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_order_and_non_blocking_send() {
        init_tracing();
        let channel = FlexChannel::new();
        let results = Arc::new(Mutex::new(Vec::new()));
        let results_clone = results.clone();

        let handle = channel
            .start(move |item: Box<usize>| {
                results_clone.lock().unwrap().push(*item);
                std::thread::sleep(Duration::from_micros(200));
            })
            .unwrap();

        let start = Instant::now();
        for i in 0..REPEAT_COUNT {
            channel.send(Box::new(i));
        }
        let elapsed = start.elapsed();
        assert!(elapsed < Duration::from_millis(10), "sends took {elapsed:?}");

        channel.close();
        handle.wait().await.unwrap();

        let results = results.lock().unwrap();
        assert_eq!(results.len(), REPEAT_COUNT, "should all be received");
        for (i, item) in results.iter().enumerate() {
            assert_eq!(*item, i, "messages should be in order");
        }
    }

    #[tokio::test]
    async fn test_double_start_runs_one_worker() {
        init_tracing();
        let channel = FlexChannel::new();
        let results = Arc::new(Mutex::new(Vec::new()));

        let sink = results.clone();
        let handle = channel
            .start(move |item: u32| sink.lock().unwrap().push(("first", item)))
            .unwrap();

        let sink = results.clone();
        let second = channel.start(move |item: u32| sink.lock().unwrap().push(("second", item)));
        assert!(matches!(second, Err(FlexChannelError::AlreadyStarted)));
        assert_eq!(
            second.unwrap_err().to_string(),
            "already started".to_string()
        );

        for i in 0..10 {
            channel.send(i);
        }
        channel.close();
        handle.wait().await.unwrap();

        let results = results.lock().unwrap();
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|(who, _)| *who == "first"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_completeness_under_concurrency() {
        init_tracing();
        let channel = Arc::new(FlexChannel::with_config(FlexChannelConfig {
            name: "concurrency".to_string(),
            transport_capacity: 8,
            pool_capacity: 32,
            ..FlexChannelConfig::default()
        }));
        let results = Arc::new(Mutex::new(Vec::new()));
        let sink = results.clone();
        let handle = channel
            .start(move |item: String| sink.lock().unwrap().push(item))
            .unwrap();

        let mut producers = Vec::new();
        for producer in 0..10 {
            let channel = channel.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..200 {
                    channel.send(format!("{producer}-{i}"));
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        channel.close();
        handle.wait().await.unwrap();

        let results = results.lock().unwrap();
        assert_eq!(results.len(), 2000);
        let distinct: HashSet<&String> = results.iter().collect();
        assert_eq!(distinct.len(), 2000);

        let stats = channel.stats();
        assert_eq!(stats.accepted, 2000);
        assert_eq!(stats.delivered, 2000);
        assert_eq!(stats.pending(), 0);
    }
}
